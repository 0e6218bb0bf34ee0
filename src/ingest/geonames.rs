/// GeoNames earthquake feed client
///
/// Retrieves earthquake records from the GeoNames `earthquakesJSON` web
/// service, either for a bounding box or, when a date is supplied, globally
/// in most-recent-first order above a magnitude floor.
///
/// API Documentation: https://www.geonames.org/export/JSON-webservices.html#earthquakesJSON

use serde::Deserialize;
use std::time::Duration;

use crate::analysis::recency::parse_quake_datetime;
use crate::config::GeoNamesConfig;
use crate::model::{Earthquake, FeedQuery, QuakeError};

pub const GEONAMES_BASE_URL: &str = "http://api.geonames.org";

// ============================================================================
// Feed abstraction
// ============================================================================

/// Anything that can answer a [`FeedQuery`] with a batch of earthquakes.
///
/// Implementations report failures as typed errors; none of them retry.
#[allow(async_fn_in_trait)]
pub trait QuakeFeed {
    async fn fetch_earthquakes(&self, query: &FeedQuery) -> Result<Vec<Earthquake>, QuakeError>;
}

impl<T: QuakeFeed> QuakeFeed for &T {
    async fn fetch_earthquakes(&self, query: &FeedQuery) -> Result<Vec<Earthquake>, QuakeError> {
        (**self).fetch_earthquakes(query).await
    }
}

// ============================================================================
// GeoNames API Response Structures
// ============================================================================

/// Top-level `earthquakesJSON` document.
///
/// A successful call carries `earthquakes`; a rejected one (bad username,
/// exhausted credits) carries `status` and still returns HTTP 200.
#[derive(Debug, Deserialize)]
pub struct GeoNamesResponse {
    pub earthquakes: Option<Vec<GeoNamesQuake>>,
    pub status: Option<GeoNamesStatus>,
}

#[derive(Debug, Deserialize)]
pub struct GeoNamesStatus {
    pub message: String,
    pub value: i64,
}

/// Single earthquake entry as GeoNames serializes it.
#[derive(Debug, Deserialize)]
pub struct GeoNamesQuake {
    pub eqid: String,
    pub magnitude: f64,
    pub depth: f64,
    pub datetime: String, // "2011-03-11 04:46:23"
    pub lat: f64,
    pub lng: f64,
    pub src: Option<String>,
}

// ============================================================================
// URL construction and parsing
// ============================================================================

/// Builds an `earthquakesJSON` request URL.
pub fn build_feed_url(base_url: &str, username: &str, query: &FeedQuery) -> String {
    let mut url = format!(
        "{}/earthquakesJSON?north={}&south={}&east={}&west={}&username={}&maxRows={}",
        base_url.trim_end_matches('/'),
        query.bbox.north,
        query.bbox.south,
        query.bbox.east,
        query.bbox.west,
        username,
        query.max_rows
    );

    if let Some(date) = query.date {
        url.push_str(&format!("&date={}", date.format("%Y-%m-%d")));
    }
    if let Some(min_magnitude) = query.min_magnitude {
        url.push_str(&format!("&minMagnitude={}", min_magnitude));
    }

    url
}

/// Parses an `earthquakesJSON` body into earthquakes, preserving feed order.
pub fn parse_feed_response(body: &str) -> Result<Vec<Earthquake>, QuakeError> {
    let response: GeoNamesResponse = serde_json::from_str(body)
        .map_err(|e| QuakeError::MalformedResponse(e.to_string()))?;

    if let Some(status) = response.status {
        return Err(QuakeError::ServiceError {
            code: status.value,
            message: status.message,
        });
    }

    let records = response.earthquakes.ok_or_else(|| {
        QuakeError::MalformedResponse("response has neither 'earthquakes' nor 'status'".into())
    })?;

    records.into_iter().map(parse_quake).collect()
}

/// Converts a single wire record into our format.
fn parse_quake(raw: GeoNamesQuake) -> Result<Earthquake, QuakeError> {
    let occurred_at = parse_quake_datetime(&raw.datetime).map_err(|e| {
        QuakeError::MalformedResponse(format!("earthquake {}: {}", raw.eqid, e))
    })?;

    Ok(Earthquake {
        eqid: raw.eqid,
        magnitude: raw.magnitude,
        depth_km: raw.depth,
        datetime: raw.datetime,
        occurred_at,
        lat: raw.lat,
        lng: raw.lng,
    })
}

// ============================================================================
// API Client
// ============================================================================

/// HTTP client for the GeoNames earthquake service.
#[derive(Debug, Clone)]
pub struct GeoNamesClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
}

impl GeoNamesClient {
    pub fn new(base_url: &str, username: &str, timeout: Duration) -> Result<Self, QuakeError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            username: username.to_string(),
        })
    }

    pub fn from_config(config: &GeoNamesConfig) -> Result<Self, QuakeError> {
        Self::new(
            &config.base_url,
            &config.username,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl QuakeFeed for GeoNamesClient {
    async fn fetch_earthquakes(&self, query: &FeedQuery) -> Result<Vec<Earthquake>, QuakeError> {
        let url = build_feed_url(&self.base_url, &self.username, query);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QuakeError::HttpError(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_feed_response(&body)
    }
}

// ============================================================================
// Tests
// ============================================================================
