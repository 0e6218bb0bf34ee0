/// Address geocoding
///
/// Turns a free-text address into the bounding box the map should show,
/// using the Google Geocoding web service. Only the first result's viewport
/// is used.
///
/// API Documentation: https://developers.google.com/maps/documentation/geocoding/requests-geocoding

use serde::Deserialize;
use std::time::Duration;

use crate::config::GeocoderConfig;
use crate::model::{BoundingBox, QuakeError};

pub const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Resolves addresses to bounding boxes.
///
/// An address with no match is `QuakeError::AddressNotFound`, distinct from
/// transport failures.
#[allow(async_fn_in_trait)]
pub trait AddressResolver {
    async fn resolve(&self, address: &str) -> Result<BoundingBox, QuakeError>;
}

impl<T: AddressResolver> AddressResolver for &T {
    async fn resolve(&self, address: &str) -> Result<BoundingBox, QuakeError> {
        (**self).resolve(address).await
    }
}

// ============================================================================
// Geocoding API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    pub formatted_address: Option<String>,
    pub geometry: Geometry,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub viewport: Viewport,
}

#[derive(Debug, Deserialize)]
pub struct Viewport {
    pub northeast: LatLng,
    pub southwest: LatLng,
}

#[derive(Debug, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Interprets a geocoding response for `address`.
pub fn parse_geocode_response(address: &str, body: &str) -> Result<BoundingBox, QuakeError> {
    let response: GeocodeResponse = serde_json::from_str(body)
        .map_err(|e| QuakeError::MalformedResponse(e.to_string()))?;

    match response.status.as_str() {
        "OK" => {
            let first = response
                .results
                .into_iter()
                .next()
                .ok_or_else(|| QuakeError::AddressNotFound(address.to_string()))?;
            let viewport = first.geometry.viewport;

            BoundingBox::new(
                viewport.northeast.lat,
                viewport.southwest.lat,
                viewport.northeast.lng,
                viewport.southwest.lng,
            )
        }
        "ZERO_RESULTS" => Err(QuakeError::AddressNotFound(address.to_string())),
        _ => Err(QuakeError::GeocoderStatus {
            status: response.status,
            message: response.error_message,
        }),
    }
}

// ============================================================================
// API Client
// ============================================================================

#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, QuakeError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &GeocoderConfig) -> Result<Self, QuakeError> {
        Self::new(
            &config.base_url,
            config.api_key.as_deref().unwrap_or_default(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

impl AddressResolver for GoogleGeocoder {
    async fn resolve(&self, address: &str) -> Result<BoundingBox, QuakeError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QuakeError::HttpError(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_geocode_response(address, &body)
    }
}

// ============================================================================
// Tests
// ============================================================================
