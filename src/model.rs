/// Core data types for the earthquake monitoring service.
///
/// This module defines the shared domain model imported by all other modules:
/// earthquake records, bounding boxes, feed queries, search results and the
/// error type every component boundary returns.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

/// A latitude/longitude rectangle, in degrees.
///
/// `north > south` is enforced. `east` and `west` are passed through to the
/// feed untouched; a box crossing the antimeridian has `west > east`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// The whole globe, used by the top-ten search.
    pub const WORLD: BoundingBox = BoundingBox {
        north: 90.0,
        south: -90.0,
        east: 180.0,
        west: -180.0,
    };

    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self, QuakeError> {
        if !(north > south) {
            return Err(QuakeError::InvalidBoundingBox(format!(
                "north ({}) must be greater than south ({})",
                north, south
            )));
        }
        Ok(Self { north, south, east, west })
    }

    /// Whether the box spans the antimeridian.
    pub fn wraps_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Returns `true` if the point lies inside the box (edges inclusive).
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        if lat < self.south || lat > self.north {
            return false;
        }
        if self.wraps_antimeridian() {
            lng >= self.west || lng <= self.east
        } else {
            lng >= self.west && lng <= self.east
        }
    }
}

impl std::str::FromStr for BoundingBox {
    type Err = QuakeError;

    /// Parses `"north,south,east,west"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| QuakeError::InvalidBoundingBox(format!("'{}': {}", s, e)))?;

        match parts.as_slice() {
            [n, s, e, w] => BoundingBox::new(*n, *s, *e, *w),
            _ => Err(QuakeError::InvalidBoundingBox(format!(
                "expected north,south,east,west, got '{}'",
                s
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Earthquake records
// ---------------------------------------------------------------------------

/// One reported seismic event.
///
/// Built from one entry of the feed's `earthquakes[]` array. `datetime` keeps
/// the source text for display; `occurred_at` is the same instant parsed to
/// UTC and is what recency checks use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Earthquake {
    pub eqid: String,
    pub magnitude: f64,
    pub depth_km: f64,
    pub datetime: String, // e.g. "2024-05-01 12:00:00"
    pub occurred_at: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
}

impl Earthquake {
    /// The fields shown when a marker is activated.
    pub fn detail(&self) -> QuakeDetail {
        QuakeDetail {
            eqid: self.eqid.clone(),
            magnitude: self.magnitude,
            depth_km: self.depth_km,
            datetime: self.datetime.clone(),
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Plain detail record handed to the presentation layer for a single marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuakeDetail {
    pub eqid: String,
    pub magnitude: f64,
    pub depth_km: f64,
    pub datetime: String,
    pub lat: f64,
    pub lng: f64,
}

// ---------------------------------------------------------------------------
// Feed queries
// ---------------------------------------------------------------------------

/// Parameters for one request against the earthquake feed.
///
/// Supplying `date` switches the feed into its date-sorted mode
/// (most recent first, events on or before `date`).
#[derive(Debug, Clone, PartialEq)]
pub struct FeedQuery {
    pub bbox: BoundingBox,
    pub max_rows: u32,
    pub date: Option<NaiveDate>,
    pub min_magnitude: Option<f64>,
}

impl FeedQuery {
    /// All events inside `bbox`, capped at `max_rows`.
    pub fn in_box(bbox: BoundingBox, max_rows: u32) -> Self {
        Self {
            bbox,
            max_rows,
            date: None,
            min_magnitude: None,
        }
    }

    /// Global, date-descending events of at least `min_magnitude`.
    pub fn recent_global(date: NaiveDate, min_magnitude: f64, max_rows: u32) -> Self {
        Self {
            bbox: BoundingBox::WORLD,
            max_rows,
            date: Some(date),
            min_magnitude: Some(min_magnitude),
        }
    }
}

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

/// Outcome of a successful widening search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopTenResult {
    /// Magnitude floor of the request that produced the list.
    pub floor: f64,
    /// Number of feed requests made, including the successful one.
    pub attempts: u32,
    /// Every floor requested, in order.
    pub floors_tried: Vec<f64>,
    /// At most `target_count` events, magnitude descending.
    pub earthquakes: Vec<Earthquake>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when resolving addresses or fetching earthquakes.
#[derive(Debug, Clone, PartialEq)]
pub enum QuakeError {
    /// The geocoder found no match for the address.
    AddressNotFound(String),
    /// The geocoder answered with a status other than OK / ZERO_RESULTS.
    GeocoderStatus { status: String, message: Option<String> },
    /// Non-2xx HTTP response.
    HttpError(u16),
    /// The request never produced a response (connect, timeout, body read).
    Transport(String),
    /// The response body could not be deserialized.
    MalformedResponse(String),
    /// The feed reported an error in-band (HTTP 200 with a `status` object).
    ServiceError { code: i64, message: String },
    /// The widening search ran out of floors or attempts.
    NoConvergence { attempts: u32, last_floor: f64 },
    InvalidBoundingBox(String),
    /// A search parameter the widening search cannot work with.
    InvalidSearch(String),
}

impl QuakeError {
    /// Network and HTTP-status failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, QuakeError::HttpError(_) | QuakeError::Transport(_))
    }
}

impl std::fmt::Display for QuakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuakeError::AddressNotFound(address) => write!(f, "No results found for '{}'", address),
            QuakeError::GeocoderStatus { status, message } => match message {
                Some(msg) => write!(f, "Geocoder error: {} ({})", status, msg),
                None => write!(f, "Geocoder error: {}", status),
            },
            QuakeError::HttpError(code) => write!(f, "HTTP error: {}", code),
            QuakeError::Transport(msg) => write!(f, "Transport error: {}", msg),
            QuakeError::MalformedResponse(msg) => write!(f, "Parse error: {}", msg),
            QuakeError::ServiceError { code, message } => {
                write!(f, "Service error {}: {}", code, message)
            }
            QuakeError::NoConvergence { attempts, last_floor } => write!(
                f,
                "No convergence after {} attempts (last floor M{:.1})",
                attempts, last_floor
            ),
            QuakeError::InvalidBoundingBox(msg) => write!(f, "Invalid bounding box: {}", msg),
            QuakeError::InvalidSearch(msg) => write!(f, "Invalid search: {}", msg),
        }
    }
}

impl std::error::Error for QuakeError {}

impl From<reqwest::Error> for QuakeError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => QuakeError::HttpError(status.as_u16()),
            None => QuakeError::Transport(err.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
