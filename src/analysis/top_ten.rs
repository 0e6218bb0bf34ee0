//! Top-ten earthquake search.
//!
//! Finds the strongest events of the trailing window by asking the feed for
//! recent events above a magnitude floor, and lowering the floor until the
//! window holds enough events to rank. The floor never drops below
//! `min_floor` and at most `max_attempts` requests are made, so a feed that
//! can never satisfy the target ends in `NoConvergence` rather than looping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::recency::recent_prefix;
use crate::ingest::geonames::QuakeFeed;
use crate::logging::{self, DataSource};
use crate::model::{Earthquake, FeedQuery, QuakeError, TopTenResult};

/// Widest trailing window accepted, a century.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Tuning for the widening search. Defaults start at M6.0 and step down by half a magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WideningPolicy {
    /// Floor used when the caller has no preference.
    pub initial_floor: f64,
    /// Amount the floor drops after each insufficient batch.
    pub floor_step: f64,
    /// Lowest floor that will be requested.
    pub min_floor: f64,
    /// Upper bound on feed requests per search.
    pub max_attempts: u32,
    /// Number of in-window events needed before ranking.
    pub target_count: usize,
    pub window_days: i64,
    /// Row cap sent with each request.
    pub max_rows: u32,
}

impl Default for WideningPolicy {
    fn default() -> Self {
        Self {
            initial_floor: 6.0,
            floor_step: 0.5,
            min_floor: 0.0,
            max_attempts: 13,
            target_count: 10,
            window_days: 365,
            max_rows: 300,
        }
    }
}

impl WideningPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.floor_step > 0.0) {
            return Err(format!("floor_step must be positive, got {}", self.floor_step));
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if self.target_count == 0 {
            return Err("target_count must be at least 1".to_string());
        }
        if self.window_days <= 0 || self.window_days > MAX_WINDOW_DAYS {
            return Err(format!(
                "window_days must be between 1 and {}, got {}",
                MAX_WINDOW_DAYS, self.window_days
            ));
        }
        if self.max_rows == 0 {
            return Err("max_rows must be at least 1".to_string());
        }
        Ok(())
    }

    /// Floor for the zero-based `attempt`, starting from `start`.
    pub fn floor_for_attempt(&self, start: f64, attempt: u32) -> f64 {
        start - self.floor_step * f64::from(attempt)
    }
}

/// Sorts by magnitude, strongest first, and keeps the first `limit`.
///
/// The sort is stable: equal magnitudes keep their feed order.
pub fn rank_by_magnitude(quakes: &[Earthquake], limit: usize) -> Vec<Earthquake> {
    let mut ranked = quakes.to_vec();
    ranked.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    ranked.truncate(limit);
    ranked
}

/// Runs the widening search against a feed.
pub struct TopEarthquakeFinder<F> {
    feed: F,
    policy: WideningPolicy,
}

impl<F: QuakeFeed> TopEarthquakeFinder<F> {
    pub fn new(feed: F, policy: WideningPolicy) -> Self {
        Self { feed, policy }
    }

    pub fn policy(&self) -> &WideningPolicy {
        &self.policy
    }

    /// Convenience wrapper that uses the real current time.
    pub async fn find_top_ten(&self, min_magnitude: f64) -> Result<TopTenResult, QuakeError> {
        self.find_top_ten_at(min_magnitude, Utc::now()).await
    }

    /// Searches from `min_magnitude` downwards, treating `now` as the
    /// current time for both the request date and the window.
    ///
    /// Feed failures end the search immediately; only an insufficient batch
    /// moves on to the next floor. A non-finite starting floor or an invalid
    /// policy is rejected before any request is made.
    pub async fn find_top_ten_at(
        &self,
        min_magnitude: f64,
        now: DateTime<Utc>,
    ) -> Result<TopTenResult, QuakeError> {
        if !min_magnitude.is_finite() {
            let err = QuakeError::InvalidSearch(format!("starting floor must be finite, got {}", min_magnitude));
            logging::log_failure(DataSource::System, None, "top-ten search", &err);
            return Err(err);
        }
        self.policy.validate().map_err(QuakeError::InvalidSearch)?;

        let mut floors_tried = Vec::new();
        let mut last_floor = min_magnitude;

        for attempt in 0..self.policy.max_attempts {
            let floor = self.policy.floor_for_attempt(min_magnitude, attempt);
            if floor < self.policy.min_floor {
                break;
            }
            floors_tried.push(floor);
            last_floor = floor;

            let context = format!("M{:.1}", floor);
            let query = FeedQuery::recent_global(now.date_naive(), floor, self.policy.max_rows);

            let batch = match self.feed.fetch_earthquakes(&query).await {
                Ok(batch) => batch,
                Err(e) => {
                    logging::log_failure(DataSource::GeoNames, Some(&context), "top-ten request", &e);
                    return Err(e);
                }
            };

            let recent = recent_prefix(&batch, self.policy.window_days, now)?;

            if recent.len() < self.policy.target_count {
                logging::debug(
                    DataSource::GeoNames,
                    Some(&context),
                    &format!(
                        "{} of {} event(s) inside {} days, need {}; lowering floor",
                        recent.len(),
                        batch.len(),
                        self.policy.window_days,
                        self.policy.target_count
                    ),
                );
                continue;
            }

            let earthquakes = rank_by_magnitude(recent, self.policy.target_count);
            let attempts = attempt + 1;
            logging::log_search_summary(attempts, floor, earthquakes.len());

            return Ok(TopTenResult {
                floor,
                attempts,
                floors_tried,
                earthquakes,
            });
        }

        let err = QuakeError::NoConvergence {
            attempts: floors_tried.len() as u32,
            last_floor,
        };
        logging::log_failure(DataSource::GeoNames, None, "top-ten search", &err);
        Err(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
