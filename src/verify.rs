//! External Service Verification Module
//!
//! Probes the earthquake feed and the geocoder once each to find out whether
//! the configured endpoints and credentials actually work.
//!
//! Run this after changing credentials or endpoints in `quakemon.toml`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::error::Error;

use crate::config::AppConfig;
use crate::ingest::geocoder::{AddressResolver, GoogleGeocoder};
use crate::ingest::geonames::{GeoNamesClient, QuakeFeed};
use crate::model::{FeedQuery, QuakeError};

/// Address used to exercise the geocoder.
pub const PROBE_ADDRESS: &str = "Tokyo, Japan";

/// Floor used to probe the feed; high enough for a cheap response.
pub const PROBE_MIN_MAGNITUDE: f64 = 5.0;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub feed: FeedVerification,
    pub geocoder: GeocoderVerification,
}

impl VerificationReport {
    pub fn working_count(&self) -> usize {
        [&self.feed.status, &self.geocoder.status]
            .into_iter()
            .filter(|s| **s != VerificationStatus::Failed)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedVerification {
    pub base_url: String,
    pub status: VerificationStatus,
    pub api_responsive: bool,
    pub sample_data_count: usize,
    pub newest_event: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderVerification {
    pub base_url: String,
    pub status: VerificationStatus,
    pub api_key_present: bool,
    pub api_responsive: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

// ============================================================================
// Feed Verification
// ============================================================================

pub async fn verify_feed<F: QuakeFeed>(feed: &F, base_url: &str) -> FeedVerification {
    let mut result = FeedVerification {
        base_url: base_url.to_string(),
        status: VerificationStatus::Failed,
        api_responsive: false,
        sample_data_count: 0,
        newest_event: None,
        error_message: None,
    };

    let query = FeedQuery::recent_global(Utc::now().date_naive(), PROBE_MIN_MAGNITUDE, 10);

    match feed.fetch_earthquakes(&query).await {
        Ok(quakes) => {
            result.api_responsive = true;
            result.sample_data_count = quakes.len();
            result.newest_event = quakes.first().map(|q| format!("{} ({})", q.eqid, q.datetime));

            if result.sample_data_count > 0 {
                result.status = VerificationStatus::Success;
            } else {
                result.status = VerificationStatus::PartialSuccess;
            }
        }
        Err(e @ QuakeError::ServiceError { .. }) => {
            // Server answered but refused the account
            result.api_responsive = true;
            result.error_message = Some(e.to_string());
        }
        Err(e) => {
            result.error_message = Some(format!("API request failed: {}", e));
        }
    }

    result
}

// ============================================================================
// Geocoder Verification
// ============================================================================

pub async fn verify_geocoder<R: AddressResolver>(
    resolver: &R,
    base_url: &str,
    api_key_present: bool,
) -> GeocoderVerification {
    let mut result = GeocoderVerification {
        base_url: base_url.to_string(),
        status: VerificationStatus::Failed,
        api_key_present,
        api_responsive: false,
        error_message: None,
    };

    if !api_key_present {
        result.error_message = Some("No API key configured".to_string());
        return result;
    }

    match resolver.resolve(PROBE_ADDRESS).await {
        Ok(_) => {
            result.api_responsive = true;
            result.status = VerificationStatus::Success;
        }
        Err(e @ QuakeError::AddressNotFound(_)) => {
            result.api_responsive = true;
            result.status = VerificationStatus::PartialSuccess;
            result.error_message = Some(e.to_string());
        }
        Err(e @ QuakeError::GeocoderStatus { .. }) => {
            result.api_responsive = true;
            result.error_message = Some(e.to_string());
        }
        Err(e) => {
            result.error_message = Some(format!("API request failed: {}", e));
        }
    }

    result
}

// ============================================================================
// Full Verification Runner
// ============================================================================

pub async fn run_full_verification(config: &AppConfig) -> Result<VerificationReport, Box<dyn Error>> {
    let feed = GeoNamesClient::from_config(&config.geonames)?;
    let geocoder = GoogleGeocoder::from_config(&config.geocoder)?;
    let api_key_present = config
        .geocoder
        .api_key
        .as_deref()
        .is_some_and(|k| !k.trim().is_empty());

    // Independent probes
    let (feed_result, geocoder_result) = tokio::join!(
        verify_feed(&feed, &config.geonames.base_url),
        verify_geocoder(&geocoder, &config.geocoder.base_url, api_key_present),
    );

    Ok(VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        feed: feed_result,
        geocoder: geocoder_result,
    })
}

fn status_line(status: &VerificationStatus, error: Option<&str>) -> String {
    match status {
        VerificationStatus::Success => "✓ OK".to_string(),
        VerificationStatus::PartialSuccess => {
            format!("⚠ Partial ({})", error.unwrap_or("responsive but no data"))
        }
        VerificationStatus::Failed => format!("✗ FAILED: {}", error.unwrap_or("Unknown")),
    }
}

pub fn print_summary(report: &VerificationReport) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 VERIFICATION SUMMARY  ({})", report.timestamp);
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("Earthquake feed:  {}", report.feed.base_url);
    println!(
        "  {}",
        status_line(&report.feed.status, report.feed.error_message.as_deref())
    );
    if report.feed.api_responsive {
        println!("  Sample: {} event(s)", report.feed.sample_data_count);
    }
    if let Some(newest) = &report.feed.newest_event {
        println!("  Newest: {}", newest);
    }
    println!();
    println!("Geocoder:         {}", report.geocoder.base_url);
    println!(
        "  {}",
        status_line(&report.geocoder.status, report.geocoder.error_message.as_deref())
    );
    println!();
    println!("Working: {}/2", report.working_count());
    println!("═══════════════════════════════════════════════════════════");
}
