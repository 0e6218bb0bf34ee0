/// Earthquake recency checks.
///
/// The top-ten search only ranks events from a trailing window (a year by
/// default). The feed hands back events most-recent-first, so the window is
/// always a prefix of the batch and can be found with a single scan.
///
/// # Clock injection
/// All functions accept a `now: DateTime<Utc>` parameter rather than calling
/// `Utc::now()` internally. This makes the window purely deterministic in
/// tests without mocking or time manipulation.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

use crate::model::{Earthquake, QuakeError};

/// Timestamp layouts seen in the feed, tried in order.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parses a feed timestamp into UTC.
///
/// GeoNames reports `"2011-03-11 04:46:23"` with no offset; those are UTC.
/// RFC 3339 strings with an explicit offset are converted.
pub fn parse_quake_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("unrecognised datetime '{}'", raw))
}

// ---------------------------------------------------------------------------
// Window checks
// ---------------------------------------------------------------------------

/// Start of the trailing window ending at `now`.
///
/// Fails when the window reaches past the earliest representable time.
pub fn window_start(window_days: i64, now: DateTime<Utc>) -> Result<DateTime<Utc>, QuakeError> {
    TimeDelta::try_days(window_days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| QuakeError::InvalidSearch(format!("window of {} days is out of range", window_days)))
}

/// Returns `true` if the event happened strictly after the window start.
///
///   occurred_at >  now - window  →  inside
///   occurred_at == now - window  →  outside
pub fn is_within_window_at(
    quake: &Earthquake,
    window_days: i64,
    now: DateTime<Utc>,
) -> Result<bool, QuakeError> {
    Ok(quake.occurred_at > window_start(window_days, now)?)
}

/// Returns the leading run of `quakes` that falls inside the window.
///
/// Scanning stops at the first event outside the window; anything after it
/// is ignored even if it would qualify. Callers pass date-descending batches.
pub fn recent_prefix(
    quakes: &[Earthquake],
    window_days: i64,
    now: DateTime<Utc>,
) -> Result<&[Earthquake], QuakeError> {
    let start = window_start(window_days, now)?;
    let end = quakes
        .iter()
        .position(|q| q.occurred_at <= start)
        .unwrap_or(quakes.len());
    Ok(&quakes[..end])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn quake_at(eqid: &str, datetime: &str) -> Earthquake {
        Earthquake {
            eqid: eqid.to_string(),
            magnitude: 6.0,
            depth_km: 10.0,
            datetime: datetime.to_string(),
            occurred_at: parse_quake_datetime(datetime).expect("test datetime should parse"),
            lat: 0.0,
            lng: 0.0,
        }
    }

    /// A fixed "now" used across all tests: 2024-05-01 13:00:00 UTC.
    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    // --- Parsing ------------------------------------------------------------

    #[test]
    fn test_geonames_format_parses_as_utc() {
        let dt = parse_quake_datetime("2011-03-11 04:46:23").expect("should parse");
        assert_eq!(dt, Utc.with_ymd_and_hms(2011, 3, 11, 4, 46, 23).unwrap());
    }

    #[test]
    fn test_offset_datetime_converted_to_utc() {
        let dt = parse_quake_datetime("2024-05-01T08:00:00-05:00").expect("should parse");
        assert_eq!(dt, fixed_now());
    }

    #[test]
    fn test_t_separator_without_offset_parses() {
        assert!(parse_quake_datetime("2024-05-01T08:00:00").is_ok());
    }

    #[test]
    fn test_invalid_datetime_returns_error() {
        assert!(parse_quake_datetime("not-a-datetime").is_err());
        assert!(parse_quake_datetime("").is_err());
    }

    // --- Window -------------------------------------------------------------

    #[test]
    fn test_event_a_day_ago_is_within_a_year() {
        let quake = quake_at("a", "2024-04-30 13:00:00");
        assert!(is_within_window_at(&quake, 365, fixed_now()).unwrap());
    }

    #[test]
    fn test_event_exactly_at_window_start_is_outside() {
        // 2023-05-02 13:00 is exactly 365 days before the fixed now (2024 is a leap year)
        let quake = quake_at("a", "2023-05-02 13:00:00");
        assert!(!is_within_window_at(&quake, 365, fixed_now()).unwrap());

        let quake = quake_at("b", "2023-05-02 13:00:01");
        assert!(is_within_window_at(&quake, 365, fixed_now()).unwrap());
    }

    #[test]
    fn test_recent_prefix_stops_at_first_old_event() {
        let quakes = vec![
            quake_at("a", "2024-04-30 00:00:00"),
            quake_at("b", "2024-01-15 00:00:00"),
            quake_at("c", "2022-12-01 00:00:00"),
            // out of order on purpose: not reached by the scan
            quake_at("d", "2024-03-01 00:00:00"),
        ];
        let prefix = recent_prefix(&quakes, 365, fixed_now()).unwrap();
        let ids: Vec<_> = prefix.iter().map(|q| q.eqid.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_recent_prefix_of_all_recent_batch_is_whole_batch() {
        let quakes = vec![
            quake_at("a", "2024-04-30 00:00:00"),
            quake_at("b", "2024-04-29 00:00:00"),
        ];
        assert_eq!(recent_prefix(&quakes, 365, fixed_now()).unwrap().len(), 2);
    }

    #[test]
    fn test_recent_prefix_of_empty_batch_is_empty() {
        assert!(recent_prefix(&[], 365, fixed_now()).unwrap().is_empty());
    }

    #[test]
    fn test_same_event_inside_wide_window_not_narrow() {
        let quake = quake_at("a", "2024-03-01 13:00:00"); // 61 days before now
        assert!(!is_within_window_at(&quake, 30, fixed_now()).unwrap());
        assert!(is_within_window_at(&quake, 90, fixed_now()).unwrap());
    }

    #[test]
    fn test_window_too_large_for_calendar_is_an_error() {
        let quakes = vec![quake_at("a", "2024-04-30 00:00:00")];

        let err = recent_prefix(&quakes, 100_000_000, fixed_now()).unwrap_err();
        assert!(matches!(err, QuakeError::InvalidSearch(_)));

        assert!(window_start(i64::MAX, fixed_now()).is_err());
        assert!(is_within_window_at(&quakes[0], 100_000_000, fixed_now()).is_err());
    }

    #[test]
    fn test_window_start_is_exact_day_count() {
        let start = window_start(365, fixed_now()).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 5, 2, 13, 0, 0).unwrap());
    }
}
