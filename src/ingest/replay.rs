/// Offline replay of a saved earthquake feed
///
/// When the live GeoNames service is unavailable (no account, no network,
/// exhausted credits), use this module to answer feed queries from a saved
/// `earthquakesJSON` document for testing and development.

use chrono::NaiveTime;
use std::path::Path;

use crate::ingest::geonames::{QuakeFeed, parse_feed_response};
use crate::logging::{self, DataSource};
use crate::model::{Earthquake, FeedQuery, QuakeError};

/// Feed backed by an in-memory batch of earthquakes.
#[derive(Debug, Clone)]
pub struct ReplayFeed {
    earthquakes: Vec<Earthquake>,
}

impl ReplayFeed {
    pub fn new(earthquakes: Vec<Earthquake>) -> Self {
        Self { earthquakes }
    }

    /// Load from a GeoNames JSON document held in memory.
    pub fn from_json(body: &str) -> Result<Self, QuakeError> {
        Ok(Self::new(parse_feed_response(body)?))
    }

    /// Load from a GeoNames JSON document on disk.
    pub fn from_path(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let body = std::fs::read_to_string(path)?;
        let feed = Self::from_json(&body)?;

        logging::info(
            DataSource::Replay,
            Some(&path.display().to_string()),
            &format!("Loaded {} earthquake(s) for replay", feed.len()),
        );

        Ok(feed)
    }

    pub fn len(&self) -> usize {
        self.earthquakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.earthquakes.is_empty()
    }

    /// Answers `query` the way the live service does.
    ///
    /// With a date the result is every matching event up to the end of that
    /// day, most recent first; without one it keeps file order.
    pub fn select(&self, query: &FeedQuery) -> Vec<Earthquake> {
        let mut selected: Vec<Earthquake> = self
            .earthquakes
            .iter()
            .filter(|q| query.bbox.contains(q.lat, q.lng))
            .filter(|q| query.min_magnitude.is_none_or(|m| q.magnitude >= m))
            .cloned()
            .collect();

        if let Some(date) = query.date {
            let end_of_day = date.and_time(NaiveTime::MIN).and_utc() + chrono::Duration::days(1);
            selected.retain(|q| q.occurred_at < end_of_day);
            selected.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        }

        selected.truncate(query.max_rows as usize);
        selected
    }
}

impl QuakeFeed for ReplayFeed {
    async fn fetch_earthquakes(&self, query: &FeedQuery) -> Result<Vec<Earthquake>, QuakeError> {
        let selected = self.select(query);
        logging::debug(
            DataSource::Replay,
            None,
            &format!("Replayed {} of {} earthquake(s)", selected.len(), self.len()),
        );
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;
    use chrono::NaiveDate;

    const DOCUMENT: &str = r#"{"earthquakes":[
        {"datetime":"2024-01-10 08:00:00","depth":35.0,"lng":142.4,"eqid":"jp1","magnitude":6.1,"lat":38.3},
        {"datetime":"2024-03-02 11:30:00","depth":10.0,"lng":-155.3,"eqid":"hi1","magnitude":4.2,"lat":19.4},
        {"datetime":"2024-02-20 23:10:00","depth":600.0,"lng":179.6,"eqid":"fj1","magnitude":6.8,"lat":-17.9},
        {"datetime":"2024-05-03 01:00:00","depth":8.0,"lng":-178.9,"eqid":"fj2","magnitude":5.4,"lat":-18.2}
    ]}"#;

    fn feed() -> ReplayFeed {
        ReplayFeed::from_json(DOCUMENT).expect("document should parse")
    }

    fn ids(quakes: &[Earthquake]) -> Vec<&str> {
        quakes.iter().map(|q| q.eqid.as_str()).collect()
    }

    #[test]
    fn test_box_query_keeps_file_order() {
        let selected = feed().select(&FeedQuery::in_box(BoundingBox::WORLD, 25));
        assert_eq!(ids(&selected), vec!["jp1", "hi1", "fj1", "fj2"]);
    }

    #[test]
    fn test_box_query_across_antimeridian() {
        let fiji = BoundingBox::new(-12.0, -21.0, -178.0, 177.0).unwrap();
        let selected = feed().select(&FeedQuery::in_box(fiji, 25));
        assert_eq!(ids(&selected), vec!["fj1", "fj2"]);
    }

    #[test]
    fn test_dated_query_sorts_recent_first_and_applies_floor() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let selected = feed().select(&FeedQuery::recent_global(date, 5.0, 300));
        // fj2 happened after the requested date
        assert_eq!(ids(&selected), vec!["fj1", "jp1"]);
    }

    #[test]
    fn test_row_cap_applied() {
        let selected = feed().select(&FeedQuery::in_box(BoundingBox::WORLD, 2));
        assert_eq!(selected.len(), 2);
    }

    #[tokio::test]
    async fn test_feed_trait_returns_selection() {
        let feed = feed();
        let quakes = feed
            .fetch_earthquakes(&FeedQuery::in_box(BoundingBox::WORLD, 25))
            .await
            .unwrap();
        assert_eq!(quakes.len(), 4);
    }
}
