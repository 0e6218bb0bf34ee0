//! Bounding-box earthquake query.

use crate::ingest::geonames::QuakeFeed;
use crate::logging::{self, DataSource};
use crate::model::{BoundingBox, Earthquake, FeedQuery, QuakeError};

/// Fetches the earthquakes inside a box in a single request.
///
/// No retries and no reordering: the caller gets whatever the feed returned,
/// or the error that stopped it.
pub struct BoundedQuakeQuery<F> {
    feed: F,
    max_rows: u32,
}

impl<F: QuakeFeed> BoundedQuakeQuery<F> {
    pub fn new(feed: F, max_rows: u32) -> Self {
        Self { feed, max_rows }
    }

    pub async fn query_box(&self, bbox: &BoundingBox) -> Result<Vec<Earthquake>, QuakeError> {
        let context = format!(
            "N{} S{} E{} W{}",
            bbox.north, bbox.south, bbox.east, bbox.west
        );

        match self.feed.fetch_earthquakes(&FeedQuery::in_box(*bbox, self.max_rows)).await {
            Ok(quakes) => {
                logging::debug(
                    DataSource::GeoNames,
                    Some(&context),
                    &format!("{} earthquake(s) in box", quakes.len()),
                );
                Ok(quakes)
            }
            Err(e) => {
                logging::log_failure(DataSource::GeoNames, Some(&context), "box query", &e);
                Err(e)
            }
        }
    }
}
