//! Address search flow.
//!
//! Submitting an address resolves it to a box, moves the map there, fetches
//! the earthquakes inside the box and swaps them onto the map. A failed
//! lookup or fetch leaves the existing markers alone and is returned to the
//! caller for display.

use crate::ingest::geocoder::AddressResolver;
use crate::ingest::geonames::QuakeFeed;
use crate::logging::{self, DataSource};
use crate::map_view::MapView;
use crate::model::{BoundingBox, QuakeError};
use crate::query::BoundedQuakeQuery;

/// What a submission did to the map.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Blank input; nothing was requested and the map is unchanged.
    Skipped,
    /// The map now shows `count` markers inside `bbox`.
    Plotted { bbox: BoundingBox, count: usize },
}

pub struct QuakePage<R, F, M> {
    resolver: R,
    query: BoundedQuakeQuery<F>,
    map: M,
}

impl<R, F, M> QuakePage<R, F, M>
where
    R: AddressResolver,
    F: QuakeFeed,
    M: MapView,
{
    pub fn new(resolver: R, query: BoundedQuakeQuery<F>, map: M) -> Self {
        Self { resolver, query, map }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub async fn submit_address(&mut self, address: &str) -> Result<SearchOutcome, QuakeError> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(SearchOutcome::Skipped);
        }

        let bbox = match self.resolver.resolve(address).await {
            Ok(bbox) => bbox,
            Err(e) => {
                logging::log_failure(DataSource::Geocoder, Some(address), "geocode", &e);
                return Err(e);
            }
        };

        logging::info(
            DataSource::Geocoder,
            Some(address),
            &format!(
                "Resolved to N {} S {} E {} W {}",
                bbox.north, bbox.south, bbox.east, bbox.west
            ),
        );

        self.show_box(bbox).await
    }

    /// Centres the map on `bbox` and plots the earthquakes inside it.
    ///
    /// The view moves even if the earthquake fetch then fails.
    pub async fn show_box(&mut self, bbox: BoundingBox) -> Result<SearchOutcome, QuakeError> {
        self.map.set_view(&bbox);

        let quakes = self.query.query_box(&bbox).await?;
        let count = quakes.len();
        self.map.set_markers(quakes);

        Ok(SearchOutcome::Plotted { bbox, count })
    }
}
