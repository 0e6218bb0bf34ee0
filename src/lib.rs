//! Earthquake lookup service.
//!
//! Resolves an address to a bounding box, fetches the earthquakes inside it
//! from the GeoNames feed, and plots them; independently, finds the strongest
//! earthquakes of the past year by progressively lowering a magnitude floor.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod map_view;
pub mod model;
pub mod page;
pub mod query;
pub mod verify;
