/// Clients for the external services the page depends on.
///
/// - `geonames` — earthquake feed (`earthquakesJSON`) and the `QuakeFeed` trait.
/// - `geocoder` — free-text address to bounding box.
/// - `replay` — offline feed backed by a saved GeoNames document.

pub mod geocoder;
pub mod geonames;
pub mod replay;
