/// Search logic for the earthquake monitoring service.
///
/// Submodules:
/// - `recency` — feed timestamp parsing and the trailing-window prefix scan.
/// - `top_ten` — the widening magnitude-floor search and ranking.

pub mod recency;
pub mod top_ten;
