//! Decoded API shapes shared across resolvers, fetchers, and the
//! metrics aggregator.

pub mod central;
pub mod ids;
pub mod state;
pub mod stats;

pub use central::{SeriesNode, Team, Title};
pub use state::{NormalizedSeries, Outcome};
