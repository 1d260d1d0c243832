//! gridscout generates opponent scouting reports from GRID-style esports
//! GraphQL APIs: it resolves a team from a loose name, discovers its
//! recent series, aggregates outcomes and statistics, and renders a
//! markdown report with a narrative summary.

pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod insights;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod narrative;
pub mod report;
pub mod resolve;
pub mod stats;
pub mod util;

pub use client::{Endpoint, GridClient, ResponseCache};
pub use config::Config;
pub use error::AppError;
pub use metrics::{ScoutingMetrics, compute_metrics};
pub use model::{NormalizedSeries, Outcome};
pub use report::{ReportGenerator, ReportRequest, ScoutingReport};
pub use resolve::TimeWindow;
