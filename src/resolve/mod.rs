//! Entity resolution: game titles, teams, and recent series.

pub mod matching;
pub mod series;
pub mod team;
pub mod title;

pub use series::{SeriesResolution, TimeWindow, fetch_series_by_id, resolve_recent_series};
pub use team::{ResolvedTeam, resolve_team};
pub use title::resolve_title;
