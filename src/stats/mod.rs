//! Statistics-endpoint fetchers.
//!
//! Each fetcher walks its variant registry richest-first and reports a
//! typed [`Fetched`] outcome: a decoded summary, or `Unsupported` with the
//! reason once every variant has been rejected by the schema.

pub mod game;
pub mod player;
pub mod series;
pub mod team;

use crate::error::AppError;

pub use game::{DraftAction, GameRow, fetch_draft_actions, fetch_game_rows};
pub use player::{PlayerLine, PlayerStatsSummary, fetch_player_lines, rank_players};
pub use series::collect_normalized_series;
pub use team::{TeamStatsSummary, fetch_team_statistics};

/// When a GraphQL failure means "this query shape does not exist on this
/// schema", returns the first offending message so it can be recorded as
/// the unsupported reason. Anything else is a real failure.
pub(crate) fn unsupported_reason(error: &AppError) -> Option<String> {
    let errors = error.graphql_errors()?;
    errors
        .iter()
        .find(|e| {
            e.is_field_not_found()
                || e.is_unsupported_segment()
                || e.is_unsupported_aggregation_ids()
        })
        .map(|e| e.message.clone())
}
