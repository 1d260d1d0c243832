//! Game-title resolution against the titles directory.

use crate::client::queries::TITLES_QUERY;
use crate::client::{Endpoint, GridClient};
use crate::constants::{cache_ttl, matching};
use crate::error::AppError;
use crate::model::central::TitlesData;
use crate::model::Title;
use crate::resolve::matching::{BestMatch, normalize_name, score_names};
use std::time::Duration;
use tracing::{debug, instrument};

/// Common shorthand scouts actually type, expanded before matching.
const GAME_ALIASES: [(&str, &str); 7] = [
    ("val", "valorant"),
    ("lol", "league of legends"),
    ("league", "league of legends"),
    ("cs", "counter strike 2"),
    ("cs2", "counter strike 2"),
    ("dota", "dota 2"),
    ("r6", "rainbow six siege"),
];

fn expand_alias(normalized: &str) -> &str {
    GAME_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, full)| *full)
        .unwrap_or(normalized)
}

/// Resolves a user-supplied game name to a directory title.
///
/// Exact matches on the short or full name win immediately; otherwise the
/// best fuzzy score above the acceptance threshold is taken.
#[instrument(skip(client))]
pub async fn resolve_title(client: &GridClient, game: &str) -> Result<Title, AppError> {
    let data: TitlesData = client
        .request(
            Endpoint::Central,
            TITLES_QUERY,
            serde_json::json!({}),
            Duration::from_secs(cache_ttl::TITLES_SECONDS),
        )
        .await?;

    let query = expand_alias(&normalize_name(game)).to_string();
    let mut best = BestMatch::new();

    for title in data.titles {
        let full = normalize_name(&title.name);
        let short = title
            .name_shortened
            .as_deref()
            .map(normalize_name)
            .unwrap_or_default();

        if query == full || (!short.is_empty() && query == short) {
            debug!("Exact title match: {} -> {}", game, title.name);
            return Ok(title);
        }

        let score = score_names(&query, &full).max(if short.is_empty() {
            0.0
        } else {
            score_names(&query, &short)
        });
        best.consider(score, title);
    }

    best.accept(matching::ACCEPT_THRESHOLD)
        .ok_or(AppError::TitleNotFound {
            game: game.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_expansion() {
        assert_eq!(expand_alias("val"), "valorant");
        assert_eq!(expand_alias("lol"), "league of legends");
        assert_eq!(expand_alias("valorant"), "valorant");
        assert_eq!(expand_alias("starcraft"), "starcraft");
    }
}
