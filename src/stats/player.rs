//! Player-level aggregates: appearance ranking over the resolved series
//! plus per-player statistics fetched with bounded concurrency.

use crate::client::queries::{Fetched, PLAYER_STATS_VARIANTS, player_statistics_query};
use crate::client::{Endpoint, GridClient};
use crate::constants::{cache_ttl, concurrency};
use crate::error::AppError;
use crate::model::SeriesNode;
use crate::model::central::PlayerRef;
use crate::model::stats::PlayerStatisticsData;
use crate::resolve::TimeWindow;
use crate::stats::unsupported_reason;
use crate::util::concurrency::map_with_concurrency;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Normalized per-player aggregates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatsSummary {
    pub selection_used: &'static str,
    pub sample_series: Option<f64>,
    pub win_rate_percent: Option<f64>,
    pub kills_avg: Option<f64>,
    pub deaths_avg: Option<f64>,
    pub kills_per_round: Option<f64>,
    pub deaths_per_round: Option<f64>,
}

/// One row of the roster table. `stats` is `None` when the lookup failed
/// or the schema exposes no player statistics; the row itself survives so
/// the roster stays complete.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLine {
    pub player_id: String,
    pub nickname: Option<String>,
    pub appearances: usize,
    pub stats: Option<PlayerStatsSummary>,
}

/// Ranks players by how many of the resolved series they appeared in,
/// ties broken by id for determinism.
pub fn rank_players(series: &[SeriesNode], limit: usize) -> Vec<(PlayerRef, usize)> {
    let mut appearances: HashMap<String, (PlayerRef, usize)> = HashMap::new();
    for node in series {
        for team in &node.teams {
            for entry in &team.players {
                let player = entry.player();
                appearances
                    .entry(player.id.clone())
                    .and_modify(|(existing, count)| {
                        if existing.nickname.is_none() {
                            existing.nickname = player.nickname.clone();
                        }
                        *count += 1;
                    })
                    .or_insert_with(|| (player.clone(), 1));
            }
        }
    }

    let mut ranked: Vec<(PlayerRef, usize)> = appearances.into_values().collect();
    ranked.sort_by(|(a, count_a), (b, count_b)| {
        count_b.cmp(count_a).then_with(|| a.id.cmp(&b.id))
    });
    ranked.truncate(limit);
    ranked
}

/// Fetches one player's aggregates, walking the four selection shapes.
#[instrument(skip(client))]
pub async fn fetch_player_statistics(
    client: &GridClient,
    player_id: &str,
    window: TimeWindow,
) -> Result<Fetched<Option<PlayerStatsSummary>>, AppError> {
    let variables = json!({
        "playerId": player_id,
        "filter": {"timeWindow": window.filter_tag()},
    });

    let mut last_reason = String::new();
    for variant in &PLAYER_STATS_VARIANTS {
        let query = player_statistics_query(variant);
        match client
            .request::<PlayerStatisticsData>(
                Endpoint::Statistics,
                &query,
                variables.clone(),
                Duration::from_secs(cache_ttl::STATISTICS_SECONDS),
            )
            .await
        {
            Ok(data) => {
                debug!("Player statistics selection '{}' accepted", variant.name);
                return Ok(Fetched::Ok(data.player_statistics.map(|payload| {
                    let series = payload.series.unwrap_or_default();
                    let (won_count, won_percentage) = series
                        .won
                        .as_ref()
                        .map(|w| w.win_stats())
                        .unwrap_or((None, None));
                    let alias = series.win_rate.as_ref();
                    let win_rate_percent = alias
                        .and_then(|bucket| bucket.percentage)
                        .or(won_percentage)
                        .or_else(|| {
                            let count = alias.and_then(|bucket| bucket.count).or(won_count)?;
                            let total = series.count?;
                            (total > 0.0).then(|| count / total * 100.0)
                        });
                    let segment = payload.segment.as_ref().and_then(|s| s.first());
                    PlayerStatsSummary {
                        selection_used: variant.name,
                        sample_series: series.count,
                        win_rate_percent,
                        kills_avg: series.kills.as_ref().and_then(|k| k.avg),
                        deaths_avg: series.deaths.as_ref().and_then(|d| d.avg),
                        kills_per_round: segment
                            .and_then(|s| s.kills.as_ref())
                            .and_then(|k| k.avg),
                        deaths_per_round: segment
                            .and_then(|s| s.deaths.as_ref())
                            .and_then(|d| d.avg),
                    }
                })));
            }
            Err(error) => match unsupported_reason(&error) {
                Some(reason) => last_reason = reason,
                None => return Err(error),
            },
        }
    }

    Ok(Fetched::Unsupported(last_reason))
}

/// Builds the roster table for the most frequent players across the
/// resolved series. Per-player failures degrade that row to `stats: None`
/// instead of failing the report.
pub async fn fetch_player_lines(
    client: &GridClient,
    series: &[SeriesNode],
    window: TimeWindow,
    limit: usize,
) -> Vec<PlayerLine> {
    let ranked = rank_players(series, limit);

    map_with_concurrency(
        ranked,
        concurrency::PLAYER_STATS_FETCH,
        |(player, appearances)| async move {
            let stats = match fetch_player_statistics(client, &player.id, window).await {
                Ok(fetched) => fetched.into_option().flatten(),
                Err(error) => {
                    warn!("Player statistics for {} failed: {}", player.id, error);
                    None
                }
            };
            PlayerLine {
                player_id: player.id,
                nickname: player.nickname,
                appearances,
                stats,
            }
        },
    )
    .await
}
