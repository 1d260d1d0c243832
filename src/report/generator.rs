//! The report pipeline: resolve, fetch, aggregate, narrate, assemble.

use crate::client::queries::Fetched;
use crate::client::{GridClient, ResponseCache};
use crate::config::Config;
use crate::constants::{concurrency, report};
use crate::error::AppError;
use crate::insights::{build_insights, classify_archetype};
use crate::metrics::compute_metrics;
use crate::model::state::NormalizedSeries;
use crate::narrative::generate_narrative;
use crate::report::{ComparisonBlock, ComparisonSide, EvidenceSeries, ReportMeta, ScoutingReport};
use crate::resolve::{TimeWindow, resolve_recent_series, resolve_team, resolve_title};
use crate::stats::game::DraftAction;
use crate::stats::{
    collect_normalized_series, fetch_draft_actions, fetch_player_lines, fetch_team_statistics,
};
use crate::util::concurrency::map_with_concurrency;
use chrono::{SecondsFormat, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// What to scout.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub game: String,
    pub team: String,
    /// Optional second team for the head-to-head block.
    pub opponent: Option<String>,
    /// How many recent series to scout.
    pub last_n: usize,
    pub window: TimeWindow,
}

/// Owns the client and runs the pipeline end to end.
pub struct ReportGenerator {
    client: GridClient,
    config: Config,
}

impl ReportGenerator {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let client = GridClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// Shares a response cache across generators in the same process.
    pub fn with_cache(config: Config, cache: Arc<ResponseCache>) -> Result<Self, AppError> {
        let client = GridClient::with_cache(&config, cache)?;
        Ok(Self { client, config })
    }

    /// Generates a scouting report.
    ///
    /// Directory failures (unknown title or team) and an empty sample are
    /// hard errors; everything downstream degrades into limitation notes
    /// rather than failing the report.
    #[instrument(skip(self), fields(team = %request.team, game = %request.game))]
    pub async fn generate(&self, request: &ReportRequest) -> Result<ScoutingReport, AppError> {
        let mut limitations: Vec<String> = Vec::new();

        let title = resolve_title(&self.client, &request.game).await?;
        let resolved = resolve_team(&self.client, &title.id, &request.team).await?;
        if !resolved.is_exact() {
            limitations.push(format!(
                "team '{}' resolved to '{}' by fuzzy match (score {:.2})",
                request.team, resolved.team.name, resolved.score
            ));
        }
        info!(
            "Scouting {} ({}) in title {}",
            resolved.team.name, resolved.team.id, title.name
        );

        let team_stats =
            match fetch_team_statistics(&self.client, &resolved.team.id, request.window).await? {
                Fetched::Ok(summary) => summary,
                Fetched::Unsupported(reason) => {
                    limitations.push(format!(
                        "team-level aggregates unsupported by this schema: {reason}"
                    ));
                    None
                }
            };
        if let Some(stats) = &team_stats {
            limitations.extend(stats.notes.iter().cloned());
        }

        let aggregation_ids: Vec<String> = team_stats
            .as_ref()
            .map(|stats| stats.aggregation_series_ids.clone())
            .unwrap_or_default();

        let resolution = resolve_recent_series(
            &self.client,
            &resolved.team,
            &title.id,
            request.last_n,
            request.window,
            &aggregation_ids,
        )
        .await?;
        limitations.extend(resolution.notes.iter().cloned());
        if resolution.series.is_empty() {
            return Err(AppError::insufficient_data(format!(
                "no series found for {} in the {}",
                resolved.team.name,
                request.window.label()
            )));
        }
        if resolution.series.len() < request.last_n {
            limitations.push(format!(
                "only {} of the requested {} series were found",
                resolution.series.len(),
                request.last_n
            ));
        }

        let (normalized, hydration_notes) =
            collect_normalized_series(&self.client, &resolution.series, &resolved.team.id).await;
        limitations.extend(hydration_notes);
        if normalized.is_empty() {
            return Err(AppError::insufficient_data(format!(
                "none of the {} resolved series had a usable end state",
                resolution.series.len()
            )));
        }

        let metrics = compute_metrics(&normalized);
        limitations.extend(metrics.data_quality.iter().cloned());

        let players = fetch_player_lines(
            &self.client,
            &resolution.series,
            request.window,
            report::PLAYER_TABLE_LIMIT,
        )
        .await;
        if players.is_empty() {
            limitations.push(
                "roster and player insights are omitted: no player data in the resolved series"
                    .to_string(),
            );
        } else if players.iter().all(|line| line.stats.is_none()) {
            limitations.push("player statistics unavailable for every ranked player".to_string());
        }

        let draft_notes = self
            .draft_summary(&resolution.series, &mut limitations)
            .await;

        let insights = build_insights(&metrics, team_stats.as_ref(), &players);
        let (narrative, narrative_note) =
            generate_narrative(&self.config, &resolved.team.name, &metrics, &insights).await;
        if let Some(note) = narrative_note {
            limitations.push(note);
        }

        let comparison = match &request.opponent {
            Some(opponent_name) => {
                self.head_to_head(
                    &title.id,
                    &resolved.team.name,
                    team_stats.as_ref().and_then(|s| s.win_rate_percent),
                    team_stats.as_ref().and_then(|s| s.kills_avg),
                    team_stats.as_ref().and_then(|s| s.deaths_per_round),
                    opponent_name,
                    request.window,
                    &mut limitations,
                )
                .await
            }
            None => None,
        };

        let evidence = evidence_from(&normalized);

        Ok(ScoutingReport {
            meta: ReportMeta {
                requested_team: request.team.clone(),
                team_id: resolved.team.id.clone(),
                team_name: resolved.team.name.clone(),
                game: title.name.clone(),
                title_id: title.id.clone(),
                window_label: request.window.label(),
                series_count: normalized.len(),
                resolution_strategy: resolution.strategy,
                generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            },
            metrics,
            team_stats,
            players,
            insights,
            narrative,
            draft_notes,
            comparison,
            limitations,
            evidence,
        })
    }

    /// Aggregates draft tendencies across the most recent series. Fully
    /// unsupported drafts become a single limitation note.
    async fn draft_summary(
        &self,
        series: &[crate::model::SeriesNode],
        limitations: &mut Vec<String>,
    ) -> Vec<String> {
        let ids: Vec<String> = series
            .iter()
            .take(report::DRAFT_SERIES_CAP)
            .map(|node| node.id.clone())
            .collect();
        if ids.is_empty() {
            return Vec::new();
        }

        let client = &self.client;
        let results = map_with_concurrency(
            ids,
            concurrency::REPORT_SERIES_FETCH,
            |series_id| async move { fetch_draft_actions(client, &series_id).await },
        )
        .await;

        let mut actions = Vec::new();
        let mut any_supported = false;
        for result in results {
            match result {
                Ok(Fetched::Ok(mut batch)) => {
                    any_supported = true;
                    actions.append(&mut batch);
                }
                Ok(Fetched::Unsupported(_)) => {}
                Err(error) => warn!("Draft lookup failed: {}", error),
            }
        }

        if !any_supported {
            limitations.push("draft data unsupported by this schema".to_string());
            return Vec::new();
        }
        summarize_draft_actions(&actions)
    }

    #[allow(clippy::too_many_arguments)]
    async fn head_to_head(
        &self,
        title_id: &str,
        team_name: &str,
        team_win_rate: Option<f64>,
        team_kills: Option<f64>,
        team_dpr: Option<f64>,
        opponent_name: &str,
        window: TimeWindow,
        limitations: &mut Vec<String>,
    ) -> Option<ComparisonBlock> {
        let opponent = match resolve_team(&self.client, title_id, opponent_name).await {
            Ok(resolved) => resolved,
            Err(error) => {
                limitations.push(format!("head-to-head skipped: {error}"));
                return None;
            }
        };

        let stats = match fetch_team_statistics(&self.client, &opponent.team.id, window).await {
            Ok(fetched) => fetched.into_option().flatten(),
            Err(error) => {
                limitations.push(format!("head-to-head skipped: {error}"));
                return None;
            }
        };

        let opponent_win_rate = stats.as_ref().and_then(|s| s.win_rate_percent);
        let opponent_kills = stats.as_ref().and_then(|s| s.kills_avg);
        let opponent_dpr = stats.as_ref().and_then(|s| s.deaths_per_round);

        Some(ComparisonBlock {
            team: ComparisonSide {
                name: team_name.to_string(),
                win_rate_percent: team_win_rate,
                kills_avg: team_kills,
                archetype: classify_archetype(team_win_rate, team_kills, team_dpr),
            },
            opponent: ComparisonSide {
                name: opponent.team.name,
                win_rate_percent: opponent_win_rate,
                kills_avg: opponent_kills,
                archetype: classify_archetype(opponent_win_rate, opponent_kills, opponent_dpr),
            },
        })
    }
}

fn evidence_from(normalized: &[NormalizedSeries]) -> Vec<EvidenceSeries> {
    normalized
        .iter()
        .map(|entry| EvidenceSeries {
            series_id: entry.series_id.clone(),
            opponent: entry.opponent.clone(),
            outcome: entry.outcome,
            score: match (entry.team_score, entry.opponent_score) {
                (Some(ours), Some(theirs)) => Some(format!("{ours:.0}-{theirs:.0}")),
                _ => None,
            },
            start_time: entry.start_time.clone(),
        })
        .collect()
}

/// Turns raw draft actions into report lines, most frequent names first.
fn summarize_draft_actions(actions: &[DraftAction]) -> Vec<String> {
    let mut counts: HashMap<(String, String), usize> = HashMap::new();
    for action in actions {
        let Some(name) = action.draftable.as_ref().and_then(|d| d.name.clone()) else {
            continue;
        };
        let kind = action
            .action_type
            .as_deref()
            .unwrap_or("pick")
            .to_lowercase();
        *counts.entry((kind, name)).or_insert(0) += 1;
    }

    let mut notes = Vec::new();
    for kind in ["ban", "pick"] {
        let mut entries: Vec<(&String, usize)> = counts
            .iter()
            .filter(|((k, _), _)| k == kind)
            .map(|((_, name), count)| (name, *count))
            .collect();
        if entries.is_empty() {
            continue;
        }
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let listed: Vec<String> = entries
            .iter()
            .take(report::DRAFT_TOP_NAMES)
            .map(|(name, count)| format!("{name} ({count})"))
            .collect();
        notes.push(format!(
            "Most {} {}: {}",
            if kind == "ban" { "banned" } else { "picked" },
            if kind == "ban" { "maps/targets" } else { "choices" },
            listed.join(", ")
        ));
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::game::Draftable;

    fn action(kind: &str, name: &str) -> DraftAction {
        DraftAction {
            action_type: Some(kind.to_string()),
            sequence_number: None,
            draftable: Some(Draftable {
                draftable_type: None,
                name: Some(name.to_string()),
            }),
        }
    }

    #[test]
    fn test_summarize_draft_actions_counts_and_orders() {
        let actions = vec![
            action("ban", "Icebox"),
            action("ban", "Icebox"),
            action("ban", "Breeze"),
            action("pick", "Ascent"),
            action("pick", "Ascent"),
            action("pick", "Bind"),
        ];
        let notes = summarize_draft_actions(&actions);
        assert_eq!(notes.len(), 2);
        assert!(notes[0].contains("Icebox (2)"));
        assert!(notes[0].starts_with("Most banned"));
        assert!(notes[1].contains("Ascent (2)"));
    }

    #[test]
    fn test_summarize_skips_nameless_actions() {
        let actions = vec![DraftAction {
            action_type: Some("ban".to_string()),
            sequence_number: None,
            draftable: None,
        }];
        assert!(summarize_draft_actions(&actions).is_empty());
    }
}
