//! Scouting report assembly and rendering.

pub mod generator;

use crate::insights::Insights;
use crate::metrics::ScoutingMetrics;
use crate::model::Outcome;
use crate::narrative::Narrative;
use crate::stats::{PlayerLine, TeamStatsSummary};
use serde::Serialize;

pub use generator::{ReportGenerator, ReportRequest};

/// The assembled scouting report. Serializes to JSON for machine
/// consumers; [`ScoutingReport::to_markdown`] renders the human version.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoutingReport {
    pub meta: ReportMeta,
    pub metrics: ScoutingMetrics,
    pub team_stats: Option<TeamStatsSummary>,
    pub players: Vec<PlayerLine>,
    pub insights: Insights,
    pub narrative: Narrative,
    pub draft_notes: Vec<String>,
    pub comparison: Option<ComparisonBlock>,
    /// Every caveat gathered along the pipeline, append-only.
    pub limitations: Vec<String>,
    pub evidence: Vec<EvidenceSeries>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub requested_team: String,
    pub team_id: String,
    pub team_name: String,
    pub game: String,
    pub title_id: String,
    pub window_label: &'static str,
    pub series_count: usize,
    pub resolution_strategy: &'static str,
    pub generated_at: String,
}

/// Head-to-head comparison against a second team, aggregate-level only.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonBlock {
    pub team: ComparisonSide,
    pub opponent: ComparisonSide,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSide {
    pub name: String,
    pub win_rate_percent: Option<f64>,
    pub kills_avg: Option<f64>,
    pub archetype: &'static str,
}

/// One scouted series, cited so report claims are checkable.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSeries {
    pub series_id: String,
    pub opponent: Option<String>,
    pub outcome: Outcome,
    pub score: Option<String>,
    pub start_time: Option<String>,
}

impl ScoutingReport {
    /// Renders the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "# Scouting Report: {}\n\n",
            self.meta.team_name
        ));
        out.push_str(&format!(
            "*{} · {} series over the {} · generated {}*\n\n",
            self.meta.game, self.meta.series_count, self.meta.window_label, self.meta.generated_at
        ));

        out.push_str("## Executive Summary\n\n");
        out.push_str(&self.narrative.executive_summary);
        out.push_str("\n\n");
        out.push_str(&format!("> {}\n\n", self.narrative.coverage_note));

        out.push_str("## Performance\n\n");
        out.push_str(&format!(
            "- Record: {}-{} ({} undecided), win rate {}\n",
            self.metrics.wins,
            self.metrics.losses,
            self.metrics.unknowns,
            fmt_rate(self.metrics.win_rate),
        ));
        out.push_str(&format!(
            "- Recent form (newest first): {}\n",
            if self.insights.recent_form_compact.is_empty() {
                "n/a"
            } else {
                &self.insights.recent_form_compact
            }
        ));
        out.push_str(&format!(
            "- Archetype: {}\n",
            self.insights.archetype
        ));
        if let Some(kills) = self
            .team_stats
            .as_ref()
            .and_then(|s| s.kills_avg)
            .or(self.metrics.avg_kills_per_series)
        {
            out.push_str(&format!("- Kills per series: {kills:.1}\n"));
        }
        if let Some(dpr) = self.team_stats.as_ref().and_then(|s| s.deaths_per_round) {
            out.push_str(&format!("- Deaths per round: {dpr:.2}\n"));
        }
        out.push('\n');

        if !self.metrics.map_win_rates.is_empty() {
            out.push_str("## Maps\n\n");
            out.push_str("| Map | W-L | Plays | Win rate |\n|---|---|---|---|\n");
            for map in &self.metrics.map_win_rates {
                out.push_str(&format!(
                    "| {} | {}-{} | {} | {} |\n",
                    map.map,
                    map.wins,
                    map.losses,
                    map.samples,
                    fmt_rate(map.win_rate),
                ));
            }
            out.push('\n');
        }

        if !self.players.is_empty() {
            out.push_str("## Players\n\n");
            out.push_str(
                "| Player | Series | Win rate | Kills/series | Deaths/round |\n|---|---|---|---|---|\n",
            );
            for line in &self.players {
                let stats = line.stats.as_ref();
                out.push_str(&format!(
                    "| {} | {} | {} | {} | {} |\n",
                    line.nickname.as_deref().unwrap_or(&line.player_id),
                    line.appearances,
                    stats
                        .and_then(|s| s.win_rate_percent)
                        .map(|v| format!("{v:.0}%"))
                        .unwrap_or_else(|| "—".to_string()),
                    stats
                        .and_then(|s| s.kills_avg)
                        .map(|v| format!("{v:.1}"))
                        .unwrap_or_else(|| "—".to_string()),
                    stats
                        .and_then(|s| s.deaths_per_round)
                        .map(|v| format!("{v:.2}"))
                        .unwrap_or_else(|| "—".to_string()),
                ));
            }
            out.push('\n');
        }

        if !self.insights.common_strategies.is_empty() || !self.insights.roster_patterns.is_empty()
        {
            out.push_str("## Tendencies\n\n");
            for item in &self.insights.common_strategies {
                out.push_str(&format!("- {item}\n"));
            }
            for item in &self.insights.roster_patterns {
                out.push_str(&format!("- {item}\n"));
            }
            out.push('\n');
        }

        if !self.draft_notes.is_empty() {
            out.push_str("## Draft\n\n");
            for note in &self.draft_notes {
                out.push_str(&format!("- {note}\n"));
            }
            out.push('\n');
        }

        out.push_str("## How To Win\n\n");
        for rec in &self.narrative.how_to_win {
            out.push_str(&format!("### {}\n\n{}\n", rec.title, rec.why));
            if !rec.evidence_refs.is_empty() {
                out.push_str(&format!("*Evidence: {}*\n", rec.evidence_refs.join(", ")));
            }
            out.push('\n');
        }

        if let Some(comparison) = &self.comparison {
            out.push_str("## Head To Head\n\n");
            out.push_str("| | Win rate | Kills/series | Archetype |\n|---|---|---|---|\n");
            for side in [&comparison.team, &comparison.opponent] {
                out.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    side.name,
                    side.win_rate_percent
                        .map(|v| format!("{v:.0}%"))
                        .unwrap_or_else(|| "—".to_string()),
                    side.kills_avg
                        .map(|v| format!("{v:.1}"))
                        .unwrap_or_else(|| "—".to_string()),
                    side.archetype,
                ));
            }
            out.push('\n');
        }

        if !self.evidence.is_empty() {
            out.push_str("## Scouted Series\n\n");
            for entry in &self.evidence {
                out.push_str(&format!(
                    "- `{}` {} vs {}{}{}\n",
                    entry.series_id,
                    entry.outcome.label(),
                    entry.opponent.as_deref().unwrap_or("unknown opponent"),
                    entry
                        .score
                        .as_deref()
                        .map(|s| format!(" ({s})"))
                        .unwrap_or_default(),
                    entry
                        .start_time
                        .as_deref()
                        .map(|t| format!(" on {t}"))
                        .unwrap_or_default(),
                ));
            }
            out.push('\n');
        }

        if !self.limitations.is_empty() {
            out.push_str("## Limitations\n\n");
            for limitation in &self.limitations {
                out.push_str(&format!("- {limitation}\n"));
            }
        }

        out
    }
}

fn fmt_rate(rate: Option<f64>) -> String {
    rate.map(|r| format!("{:.0}%", r * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}
