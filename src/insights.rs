//! Heuristic insight generation: archetype classification, playstyle
//! reads, and "how to win" recommendations.
//!
//! Everything here is deterministic and derived only from the computed
//! metrics, so the report stays useful when the narrative service is
//! unavailable. Each recommendation carries evidence references back to
//! the metrics or series that justify it.

use crate::constants::{archetype, insight};
use crate::metrics::ScoutingMetrics;
use crate::stats::{PlayerLine, TeamStatsSummary};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub archetype: &'static str,
    /// Compact recent-form string, newest first, e.g. "W W L W ?".
    pub recent_form_compact: String,
    pub common_strategies: Vec<String>,
    pub how_to_win: Vec<Recommendation>,
    pub roster_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    pub why: String,
    pub evidence_refs: Vec<String>,
}

/// Classifies the team into a coarse archetype from win rate (percent),
/// kills per series, and deaths per round. Missing inputs simply fail
/// their threshold checks, so thin data lands on the balanced default.
pub fn classify_archetype(
    win_rate_percent: Option<f64>,
    kills_avg: Option<f64>,
    deaths_per_round: Option<f64>,
) -> &'static str {
    let wr_above = |limit: f64| win_rate_percent.is_some_and(|wr| wr > limit);
    let wr_below = |limit: f64| win_rate_percent.is_some_and(|wr| wr < limit);
    let kills_above = |limit: f64| kills_avg.is_some_and(|k| k > limit);

    if wr_above(archetype::JUGGERNAUT_WIN_RATE) && kills_above(archetype::JUGGERNAUT_KILLS) {
        "Juggernaut"
    } else if wr_above(archetype::IRON_WALL_WIN_RATE)
        && deaths_per_round.is_some_and(|dpr| dpr < archetype::IRON_WALL_DEATHS_PER_ROUND)
    {
        "Iron Wall"
    } else if kills_above(archetype::GLASS_CANNON_KILLS)
        && wr_below(archetype::GLASS_CANNON_WIN_RATE)
    {
        "Glass Cannon"
    } else if wr_below(archetype::UNDERDOG_WIN_RATE) {
        "Underdog"
    } else {
        "Balanced Tactician"
    }
}

/// Derives the full insight block from metrics, optional team aggregates,
/// and the roster table.
pub fn build_insights(
    metrics: &ScoutingMetrics,
    team_stats: Option<&TeamStatsSummary>,
    players: &[PlayerLine],
) -> Insights {
    let win_rate_percent = team_stats
        .and_then(|stats| stats.win_rate_percent)
        .or(metrics.win_rate.map(|wr| wr * 100.0));
    let kills_avg = team_stats
        .and_then(|stats| stats.kills_avg)
        .or(metrics.avg_kills_per_series);
    let deaths_per_round = team_stats.and_then(|stats| stats.deaths_per_round);

    Insights {
        archetype: classify_archetype(win_rate_percent, kills_avg, deaths_per_round),
        recent_form_compact: recent_form_compact(metrics),
        common_strategies: common_strategies(metrics),
        how_to_win: how_to_win(metrics, win_rate_percent, kills_avg, deaths_per_round),
        roster_patterns: roster_patterns(metrics, players),
    }
}

fn recent_form_compact(metrics: &ScoutingMetrics) -> String {
    metrics
        .recent_form
        .iter()
        .take(insight::RECENT_FORM_WINDOW)
        .map(|entry| match entry.outcome {
            crate::model::Outcome::Win => "W",
            crate::model::Outcome::Loss => "L",
            crate::model::Outcome::Unknown => "?",
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn common_strategies(metrics: &ScoutingMetrics) -> Vec<String> {
    let mut strategies = Vec::new();

    if let Some(best) = metrics
        .map_win_rates
        .iter()
        .find(|m| m.samples >= insight::RELIABLE_MAP_SAMPLE && m.win_rate.is_some_and(|wr| wr >= 0.6))
    {
        strategies.push(format!(
            "Strong on {} ({}-{} across {} plays)",
            best.map, best.wins, best.losses, best.samples
        ));
    }

    if let Some(duration) = metrics.avg_game_duration_seconds {
        if duration < insight::FAST_TEMPO_SECONDS {
            strategies.push(format!(
                "Plays fast games (avg {:.0} min), favors early aggression",
                duration / 60.0
            ));
        } else {
            strategies.push(format!(
                "Comfortable in long games (avg {:.0} min)",
                duration / 60.0
            ));
        }
    }

    let streak = metrics
        .recent_form
        .iter()
        .take_while(|entry| entry.outcome == crate::model::Outcome::Win)
        .count();
    if streak >= 3 {
        strategies.push(format!("Riding a {streak}-series win streak"));
    }

    strategies
}

fn how_to_win(
    metrics: &ScoutingMetrics,
    win_rate_percent: Option<f64>,
    kills_avg: Option<f64>,
    deaths_per_round: Option<f64>,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if let Some(worst) = metrics
        .map_win_rates
        .iter()
        .rev()
        .find(|m| {
            m.samples as f64 >= insight::MAP_TARGET_SAMPLE && m.win_rate.is_some_and(|wr| wr <= 0.4)
        })
    {
        recommendations.push(Recommendation {
            title: format!("Steer the series toward {}", worst.map),
            why: format!(
                "They are {}-{} on {} over {} plays",
                worst.wins, worst.losses, worst.map, worst.samples
            ),
            evidence_refs: vec![format!("map:{}", worst.map)],
        });
    }

    if win_rate_percent.is_some_and(|wr| wr < insight::LOW_WIN_RATE) {
        recommendations.push(Recommendation {
            title: "Apply early scoreboard pressure".to_string(),
            why: format!(
                "Sub-{}% win rate suggests they struggle to close from behind",
                insight::LOW_WIN_RATE
            ),
            evidence_refs: vec!["metric:winRate".to_string()],
        });
    }

    if deaths_per_round.is_some_and(|dpr| dpr > insight::HIGH_DEATHS_PER_ROUND) {
        recommendations.push(Recommendation {
            title: "Punish overextensions".to_string(),
            why: format!(
                "They bleed {:.2} deaths per round, above the {:.1} caution line",
                deaths_per_round.unwrap_or_default(),
                insight::HIGH_DEATHS_PER_ROUND
            ),
            evidence_refs: vec!["metric:deathsPerRound".to_string()],
        });
    }

    if kills_avg.is_some_and(|kills| kills < insight::LOW_KILLS_PER_SERIES) {
        recommendations.push(Recommendation {
            title: "Deny early fights".to_string(),
            why: format!(
                "Low kill output ({:.1} per series) means they rely on setups, not aim duels",
                kills_avg.unwrap_or_default()
            ),
            evidence_refs: vec!["metric:killsAvg".to_string()],
        });
    }

    if recommendations.is_empty() {
        let refs = metrics
            .recent_form
            .iter()
            .take(insight::RECENT_FORM_WINDOW)
            .map(|entry| format!("series:{}", entry.series_id))
            .collect();
        recommendations.push(Recommendation {
            title: "Prepare for a balanced opponent".to_string(),
            why: "No exploitable statistical weakness in the sample; win through preparation"
                .to_string(),
            evidence_refs: refs,
        });
    }

    recommendations
}

fn roster_patterns(metrics: &ScoutingMetrics, players: &[PlayerLine]) -> Vec<String> {
    let mut patterns = Vec::new();
    if players.is_empty() || metrics.sample_size == 0 {
        return patterns;
    }

    let ever_present: Vec<&PlayerLine> = players
        .iter()
        .filter(|line| line.appearances >= metrics.sample_size)
        .collect();
    if ever_present.len() >= 3 {
        patterns.push(format!(
            "Stable core: {} featured in every scouted series",
            join_nicknames(&ever_present)
        ));
    }

    let rotating: Vec<&PlayerLine> = players
        .iter()
        .filter(|line| line.appearances * 2 < metrics.sample_size)
        .collect();
    if !rotating.is_empty() {
        patterns.push(format!(
            "Rotating slots: {} appeared in under half the series",
            join_nicknames(&rotating)
        ));
    }

    if let Some(top) = players.first()
        && let Some(stats) = &top.stats
        && let Some(kills) = stats.kills_avg
        && metrics
            .avg_kills_per_series
            .is_some_and(|team_kills| team_kills > 0.0 && kills / team_kills > 0.3)
    {
        patterns.push(format!(
            "Kill pressure funnels through {}",
            top.nickname.as_deref().unwrap_or(&top.player_id)
        ));
    }

    patterns
}

fn join_nicknames(lines: &[&PlayerLine]) -> String {
    lines
        .iter()
        .map(|line| line.nickname.as_deref().unwrap_or(&line.player_id))
        .collect::<Vec<_>>()
        .join(", ")
}
