//! Pure aggregation of normalized series into scouting metrics.
//!
//! No I/O happens here. The cardinal rule is null-not-zero: a statistic
//! that cannot be computed from the sample stays `None`, and anything that
//! shrank or skewed the sample lands in `data_quality`.

use crate::model::state::{NormalizedSeries, Outcome};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoutingMetrics {
    /// Number of series in the sample, unknown outcomes included.
    pub sample_size: usize,
    pub wins: usize,
    pub losses: usize,
    pub unknowns: usize,
    /// Wins over decided series (wins + losses), as a fraction. `None`
    /// when no series had a decidable outcome.
    pub win_rate: Option<f64>,
    pub avg_kills_per_series: Option<f64>,
    pub avg_deaths_per_series: Option<f64>,
    /// Per-map win rates, best map first.
    pub map_win_rates: Vec<MapWinRate>,
    /// Newest first, matching the input order.
    pub recent_form: Vec<RecentFormEntry>,
    pub avg_game_duration_seconds: Option<f64>,
    /// Append-only caveats about the sample.
    pub data_quality: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapWinRate {
    pub map: String,
    pub wins: usize,
    pub losses: usize,
    /// Times the map was played, undecided games included.
    pub samples: usize,
    pub win_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFormEntry {
    pub series_id: String,
    pub outcome: Outcome,
    pub opponent: Option<String>,
    pub score: Option<String>,
}

/// Aggregates normalized series (expected newest-first) into metrics.
pub fn compute_metrics(series: &[NormalizedSeries]) -> ScoutingMetrics {
    let mut wins = 0;
    let mut losses = 0;
    let mut unknowns = 0;
    let mut data_quality = Vec::new();

    for entry in series {
        match entry.outcome {
            Outcome::Win => wins += 1,
            Outcome::Loss => losses += 1,
            Outcome::Unknown => unknowns += 1,
        }
    }

    let decided = wins + losses;
    let win_rate = (decided > 0).then(|| wins as f64 / decided as f64);
    if unknowns > 0 {
        data_quality.push(format!(
            "{unknowns} series had an undecidable outcome and do not count toward the win rate"
        ));
    }

    let avg_kills_per_series = mean(series.iter().filter_map(|s| s.team_kills));
    let avg_deaths_per_series = mean(series.iter().filter_map(|s| s.team_deaths));
    let with_kills = series.iter().filter(|s| s.team_kills.is_some()).count();
    if with_kills > 0 && with_kills < series.len() {
        data_quality.push(format!(
            "kill/death averages cover {with_kills} of {} series",
            series.len()
        ));
    }

    let recent_form = series
        .iter()
        .map(|entry| RecentFormEntry {
            series_id: entry.series_id.clone(),
            outcome: entry.outcome,
            opponent: entry.opponent.clone(),
            score: match (entry.team_score, entry.opponent_score) {
                (Some(ours), Some(theirs)) => Some(format!("{ours:.0}-{theirs:.0}")),
                _ => None,
            },
        })
        .collect();

    let map_win_rates = compute_map_win_rates(series);
    let avg_game_duration_seconds = mean(
        series
            .iter()
            .flat_map(|s| s.maps.iter())
            .filter_map(|m| m.duration_seconds),
    );

    ScoutingMetrics {
        sample_size: series.len(),
        wins,
        losses,
        unknowns,
        win_rate,
        avg_kills_per_series,
        avg_deaths_per_series,
        map_win_rates,
        recent_form,
        avg_game_duration_seconds,
        data_quality,
    }
}

fn compute_map_win_rates(series: &[NormalizedSeries]) -> Vec<MapWinRate> {
    let mut per_map: HashMap<String, MapWinRate> = HashMap::new();

    for map in series.iter().flat_map(|s| s.maps.iter()) {
        let entry = per_map
            .entry(map.name.clone())
            .or_insert_with(|| MapWinRate {
                map: map.name.clone(),
                wins: 0,
                losses: 0,
                samples: 0,
                win_rate: None,
            });
        entry.samples += 1;
        match map.won {
            Some(true) => entry.wins += 1,
            Some(false) => entry.losses += 1,
            None => {}
        }
    }

    let mut rates: Vec<MapWinRate> = per_map
        .into_values()
        .map(|mut entry| {
            let decided = entry.wins + entry.losses;
            entry.win_rate = (decided > 0).then(|| entry.wins as f64 / decided as f64);
            entry
        })
        .collect();

    // Best map first; undecided maps last; ties broken by sample size
    // then name for a stable report.
    rates.sort_by(|a, b| {
        b.win_rate
            .partial_cmp(&a.win_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.samples.cmp(&a.samples))
            .then_with(|| a.map.cmp(&b.map))
    });
    rates
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}
