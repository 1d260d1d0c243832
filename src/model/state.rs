//! Finished-series end state and its normalization into the flat
//! per-series record the metrics aggregator consumes.

use crate::model::ids::string_or_number;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a series from the scouted team's perspective.
///
/// `Unknown` is a real value, not an error: end states without win flags
/// or scores stay in the sample but never contribute to the win rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Win,
    Loss,
    Unknown,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Win => "WIN",
            Outcome::Loss => "LOSS",
            Outcome::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesEndStateData {
    pub series_state: Option<SeriesEndState>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesEndState {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub finished: Option<bool>,
    #[serde(default = "Vec::new")]
    pub teams: Vec<EndStateTeam>,
    #[serde(default = "Vec::new")]
    pub games: Vec<EndStateGame>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndStateTeam {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub won: Option<bool>,
    #[serde(default = "Vec::new")]
    pub players: Vec<EndStatePlayer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndStatePlayer {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kills: Option<f64>,
    #[serde(default)]
    pub deaths: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndStateGame {
    #[serde(default)]
    pub sequence_number: Option<i64>,
    #[serde(default)]
    pub map: Option<MapRef>,
    #[serde(default)]
    pub finished: Option<bool>,
    #[serde(default)]
    pub duration: Option<Value>,
    #[serde(default = "Vec::new")]
    pub teams: Vec<EndStateGameTeam>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndStateGameTeam {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub won: Option<bool>,
}

/// Flat per-series record from the scouted team's perspective.
#[derive(Debug, Clone)]
pub struct NormalizedSeries {
    pub series_id: String,
    pub outcome: Outcome,
    pub opponent: Option<String>,
    pub team_score: Option<f64>,
    pub opponent_score: Option<f64>,
    pub team_kills: Option<f64>,
    pub team_deaths: Option<f64>,
    pub maps: Vec<NormalizedMap>,
    /// Scheduled start from the directory listing, for recency ordering.
    pub start_time: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NormalizedMap {
    pub name: String,
    pub won: Option<bool>,
    pub duration_seconds: Option<f64>,
}

/// Projects an end state onto the scouted team.
///
/// Outcome resolution order: the explicit `won` flag, then score
/// comparison, then `Unknown`. A series whose roster does not include the
/// team at all also normalizes to `Unknown` so upstream filter bugs
/// surface as data-quality notes instead of skewed win rates.
pub fn normalize_series(
    state: &SeriesEndState,
    team_id: &str,
    start_time: Option<String>,
) -> NormalizedSeries {
    let focus = state.teams.iter().find(|team| team.id == team_id);
    let opponent = state.teams.iter().find(|team| team.id != team_id);

    let outcome = match focus {
        Some(team) => match team.won {
            Some(true) => Outcome::Win,
            Some(false) => Outcome::Loss,
            None => match (team.score, opponent.and_then(|o| o.score)) {
                (Some(ours), Some(theirs)) if ours > theirs => Outcome::Win,
                (Some(ours), Some(theirs)) if ours < theirs => Outcome::Loss,
                _ => Outcome::Unknown,
            },
        },
        None => Outcome::Unknown,
    };

    let sum_stat = |pick: fn(&EndStatePlayer) -> Option<f64>| {
        focus.and_then(|team| {
            team.players
                .iter()
                .filter_map(pick)
                .reduce(|acc, v| acc + v)
        })
    };

    let maps = state
        .games
        .iter()
        .filter_map(|game| {
            let name = game.map.as_ref().and_then(|m| m.name.clone())?;
            let won = game
                .teams
                .iter()
                .find(|team| team.id == team_id)
                .and_then(|team| match team.won {
                    Some(flag) => Some(flag),
                    None => game_won_by_score(game, team_id),
                });
            Some(NormalizedMap {
                name,
                won,
                duration_seconds: game.duration.as_ref().and_then(parse_duration_seconds),
            })
        })
        .collect();

    NormalizedSeries {
        series_id: state.id.clone(),
        outcome,
        opponent: opponent.and_then(|team| team.name.clone()),
        team_score: focus.and_then(|team| team.score),
        opponent_score: opponent.and_then(|team| team.score),
        team_kills: sum_stat(|p| p.kills),
        team_deaths: sum_stat(|p| p.deaths),
        maps,
        start_time,
    }
}

fn game_won_by_score(game: &EndStateGame, team_id: &str) -> Option<bool> {
    let ours = game
        .teams
        .iter()
        .find(|team| team.id == team_id)
        .and_then(|team| team.score)?;
    let theirs = game
        .teams
        .iter()
        .find(|team| team.id != team_id)
        .and_then(|team| team.score)?;
    if ours == theirs {
        None
    } else {
        Some(ours > theirs)
    }
}

/// Game durations arrive as seconds, as numeric strings, or as ISO-8601
/// durations like "PT31M12S".
pub fn parse_duration_seconds(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            if let Ok(seconds) = s.parse::<f64>() {
                return Some(seconds);
            }
            parse_iso8601_duration(s)
        }
        _ => None,
    }
}

fn parse_iso8601_duration(raw: &str) -> Option<f64> {
    let rest = raw.strip_prefix("PT")?;
    let mut total = 0.0;
    let mut number = String::new();
    let mut matched = false;
    for c in rest.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
            continue;
        }
        let value: f64 = number.parse().ok()?;
        number.clear();
        total += match c {
            'H' => value * 3600.0,
            'M' => value * 60.0,
            'S' => value,
            _ => return None,
        };
        matched = true;
    }
    if !number.is_empty() || !matched {
        return None;
    }
    Some(total)
}
