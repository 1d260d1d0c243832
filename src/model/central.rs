//! Decoded shapes for the central-data endpoint: titles, the team
//! directory, and series listings.

use crate::model::ids::{opt_string_or_number, string_or_number};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub name_shortened: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TitlesData {
    pub titles: Vec<Title>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub name_shortened: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    #[serde(default)]
    pub total_count: Option<i64>,
    #[serde(default)]
    pub page_info: PageInfo,
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
}

impl<T> Connection<T> {
    pub fn nodes(self) -> Vec<T> {
        self.edges.into_iter().map(|edge| edge.node).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct TeamsData {
    pub teams: Connection<Team>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllSeriesData {
    pub all_series: Connection<SeriesNode>,
}

#[derive(Debug, Deserialize)]
pub struct SeriesByIdData {
    pub series: Option<SeriesNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesNode {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub start_time_scheduled: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub format: Option<SeriesFormat>,
    #[serde(default)]
    pub tournament: Option<Tournament>,
    #[serde(default = "Vec::new")]
    pub teams: Vec<SeriesTeam>,
}

impl SeriesNode {
    /// Millisecond timestamp used for recency ordering. Prefers the
    /// scheduled start, falls back to the update time, then zero so a
    /// series with no timestamps sorts last under descending order.
    pub fn sort_timestamp(&self) -> i64 {
        parse_timestamp_millis(self.start_time_scheduled.as_deref())
            .or_else(|| parse_timestamp_millis(self.updated_at.as_deref()))
            .unwrap_or(0)
    }

    /// Whether the given team id appears among the series participants.
    pub fn involves_team(&self, team_id: &str) -> bool {
        self.teams
            .iter()
            .any(|team| team.base_info.as_ref().is_some_and(|info| info.id == team_id))
    }

    pub fn team_names(&self) -> Vec<&str> {
        self.teams
            .iter()
            .filter_map(|team| team.base_info.as_ref().map(|info| info.name.as_str()))
            .collect()
    }
}

fn parse_timestamp_millis(raw: Option<&str>) -> Option<i64> {
    let raw = raw?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesFormat {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_shortened: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tournament {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesTeam {
    #[serde(default)]
    pub base_info: Option<TeamRef>,
    #[serde(default)]
    pub score_advantage: Option<f64>,
    #[serde(default = "Vec::new")]
    pub players: Vec<PlayerEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamRef {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerRef {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub nickname: Option<String>,
}

/// Roster entry in either of the two schema shapes: nested under
/// `baseInfo` or flat on the player object. The nested shape is tried
/// first because a flat decode would accept it while losing the id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PlayerEntry {
    Nested {
        #[serde(rename = "baseInfo")]
        base_info: PlayerRef,
    },
    Flat(PlayerRef),
}

impl PlayerEntry {
    pub fn player(&self) -> &PlayerRef {
        match self {
            PlayerEntry::Nested { base_info } => base_info,
            PlayerEntry::Flat(player) => player,
        }
    }
}
