//! Decoded shapes for the statistics endpoint.
//!
//! Aggregates arrive in several spellings depending on the schema tier:
//! `won` may be a single bucket or an array of per-outcome buckets, the
//! round segment may be an object or a list, and every numeric field is
//! optional. Decoding keeps everything optional; the distinction between
//! "zero" and "absent" matters downstream and is never collapsed here.

use crate::model::ids::vec_string_or_number;
use serde::Deserialize;

/// Generic numeric aggregate. Only the fields the query selected are
/// present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Aggregate {
    #[serde(default)]
    pub avg: Option<f64>,
    #[serde(default)]
    pub sum: Option<f64>,
    #[serde(default)]
    pub count: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
}

/// One win bucket. Object-wins schemas return exactly one of these;
/// array-wins schemas return one per outcome class.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WinBucket {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub count: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
}

/// `won` in either spelling.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WonField {
    One(WinBucket),
    Many(Vec<WinBucket>),
}

impl WonField {
    /// Collapses both spellings to (win count, win percentage). For the
    /// array spelling the buckets are summed for count and the first
    /// percentage-bearing bucket wins; mixed-outcome arrays only carry
    /// the win class in practice.
    pub fn win_stats(&self) -> (Option<f64>, Option<f64>) {
        match self {
            WonField::One(bucket) => (bucket.count, bucket.percentage),
            WonField::Many(buckets) => {
                let count = buckets
                    .iter()
                    .filter_map(|b| b.count)
                    .reduce(|acc, c| acc + c);
                let percentage = buckets.iter().find_map(|b| b.percentage);
                (count, percentage)
            }
        }
    }
}

/// Round-segment aggregates, object or list spelling. The list arm must
/// be tried first: `SegmentStats` is all-optional, so an untagged decode
/// would otherwise accept a JSON array as a single (empty) object and
/// drop the aggregates.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SegmentField {
    Many(Vec<SegmentStats>),
    One(SegmentStats),
}

impl SegmentField {
    pub fn first(&self) -> Option<&SegmentStats> {
        match self {
            SegmentField::One(stats) => Some(stats),
            SegmentField::Many(list) => list.first(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SegmentStats {
    #[serde(default)]
    pub kills: Option<Aggregate>,
    #[serde(default)]
    pub deaths: Option<Aggregate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStatisticsData {
    pub team_statistics: Option<TeamStatisticsPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStatisticsPayload {
    #[serde(default, deserialize_with = "vec_string_or_number")]
    pub aggregation_series_ids: Vec<String>,
    #[serde(default)]
    pub series: Option<SeriesAggregates>,
    #[serde(default)]
    pub game: Option<GameAggregates>,
    #[serde(default)]
    pub segment: Option<SegmentField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesAggregates {
    #[serde(default)]
    pub count: Option<f64>,
    #[serde(default)]
    pub won: Option<WonField>,
    #[serde(default)]
    pub win_rate: Option<WinBucket>,
    #[serde(default)]
    pub kills: Option<Aggregate>,
    #[serde(default)]
    pub deaths: Option<Aggregate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAggregates {
    #[serde(default)]
    pub count: Option<f64>,
    #[serde(default)]
    pub won: Option<WonField>,
    #[serde(default)]
    pub duration: Option<Aggregate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatisticsData {
    pub player_statistics: Option<PlayerStatisticsPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatisticsPayload {
    #[serde(default)]
    pub series: Option<SeriesAggregates>,
    #[serde(default)]
    pub segment: Option<SegmentField>,
}
