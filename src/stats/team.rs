//! Team-level aggregates from the statistics endpoint.

use crate::client::queries::{Fetched, TEAM_STATS_VARIANTS, team_statistics_query};
use crate::client::{Endpoint, GridClient};
use crate::constants::cache_ttl;
use crate::error::AppError;
use crate::model::stats::{TeamStatisticsData, TeamStatisticsPayload};
use crate::resolve::TimeWindow;
use crate::stats::unsupported_reason;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

/// Normalized team aggregates. Every number is optional: absent upstream
/// fields stay absent instead of turning into zeros.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStatsSummary {
    /// Name of the query variant that this schema accepted.
    pub selection_used: &'static str,
    pub sample_series: Option<f64>,
    pub win_count: Option<f64>,
    pub win_rate_percent: Option<f64>,
    pub kills_avg: Option<f64>,
    pub kills_sum: Option<f64>,
    pub deaths_per_round: Option<f64>,
    pub game_count: Option<f64>,
    pub game_duration_avg: Option<f64>,
    /// Series ids this aggregate was computed over; feeds the series
    /// resolver's fast path.
    pub aggregation_series_ids: Vec<String>,
    pub notes: Vec<String>,
}

/// Fetches team aggregates, walking the eight selection shapes.
#[instrument(skip(client))]
pub async fn fetch_team_statistics(
    client: &GridClient,
    team_id: &str,
    window: TimeWindow,
) -> Result<Fetched<Option<TeamStatsSummary>>, AppError> {
    let variables = json!({
        "teamId": team_id,
        "filter": {"timeWindow": window.filter_tag()},
    });

    let mut last_reason = String::new();
    for variant in &TEAM_STATS_VARIANTS {
        let query = team_statistics_query(variant);
        match client
            .request::<TeamStatisticsData>(
                Endpoint::Statistics,
                &query,
                variables.clone(),
                Duration::from_secs(cache_ttl::STATISTICS_SECONDS),
            )
            .await
        {
            Ok(data) => {
                debug!("Team statistics selection '{}' accepted", variant.name);
                return Ok(Fetched::Ok(
                    data.team_statistics
                        .map(|payload| summarize(payload, variant.name, variant.with_segment)),
                ));
            }
            Err(error) => match unsupported_reason(&error) {
                Some(reason) => {
                    debug!(
                        "Team statistics selection '{}' rejected: {}",
                        variant.name, reason
                    );
                    last_reason = reason;
                }
                None => return Err(error),
            },
        }
    }

    Ok(Fetched::Unsupported(last_reason))
}

fn summarize(
    payload: TeamStatisticsPayload,
    selection_used: &'static str,
    had_segment: bool,
) -> TeamStatsSummary {
    let mut notes = Vec::new();

    let series = payload.series.unwrap_or_default();
    let game = payload.game.unwrap_or_default();

    let (won_count, won_percentage) = series
        .won
        .as_ref()
        .map(|w| w.win_stats())
        .unwrap_or((None, None));

    // The winRate alias carries a percentage on percent-shaped schemas and
    // a raw win count elsewhere; the ratio is derived in the latter case.
    let alias = series.win_rate.as_ref();
    let win_rate_percent = alias
        .and_then(|bucket| bucket.percentage)
        .or(won_percentage)
        .or_else(|| {
            let count = alias.and_then(|bucket| bucket.count).or(won_count)?;
            let total = series.count?;
            (total > 0.0).then(|| count / total * 100.0)
        });

    let win_count = won_count.or_else(|| alias.and_then(|bucket| bucket.count));

    let deaths_per_round = payload
        .segment
        .as_ref()
        .and_then(|segment| segment.first())
        .and_then(|stats| stats.deaths.as_ref())
        .and_then(|deaths| deaths.avg);
    if had_segment && deaths_per_round.is_none() {
        notes.push("round-level aggregates were absent from the response".to_string());
    } else if !had_segment {
        notes.push("round segment unsupported by this schema".to_string());
    }

    TeamStatsSummary {
        selection_used,
        sample_series: series.count,
        win_count,
        win_rate_percent,
        kills_avg: series.kills.as_ref().and_then(|k| k.avg),
        kills_sum: series.kills.as_ref().and_then(|k| k.sum),
        deaths_per_round,
        game_count: game.count,
        game_duration_avg: game.duration.as_ref().and_then(|d| d.avg),
        aggregation_series_ids: payload.aggregation_series_ids,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::{Value, json};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn client_for(server: &MockServer) -> GridClient {
        GridClient::new(&Config {
            api_key: "k".to_string(),
            central_url: server.uri(),
            stats_url: server.uri(),
            http_timeout_seconds: 5,
            ..Config::default()
        })
        .unwrap()
    }

    fn full_payload() -> Value {
        json!({
            "data": {
                "teamStatistics": {
                    "aggregationSeriesIds": ["s1", "s2", "s3"],
                    "series": {
                        "count": 12,
                        "won": {"count": 7, "percentage": 58.3},
                        "winRate": {"percentage": 58.3},
                        "kills": {"avg": 21.5, "sum": 258}
                    },
                    "game": {"count": 30, "duration": {"avg": 1725.0}},
                    "segment": {"deaths": {"avg": 0.64}, "kills": {"avg": 0.81}}
                }
            }
        })
    }

    #[tokio::test]
    async fn test_first_variant_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_payload()))
            .expect(1)
            .mount(&server)
            .await;

        let fetched = fetch_team_statistics(&client_for(&server), "101", TimeWindow::Last6Months)
            .await
            .unwrap();
        let summary = fetched.into_option().unwrap().unwrap();
        assert_eq!(summary.selection_used, "segment_percent_object");
        assert_eq!(summary.sample_series, Some(12.0));
        assert_eq!(summary.win_rate_percent, Some(58.3));
        assert_eq!(summary.deaths_per_round, Some(0.64));
        assert_eq!(summary.aggregation_series_ids.len(), 3);
    }

    #[tokio::test]
    async fn test_segment_rejection_falls_through_to_segmentless_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(|request: &Request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap();
                let query = body["query"].as_str().unwrap_or_default();
                if query.contains("segment(type: ROUND)") {
                    ResponseTemplate::new(200).set_body_json(json!({
                        "errors": [{"message": "Cannot query field 'segment' on type 'TeamStatistics'"}]
                    }))
                } else {
                    ResponseTemplate::new(200).set_body_json(json!({
                        "data": {
                            "teamStatistics": {
                                "series": {
                                    "count": 10,
                                    "won": {"count": 6, "percentage": 60.0},
                                    "winRate": {"percentage": 60.0}
                                }
                            }
                        }
                    }))
                }
            })
            .mount(&server)
            .await;

        let fetched = fetch_team_statistics(&client_for(&server), "101", TimeWindow::Last6Months)
            .await
            .unwrap();
        let summary = fetched.into_option().unwrap().unwrap();
        assert_eq!(summary.selection_used, "percent_object");
        assert!(summary.deaths_per_round.is_none());
        assert!(summary.notes.iter().any(|n| n.contains("segment")));
    }

    #[tokio::test]
    async fn test_all_variants_rejected_is_unsupported_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{"message": "Cannot query field 'teamStatistics'"}]
            })))
            .expect(8)
            .mount(&server)
            .await;

        let fetched = fetch_team_statistics(&client_for(&server), "101", TimeWindow::Last6Months)
            .await
            .unwrap();
        assert!(matches!(fetched, Fetched::Unsupported(ref reason) if reason.contains("teamStatistics")));
    }

    #[tokio::test]
    async fn test_auth_failure_aborts_the_walk() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let result = fetch_team_statistics(&client_for(&server), "101", TimeWindow::Last6Months).await;
        assert!(matches!(result, Err(AppError::AuthRejected { .. })));
    }

    #[test]
    fn test_win_rate_derived_from_ratio_shape() {
        let payload: TeamStatisticsPayload = serde_json::from_value(json!({
            "series": {"count": 10, "winRate": {"count": 7}}
        }))
        .unwrap();
        let summary = summarize(payload, "ratio_object", false);
        assert_eq!(summary.win_rate_percent, Some(70.0));
        assert_eq!(summary.win_count, Some(7.0));
    }

    #[test]
    fn test_missing_aggregates_stay_none_not_zero() {
        let payload: TeamStatisticsPayload =
            serde_json::from_value(json!({"series": {"count": 0}})).unwrap();
        let summary = summarize(payload, "ratio_object", false);
        assert!(summary.win_rate_percent.is_none());
        assert!(summary.kills_avg.is_none());
    }
}
