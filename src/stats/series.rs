//! End-state hydration for resolved series.

use crate::client::queries::{END_STATE_VARIANTS, Fetched, end_state_query};
use crate::client::{Endpoint, GridClient};
use crate::constants::{cache_ttl, concurrency};
use crate::error::AppError;
use crate::model::SeriesNode;
use crate::model::state::{
    NormalizedMap, NormalizedSeries, SeriesEndState, SeriesEndStateData, normalize_series,
};
use crate::stats::game::{fetch_game_rows, maps_from_game_rows};
use crate::stats::unsupported_reason;
use crate::util::concurrency::map_with_concurrency;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Fetches the finished end state of one series, walking both shapes.
/// `Ok(Fetched::Ok(None))` means the series has no end state upstream.
#[instrument(skip(client))]
pub async fn fetch_series_end_state(
    client: &GridClient,
    series_id: &str,
) -> Result<Fetched<Option<SeriesEndState>>, AppError> {
    let variables = json!({"seriesId": series_id});

    let mut last_reason = String::new();
    for variant in &END_STATE_VARIANTS {
        let query = end_state_query(variant);
        match client
            .request::<SeriesEndStateData>(
                Endpoint::Statistics,
                &query,
                variables.clone(),
                Duration::from_secs(cache_ttl::STATISTICS_SECONDS),
            )
            .await
        {
            Ok(data) => {
                debug!("End-state shape '{}' accepted for {}", variant.name, series_id);
                return Ok(Fetched::Ok(data.series_state));
            }
            Err(error) => {
                if error.is_not_found() {
                    return Ok(Fetched::Ok(None));
                }
                match unsupported_reason(&error) {
                    Some(reason) => last_reason = reason,
                    None => return Err(error),
                }
            }
        }
    }

    Ok(Fetched::Unsupported(last_reason))
}

/// Hydrates and normalizes the resolved series for the scouted team.
///
/// Per-series failures and missing end states shrink the sample and are
/// recorded as notes; they never abort the pipeline.
pub async fn collect_normalized_series(
    client: &GridClient,
    series: &[SeriesNode],
    team_id: &str,
) -> (Vec<NormalizedSeries>, Vec<String>) {
    let inputs: Vec<(String, Option<String>)> = series
        .iter()
        .map(|node| (node.id.clone(), node.start_time_scheduled.clone()))
        .collect();

    let results = map_with_concurrency(
        inputs,
        concurrency::REPORT_SERIES_FETCH,
        |(series_id, start_time)| async move {
            let outcome = fetch_series_end_state(client, &series_id).await;
            (series_id, start_time, outcome)
        },
    )
    .await;

    let mut normalized = Vec::new();
    let mut notes = Vec::new();
    let mut failures = 0usize;
    let mut missing = 0usize;
    let mut unsupported: Option<String> = None;

    for (series_id, start_time, outcome) in results {
        match outcome {
            Ok(Fetched::Ok(Some(state))) => {
                let mut record = normalize_series(&state, team_id, start_time);
                if needs_game_backfill(&record.maps) {
                    backfill_maps(client, &series_id, team_id, &mut record.maps).await;
                }
                normalized.push(record);
            }
            Ok(Fetched::Ok(None)) => {
                debug!("Series {} has no end state yet", series_id);
                missing += 1;
            }
            Ok(Fetched::Unsupported(reason)) => {
                unsupported.get_or_insert(reason);
            }
            Err(error) => {
                warn!("End state for series {} failed: {}", series_id, error);
                failures += 1;
            }
        }
    }

    if missing > 0 {
        notes.push(format!(
            "{missing} series had no finished end state and were excluded"
        ));
    }
    if failures > 0 {
        notes.push(format!(
            "{failures} series could not be hydrated and were excluded"
        ));
    }
    if let Some(reason) = unsupported {
        notes.push(format!("series end states unsupported by this schema: {reason}"));
    }

    (normalized, notes)
}

/// The lean end-state shape carries games without teams or durations, so
/// a map list with no outcomes at all is worth a per-game lookup.
fn needs_game_backfill(maps: &[NormalizedMap]) -> bool {
    maps.is_empty()
        || maps
            .iter()
            .all(|map| map.won.is_none() && map.duration_seconds.is_none())
}

/// Replaces the map list with one rebuilt from per-game rows. Failures
/// and unsupported selections leave the end-state maps in place.
async fn backfill_maps(
    client: &GridClient,
    series_id: &str,
    team_id: &str,
    maps: &mut Vec<NormalizedMap>,
) {
    match fetch_game_rows(client, series_id, team_id).await {
        Ok(Fetched::Ok(rows)) => {
            let rebuilt = maps_from_game_rows(&rows);
            if !rebuilt.is_empty() {
                debug!(
                    "Per-game rows rebuilt {} maps for series {}",
                    rebuilt.len(),
                    series_id
                );
                *maps = rebuilt;
            }
        }
        Ok(Fetched::Unsupported(reason)) => {
            debug!("Per-game rows unsupported for series {}: {}", series_id, reason);
        }
        Err(error) => {
            warn!("Per-game rows for series {} failed: {}", series_id, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::Outcome;
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

    fn listing_node(id: &str) -> SeriesNode {
        serde_json::from_value(json!({
            "id": id,
            "startTimeScheduled": "2026-08-01T12:00:00Z",
        }))
        .unwrap()
    }

    fn end_state_body(id: &str, won: bool) -> Value {
        json!({
            "data": {
                "seriesState": {
                    "id": id,
                    "finished": true,
                    "teams": [
                        {"id": "101", "name": "G2 Esports", "score": 2, "won": won},
                        {"id": "102", "name": "Fnatic", "score": 1, "won": !won},
                    ],
                    "games": [],
                }
            }
        })
    }

    #[tokio::test]
    async fn test_collect_normalizes_and_notes_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(|request: &Request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap();
                let id = body["variables"]["seriesId"].as_str().unwrap_or_default();
                match id {
                    "s1" => ResponseTemplate::new(200).set_body_json(end_state_body("s1", true)),
                    "s2" => ResponseTemplate::new(200).set_body_json(json!({
                        "errors": [{"message": "series not found"}]
                    })),
                    _ => ResponseTemplate::new(400),
                }
            })
            .mount(&server)
            .await;

        let series = vec![listing_node("s1"), listing_node("s2"), listing_node("s3")];
        let (normalized, notes) =
            collect_normalized_series(&client_for(&server), &series, "101").await;

        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].outcome, Outcome::Win);
        assert_eq!(normalized[0].opponent.as_deref(), Some("Fnatic"));
        assert_eq!(
            normalized[0].start_time.as_deref(),
            Some("2026-08-01T12:00:00Z")
        );
        // One missing end state, one hard failure.
        assert_eq!(notes.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_games_backfilled_from_per_game_rows() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(|request: &Request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap();
                let query = body["query"].as_str().unwrap_or_default();
                if query.contains("query SeriesGames") {
                    ResponseTemplate::new(200).set_body_json(json!({
                        "data": {
                            "seriesState": {
                                "id": "s1",
                                "games": [
                                    {"map": {"name": "Ascent"}, "duration": "PT30M", "teams": [
                                        {"id": "101", "score": 13, "won": true},
                                        {"id": "102", "score": 9, "won": false},
                                    ]},
                                ],
                            }
                        }
                    }))
                } else {
                    // End state without per-game detail.
                    ResponseTemplate::new(200).set_body_json(end_state_body("s1", true))
                }
            })
            .mount(&server)
            .await;

        let series = vec![listing_node("s1")];
        let (normalized, notes) =
            collect_normalized_series(&client_for(&server), &series, "101").await;

        assert!(notes.is_empty());
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].outcome, Outcome::Win);
        assert_eq!(normalized[0].maps.len(), 1);
        assert_eq!(normalized[0].maps[0].name, "Ascent");
        assert_eq!(normalized[0].maps[0].won, Some(true));
        assert_eq!(normalized[0].maps[0].duration_seconds, Some(1800.0));
    }

    #[tokio::test]
    async fn test_end_state_shape_walk() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(|request: &Request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap();
                let query = body["query"].as_str().unwrap_or_default();
                if query.contains("teams { id name score won }") {
                    // The full shape's per-game teams are rejected.
                    ResponseTemplate::new(200).set_body_json(json!({
                        "errors": [{"message": "Cannot query field 'teams' on type 'GameState'"}]
                    }))
                } else {
                    ResponseTemplate::new(200).set_body_json(end_state_body("s1", false))
                }
            })
            .mount(&server)
            .await;

        let fetched = fetch_series_end_state(&client_for(&server), "s1")
            .await
            .unwrap();
        let state = fetched.into_option().unwrap().unwrap();
        assert_eq!(state.id, "s1");
    }
}
