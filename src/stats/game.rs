//! Per-game rows and draft actions for a single series.

use crate::client::queries::{
    DRAFT_SELECTIONS, Fetched, GAME_STATS_SELECTIONS, draft_actions_query, game_statistics_query,
};
use crate::client::{Endpoint, GridClient};
use crate::constants::cache_ttl;
use crate::error::AppError;
use crate::model::state::{NormalizedMap, SeriesEndStateData, parse_duration_seconds};
use crate::stats::unsupported_reason;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

/// One game of a series, projected onto the scouted team.
#[derive(Debug, Clone)]
pub struct GameRow {
    pub map_name: Option<String>,
    pub duration_seconds: Option<f64>,
    pub team_score: Option<f64>,
    pub opponent_score: Option<f64>,
    pub won: Option<bool>,
}

/// Fetches the per-game breakdown for a series, walking the six
/// selection shapes richest-first.
#[instrument(skip(client))]
pub async fn fetch_game_rows(
    client: &GridClient,
    series_id: &str,
    team_id: &str,
) -> Result<Fetched<Vec<GameRow>>, AppError> {
    let variables = json!({"seriesId": series_id});

    let mut last_reason = String::new();
    for (name, selection) in &GAME_STATS_SELECTIONS {
        let query = game_statistics_query(selection);
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
                debug!("Game selection '{}' accepted for series {}", name, series_id);
                let rows = data
                    .series_state
                    .map(|state| {
                        state
                            .games
                            .iter()
                            .map(|game| {
                                let ours =
                                    game.teams.iter().find(|team| team.id == team_id);
                                let theirs =
                                    game.teams.iter().find(|team| team.id != team_id);
                                GameRow {
                                    map_name: game.map.as_ref().and_then(|m| m.name.clone()),
                                    duration_seconds: game
                                        .duration
                                        .as_ref()
                                        .and_then(parse_duration_seconds),
                                    team_score: ours.and_then(|t| t.score),
                                    opponent_score: theirs.and_then(|t| t.score),
                                    won: ours.and_then(|t| t.won),
                                }
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                return Ok(Fetched::Ok(rows));
            }
            Err(error) => match unsupported_reason(&error) {
                Some(reason) => last_reason = reason,
                None => return Err(error),
            },
        }
    }

    Ok(Fetched::Unsupported(last_reason))
}

/// Projects game rows into the per-map records the metrics aggregator
/// consumes. Rows without a map name carry nothing attributable and are
/// dropped; a missing win flag falls back to the score comparison.
pub fn maps_from_game_rows(rows: &[GameRow]) -> Vec<NormalizedMap> {
    rows.iter()
        .filter_map(|row| {
            let name = row.map_name.clone()?;
            let won = row.won.or(match (row.team_score, row.opponent_score) {
                (Some(ours), Some(theirs)) if ours != theirs => Some(ours > theirs),
                _ => None,
            });
            Some(NormalizedMap {
                name,
                won,
                duration_seconds: row.duration_seconds,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftData {
    series_state: Option<DraftSeries>,
}

#[derive(Debug, Deserialize)]
struct DraftSeries {
    #[serde(default = "Vec::new")]
    games: Vec<DraftGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftGame {
    #[serde(default = "Vec::new")]
    draft_actions: Vec<DraftAction>,
}

/// A single pick or ban from the series draft.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftAction {
    #[serde(rename = "type", default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub sequence_number: Option<i64>,
    #[serde(default)]
    pub draftable: Option<Draftable>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Draftable {
    #[serde(rename = "type", default)]
    pub draftable_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Fetches the draft actions for a series across all its games, walking
/// the four selection shapes.
#[instrument(skip(client))]
pub async fn fetch_draft_actions(
    client: &GridClient,
    series_id: &str,
) -> Result<Fetched<Vec<DraftAction>>, AppError> {
    let variables = json!({"seriesId": series_id});

    let mut last_reason = String::new();
    for (name, selection) in &DRAFT_SELECTIONS {
        let query = draft_actions_query(selection);
        match client
            .request::<DraftData>(
                Endpoint::Statistics,
                &query,
                variables.clone(),
                Duration::from_secs(cache_ttl::STATISTICS_SECONDS),
            )
            .await
        {
            Ok(data) => {
                debug!("Draft selection '{}' accepted for series {}", name, series_id);
                let actions = data
                    .series_state
                    .map(|state| {
                        state
                            .games
                            .into_iter()
                            .flat_map(|game| game.draft_actions)
                            .collect()
                    })
                    .unwrap_or_default();
                return Ok(Fetched::Ok(actions));
            }
            Err(error) => match unsupported_reason(&error) {
                Some(reason) => last_reason = reason,
                None => return Err(error),
            },
        }
    }

    Ok(Fetched::Unsupported(last_reason))
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

    #[tokio::test]
    async fn test_game_rows_projected_onto_team() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "seriesState": {
                        "id": "s1",
                        "games": [
                            {
                                "map": {"name": "Ascent"},
                                "duration": "PT32M10S",
                                "teams": [
                                    {"id": "101", "score": 13, "won": true},
                                    {"id": "102", "score": 7, "won": false},
                                ],
                            },
                            {
                                "map": {"name": "Bind"},
                                "teams": [
                                    {"id": "101", "score": 9},
                                    {"id": "102", "score": 13},
                                ],
                            },
                        ],
                    }
                }
            })))
            .mount(&server)
            .await;

        let rows = fetch_game_rows(&client_for(&server), "s1", "101")
            .await
            .unwrap()
            .into_option()
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].map_name.as_deref(), Some("Ascent"));
        assert_eq!(rows[0].duration_seconds, Some(1930.0));
        assert_eq!(rows[0].won, Some(true));
        assert_eq!(rows[1].team_score, Some(9.0));
        assert_eq!(rows[1].won, None);
    }

    #[test]
    fn test_maps_from_game_rows_projects_and_drops_nameless() {
        let rows = vec![
            GameRow {
                map_name: Some("Ascent".to_string()),
                duration_seconds: Some(1930.0),
                team_score: Some(13.0),
                opponent_score: Some(7.0),
                won: Some(true),
            },
            GameRow {
                map_name: Some("Bind".to_string()),
                duration_seconds: None,
                team_score: Some(9.0),
                opponent_score: Some(13.0),
                won: None,
            },
            GameRow {
                map_name: None,
                duration_seconds: Some(100.0),
                team_score: None,
                opponent_score: None,
                won: Some(true),
            },
        ];

        let maps = maps_from_game_rows(&rows);
        assert_eq!(maps.len(), 2);
        assert_eq!(maps[0].name, "Ascent");
        assert_eq!(maps[0].won, Some(true));
        assert_eq!(maps[0].duration_seconds, Some(1930.0));
        // Win flag absent, decided by score comparison.
        assert_eq!(maps[1].won, Some(false));
    }

    #[tokio::test]
    async fn test_draft_selection_walk_flattens_games() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(|request: &Request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap();
                let query = body["query"].as_str().unwrap_or_default();
                if query.contains("drafter") {
                    ResponseTemplate::new(200).set_body_json(json!({
                        "errors": [{"message": "Cannot query field 'drafter'"}]
                    }))
                } else {
                    ResponseTemplate::new(200).set_body_json(json!({
                        "data": {
                            "seriesState": {
                                "games": [
                                    {"draftActions": [
                                        {"type": "ban", "sequenceNumber": 1, "draftable": {"name": "Icebox"}},
                                    ]},
                                    {"draftActions": [
                                        {"type": "pick", "sequenceNumber": 2, "draftable": {"name": "Ascent"}},
                                    ]},
                                ],
                            }
                        }
                    }))
                }
            })
            .mount(&server)
            .await;

        let actions = fetch_draft_actions(&client_for(&server), "s1")
            .await
            .unwrap()
            .into_option()
            .unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].action_type.as_deref(), Some("ban"));
        assert_eq!(
            actions[1].draftable.as_ref().unwrap().name.as_deref(),
            Some("Ascent")
        );
    }

    #[tokio::test]
    async fn test_draft_unsupported_everywhere() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{"message": "Cannot query field 'draftActions'"}]
            })))
            .expect(4)
            .mount(&server)
            .await;

        let fetched = fetch_draft_actions(&client_for(&server), "s1").await.unwrap();
        assert!(matches!(fetched, Fetched::Unsupported(_)));
    }
}
