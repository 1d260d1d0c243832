//! Team resolution: paged directory scan with fuzzy name matching.

use crate::client::queries::{TEAMS_FILTERED_QUERY, TEAMS_UNFILTERED_QUERY};
use crate::client::{Endpoint, GridClient};
use crate::constants::{cache_ttl, matching, paging};
use crate::error::AppError;
use crate::model::Team;
use crate::model::central::TeamsData;
use crate::resolve::matching::{BestMatch, normalize_name, score_names};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// A resolved team plus the score that selected it, so callers can flag
/// fuzzy (non-exact) resolutions in data-quality notes.
#[derive(Debug, Clone)]
pub struct ResolvedTeam {
    pub team: Team,
    pub score: f64,
}

impl ResolvedTeam {
    pub fn is_exact(&self) -> bool {
        self.score >= 1.0
    }
}

/// Resolves a user-supplied team name within a title.
///
/// Pages through the directory up to the scan cap. An exact normalized
/// match on the full or shortened name returns immediately without
/// finishing the scan; otherwise the best fuzzy candidate (scored over
/// both name fields) above the acceptance threshold wins. The
/// title-scoped filter is dropped mid-scan if this schema rejects it.
#[instrument(skip(client))]
pub async fn resolve_team(
    client: &GridClient,
    title_id: &str,
    name: &str,
) -> Result<ResolvedTeam, AppError> {
    let query_name = normalize_name(name);
    if query_name.is_empty() {
        return Err(AppError::team_not_found(name));
    }

    let mut use_filter = true;
    let mut cursor: Option<String> = None;
    let mut best = BestMatch::new();

    let mut pages = 0;
    while pages < paging::TEAM_SCAN_PAGE_CAP {
        let (document, variables) = if use_filter {
            (
                TEAMS_FILTERED_QUERY,
                json!({
                    "first": paging::PAGE_SIZE,
                    "after": cursor,
                    "filter": {"titleId": title_id},
                }),
            )
        } else {
            (
                TEAMS_UNFILTERED_QUERY,
                json!({"first": paging::PAGE_SIZE, "after": cursor}),
            )
        };

        let page: TeamsData = match client
            .request(
                Endpoint::Central,
                document,
                variables,
                Duration::from_secs(cache_ttl::TEAMS_SECONDS),
            )
            .await
        {
            Ok(page) => page,
            Err(error) => {
                let filter_rejected = use_filter
                    && error
                        .graphql_errors()
                        .is_some_and(|errors| {
                            errors.iter().any(|e| e.is_unsupported_team_directory_filter())
                        });
                if filter_rejected {
                    warn!("Team directory filter unsupported, rescanning unfiltered");
                    use_filter = false;
                    cursor = None;
                    pages += 1;
                    continue;
                }
                return Err(error);
            }
        };

        pages += 1;
        let page_info = page.teams.page_info.clone();

        for team in page.teams.nodes() {
            let full = normalize_name(&team.name);
            let short = team
                .name_shortened
                .as_deref()
                .map(normalize_name)
                .unwrap_or_default();

            if full == query_name || (!short.is_empty() && short == query_name) {
                debug!("Exact team match: {} -> {} ({})", name, team.name, team.id);
                return Ok(ResolvedTeam { team, score: 1.0 });
            }

            let score = score_names(&query_name, &full).max(if short.is_empty() {
                0.0
            } else {
                score_names(&query_name, &short)
            });
            best.consider(score, team);
        }

        if !page_info.has_next_page {
            break;
        }
        cursor = page_info.end_cursor;
    }

    let score = best.score;
    best.accept(matching::ACCEPT_THRESHOLD)
        .map(|team| {
            debug!("Fuzzy team match: {} -> {} (score {:.2})", name, team.name, score);
            ResolvedTeam { team, score }
        })
        .ok_or_else(|| AppError::team_not_found(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::{Value, json};
    use wiremock::matchers::{body_partial_json, method};
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

    fn teams_page(teams: &[(&str, &str)], has_next: bool) -> Value {
        json!({
            "data": {
                "teams": {
                    "totalCount": teams.len(),
                    "pageInfo": {"hasNextPage": has_next, "endCursor": if has_next { Some("next") } else { None }},
                    "edges": teams.iter().map(|(id, name)| json!({"node": {"id": id, "name": name}})).collect::<Vec<_>>(),
                }
            }
        })
    }

    #[tokio::test]
    async fn test_exact_match_short_circuits_pagination() {
        let server = MockServer::start().await;
        // Page 1 contains the exact match; a second page must never be asked for.
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(teams_page(
                &[("100", "Cloud9"), ("101", "G2 Esports")],
                true,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let resolved = resolve_team(&client_for(&server), "6", "g2 esports")
            .await
            .unwrap();
        assert_eq!(resolved.team.id, "101");
        assert!(resolved.is_exact());
    }

    #[tokio::test]
    async fn test_exact_shortened_name_match_resolves() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "teams": {
                        "totalCount": 2,
                        "pageInfo": {"hasNextPage": false, "endCursor": null},
                        "edges": [
                            {"node": {"id": "100", "name": "Cloud9", "nameShortened": "C9"}},
                            {"node": {"id": "55", "name": "Team Liquid", "nameShortened": "TL"}},
                        ],
                    }
                }
            })))
            .mount(&server)
            .await;

        let resolved = resolve_team(&client_for(&server), "6", "TL").await.unwrap();
        assert_eq!(resolved.team.id, "55");
        assert_eq!(resolved.team.name, "Team Liquid");
        assert!(resolved.is_exact());
    }

    #[tokio::test]
    async fn test_fuzzy_match_scans_all_pages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"variables": {"after": "next"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(teams_page(
                &[("102", "Fnatic")],
                false,
            )))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(teams_page(
                &[("100", "Cloud9")],
                true,
            )))
            .mount(&server)
            .await;

        let resolved = resolve_team(&client_for(&server), "6", "fnatik")
            .await
            .unwrap();
        assert_eq!(resolved.team.id, "102");
        assert!(!resolved.is_exact());
    }

    #[tokio::test]
    async fn test_no_candidate_above_threshold_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(teams_page(
                &[("100", "Cloud9"), ("102", "Fnatic")],
                false,
            )))
            .mount(&server)
            .await;

        let result = resolve_team(&client_for(&server), "6", "Sentinels").await;
        assert!(matches!(result, Err(AppError::TeamNotFound { .. })));
    }

    #[tokio::test]
    async fn test_unsupported_filter_downgrades_to_unfiltered_scan() {
        let server = MockServer::start().await;
        // Filtered query rejected, unfiltered succeeds.
        let rejection = json!({
            "errors": [{"message": "Unknown argument 'filter' on field 'teams'"}]
        });
        Mock::given(method("POST"))
            .respond_with(move |request: &Request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap();
                let query = body["query"].as_str().unwrap_or_default();
                if query.contains("$filter") {
                    ResponseTemplate::new(200).set_body_json(rejection.clone())
                } else {
                    ResponseTemplate::new(200).set_body_json(teams_page(
                        &[("101", "G2 Esports")],
                        false,
                    ))
                }
            })
            .mount(&server)
            .await;

        let resolved = resolve_team(&client_for(&server), "6", "G2 Esports")
            .await
            .unwrap();
        assert_eq!(resolved.team.id, "101");
    }
}
