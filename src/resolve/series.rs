//! Recent-series discovery for a resolved team.
//!
//! Three tiers, cheapest first:
//! 1. Hydrate the series ids the statistics endpoint already aggregated
//!    over (`aggregationSeriesIds`), when enough of them exist.
//! 2. Scan the series listing with server-side team/time filters,
//!    dropping each filter client-side when this schema rejects it.
//! 3. As a last resort, bucket scanned series by participant name and
//!    fuzzy-match the buckets against the team name. Covers deployments
//!    whose listing carries names but no usable team ids.

use crate::client::queries::{
    SERIES_BY_ID_VARIANTS, SERIES_LIST_VARIANTS, SeriesListVariant, series_by_id_query,
    series_list_query,
};
use crate::client::{Endpoint, GridClient};
use crate::constants::{cache_ttl, concurrency, matching, paging};
use crate::error::AppError;
use crate::model::central::{AllSeriesData, SeriesByIdData};
use crate::model::{SeriesNode, Team};
use crate::resolve::matching::{normalize_name, score_names};
use crate::util::concurrency::map_with_concurrency;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// How far back series discovery looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    LastMonth,
    Last3Months,
    #[default]
    Last6Months,
}

impl TimeWindow {
    pub fn days(self) -> i64 {
        match self {
            TimeWindow::LastMonth => 30,
            TimeWindow::Last3Months => 90,
            TimeWindow::Last6Months => 180,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::LastMonth => "last month",
            TimeWindow::Last3Months => "last 3 months",
            TimeWindow::Last6Months => "last 6 months",
        }
    }

    /// Enum tag used by the statistics endpoint's `timeWindow` filter.
    pub fn filter_tag(self) -> &'static str {
        match self {
            TimeWindow::LastMonth => "LAST_MONTH",
            TimeWindow::Last3Months => "LAST_3_MONTHS",
            TimeWindow::Last6Months => "LAST_6_MONTHS",
        }
    }

    fn started_after_millis(self) -> i64 {
        (Utc::now() - ChronoDuration::days(self.days())).timestamp_millis()
    }

    fn started_after_rfc3339(self) -> String {
        (Utc::now() - ChronoDuration::days(self.days()))
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }
}

/// Discovery result plus the notes and strategy the report surfaces.
#[derive(Debug)]
pub struct SeriesResolution {
    pub series: Vec<SeriesNode>,
    pub notes: Vec<String>,
    pub strategy: &'static str,
}

/// Looks up a single series, walking the two roster shapes. `Ok(None)`
/// means the id genuinely does not exist upstream.
pub async fn fetch_series_by_id(
    client: &GridClient,
    series_id: &str,
) -> Result<Option<SeriesNode>, AppError> {
    for variant in &SERIES_BY_ID_VARIANTS {
        let query = series_by_id_query(variant);
        match client
            .request::<SeriesByIdData>(
                Endpoint::Central,
                &query,
                json!({"id": series_id}),
                Duration::from_secs(cache_ttl::SERIES_BY_ID_SECONDS),
            )
            .await
        {
            Ok(data) => return Ok(data.series),
            Err(error) => {
                let shape_rejected = error.graphql_errors().is_some_and(|errors| {
                    errors
                        .iter()
                        .any(|e| e.is_field_not_found() || e.is_player_base_info_missing())
                });
                if shape_rejected {
                    debug!("Series lookup shape '{}' unsupported, trying next", variant.name);
                    continue;
                }
                if error.is_not_found() {
                    return Ok(None);
                }
                return Err(error);
            }
        }
    }
    Err(AppError::schema_validation(
        "series lookup",
        "no supported query shape for single-series lookup",
    ))
}

/// Resolves the team's most recent `last_n` series within the window.
#[instrument(skip(client, aggregation_ids), fields(team = %team.name))]
pub async fn resolve_recent_series(
    client: &GridClient,
    team: &Team,
    title_id: &str,
    last_n: usize,
    window: TimeWindow,
    aggregation_ids: &[String],
) -> Result<SeriesResolution, AppError> {
    let mut notes = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut collected: Vec<SeriesNode> = Vec::new();
    let mut strategy = "scan";

    if aggregation_ids.len() >= last_n {
        let hydrated = hydrate_series_ids(client, aggregation_ids, last_n, &mut notes).await;
        for series in hydrated {
            if seen.insert(series.id.clone()) {
                collected.push(series);
            }
        }
        if collected.len() >= last_n {
            strategy = "aggregation_ids";
            return Ok(finish(collected, last_n, notes, strategy));
        }
        strategy = "aggregation_ids+scan";
    }

    let mut name_bucket_pool: Vec<SeriesNode> = Vec::new();
    scan_series(
        client,
        team,
        title_id,
        last_n,
        window,
        &mut seen,
        &mut collected,
        &mut name_bucket_pool,
        &mut notes,
    )
    .await?;

    if collected.len() < last_n && !name_bucket_pool.is_empty() {
        let bucketed = best_name_bucket(&team.name, name_bucket_pool, last_n);
        if !bucketed.is_empty() {
            notes.push(
                "series matched by participant name because team ids were unavailable in the listing"
                    .to_string(),
            );
            strategy = "name_match";
            for series in bucketed {
                if seen.insert(series.id.clone()) {
                    collected.push(series);
                }
            }
        }
    }

    Ok(finish(collected, last_n, notes, strategy))
}

fn finish(
    mut collected: Vec<SeriesNode>,
    last_n: usize,
    notes: Vec<String>,
    strategy: &'static str,
) -> SeriesResolution {
    collected.sort_by_key(|series| std::cmp::Reverse(series.sort_timestamp()));
    collected.truncate(last_n);
    SeriesResolution {
        series: collected,
        notes,
        strategy,
    }
}

async fn hydrate_series_ids(
    client: &GridClient,
    ids: &[String],
    last_n: usize,
    notes: &mut Vec<String>,
) -> Vec<SeriesNode> {
    let take = (last_n * 2).min(ids.len());
    let ids: Vec<String> = ids[..take].to_vec();

    let results = map_with_concurrency(ids, concurrency::SERIES_FETCH, |id| async move {
        (id.clone(), fetch_series_by_id(client, &id).await)
    })
    .await;

    let mut hydrated = Vec::new();
    let mut failures = 0usize;
    for (id, result) in results {
        match result {
            Ok(Some(series)) => hydrated.push(series),
            Ok(None) => debug!("Aggregated series id {} no longer resolvable", id),
            Err(error) => {
                warn!("Hydrating series {} failed: {}", id, error);
                failures += 1;
            }
        }
    }
    if failures > 0 {
        notes.push(format!(
            "{failures} aggregated series could not be hydrated and were skipped"
        ));
    }
    hydrated
}

#[allow(clippy::too_many_arguments)]
async fn scan_series(
    client: &GridClient,
    team: &Team,
    title_id: &str,
    last_n: usize,
    window: TimeWindow,
    seen: &mut HashSet<String>,
    collected: &mut Vec<SeriesNode>,
    name_bucket_pool: &mut Vec<SeriesNode>,
    notes: &mut Vec<String>,
) -> Result<(), AppError> {
    let mut variant = &SERIES_LIST_VARIANTS[0];
    let mut cursor: Option<String> = None;
    let window_start_millis = window.started_after_millis();
    let started_after = window.started_after_rfc3339();

    let mut pages = 0;
    while pages < paging::SERIES_SCAN_PAGE_CAP {
        let first_page = cursor.is_none();
        let query = series_list_query(variant);
        let mut variables = json!({
            "first": paging::PAGE_SIZE,
            "after": cursor,
            "titleIds": [title_id],
        });
        if variant.with_team_filter {
            variables["teamIds"] = json!([team.id]);
        }
        if variant.with_time_filter {
            variables["startedAfter"] = json!(started_after);
        }

        let page: AllSeriesData = match client
            .request(
                Endpoint::Central,
                &query,
                variables,
                Duration::from_secs(cache_ttl::SERIES_LIST_SECONDS),
            )
            .await
        {
            Ok(page) => page,
            Err(error) => {
                if let Some(downgraded) = downgrade_variant(variant, &error) {
                    notes.push(format!(
                        "series listing filter unsupported upstream, continued with '{}' shape",
                        downgraded.name
                    ));
                    variant = downgraded;
                    cursor = None;
                    pages += 1;
                    continue;
                }
                return Err(error);
            }
        };

        pages += 1;

        // Some deployments return an empty listing instead of rejecting a
        // filter they do not support. An empty first page with filters on
        // gets the same treatment: drop the team filter, then the time
        // filter, and rescan.
        if first_page
            && page.all_series.edges.is_empty()
            && (variant.with_team_filter || variant.with_time_filter)
        {
            let want_time = variant.with_team_filter && variant.with_time_filter;
            if let Some(downgraded) = SERIES_LIST_VARIANTS
                .iter()
                .find(|v| !v.with_team_filter && v.with_time_filter == want_time)
            {
                debug!(
                    "Series listing empty under '{}' filters, retrying as '{}'",
                    variant.name, downgraded.name
                );
                variant = downgraded;
                cursor = None;
                continue;
            }
        }

        let page_info = page.all_series.page_info.clone();
        let mut past_window = false;

        for node in page.all_series.nodes() {
            // Listing is ordered by scheduled start descending, so the
            // first series older than the window ends the scan.
            if !variant.with_time_filter {
                let ts = node.sort_timestamp();
                if ts > 0 && ts < window_start_millis {
                    past_window = true;
                    break;
                }
            }

            let accepted = if variant.with_team_filter {
                Some(node)
            } else if node.teams.is_empty() {
                // Some listings omit participants entirely; a single-series
                // lookup is the only way to check membership.
                match fetch_series_by_id(client, &node.id).await? {
                    Some(full) if full.involves_team(&team.id) => Some(full),
                    _ => None,
                }
            } else if node.involves_team(&team.id) {
                Some(node)
            } else {
                name_bucket_pool.push(node);
                None
            };

            if let Some(series) = accepted
                && seen.insert(series.id.clone())
            {
                collected.push(series);
            }
        }

        if collected.len() >= last_n || past_window || !page_info.has_next_page {
            break;
        }
        cursor = page_info.end_cursor;
    }

    Ok(())
}

/// Maps a rejected filter to the next listing shape, or `None` when the
/// error is not a filter-support problem.
fn downgrade_variant(
    current: &SeriesListVariant,
    error: &AppError,
) -> Option<&'static SeriesListVariant> {
    let errors = error.graphql_errors()?;

    let team_rejected =
        current.with_team_filter && errors.iter().any(|e| e.is_unsupported_team_id_filter());
    let time_rejected =
        current.with_time_filter && errors.iter().any(|e| e.is_unsupported_start_time_filter());

    let (want_team, want_time) = if time_rejected {
        (current.with_team_filter && !team_rejected, false)
    } else if team_rejected {
        (false, current.with_time_filter)
    } else {
        return None;
    };

    SERIES_LIST_VARIANTS
        .iter()
        .find(|v| v.with_team_filter == want_team && v.with_time_filter == want_time)
}

/// Groups candidate series by participant name, scores each name against
/// the team name, and returns the best-scoring bucket. Ties break toward
/// the larger bucket; buckets below the acceptance threshold are ignored.
fn best_name_bucket(team_name: &str, pool: Vec<SeriesNode>, last_n: usize) -> Vec<SeriesNode> {
    let query = normalize_name(team_name);
    let mut buckets: HashMap<String, (f64, Vec<usize>)> = HashMap::new();

    for (index, series) in pool.iter().enumerate() {
        for name in series.team_names() {
            let normalized = normalize_name(name);
            if normalized.is_empty() {
                continue;
            }
            let entry = buckets
                .entry(normalized.clone())
                .or_insert_with(|| (score_names(&query, &normalized), Vec::new()));
            entry.1.push(index);
        }
    }

    let mut best: Option<(f64, usize, String)> = None;
    for (name, (score, indexes)) in &buckets {
        if *score < matching::ACCEPT_THRESHOLD {
            continue;
        }
        let candidate = (*score, indexes.len(), name.clone());
        let better = match &best {
            None => true,
            Some((best_score, best_size, _)) => {
                *score > *best_score || (*score == *best_score && indexes.len() > *best_size)
            }
        };
        if better {
            best = Some(candidate);
        }
        // A near-exact bucket with enough series is unambiguous.
        if *score >= matching::EARLY_STOP_SCORE && indexes.len() >= last_n {
            best = Some((*score, indexes.len(), name.clone()));
            break;
        }
    }

    let Some((_, _, winner)) = best else {
        return Vec::new();
    };
    let indexes: HashSet<usize> = buckets.remove(&winner).map(|(_, i)| i.into_iter().collect()).unwrap_or_default();
    pool.into_iter()
        .enumerate()
        .filter_map(|(index, series)| indexes.contains(&index).then_some(series))
        .collect()
}
