//! HTTP transport for the GRID-style GraphQL endpoints.
//!
//! One client instance owns the HTTP connection pool, the response cache,
//! and the retry/backoff policy. All higher layers go through
//! [`GridClient::request`]; none of them see HTTP status codes or raw
//! envelopes.

use crate::client::cache::ResponseCache;
use crate::client::graphql::{GraphqlErrorItem, operation_name, sanitize_variables};
use crate::config::Config;
use crate::constants::{HTTP_POOL_MAX_IDLE_PER_HOST, retry};
use crate::error::AppError;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// The two GraphQL services the pipeline talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Directory data: titles, teams, series listings.
    Central,
    /// Aggregated statistics: team/player/game/draft numbers.
    Statistics,
}

impl Endpoint {
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Central => "central",
            Endpoint::Statistics => "statistics",
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphqlErrorItem>>,
}

/// GraphQL client for the central-data and statistics endpoints.
pub struct GridClient {
    http: Client,
    api_key: String,
    central_url: String,
    stats_url: String,
    cache: Arc<ResponseCache>,
}

impl GridClient {
    /// Creates a client with its own response cache.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Self::with_cache(config, Arc::new(ResponseCache::new()))
    }

    /// Creates a client sharing an externally owned response cache. Lets
    /// multiple report runs in one process reuse directory lookups.
    pub fn with_cache(config: &Config, cache: Arc<ResponseCache>) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .pool_max_idle_per_host(HTTP_POOL_MAX_IDLE_PER_HOST)
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            central_url: config.central_url.clone(),
            stats_url: config.stats_url.clone(),
            cache,
        })
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Central => &self.central_url,
            Endpoint::Statistics => &self.stats_url,
        }
    }

    /// Executes a GraphQL request with caching and the default retry budget.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &str,
        variables: Value,
        cache_ttl: Duration,
    ) -> Result<T, AppError> {
        self.request_with_retries(endpoint, query, variables, cache_ttl, retry::DEFAULT_RETRIES)
            .await
    }

    /// Executes a GraphQL request with an explicit retry budget.
    ///
    /// `retries` is the number of re-attempts after the first request, so
    /// the total attempt count is `retries + 1`. Successful payloads are
    /// cached under `endpoint:query:variables` for `cache_ttl`.
    #[instrument(skip(self, query, variables), fields(endpoint = endpoint.name()))]
    pub async fn request_with_retries<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &str,
        variables: Value,
        cache_ttl: Duration,
        retries: u32,
    ) -> Result<T, AppError> {
        if self.api_key.is_empty() {
            return Err(AppError::MissingApiKey);
        }

        let variables = sanitize_variables(variables);
        let cache_key = ResponseCache::key(endpoint.name(), query, &variables);

        if let Some(cached) = self.cache.get(&cache_key).await {
            debug!("Cache hit for {}", endpoint.name());
            return Ok(serde_json::from_value(cached)?);
        }

        let operation = operation_name(query);
        let mut last_error = AppError::RequestFailed {
            status: None,
            message: "request was never attempted".to_string(),
        };

        for attempt in 0..=retries {
            match self.execute_once(endpoint, query, &variables, &operation).await {
                Ok(data) => {
                    self.cache
                        .insert(cache_key, data.clone(), cache_ttl)
                        .await;
                    return Ok(serde_json::from_value(data)?);
                }
                Err(error) => {
                    if !error.is_retryable() || attempt == retries {
                        return Err(error);
                    }
                    let delay = backoff_delay(&error, attempt);
                    warn!(
                        "Attempt {}/{} for {:?} failed ({}), retrying in {:?}",
                        attempt + 1,
                        retries + 1,
                        operation,
                        error,
                        delay
                    );
                    last_error = error;
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(last_error)
    }

    async fn execute_once(
        &self,
        endpoint: Endpoint,
        query: &str,
        variables: &Value,
        operation: &Option<String>,
    ) -> Result<Value, AppError> {
        let response = self
            .http
            .post(self.endpoint_url(endpoint))
            .header("x-api-key", &self.api_key)
            .json(&serde_json::json!({
                "query": query,
                "variables": variables,
            }))
            .send()
            .await?;

        let status = response.status();

        if status.as_u16() == 401 || status.as_u16() == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::AuthRejected {
                status: status.as_u16(),
                body,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RequestFailed {
                status: Some(status.as_u16()),
                message: truncate_body(&body),
            });
        }

        let envelope: GraphqlEnvelope = response.json().await?;

        // Errors win even when partial data is present; partial payloads
        // have produced misleading aggregates downstream.
        if let Some(errors) = envelope.errors
            && !errors.is_empty()
        {
            return Err(AppError::Graphql {
                endpoint: endpoint.name().to_string(),
                operation: operation.clone(),
                errors,
            });
        }

        match envelope.data {
            Some(data) if !data.is_null() => Ok(data),
            _ => Err(AppError::RequestFailed {
                status: Some(status.as_u16()),
                message: "GraphQL response carried neither data nor errors".to_string(),
            }),
        }
    }
}

/// Computes the backoff delay before re-attempt `attempt + 1`.
///
/// Rate-limit-classified failures back off from a higher base with a
/// multiplier; everything else uses the plain base. Delay scales linearly
/// with the attempt index and carries random jitter to avoid thundering
/// retries from concurrent lookups.
fn backoff_delay(error: &AppError, attempt: u32) -> Duration {
    let base = if error.is_rate_limit() {
        retry::RATE_LIMIT_BASE_DELAY_MS * retry::RATE_LIMIT_MULTIPLIER
    } else {
        retry::BASE_DELAY_MS
    };
    let jitter = rand::rng().random_range(0..=retry::JITTER_MAX_MS);
    Duration::from_millis(base * u64::from(attempt + 1) + jitter)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 300;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &body[..end])
    }
}
