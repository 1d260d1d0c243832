//! Application-wide constants and configuration values
//!
//! This module centralizes all magic numbers and tuning knobs
//! to improve maintainability and make the codebase more configurable.

#![allow(dead_code)]

/// Default timeout for HTTP requests in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Maximum number of connections per host in the HTTP client pool
pub const HTTP_POOL_MAX_IDLE_PER_HOST: usize = 100;

/// Wall-clock timeout for a single narrative-generation call in seconds
pub const NARRATIVE_TIMEOUT_SECONDS: u64 = 30;

/// Cache TTL (Time To Live) values in seconds
pub mod cache_ttl {
    /// TTL for the titles directory (reference data, changes rarely)
    pub const TITLES_SECONDS: u64 = 12 * 60 * 60;

    /// TTL for team directory pages
    pub const TEAMS_SECONDS: u64 = 5 * 60;

    /// TTL for series listing pages (recency matters here)
    pub const SERIES_LIST_SECONDS: u64 = 60;

    /// TTL for individual series lookups
    pub const SERIES_BY_ID_SECONDS: u64 = 10 * 60;

    /// TTL for statistics aggregates (team/player/game/draft)
    pub const STATISTICS_SECONDS: u64 = 5 * 60;
}

/// Maximum number of entries in the shared GraphQL response cache
pub const RESPONSE_CACHE_CAPACITY: usize = 250;

/// Retry and backoff configuration for the transport client
pub mod retry {
    /// Default attempt budget beyond the initial request
    pub const DEFAULT_RETRIES: u32 = 2;

    /// Base backoff delay for transient failures (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Base backoff delay for rate-limit-classified failures (milliseconds)
    pub const RATE_LIMIT_BASE_DELAY_MS: u64 = 1500;

    /// Backoff multiplier applied to rate-limit-classified failures
    pub const RATE_LIMIT_MULTIPLIER: u64 = 2;

    /// Upper bound for random backoff jitter (milliseconds)
    pub const JITTER_MAX_MS: u64 = 250;
}

/// Pagination limits for directory and series scans
pub mod paging {
    /// Page size requested from connection-style queries
    pub const PAGE_SIZE: i64 = 50;

    /// Maximum pages scanned while resolving a team name
    pub const TEAM_SCAN_PAGE_CAP: u32 = 20;

    /// Maximum pages scanned while discovering series
    pub const SERIES_SCAN_PAGE_CAP: u32 = 8;
}

/// Bounded-concurrency limits for batch hydration
pub mod concurrency {
    /// In-flight per-series lookups during hydration
    pub const SERIES_FETCH: usize = 2;

    /// In-flight per-series lookups while building the report body
    pub const REPORT_SERIES_FETCH: usize = 3;

    /// In-flight per-player statistics lookups
    pub const PLAYER_STATS_FETCH: usize = 4;
}

/// Fuzzy matching thresholds for team-name resolution
pub mod matching {
    /// Score assigned when one normalized name contains the other
    pub const SUBSTRING_SCORE: f64 = 0.92;

    /// Minimum Levenshtein similarity accepted as a match
    pub const ACCEPT_THRESHOLD: f64 = 0.78;

    /// Score above which a name-based series bucket may stop the scan early
    pub const EARLY_STOP_SCORE: f64 = 0.9;
}

/// Threshold rules for the team archetype classification.
/// Win rates are percentages, kills are per series, deaths are per round.
pub mod archetype {
    pub const JUGGERNAUT_WIN_RATE: f64 = 65.0;
    pub const JUGGERNAUT_KILLS: f64 = 18.0;

    pub const IRON_WALL_WIN_RATE: f64 = 55.0;
    pub const IRON_WALL_DEATHS_PER_ROUND: f64 = 0.7;

    pub const GLASS_CANNON_KILLS: f64 = 20.0;
    pub const GLASS_CANNON_WIN_RATE: f64 = 50.0;

    pub const UNDERDOG_WIN_RATE: f64 = 40.0;
}

/// Cutoffs used by the insight heuristics
pub mod insight {
    /// Map sample size below which win rates are considered noisy
    pub const RELIABLE_MAP_SAMPLE: usize = 2;

    /// Map sample size required before recommending a map target
    pub const MAP_TARGET_SAMPLE: f64 = 3.0;

    /// Number of recent-form entries rendered in the compact string
    pub const RECENT_FORM_WINDOW: usize = 5;

    /// Win-rate percentage below which inconsistency is flagged
    pub const LOW_WIN_RATE: f64 = 45.0;

    /// Deaths per round above which tempo punishes are suggested
    pub const HIGH_DEATHS_PER_ROUND: f64 = 1.1;

    /// Kills per series below which early-fight denial is suggested
    pub const LOW_KILLS_PER_SERIES: f64 = 20.0;

    /// Average game duration (seconds) under which tempo is called fast
    pub const FAST_TEMPO_SECONDS: f64 = 1800.0;
}

/// Report assembly limits
pub mod report {
    /// Players shown in the roster table
    pub const PLAYER_TABLE_LIMIT: usize = 5;

    /// Series whose drafts are aggregated for the draft section
    pub const DRAFT_SERIES_CAP: usize = 5;

    /// Names listed per draft-tendency line
    pub const DRAFT_TOP_NAMES: usize = 3;
}

/// Environment variable names
pub mod env_vars {
    /// API key for the GRID-style data provider
    pub const API_KEY: &str = "GRIDSCOUT_API_KEY";

    /// Central data endpoint URL override
    pub const CENTRAL_URL: &str = "GRIDSCOUT_CENTRAL_URL";

    /// Statistics endpoint URL override
    pub const STATS_URL: &str = "GRIDSCOUT_STATS_URL";

    /// Narrative (LLM) API key
    pub const NARRATIVE_API_KEY: &str = "GRIDSCOUT_NARRATIVE_API_KEY";

    /// Narrative model name
    pub const NARRATIVE_MODEL: &str = "GRIDSCOUT_NARRATIVE_MODEL";

    /// Narrative endpoint URL override
    pub const NARRATIVE_URL: &str = "GRIDSCOUT_NARRATIVE_URL";

    /// Log file path override
    pub const LOG_FILE: &str = "GRIDSCOUT_LOG_FILE";

    /// HTTP timeout override in seconds
    pub const HTTP_TIMEOUT: &str = "GRIDSCOUT_HTTP_TIMEOUT";
}
