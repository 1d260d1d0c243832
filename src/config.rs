use crate::constants::env_vars;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Default public endpoints for the GRID-style provider. Both can be
/// overridden per deployment through the config file or environment.
const DEFAULT_CENTRAL_URL: &str = "https://api.grid.gg/central-data/graphql";
const DEFAULT_STATS_URL: &str = "https://api.grid.gg/statistics-feed/graphql";
const DEFAULT_NARRATIVE_URL: &str = "https://api.openai.com/v1/responses";

/// Configuration structure for the application.
/// Handles loading, saving, and managing application settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// API key sent as the x-api-key header on every GraphQL request.
    /// An empty key is tolerated at load time but fatal at first request.
    #[serde(default)]
    pub api_key: String,
    /// Central/directory GraphQL endpoint (titles, teams, series).
    #[serde(default = "default_central_url")]
    pub central_url: String,
    /// Statistics GraphQL endpoint (team/player/game/series aggregates).
    #[serde(default = "default_stats_url")]
    pub stats_url: String,
    /// Narrative generation endpoint. Overridable for testing.
    #[serde(default = "default_narrative_url")]
    pub narrative_url: String,
    /// Narrative service API key. Optional; without it the deterministic
    /// summary is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_api_key: Option<String>,
    /// Narrative model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_model: Option<String>,
    /// Path to the log file. If not specified, logs go to a default location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<String>,
    /// HTTP timeout in seconds for API requests.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
}

fn default_http_timeout() -> u64 {
    crate::constants::DEFAULT_HTTP_TIMEOUT_SECONDS
}

fn default_central_url() -> String {
    DEFAULT_CENTRAL_URL.to_string()
}

fn default_stats_url() -> String {
    DEFAULT_STATS_URL.to_string()
}

fn default_narrative_url() -> String {
    DEFAULT_NARRATIVE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: String::new(),
            central_url: default_central_url(),
            stats_url: default_stats_url(),
            narrative_url: default_narrative_url(),
            narrative_api_key: None,
            narrative_model: None,
            log_file_path: None,
            http_timeout_seconds: default_http_timeout(),
        }
    }
}

impl Config {
    /// Loads configuration from the default config file location.
    /// Environment variables override config file values.
    ///
    /// # Environment Variables
    /// - `GRIDSCOUT_API_KEY` - GRID API key
    /// - `GRIDSCOUT_CENTRAL_URL` / `GRIDSCOUT_STATS_URL` - endpoint overrides
    /// - `GRIDSCOUT_NARRATIVE_API_KEY` / `GRIDSCOUT_NARRATIVE_MODEL` /
    ///   `GRIDSCOUT_NARRATIVE_URL` - narrative service settings
    /// - `GRIDSCOUT_LOG_FILE` - log file path override
    /// - `GRIDSCOUT_HTTP_TIMEOUT` - HTTP timeout in seconds
    pub async fn load() -> Result<Self, AppError> {
        let config_path = get_config_path();

        let mut config = if Path::new(&config_path).exists() {
            let content = fs::read_to_string(&config_path).await?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        if let Ok(api_key) = std::env::var(env_vars::API_KEY) {
            config.api_key = api_key;
        }
        if let Ok(url) = std::env::var(env_vars::CENTRAL_URL) {
            config.central_url = url;
        }
        if let Ok(url) = std::env::var(env_vars::STATS_URL) {
            config.stats_url = url;
        }
        if let Ok(key) = std::env::var(env_vars::NARRATIVE_API_KEY) {
            config.narrative_api_key = Some(key);
        }
        if let Ok(model) = std::env::var(env_vars::NARRATIVE_MODEL) {
            config.narrative_model = Some(model);
        }
        if let Ok(url) = std::env::var(env_vars::NARRATIVE_URL) {
            config.narrative_url = url;
        }
        if let Ok(log_file_path) = std::env::var(env_vars::LOG_FILE) {
            config.log_file_path = Some(log_file_path);
        }
        if let Some(timeout) = std::env::var(env_vars::HTTP_TIMEOUT)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.http_timeout_seconds = timeout;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration settings.
    ///
    /// The API key may be empty here (it is checked again at first request)
    /// but endpoint URLs must look like URLs and the timeout must be nonzero.
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, url) in [
            ("central_url", &self.central_url),
            ("stats_url", &self.stats_url),
            ("narrative_url", &self.narrative_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::config_error(format!(
                    "{name} must start with http:// or https://, got '{url}'"
                )));
            }
        }

        if self.http_timeout_seconds == 0 {
            return Err(AppError::config_error(
                "http_timeout_seconds must be greater than zero",
            ));
        }

        if let Some(path) = &self.log_file_path
            && path.is_empty()
        {
            return Err(AppError::config_error("log_file_path must not be empty"));
        }

        Ok(())
    }

    /// Saves current configuration to the default config file location.
    pub async fn save(&self) -> Result<(), AppError> {
        self.save_to_path(&get_config_path()).await
    }

    /// Returns the platform-specific path for the config file.
    pub fn get_config_path() -> String {
        get_config_path()
    }

    /// Returns the platform-specific path for the log directory.
    pub fn get_log_dir_path() -> String {
        get_log_dir_path()
    }

    /// Saves configuration to a custom file path, creating parent
    /// directories as needed.
    pub async fn save_to_path(&self, path: &str) -> Result<(), AppError> {
        let config_dir = Path::new(path).parent().ok_or_else(|| {
            AppError::config_error(format!("Path '{path}' has no parent directory"))
        })?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).await?;
        }
        let content = toml::to_string_pretty(self)?;
        let mut file = fs::File::create(path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Loads configuration from a custom file path (for testing).
    pub async fn load_from_path(path: &str) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

fn get_config_path() -> String {
    dirs::config_dir()
        .map(|dir| dir.join("gridscout").join("config.toml"))
        .unwrap_or_else(|| Path::new("config.toml").to_path_buf())
        .to_string_lossy()
        .to_string()
}

fn get_log_dir_path() -> String {
    dirs::config_dir()
        .map(|dir| dir.join("gridscout").join("logs"))
        .unwrap_or_else(|| Path::new("logs").to_path_buf())
        .to_string_lossy()
        .to_string()
}
