use thiserror::Error;

use crate::client::graphql::GraphqlErrorItem;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("GRID API key missing from configuration")]
    MissingApiKey,

    #[error("Missing/invalid x-api-key header ({status})")]
    AuthRejected { status: u16, body: String },

    #[error("GRID GraphQL error on {endpoint}: {}", format_graphql_errors(.errors))]
    Graphql {
        endpoint: String,
        operation: Option<String>,
        errors: Vec<GraphqlErrorItem>,
    },

    #[error("GRID request failed{}: {message}", format_status(.status))]
    RequestFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("Failed to fetch data from API: {0}")]
    ApiFetch(#[from] reqwest::Error),

    #[error("Failed to parse API response: {0}")]
    ApiParse(#[from] serde_json::Error),

    // A mapper rejected a payload the chosen query variant should have
    // produced. This is a logic bug in variant selection, never retried.
    #[error("Schema validation failed for {context}: {message}")]
    SchemaValidation { context: String, message: String },

    #[error("Team not found: {name}")]
    TeamNotFound { name: String },

    #[error("Title not found for game: {game}")]
    TitleNotFound { game: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Narrative generation failed: {0}")]
    Narrative(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Date/time parsing error: {0}")]
    DateTimeParse(String),

    #[error("Log setup error: {0}")]
    LogSetup(String),
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with status {code}"),
        None => String::new(),
    }
}

fn format_graphql_errors(errors: &[GraphqlErrorItem]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(|item| item.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppError {
    /// Create a configuration error with context
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a date/time parsing error with context
    pub fn datetime_parse_error(msg: impl Into<String>) -> Self {
        Self::DateTimeParse(msg.into())
    }

    /// Create a log setup error with context
    pub fn log_setup_error(msg: impl Into<String>) -> Self {
        Self::LogSetup(msg.into())
    }

    /// Create a schema validation error for a named response shape
    pub fn schema_validation(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaValidation {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn team_not_found(name: impl Into<String>) -> Self {
        Self::TeamNotFound { name: name.into() }
    }

    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }

    /// Returns the GraphQL error items when this is a GraphQL-level failure.
    pub fn graphql_errors(&self) -> Option<&[GraphqlErrorItem]> {
        match self {
            AppError::Graphql { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// Rate-limit signaling arrives either as an HTTP 429 or inside GraphQL
    /// error extensions, so both are checked here.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            AppError::Graphql { errors, .. } => {
                errors.iter().any(GraphqlErrorItem::is_rate_limit)
            }
            AppError::RequestFailed {
                status: Some(429), ..
            } => true,
            _ => false,
        }
    }

    /// Check whether a retry could plausibly succeed. Auth rejections and
    /// schema/resolution failures are terminal for the current request.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::MissingApiKey | AppError::AuthRejected { .. } => false,
            AppError::Graphql { .. } => self.is_rate_limit(),
            AppError::RequestFailed { status, .. } => {
                matches!(status, Some(code) if *code >= 500 || *code == 429)
            }
            AppError::ApiFetch(_) => true,
            _ => false,
        }
    }

    /// Check if error indicates data not found (business logic, not technical error)
    pub fn is_not_found(&self) -> bool {
        match self {
            AppError::RequestFailed {
                status: Some(404), ..
            } => true,
            AppError::Graphql { errors, .. } => {
                errors.iter().any(GraphqlErrorItem::is_not_found)
            }
            AppError::TeamNotFound { .. } | AppError::TitleNotFound { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::graphql::GraphqlErrorItem;

    fn graphql_error(message: &str) -> AppError {
        AppError::Graphql {
            endpoint: "central".to_string(),
            operation: Some("Teams".to_string()),
            errors: vec![GraphqlErrorItem {
                message: message.to_string(),
                path: None,
                extensions: None,
            }],
        }
    }

    #[test]
    fn test_config_error_helper() {
        let error = AppError::config_error("Invalid configuration");
        assert!(matches!(error, AppError::Config(_)));
        assert_eq!(
            error.to_string(),
            "Configuration error: Invalid configuration"
        );
    }

    #[test]
    fn test_schema_validation_display() {
        let error = AppError::schema_validation("teams connection", "missing pageInfo");
        assert_eq!(
            error.to_string(),
            "Schema validation failed for teams connection: missing pageInfo"
        );
    }

    #[test]
    fn test_graphql_error_display_joins_messages() {
        let error = AppError::Graphql {
            endpoint: "central".to_string(),
            operation: None,
            errors: vec![
                GraphqlErrorItem {
                    message: "first".to_string(),
                    path: None,
                    extensions: None,
                },
                GraphqlErrorItem {
                    message: "second".to_string(),
                    path: None,
                    extensions: None,
                },
            ],
        };
        assert_eq!(
            error.to_string(),
            "GRID GraphQL error on central: first; second"
        );
    }

    #[test]
    fn test_rate_limit_detected_from_message() {
        assert!(graphql_error("rate limit exceeded, enhance your calm").is_rate_limit());
        assert!(!graphql_error("Cannot query field 'segment'").is_rate_limit());
    }

    #[test]
    fn test_is_retryable() {
        // Retryable errors
        assert!(
            AppError::RequestFailed {
                status: Some(503),
                message: "unavailable".to_string()
            }
            .is_retryable()
        );
        assert!(
            AppError::RequestFailed {
                status: Some(429),
                message: "slow down".to_string()
            }
            .is_retryable()
        );
        assert!(graphql_error("rate limit exceeded").is_retryable());

        // Non-retryable errors
        assert!(
            !AppError::AuthRejected {
                status: 403,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!AppError::MissingApiKey.is_retryable());
        assert!(!graphql_error("Cannot query field 'maps'").is_retryable());
        assert!(!AppError::config_error("bad").is_retryable());
        assert!(!AppError::team_not_found("G2").is_retryable());
    }

    #[test]
    fn test_is_not_found() {
        assert!(
            AppError::RequestFailed {
                status: Some(404),
                message: "gone".to_string()
            }
            .is_not_found()
        );
        assert!(graphql_error("series not found").is_not_found());
        assert!(AppError::team_not_found("G2").is_not_found());

        assert!(
            !AppError::RequestFailed {
                status: Some(500),
                message: "boom".to_string()
            }
            .is_not_found()
        );
        assert!(!AppError::insufficient_data("empty").is_not_found());
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let app_error: AppError = json_error.into();
        assert!(matches!(app_error, AppError::ApiParse(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();
        assert!(matches!(app_error, AppError::Io(_)));
    }
}
