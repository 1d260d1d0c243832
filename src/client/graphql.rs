//! GraphQL envelope types, error classification heuristics, and variable
//! sanitization.
//!
//! The upstream schema varies by deployment and permission tier, and the
//! only signal it gives about an unsupported field or filter is the error
//! message/extensions text. The classifiers here centralize that string
//! inspection so resolvers can branch on intent instead of raw messages.

use serde::Deserialize;
use serde_json::{Map, Value};

/// One entry from a GraphQL `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlErrorItem {
    pub message: String,
    #[serde(default)]
    pub path: Option<Vec<Value>>,
    #[serde(default)]
    pub extensions: Option<Map<String, Value>>,
}

impl GraphqlErrorItem {
    fn extension_str(&self, key: &str) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get(key))
            .and_then(Value::as_str)
    }

    /// Rate limiting is signaled through extensions rather than HTTP status.
    pub fn is_rate_limit(&self) -> bool {
        let message = self.message.to_lowercase();
        message.contains("rate limit")
            || self.extension_str("errorType") == Some("UNAVAILABLE")
            || self.extension_str("errorDetail") == Some("ENHANCE_YOUR_CALM")
    }

    /// Heuristic "this field/selection does not exist in this schema tier".
    pub fn is_field_not_found(&self) -> bool {
        let message = self.message.to_lowercase();
        message.contains("cannot query field")
            || message.contains("field_not_found")
            || message.contains("unknown field")
    }

    pub fn is_not_found(&self) -> bool {
        let message = self.message.to_lowercase();
        message.contains("not found")
            || message.contains("no series")
            || message.contains("unknown id")
    }

    /// The team-directory title filter is rejected wholesale on some tiers.
    pub fn is_unsupported_team_directory_filter(&self) -> bool {
        let message = self.message.to_lowercase();
        message.contains("teamfilter")
            || message.contains("filter")
            || message.contains("unknown")
    }

    /// `teamIds` inside the series filter is not always queryable.
    pub fn is_unsupported_team_id_filter(&self) -> bool {
        let message = self.message.to_lowercase();
        message.contains("teamids") || message.contains("unknown")
    }

    /// `startTimeScheduled` bounds are rejected where DateTimeFilter is absent.
    pub fn is_unsupported_start_time_filter(&self) -> bool {
        let message = self.message.to_lowercase();
        message.contains("starttimescheduled") || message.contains("datetimefilter")
    }

    /// Round-segment statistics are an optional schema extension.
    pub fn is_unsupported_segment(&self) -> bool {
        let message = self.message.to_lowercase();
        message.contains("segment")
            && (message.contains("cannot query")
                || message.contains("argument")
                || message.contains("unknown"))
    }

    /// `aggregationSeriesIds` is only exposed on some statistics tiers.
    pub fn is_unsupported_aggregation_ids(&self) -> bool {
        let message = self.message.to_lowercase();
        message.contains("aggregationseriesids") && message.contains("cannot query")
    }

    /// Player entries nest under `baseInfo` on some deployments only.
    pub fn is_player_base_info_missing(&self) -> bool {
        let message = self.message.to_lowercase();
        message.contains("players/baseinfo") || message.contains("field 'baseinfo'")
    }
}

/// Extracts the operation name from a query document, for log/error context.
pub fn operation_name(query: &str) -> Option<String> {
    let mut tokens = query.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "query" || token == "mutation" {
            return tokens.next().map(|name| {
                name.chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect()
            });
        }
    }
    None
}

/// Normalizes variables before sending. Callers sometimes build filters
/// generically (arrays of alternatives, list-wrapped scalars) while the
/// upstream schema expects singular objects; this collapses those shapes.
pub fn sanitize_variables(variables: Value) -> Value {
    let Value::Object(mut map) = variables else {
        return variables;
    };

    if let Some(filter) = map.remove("filter") {
        let sanitized = match filter {
            Value::Array(values) => first_object(values).unwrap_or(Value::Object(Map::new())),
            Value::Object(filter_map) => Value::Object(sanitize_filter(filter_map)),
            other => other,
        };
        map.insert("filter".to_string(), sanitized);
    }

    Value::Object(map)
}

fn sanitize_filter(mut filter: Map<String, Value>) -> Map<String, Value> {
    if let Some(Value::Array(values)) = filter.remove("startedAt") {
        filter.insert(
            "startedAt".to_string(),
            first_object(values).unwrap_or(Value::Object(Map::new())),
        );
    }
    if let Some(Value::Array(mut values)) = filter.remove("timeWindow") {
        if !values.is_empty() {
            filter.insert("timeWindow".to_string(), values.remove(0));
        }
    }
    filter
}

fn first_object(values: Vec<Value>) -> Option<Value> {
    values.into_iter().find(|value| value.is_object())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(message: &str) -> GraphqlErrorItem {
        GraphqlErrorItem {
            message: message.to_string(),
            path: None,
            extensions: None,
        }
    }

    #[test]
    fn test_rate_limit_from_extensions() {
        let error = GraphqlErrorItem {
            message: "try later".to_string(),
            path: None,
            extensions: serde_json::from_value(json!({"errorDetail": "ENHANCE_YOUR_CALM"})).ok(),
        };
        assert!(error.is_rate_limit());
        assert!(item("Rate limit exceeded").is_rate_limit());
        assert!(!item("Cannot query field 'maps'").is_rate_limit());
    }

    #[test]
    fn test_field_not_found_classification() {
        assert!(item("Cannot query field 'segment' on type 'TeamStatistics'").is_field_not_found());
        assert!(item("FIELD_NOT_FOUND: draftActions").is_field_not_found());
        assert!(!item("series not found").is_field_not_found());
    }

    #[test]
    fn test_unsupported_start_time_filter() {
        assert!(item("Unknown argument type DateTimeFilter").is_unsupported_start_time_filter());
        assert!(item("Field 'startTimeScheduled' is not defined").is_unsupported_start_time_filter());
        assert!(!item("Cannot query field 'teams'").is_unsupported_start_time_filter());
    }

    #[test]
    fn test_operation_name_extraction() {
        assert_eq!(
            operation_name("query Teams($first: Int!) { teams }"),
            Some("Teams".to_string())
        );
        assert_eq!(operation_name("{ titles { id } }"), None);
    }

    #[test]
    fn test_sanitize_collapses_array_filter() {
        let variables = json!({
            "first": 50,
            "filter": [{"titleIds": {"in": ["6"]}}, {"ignored": true}]
        });
        let sanitized = sanitize_variables(variables);
        assert_eq!(sanitized["filter"], json!({"titleIds": {"in": ["6"]}}));
        assert_eq!(sanitized["first"], json!(50));
    }

    #[test]
    fn test_sanitize_unwraps_list_wrapped_scalars() {
        let variables = json!({
            "filter": {
                "startedAt": [{"gte": "2024-01-01T00:00:00Z"}],
                "timeWindow": ["LAST_6_MONTHS"]
            }
        });
        let sanitized = sanitize_variables(variables);
        assert_eq!(
            sanitized["filter"]["startedAt"],
            json!({"gte": "2024-01-01T00:00:00Z"})
        );
        assert_eq!(sanitized["filter"]["timeWindow"], json!("LAST_6_MONTHS"));
    }

    #[test]
    fn test_sanitize_empty_array_filter_becomes_empty_object() {
        let sanitized = sanitize_variables(json!({"filter": ["scalar", 42]}));
        assert_eq!(sanitized["filter"], json!({}));
    }
}
