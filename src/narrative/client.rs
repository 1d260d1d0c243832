//! LLM-backed narrative generation over an OpenAI-style responses API.

use crate::config::Config;
use crate::constants::NARRATIVE_TIMEOUT_SECONDS;
use crate::error::AppError;
use crate::insights::Insights;
use crate::metrics::ScoutingMetrics;
use crate::narrative::Narrative;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You are an esports analyst writing a pre-match scouting brief. \
Respond with a single JSON object matching the requested schema. Every claim must cite \
evidence references from the provided metrics. Do not invent statistics.";

/// Client for the narrative service. Holds its own HTTP client so the
/// narrative timeout is independent of the data-plane timeout.
pub struct NarrativeClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl NarrativeClient {
    /// Returns `None` when no narrative key is configured; callers then
    /// use the deterministic fallback.
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_key = config.narrative_api_key.clone()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(NARRATIVE_TIMEOUT_SECONDS))
            .build()
            .ok()?;
        Some(Self {
            http,
            url: config.narrative_url.clone(),
            api_key,
            model: config
                .narrative_model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    /// Generates and validates a narrative. Any deviation from the schema
    /// is an error; the caller decides whether to fall back.
    #[instrument(skip_all, fields(team = team_name))]
    pub async fn generate(
        &self,
        team_name: &str,
        metrics: &ScoutingMetrics,
        insights: &Insights,
    ) -> Result<Narrative, AppError> {
        let body = json!({
            "model": self.model,
            "input": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_prompt(team_name, metrics, insights)},
            ],
            "text": {
                "format": {
                    "type": "json_schema",
                    "name": "scouting_narrative",
                    "schema": narrative_schema(),
                    "strict": true,
                }
            },
        });

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Narrative(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Narrative(format!(
                "service returned {status}: {body}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::Narrative(format!("unreadable response: {e}")))?;

        let text = extract_output_text(&payload)
            .ok_or_else(|| AppError::Narrative("response carried no output text".to_string()))?;
        debug!("Narrative output: {} bytes", text.len());

        let narrative: Narrative = serde_json::from_str(text)
            .map_err(|e| AppError::Narrative(format!("output violates schema: {e}")))?;
        narrative
            .validate()
            .map_err(|reason| AppError::Narrative(format!("output incomplete: {reason}")))?;
        Ok(narrative)
    }
}

/// Pulls the generated text out of a responses-API payload, accepting
/// both the `output_text` convenience field and the nested output list.
fn extract_output_text(payload: &Value) -> Option<&str> {
    if let Some(text) = payload.get("output_text").and_then(Value::as_str) {
        return Some(text);
    }
    payload
        .get("output")?
        .as_array()?
        .iter()
        .filter_map(|item| item.get("content")?.as_array())
        .flatten()
        .find_map(|content| {
            (content.get("type")?.as_str()? == "output_text")
                .then(|| content.get("text")?.as_str())
                .flatten()
        })
}

fn build_prompt(team_name: &str, metrics: &ScoutingMetrics, insights: &Insights) -> String {
    let form = &insights.recent_form_compact;
    let maps: Vec<String> = metrics
        .map_win_rates
        .iter()
        .map(|m| {
            format!(
                "{}: {}-{} ({} plays)",
                m.map, m.wins, m.losses, m.samples
            )
        })
        .collect();
    let recommendations: Vec<String> = insights
        .how_to_win
        .iter()
        .map(|r| format!("{} — {}", r.title, r.why))
        .collect();

    format!(
        "Write the scouting brief for {team_name}.\n\
         Sample: {} series ({} wins, {} losses, {} unknown outcomes).\n\
         Win rate over decided series: {}.\n\
         Recent form (newest first): {form}.\n\
         Archetype read: {}.\n\
         Map record: {}.\n\
         Candidate angles: {}.\n\
         Data quality caveats: {}.",
        metrics.sample_size,
        metrics.wins,
        metrics.losses,
        metrics.unknowns,
        metrics
            .win_rate
            .map(|wr| format!("{:.0}%", wr * 100.0))
            .unwrap_or_else(|| "not computable".to_string()),
        insights.archetype,
        if maps.is_empty() { "none".to_string() } else { maps.join("; ") },
        if recommendations.is_empty() {
            "none".to_string()
        } else {
            recommendations.join("; ")
        },
        if metrics.data_quality.is_empty() {
            "none".to_string()
        } else {
            metrics.data_quality.join("; ")
        },
    )
}

fn narrative_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["executiveSummary", "evidenceRefs", "coverageNote", "howToWin"],
        "properties": {
            "executiveSummary": {"type": "string"},
            "evidenceRefs": {"type": "array", "items": {"type": "string"}},
            "coverageNote": {"type": "string"},
            "howToWin": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["title", "why", "evidenceRefs"],
                    "properties": {
                        "title": {"type": "string"},
                        "why": {"type": "string"},
                        "evidenceRefs": {"type": "array", "items": {"type": "string"}},
                    },
                },
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::build_insights;
    use crate::metrics::compute_metrics;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> NarrativeClient {
        NarrativeClient::from_config(&Config {
            narrative_api_key: Some("llm-key".to_string()),
            narrative_url: server.uri(),
            ..Config::default()
        })
        .unwrap()
    }

    fn empty_inputs() -> (ScoutingMetrics, Insights) {
        let metrics = compute_metrics(&[]);
        let insights = build_insights(&metrics, None, &[]);
        (metrics, insights)
    }

    #[test]
    fn test_from_config_requires_api_key() {
        assert!(NarrativeClient::from_config(&Config::default()).is_none());
    }

    #[tokio::test]
    async fn test_valid_output_is_accepted() {
        let server = MockServer::start().await;
        let narrative_json = serde_json::json!({
            "executiveSummary": "They are streaky.",
            "evidenceRefs": ["metric:winRate"],
            "coverageNote": "Based on 0 series.",
            "howToWin": [{"title": "Ban their map", "why": "It is their only map", "evidenceRefs": []}],
        });
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer llm-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": [{"content": [{"type": "output_text", "text": narrative_json.to_string()}]}]
            })))
            .mount(&server)
            .await;

        let (metrics, insights) = empty_inputs();
        let narrative = client_for(&server)
            .generate("G2 Esports", &metrics, &insights)
            .await
            .unwrap();
        assert_eq!(narrative.how_to_win.len(), 1);
    }

    #[tokio::test]
    async fn test_schema_violating_output_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output_text": "{\"executiveSummary\": \"only a summary\"}"
            })))
            .mount(&server)
            .await;

        let (metrics, insights) = empty_inputs();
        let result = client_for(&server)
            .generate("G2 Esports", &metrics, &insights)
            .await;
        assert!(matches!(result, Err(AppError::Narrative(_))));
    }

    #[tokio::test]
    async fn test_service_error_surfaces_as_narrative_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let (metrics, insights) = empty_inputs();
        let result = client_for(&server)
            .generate("G2 Esports", &metrics, &insights)
            .await;
        assert!(matches!(result, Err(AppError::Narrative(_))));
    }

    #[test]
    fn test_extract_output_text_both_shapes() {
        let convenience = serde_json::json!({"output_text": "hello"});
        assert_eq!(extract_output_text(&convenience), Some("hello"));

        let nested = serde_json::json!({
            "output": [
                {"content": [{"type": "reasoning", "text": "skip"}]},
                {"content": [{"type": "output_text", "text": "kept"}]},
            ]
        });
        assert_eq!(extract_output_text(&nested), Some("kept"));

        assert_eq!(extract_output_text(&serde_json::json!({})), None);
    }
}
