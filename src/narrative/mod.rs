//! Narrative generation for the report's executive summary.
//!
//! An LLM-backed client produces the narrative when configured; every
//! failure path (no key, timeout, malformed or schema-violating output)
//! falls back to the deterministic summary so report generation never
//! depends on the narrative service.

pub mod client;
pub mod fallback;

use crate::config::Config;
use crate::insights::Insights;
use crate::metrics::ScoutingMetrics;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use client::NarrativeClient;
pub use fallback::deterministic_narrative;

/// The narrative block of a report. Producers (LLM or fallback) must fill
/// every section; decoding rejects unknown fields so a drifting model
/// output fails validation instead of silently shipping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Narrative {
    pub executive_summary: String,
    #[serde(default)]
    pub evidence_refs: Vec<String>,
    pub coverage_note: String,
    pub how_to_win: Vec<NarrativeRecommendation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NarrativeRecommendation {
    pub title: String,
    pub why: String,
    #[serde(default)]
    pub evidence_refs: Vec<String>,
}

impl Narrative {
    /// Structural checks beyond decoding: nothing required may be blank.
    pub fn validate(&self) -> Result<(), String> {
        if self.executive_summary.trim().is_empty() {
            return Err("executiveSummary is empty".to_string());
        }
        if self.coverage_note.trim().is_empty() {
            return Err("coverageNote is empty".to_string());
        }
        if self.how_to_win.is_empty() {
            return Err("howToWin has no entries".to_string());
        }
        for (index, rec) in self.how_to_win.iter().enumerate() {
            if rec.title.trim().is_empty() || rec.why.trim().is_empty() {
                return Err(format!("howToWin[{index}] has a blank title or why"));
            }
        }
        Ok(())
    }
}

/// Produces the narrative, preferring the configured LLM and falling back
/// deterministically. Returns the narrative and an optional data-quality
/// note explaining why the fallback was used.
pub async fn generate_narrative(
    config: &Config,
    team_name: &str,
    metrics: &ScoutingMetrics,
    insights: &Insights,
) -> (Narrative, Option<String>) {
    let Some(client) = NarrativeClient::from_config(config) else {
        return (
            deterministic_narrative(team_name, metrics, insights),
            Some("no narrative service configured, deterministic summary used".to_string()),
        );
    };

    match client.generate(team_name, metrics, insights).await {
        Ok(narrative) => {
            info!("Narrative generated by model");
            (narrative, None)
        }
        Err(error) => {
            warn!("Narrative service failed, using deterministic summary: {}", error);
            (
                deterministic_narrative(team_name, metrics, insights),
                Some(format!(
                    "narrative service unavailable ({error}), deterministic summary used"
                )),
            )
        }
    }
}
