//! Deterministic narrative built purely from computed metrics.
//!
//! This is the guaranteed path: it must produce a complete, valid
//! narrative for any input, including an all-unknown or thin sample.

use crate::insights::Insights;
use crate::metrics::ScoutingMetrics;
use crate::narrative::{Narrative, NarrativeRecommendation};

/// Builds the fallback narrative. Always passes [`Narrative::validate`].
pub fn deterministic_narrative(
    team_name: &str,
    metrics: &ScoutingMetrics,
    insights: &Insights,
) -> Narrative {
    let win_rate_text = metrics
        .win_rate
        .map(|wr| format!("a {:.0}% win rate over decided series", wr * 100.0))
        .unwrap_or_else(|| "no computable win rate".to_string());

    let form_text = if insights.recent_form_compact.is_empty() {
        String::new()
    } else {
        format!(" Recent form, newest first: {}.", insights.recent_form_compact)
    };

    let map_text = metrics
        .map_win_rates
        .first()
        .and_then(|best| {
            best.win_rate.map(|wr| {
                format!(
                    " Their best map in the sample is {} ({:.0}% over {} plays).",
                    best.map,
                    wr * 100.0,
                    best.samples
                )
            })
        })
        .unwrap_or_default();

    let executive_summary = format!(
        "{team_name} profiles as a {} with {} across {} scouted series ({} wins, {} losses, {} undecided).{}{}",
        insights.archetype,
        win_rate_text,
        metrics.sample_size,
        metrics.wins,
        metrics.losses,
        metrics.unknowns,
        form_text,
        map_text,
    );

    let mut evidence_refs = vec!["metric:winRate".to_string(), "metric:sampleSize".to_string()];
    evidence_refs.extend(
        metrics
            .recent_form
            .iter()
            .take(3)
            .map(|entry| format!("series:{}", entry.series_id)),
    );

    let coverage_note = if metrics.data_quality.is_empty() {
        format!("Based on {} series with no data-quality caveats.", metrics.sample_size)
    } else {
        format!(
            "Based on {} series. Caveats: {}.",
            metrics.sample_size,
            metrics.data_quality.join("; ")
        )
    };

    let how_to_win: Vec<NarrativeRecommendation> = insights
        .how_to_win
        .iter()
        .map(|rec| NarrativeRecommendation {
            title: rec.title.clone(),
            why: rec.why.clone(),
            evidence_refs: rec.evidence_refs.clone(),
        })
        .collect();

    Narrative {
        executive_summary,
        evidence_refs,
        coverage_note,
        how_to_win,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::build_insights;
    use crate::metrics::compute_metrics;
    use crate::model::Outcome;
    use crate::model::state::NormalizedSeries;

    fn series(id: &str, outcome: Outcome) -> NormalizedSeries {
        NormalizedSeries {
            series_id: id.to_string(),
            outcome,
            opponent: Some("Rival".to_string()),
            team_score: None,
            opponent_score: None,
            team_kills: None,
            team_deaths: None,
            maps: Vec::new(),
            start_time: None,
        }
    }

    #[test]
    fn test_fallback_is_always_valid() {
        let samples: Vec<Vec<NormalizedSeries>> = vec![
            Vec::new(),
            vec![series("s1", Outcome::Unknown)],
            vec![
                series("s1", Outcome::Win),
                series("s2", Outcome::Loss),
                series("s3", Outcome::Win),
            ],
        ];

        for sample in samples {
            let metrics = compute_metrics(&sample);
            let insights = build_insights(&metrics, None, &[]);
            let narrative = deterministic_narrative("G2 Esports", &metrics, &insights);
            narrative.validate().expect("fallback narrative must validate");
        }
    }

    #[test]
    fn test_summary_mentions_sample_and_archetype() {
        let sample = vec![series("s1", Outcome::Win), series("s2", Outcome::Loss)];
        let metrics = compute_metrics(&sample);
        let insights = build_insights(&metrics, None, &[]);
        let narrative = deterministic_narrative("G2 Esports", &metrics, &insights);

        assert!(narrative.executive_summary.contains("G2 Esports"));
        assert!(narrative.executive_summary.contains("2 scouted series"));
        assert!(narrative.executive_summary.contains(insights.archetype));
        assert!(narrative.coverage_note.contains("2 series"));
    }

    #[test]
    fn test_coverage_note_carries_data_quality() {
        let sample = vec![series("s1", Outcome::Unknown)];
        let metrics = compute_metrics(&sample);
        let insights = build_insights(&metrics, None, &[]);
        let narrative = deterministic_narrative("G2 Esports", &metrics, &insights);
        assert!(narrative.coverage_note.contains("undecidable"));
    }
}
