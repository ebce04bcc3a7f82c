//! v1-vs-v2 disagreement classification and dashboard aggregation.
//!
//! This module only classifies and aggregates; the calling service owns
//! accumulation and the rollout controller owns the halt/rollback call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Action;
use crate::observability::metrics as obs;

/// Default score delta below which the two versions count as agreeing.
pub const DEFAULT_EXACT_MATCH_THRESHOLD: f64 = 10.0;

/// How one v1-vs-v2 comparison is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisagreementCategory {
    /// Scores within the exact-match threshold
    ExactMatch,
    /// v2 found more risk than v1
    V2Stricter,
    /// v2 found less risk than v1; the safety-critical case
    V2Weaker,
}

/// Classify a single comparison by score delta (delta = v2 - v1).
///
/// Non-finite input classifies as `V2Weaker`: an uninterpretable
/// comparison must count toward the halt signal, not away from it.
pub fn classify_disagreement(
    v1_score: f64,
    v2_score: f64,
    threshold: f64,
) -> DisagreementCategory {
    if !v1_score.is_finite() || !v2_score.is_finite() {
        return DisagreementCategory::V2Weaker;
    }

    let delta = v2_score - v1_score;
    if delta.abs() < threshold {
        DisagreementCategory::ExactMatch
    } else if delta > 0.0 {
        DisagreementCategory::V2Stricter
    } else {
        DisagreementCategory::V2Weaker
    }
}

/// One recorded v1-vs-v2 comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisagreementMetric {
    pub evaluation_id: Uuid,
    pub v1_score: f64,
    pub v2_score: f64,
    /// v2_score - v1_score; zero when either side is non-finite
    pub delta: f64,
    pub v1_action: Action,
    pub v2_action: Action,
    pub category: DisagreementCategory,
    pub observed_at: DateTime<Utc>,
}

impl DisagreementMetric {
    /// Build a metric from both versions' outputs.
    pub fn compare(
        evaluation_id: Uuid,
        v1_score: f64,
        v2_score: f64,
        v1_action: Action,
        v2_action: Action,
        threshold: f64,
    ) -> Self {
        let category = classify_disagreement(v1_score, v2_score, threshold);
        let delta = if v1_score.is_finite() && v2_score.is_finite() {
            v2_score - v1_score
        } else {
            0.0
        };

        if category == DisagreementCategory::V2Weaker {
            obs::record_v2_weaker();
        }

        DisagreementMetric {
            evaluation_id,
            v1_score,
            v2_score,
            delta,
            v1_action,
            v2_action,
            category,
            observed_at: Utc::now(),
        }
    }
}

/// Aggregated view of a batch of comparisons, shaped for a dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_comparisons: u64,

    pub exact_match_count: u64,
    pub v2_stricter_count: u64,
    /// The signal an external rollout controller watches for rollback
    pub v2_weaker_count: u64,

    pub exact_match_pct: f64,
    pub v2_stricter_pct: f64,
    pub v2_weaker_pct: f64,

    pub mean_delta: f64,
}

/// Aggregate a batch of comparisons into dashboard counts and percentages.
///
/// An empty batch yields the all-zero dashboard.
pub fn aggregate_disagreement_metrics(metrics: &[DisagreementMetric]) -> DashboardMetrics {
    if metrics.is_empty() {
        return DashboardMetrics::default();
    }

    let mut out = DashboardMetrics {
        total_comparisons: metrics.len() as u64,
        ..DashboardMetrics::default()
    };

    let mut delta_sum = 0.0;
    for metric in metrics {
        match metric.category {
            DisagreementCategory::ExactMatch => out.exact_match_count += 1,
            DisagreementCategory::V2Stricter => out.v2_stricter_count += 1,
            DisagreementCategory::V2Weaker => out.v2_weaker_count += 1,
        }
        delta_sum += metric.delta;
    }

    let total = out.total_comparisons as f64;
    out.exact_match_pct = out.exact_match_count as f64 / total * 100.0;
    out.v2_stricter_pct = out.v2_stricter_count as f64 / total * 100.0;
    out.v2_weaker_pct = out.v2_weaker_count as f64 / total * 100.0;
    out.mean_delta = delta_sum / total;

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(v1: f64, v2: f64) -> DisagreementMetric {
        DisagreementMetric::compare(
            Uuid::new_v4(),
            v1,
            v2,
            Action::Allow,
            Action::Allow,
            DEFAULT_EXACT_MATCH_THRESHOLD,
        )
    }

    #[test]
    fn test_classification_by_delta() {
        assert_eq!(
            classify_disagreement(50.0, 55.0, 10.0),
            DisagreementCategory::ExactMatch
        );
        assert_eq!(
            classify_disagreement(50.0, 75.0, 10.0),
            DisagreementCategory::V2Stricter
        );
        assert_eq!(
            classify_disagreement(50.0, 20.0, 10.0),
            DisagreementCategory::V2Weaker
        );
    }

    #[test]
    fn test_threshold_boundary_is_exclusive() {
        // |delta| == threshold is a real disagreement.
        assert_eq!(
            classify_disagreement(50.0, 60.0, 10.0),
            DisagreementCategory::V2Stricter
        );
        assert_eq!(
            classify_disagreement(50.0, 40.0, 10.0),
            DisagreementCategory::V2Weaker
        );
    }

    #[test]
    fn test_non_finite_counts_toward_halt_signal() {
        assert_eq!(
            classify_disagreement(f64::NAN, 50.0, 10.0),
            DisagreementCategory::V2Weaker
        );
        assert_eq!(
            classify_disagreement(50.0, f64::INFINITY, 10.0),
            DisagreementCategory::V2Weaker
        );
    }

    #[test]
    fn test_empty_batch_all_zero() {
        let dash = aggregate_disagreement_metrics(&[]);
        assert_eq!(dash, DashboardMetrics::default());
        assert_eq!(dash.total_comparisons, 0);
        assert_eq!(dash.v2_weaker_count, 0);
        assert_eq!(dash.mean_delta, 0.0);
    }

    #[test]
    fn test_batch_counts_and_percentages() {
        let batch = vec![
            metric(50.0, 52.0),  // exact match
            metric(50.0, 80.0),  // stricter
            metric(50.0, 10.0),  // weaker
            metric(50.0, 10.0),  // weaker
        ];
        let dash = aggregate_disagreement_metrics(&batch);

        assert_eq!(dash.total_comparisons, 4);
        assert_eq!(dash.exact_match_count, 1);
        assert_eq!(dash.v2_stricter_count, 1);
        assert_eq!(dash.v2_weaker_count, 2);
        assert_eq!(dash.exact_match_pct, 25.0);
        assert_eq!(dash.v2_weaker_pct, 50.0);
        // (2 + 30 - 40 - 40) / 4
        assert_eq!(dash.mean_delta, -12.0);
    }

    #[test]
    fn test_compare_records_delta_and_actions() {
        let m = DisagreementMetric::compare(
            Uuid::new_v4(),
            60.0,
            30.0,
            Action::Challenge,
            Action::Allow,
            10.0,
        );
        assert_eq!(m.delta, -30.0);
        assert_eq!(m.category, DisagreementCategory::V2Weaker);
        assert_eq!(m.v1_action, Action::Challenge);
        assert_eq!(m.v2_action, Action::Allow);
    }
}
