//! Risk aggregation: combines N untrusted risk sources into one score
//! and level under fail-closed semantics.
//!
//! Pure and total: malformed numeric input is normalized toward the more
//! conservative outcome, never rejected.

use tracing::warn;

use crate::domain::{AggregatedRisk, RiskLevel, RiskSource, Thresholds};
use crate::observability::metrics as obs;

/// Clamp a raw score into [0,100]; non-finite degrades to maximal risk.
#[inline]
fn normalize_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        100.0
    }
}

/// Clamp a weight into [0,1]; non-finite degrades to zero influence.
#[inline]
fn normalize_weight(weight: f64) -> f64 {
    if weight.is_finite() {
        weight.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Clamp confidence into [0,1]; missing or non-finite means neutral trust.
#[inline]
fn normalize_confidence(confidence: Option<f64>) -> f64 {
    match confidence {
        Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
        _ => 1.0,
    }
}

/// Combine risk sources into one aggregated outcome.
///
/// Deterministic given the same ordered input:
/// - empty input falls back to maximal risk with `dominant_source_index = -1`
/// - any fail-closed source dominates outright; the max-scoring fail-closed
///   source wins, ties broken by lowest index, and non-fail-closed sources
///   are ignored entirely
/// - otherwise a confidence-weighted mean is taken, with triggered rules
///   concatenated across all sources in order (duplicates kept)
pub fn aggregate_risk_sources(
    sources: &[RiskSource],
    thresholds: Option<Thresholds>,
) -> AggregatedRisk {
    let thresholds = thresholds.unwrap_or(Thresholds::DEFAULT).validated();

    if sources.is_empty() {
        warn!("risk aggregation over empty source list, failing closed");
        obs::record_fail_closed("empty_sources");
        return AggregatedRisk::fail_closed_fallback();
    }

    // Fail-closed sources dominate: pick the worst of them and ignore the
    // rest of the input.
    let fail_closed_dominant = sources
        .iter()
        .enumerate()
        .filter(|(_, s)| s.fail_closed)
        // max_by prefers later elements on ties; strict gt keeps first-seen.
        .fold(None::<(usize, f64)>, |best, (i, s)| {
            let score = normalize_score(s.result.risk_score);
            match best {
                Some((_, best_score)) if score <= best_score => best,
                _ => Some((i, score)),
            }
        });

    if let Some((index, score)) = fail_closed_dominant {
        let source = &sources[index];
        return AggregatedRisk {
            risk_score: score,
            risk_level: RiskLevel::from_score(score, &thresholds),
            triggered_rules: source.result.triggered_rules.to_vec(),
            dominant_source_index: index as isize,
            evidence: source.result.evidence.clone(),
        };
    }

    // Weighted path: score weighted by weight x confidence.
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    let mut dominant: Option<(usize, f64)> = None;
    let mut triggered_rules = Vec::new();

    for (i, source) in sources.iter().enumerate() {
        let score = normalize_score(source.result.risk_score);
        let weight = normalize_weight(source.weight);
        let confidence = normalize_confidence(source.result.confidence);

        numerator += score * weight * confidence;
        denominator += weight * confidence;

        triggered_rules.extend(source.result.triggered_rules.iter().cloned());

        match dominant {
            Some((_, best)) if score <= best => {}
            _ => dominant = Some((i, score)),
        }
    }

    if denominator <= 0.0 {
        warn!("all risk source weights degenerate, failing closed");
        obs::record_fail_closed("zero_weight");
        return AggregatedRisk {
            triggered_rules,
            ..AggregatedRisk::fail_closed_fallback()
        };
    }

    let risk_score = normalize_score(numerator / denominator);
    let (dominant_index, _) = dominant.unwrap_or((0, 0.0));

    AggregatedRisk {
        risk_score,
        risk_level: RiskLevel::from_score(risk_score, &thresholds),
        triggered_rules,
        dominant_source_index: dominant_index as isize,
        evidence: sources[dominant_index].result.evidence.clone(),
    }
}
