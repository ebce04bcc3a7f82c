use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use super::rule::TriggeredRule;

/// Risk level derived from a numeric score via thresholds.
///
/// Levels are ordered by severity from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RiskLevel {
    Low = 0,
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl RiskLevel {
    /// Map a score in [0,100] to a level using the given thresholds.
    ///
    /// The thresholds must already be validated; callers go through
    /// `Thresholds::validated` first.
    pub fn from_score(score: f64, thresholds: &Thresholds) -> Self {
        if score >= thresholds.critical_from {
            RiskLevel::Critical
        } else if score >= thresholds.high_from {
            RiskLevel::High
        } else if score >= thresholds.medium_from {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    #[inline]
    pub fn is_critical(&self) -> bool {
        *self == RiskLevel::Critical
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Score boundaries for mapping a risk score to a level.
///
/// Invariant: `medium_from <= high_from <= critical_from`, all in [0,100].
/// Invalid thresholds are replaced wholesale by `Thresholds::DEFAULT`
/// rather than partially repaired, so a misconfigured deployment degrades
/// to known-safe boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub medium_from: f64,
    pub high_from: f64,
    pub critical_from: f64,
}

impl Thresholds {
    pub const DEFAULT: Thresholds = Thresholds {
        medium_from: 40.0,
        high_from: 60.0,
        critical_from: 80.0,
    };

    /// Check the monotonicity and range invariant.
    pub fn is_valid(&self) -> bool {
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);

        in_range(self.medium_from)
            && in_range(self.high_from)
            && in_range(self.critical_from)
            && self.medium_from <= self.high_from
            && self.high_from <= self.critical_from
    }

    /// Return self if valid, otherwise the safe default.
    pub fn validated(self) -> Thresholds {
        if self.is_valid() {
            self
        } else {
            tracing::warn!(
                medium = self.medium_from,
                high = self.high_from,
                critical = self.critical_from,
                "invalid thresholds replaced by defaults"
            );
            Thresholds::DEFAULT
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds::DEFAULT
    }
}

/// What a single risk source reports for one evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResult {
    /// Raw risk score; clamped into [0,100] during aggregation
    pub risk_score: f64,

    /// Rules this source observed as triggered
    #[serde(default)]
    pub triggered_rules: SmallVec<[TriggeredRule; 4]>,

    /// Source self-reported confidence in [0,1]; `None` means neutral trust
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Opaque audit payload forwarded to the decision record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<serde_json::Value>,
}

impl AssessmentResult {
    pub fn with_score(risk_score: f64) -> Self {
        AssessmentResult {
            risk_score,
            triggered_rules: SmallVec::new(),
            confidence: None,
            evidence: None,
        }
    }

    /// Synthetic maximal-risk result used when a source fails or times out.
    ///
    /// Confidence is zero so the weighted path contributes nothing from it,
    /// while a fail-closed source carrying it still dominates.
    pub fn synthetic_failure() -> Self {
        AssessmentResult {
            risk_score: 100.0,
            triggered_rules: SmallVec::new(),
            confidence: Some(0.0),
            evidence: None,
        }
    }
}

/// One contributor to risk aggregation.
///
/// Ephemeral: built per evaluation call, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSource {
    pub result: AssessmentResult,

    /// Relative weight in [0,1] for the weighted-mean path
    pub weight: f64,

    /// A fail-closed source dominates aggregation outright when present
    pub fail_closed: bool,
}

impl RiskSource {
    pub fn new(result: AssessmentResult, weight: f64) -> Self {
        RiskSource {
            result,
            weight,
            fail_closed: false,
        }
    }

    pub fn fail_closed(result: AssessmentResult, weight: f64) -> Self {
        RiskSource {
            result,
            weight,
            fail_closed: true,
        }
    }
}

/// Aggregated outcome of combining all risk sources. Output-only, immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedRisk {
    /// Final score, always in [0,100]
    pub risk_score: f64,

    pub risk_level: RiskLevel,

    /// Triggered rules, in source order; duplicates kept for per-source
    /// explainability
    pub triggered_rules: Vec<TriggeredRule>,

    /// Index of the source that drove the score; -1 for the empty-input
    /// fallback
    pub dominant_source_index: isize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<serde_json::Value>,
}

impl AggregatedRisk {
    /// Fail-closed fallback used for empty or degenerate input.
    pub fn fail_closed_fallback() -> Self {
        AggregatedRisk {
            risk_score: 100.0,
            risk_level: RiskLevel::Critical,
            triggered_rules: Vec::new(),
            dominant_source_index: -1,
            evidence: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn test_level_from_score_default_thresholds() {
        let t = Thresholds::DEFAULT;
        assert_eq!(RiskLevel::from_score(10.0, &t), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(45.0, &t), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(65.0, &t), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(85.0, &t), RiskLevel::Critical);
    }

    #[test]
    fn test_level_boundaries_inclusive() {
        let t = Thresholds::DEFAULT;
        assert_eq!(RiskLevel::from_score(40.0, &t), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(60.0, &t), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(80.0, &t), RiskLevel::Critical);
    }

    #[test]
    fn test_thresholds_validation() {
        assert!(Thresholds::DEFAULT.is_valid());

        let non_monotonic = Thresholds {
            medium_from: 70.0,
            high_from: 60.0,
            critical_from: 80.0,
        };
        assert!(!non_monotonic.is_valid());
        assert_eq!(non_monotonic.validated(), Thresholds::DEFAULT);

        let out_of_range = Thresholds {
            medium_from: -5.0,
            high_from: 60.0,
            critical_from: 80.0,
        };
        assert_eq!(out_of_range.validated(), Thresholds::DEFAULT);

        let non_finite = Thresholds {
            medium_from: f64::NAN,
            high_from: 60.0,
            critical_from: 80.0,
        };
        assert_eq!(non_finite.validated(), Thresholds::DEFAULT);
    }

    #[test]
    fn test_level_serialization() {
        let json = serde_json::to_string(&RiskLevel::Critical).unwrap();
        assert_eq!(json, "\"critical\"");

        let parsed: RiskLevel = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, RiskLevel::Medium);
    }

    #[test]
    fn test_synthetic_failure_result() {
        let r = AssessmentResult::synthetic_failure();
        assert_eq!(r.risk_score, 100.0);
        assert_eq!(r.confidence, Some(0.0));
        assert!(r.triggered_rules.is_empty());
    }
}
