pub mod builtin;
pub mod traits;

pub use builtin::{DeviceMismatchRule, IpBlocklistRule, VelocityRule};
pub use traits::ClassificationRule;

use smallvec::SmallVec;
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::{AssessmentResult, RiskContext, RiskSource, TriggeredRule};

/// Collection of classification rules evaluated together.
///
/// Evaluation is order-independent with respect to registration: hits are
/// sorted by descending priority, then rule id, so the output is stable
/// however the set was assembled.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<dyn ClassificationRule>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Arc<dyn ClassificationRule>>) -> Self {
        RuleSet { rules }
    }

    pub fn empty() -> Self {
        RuleSet { rules: Vec::new() }
    }

    /// Default rule set used by the local (v1) risk source.
    pub fn standard(blocked_ips: HashSet<String>, velocity_threshold: u32) -> Self {
        RuleSet {
            rules: vec![
                Arc::new(IpBlocklistRule::new("IP_BLOCKLIST", 100, blocked_ips)),
                Arc::new(DeviceMismatchRule::new("DEVICE_MISMATCH", 60)),
                Arc::new(VelocityRule::new("VELOCITY", 50, velocity_threshold)),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every rule against the context.
    pub fn evaluate(&self, ctx: &RiskContext) -> Vec<TriggeredRule> {
        let mut hits: Vec<TriggeredRule> = self
            .rules
            .iter()
            .filter_map(|rule| rule.evaluate(ctx))
            .collect();

        hits.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        hits
    }

    /// Evaluate and package the hits as a risk source for aggregation.
    ///
    /// The source score is the maximum per-rule score (rules are
    /// independent observations of the same request, not additive).
    pub fn to_risk_source(&self, ctx: &RiskContext, weight: f64) -> RiskSource {
        let hits = self.evaluate(ctx);

        let risk_score = hits.iter().map(|h| h.score).fold(0.0, f64::max);
        let triggered_rules: SmallVec<[TriggeredRule; 4]> = hits.into_iter().collect();

        RiskSource::new(
            AssessmentResult {
                risk_score,
                triggered_rules,
                confidence: None,
                evidence: None,
            },
            weight,
        )
    }
}
