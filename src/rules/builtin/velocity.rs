use crate::domain::{RiskContext, RuleAction, TriggeredRule};
use crate::rules::traits::ClassificationRule;

/// Flags bursts of failed authentication attempts.
///
/// The failure count for the rolling window is supplied on the context by
/// the caller; this rule only classifies it. Score scales linearly with
/// how far past the threshold the count is, capped at `max_score`.
#[derive(Debug)]
pub struct VelocityRule {
    id: String,
    priority: u32,
    /// Failures at or above this count trigger the rule
    threshold: u32,
    max_score: f64,
}

impl VelocityRule {
    pub fn new(id: impl Into<String>, priority: u32, threshold: u32) -> Self {
        VelocityRule {
            id: id.into(),
            priority,
            threshold: threshold.max(1),
            max_score: 80.0,
        }
    }
}

impl ClassificationRule for VelocityRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn evaluate(&self, ctx: &RiskContext) -> Option<TriggeredRule> {
        if ctx.recent_failures < self.threshold {
            return None;
        }

        let overage = (ctx.recent_failures - self.threshold) as f64;
        let score = (40.0 + overage * 10.0).min(self.max_score);

        Some(
            TriggeredRule::new(&self.id, self.priority, RuleAction::Challenge, score)
                .with_evidence(serde_json::json!({
                    "recent_failures": ctx.recent_failures,
                    "threshold": self.threshold,
                })),
        )
    }
}
