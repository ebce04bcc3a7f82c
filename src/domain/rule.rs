use serde::{Deserialize, Serialize};
use std::fmt;

/// Action a classification rule recommends when it triggers.
///
/// Ordered by severity; when aggregating, the most severe recommendation
/// wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RuleAction {
    /// Record only, no user-visible effect
    Observe = 0,
    /// Step-up verification recommended
    Challenge = 1,
    /// Deny recommended
    Block = 2,
}

impl RuleAction {
    /// Returns the more severe of two recommendations.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        std::cmp::max(self, other)
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleAction::Observe => write!(f, "observe"),
            RuleAction::Challenge => write!(f, "challenge"),
            RuleAction::Block => write!(f, "block"),
        }
    }
}

/// One rule hit, as reported by a risk source.
///
/// Carries everything the decision engine and the audit trail need:
/// which rule fired, how important it is, what it recommends, and how
/// much score it contributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggeredRule {
    /// Unique rule identifier
    pub id: String,

    /// Evaluation ordering weight; higher fires earlier in the audit list
    pub priority: u32,

    /// Recommended action for the decision engine
    pub action: RuleAction,

    /// Score contribution this rule adds to its source, in [0,100]
    pub score: f64,

    /// What was observed, for the audit trail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<serde_json::Value>,
}

impl TriggeredRule {
    pub fn new(id: impl Into<String>, priority: u32, action: RuleAction, score: f64) -> Self {
        TriggeredRule {
            id: id.into(),
            priority,
            action,
            score,
            evidence: None,
        }
    }

    pub fn with_evidence(mut self, evidence: serde_json::Value) -> Self {
        self.evidence = Some(evidence);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_severity_ordering() {
        assert!(RuleAction::Observe < RuleAction::Challenge);
        assert!(RuleAction::Challenge < RuleAction::Block);
        assert_eq!(
            RuleAction::Challenge.max(RuleAction::Block),
            RuleAction::Block
        );
    }

    #[test]
    fn test_action_serialization() {
        let json = serde_json::to_string(&RuleAction::Challenge).unwrap();
        assert_eq!(json, "\"challenge\"");
    }

    #[test]
    fn test_triggered_rule_evidence() {
        let rule = TriggeredRule::new("VELOCITY", 50, RuleAction::Challenge, 40.0)
            .with_evidence(serde_json::json!({ "attempts": 7 }));
        assert_eq!(rule.evidence.unwrap()["attempts"], 7);
    }
}
