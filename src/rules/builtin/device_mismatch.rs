use crate::domain::{RiskContext, RuleAction, TriggeredRule};
use crate::rules::traits::ClassificationRule;

/// Flags sign-ins from a fingerprint never seen for this user before.
///
/// Only meaningful when the user has history: a first-ever device (empty
/// known list) stays silent rather than challenging every new account.
#[derive(Debug)]
pub struct DeviceMismatchRule {
    id: String,
    priority: u32,
    score: f64,
}

impl DeviceMismatchRule {
    pub fn new(id: impl Into<String>, priority: u32) -> Self {
        DeviceMismatchRule {
            id: id.into(),
            priority,
            score: 50.0,
        }
    }
}

impl ClassificationRule for DeviceMismatchRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn evaluate(&self, ctx: &RiskContext) -> Option<TriggeredRule> {
        let device = ctx.device.as_ref()?;

        if ctx.known_fingerprints.is_empty() {
            return None;
        }

        if ctx
            .known_fingerprints
            .iter()
            .any(|fp| fp == &device.fingerprint)
        {
            return None;
        }

        Some(
            TriggeredRule::new(&self.id, self.priority, RuleAction::Challenge, self.score)
                .with_evidence(serde_json::json!({
                    "fingerprint": device.fingerprint,
                    "known_count": ctx.known_fingerprints.len(),
                })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeviceInfo;
    use smallvec::smallvec;

    fn ctx_with_device(fp: &str, known: &[&str]) -> RiskContext {
        let mut ctx = RiskContext::new();
        ctx.device = Some(DeviceInfo::new(fp));
        ctx.known_fingerprints = known.iter().map(|s| s.to_string()).collect();
        ctx
    }

    #[test]
    fn test_known_fingerprint_silent() {
        let rule = DeviceMismatchRule::new("DEVICE_MISMATCH", 60);
        let ctx = ctx_with_device("fp-a", &["fp-a", "fp-b"]);
        assert!(rule.evaluate(&ctx).is_none());
    }

    #[test]
    fn test_unknown_fingerprint_challenges() {
        let rule = DeviceMismatchRule::new("DEVICE_MISMATCH", 60);
        let ctx = ctx_with_device("fp-new", &["fp-a"]);

        let hit = rule.evaluate(&ctx).unwrap();
        assert_eq!(hit.action, RuleAction::Challenge);
        assert_eq!(hit.evidence.unwrap()["fingerprint"], "fp-new");
    }

    #[test]
    fn test_no_history_silent() {
        let rule = DeviceMismatchRule::new("DEVICE_MISMATCH", 60);
        let ctx = ctx_with_device("fp-new", &[]);
        assert!(rule.evaluate(&ctx).is_none());
    }

    #[test]
    fn test_no_device_silent() {
        let rule = DeviceMismatchRule::new("DEVICE_MISMATCH", 60);
        let mut ctx = RiskContext::new();
        ctx.known_fingerprints = smallvec!["fp-a".to_string()];
        assert!(rule.evaluate(&ctx).is_none());
    }
}
