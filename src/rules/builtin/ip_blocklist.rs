use std::collections::HashSet;

use crate::domain::{RiskContext, RuleAction, TriggeredRule};
use crate::rules::traits::ClassificationRule;

/// Blocks requests from IPs on a configured deny list.
///
/// The list is built once at construction; a missing client IP does not
/// trigger (the aggregator's fail-closed paths cover absent signals).
#[derive(Debug)]
pub struct IpBlocklistRule {
    id: String,
    priority: u32,
    blocked: HashSet<String>,
}

impl IpBlocklistRule {
    pub fn new(id: impl Into<String>, priority: u32, blocked: HashSet<String>) -> Self {
        IpBlocklistRule {
            id: id.into(),
            priority,
            blocked,
        }
    }
}

impl ClassificationRule for IpBlocklistRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn evaluate(&self, ctx: &RiskContext) -> Option<TriggeredRule> {
        let ip = ctx.ip.as_deref()?;

        if self.blocked.contains(ip) {
            return Some(
                TriggeredRule::new(&self.id, self.priority, RuleAction::Block, 100.0)
                    .with_evidence(serde_json::json!({ "ip": ip })),
            );
        }

        None
    }
}
