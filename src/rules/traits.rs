use crate::domain::{RiskContext, TriggeredRule};
use std::fmt::Debug;

/// Trait for independent classification rules.
///
/// Rules are pure over the evaluation context: no state, no I/O, no
/// mutation. Each rule either triggers (returning its hit with priority,
/// recommended action and score contribution) or stays silent.
pub trait ClassificationRule: Send + Sync + Debug {
    /// Unique identifier for this rule.
    fn id(&self) -> &str;

    /// Ordering weight; higher-priority hits sort first in the output.
    fn priority(&self) -> u32;

    /// Evaluate the rule against a context.
    fn evaluate(&self, ctx: &RiskContext) -> Option<TriggeredRule>;
}
