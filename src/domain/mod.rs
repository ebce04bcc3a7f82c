pub mod context;
pub mod decision;
pub mod risk;
pub mod rule;

pub use context::{DeviceInfo, RiskContext, TenantId, UserId};
pub use decision::{Action, BlockReason, DecisionPolicy, DecisionResult, DecisionSignals};
pub use risk::{AggregatedRisk, AssessmentResult, RiskLevel, RiskSource, Thresholds};
pub use rule::{RuleAction, TriggeredRule};
