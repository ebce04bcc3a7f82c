pub mod aggregate;
pub mod config;
pub mod domain;
pub mod engine;
pub mod observability;
pub mod policy;
pub mod rollout;
pub mod rules;
pub mod shadow;

pub use aggregate::aggregate_risk_sources;
pub use config::{load_config, ConfigWatcher, EngineConfig};
pub use domain::{
    Action, AggregatedRisk, AssessmentResult, BlockReason, DecisionPolicy, DecisionResult,
    DecisionSignals, RiskContext, RiskLevel, RiskSource, Thresholds, TriggeredRule,
};
pub use engine::{determine_decision_hint, RiskEngine, RiskProvider};
pub use policy::{ComposedPolicy, PolicyDecision};
pub use rollout::{resolve_pipeline_version, should_use_shadow_mode, RolloutConfig, Version};
pub use rules::{ClassificationRule, RuleSet};
pub use shadow::{aggregate_disagreement_metrics, DashboardMetrics, DisagreementMetric};
