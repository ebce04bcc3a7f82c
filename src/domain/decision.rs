use serde::{Deserialize, Serialize};
use std::fmt;

use super::risk::Thresholds;

/// Final action the engine recommends to the calling service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Allow,
    Challenge,
    Block,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Allow => write!(f, "allow"),
            Action::Challenge => write!(f, "challenge"),
            Action::Block => write!(f, "block"),
        }
    }
}

/// Machine-readable reason attached to every block decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// Risk level was missing or malformed at the boundary
    UnknownRiskLevel,
    CriticalRisk,
    CriticalReputation,
    RuleBlock,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::UnknownRiskLevel => "unknown_risk_level",
            BlockReason::CriticalRisk => "critical_risk",
            BlockReason::CriticalReputation => "critical_reputation",
            BlockReason::RuleBlock => "rule_block",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decision per evaluation. Pure value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub action: Action,

    /// Present exactly when `action == Block`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<BlockReason>,
}

impl DecisionResult {
    #[inline]
    pub fn allow() -> Self {
        DecisionResult {
            action: Action::Allow,
            block_reason: None,
        }
    }

    #[inline]
    pub fn challenge() -> Self {
        DecisionResult {
            action: Action::Challenge,
            block_reason: None,
        }
    }

    #[inline]
    pub fn block(reason: BlockReason) -> Self {
        DecisionResult {
            action: Action::Block,
            block_reason: Some(reason),
        }
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.action == Action::Block
    }
}

/// Tunables for the decision priority chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionPolicy {
    pub thresholds: Thresholds,

    /// Honor rule-level block recommendations; when off, a blocking rule
    /// degrades to a challenge recommendation
    pub block_on_critical_rules: bool,

    /// Challenge on high or medium risk even without a rule recommendation
    pub challenge_on_high_risk: bool,

    /// Reputation below this always blocks, whatever the risk level
    pub critical_reputation_threshold: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        DecisionPolicy {
            thresholds: Thresholds::DEFAULT,
            block_on_critical_rules: true,
            challenge_on_high_risk: true,
            critical_reputation_threshold: 10.0,
        }
    }
}

/// Optional per-request signals consulted by the decision chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionSignals {
    /// Subject reputation in [0,100]; lower is worse
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reputation_score: Option<f64>,
}
