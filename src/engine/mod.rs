pub mod error;
pub mod pipeline;
pub mod provider;

pub use error::{classify_pipeline_error, PipelineError, PipelineStep};
pub use pipeline::{EvaluationOutcome, RiskEngine};
pub use provider::{assess_with_timeout, RiskProvider, DEFAULT_PROVIDER_TIMEOUT};

use crate::domain::{
    BlockReason, DecisionPolicy, DecisionResult, DecisionSignals, RiskLevel, RuleAction,
    TriggeredRule,
};
use crate::observability::metrics as obs;

/// Map an aggregated risk level plus triggered rules and signals to an
/// allow / challenge / block recommendation.
///
/// First match in the priority chain wins:
/// 1. missing/malformed risk level  -> block(unknown_risk_level)
/// 2. critical risk                 -> block(critical_risk)
/// 3. reputation below threshold    -> block(critical_reputation)
/// 4. rule recommendations          -> block(rule_block), else challenge
/// 5. challenge_on_high_risk + high/medium -> challenge
/// 6. allow
///
/// Rule aggregation is order-independent: only the most severe
/// recommendation matters, not which rule carried it.
pub fn determine_decision_hint(
    risk_level: Option<RiskLevel>,
    triggered_rules: &[TriggeredRule],
    signals: Option<&DecisionSignals>,
    policy: &DecisionPolicy,
) -> DecisionResult {
    let decision = decide(risk_level, triggered_rules, signals, policy);
    obs::record_decision(decision.action);
    decision
}

fn decide(
    risk_level: Option<RiskLevel>,
    triggered_rules: &[TriggeredRule],
    signals: Option<&DecisionSignals>,
    policy: &DecisionPolicy,
) -> DecisionResult {
    // 1. Malformed input at the boundary fails safe.
    let risk_level = match risk_level {
        Some(level) => level,
        None => return DecisionResult::block(BlockReason::UnknownRiskLevel),
    };

    // 2. Critical risk blocks unconditionally.
    if risk_level.is_critical() {
        return DecisionResult::block(BlockReason::CriticalRisk);
    }

    // 3. Critical reputation blocks regardless of risk level.
    if let Some(reputation) = signals.and_then(|s| s.reputation_score) {
        if reputation.is_finite() && reputation < policy.critical_reputation_threshold {
            return DecisionResult::block(BlockReason::CriticalReputation);
        }
    }

    // 4. Most severe rule recommendation. A blocking rule degrades to a
    //    challenge when block_on_critical_rules is off.
    let worst = triggered_rules
        .iter()
        .map(|r| r.action)
        .max()
        .unwrap_or(RuleAction::Observe);

    match worst {
        RuleAction::Block if policy.block_on_critical_rules => {
            return DecisionResult::block(BlockReason::RuleBlock);
        }
        RuleAction::Block | RuleAction::Challenge => {
            return DecisionResult::challenge();
        }
        RuleAction::Observe => {}
    }

    // 5. Elevated risk without a rule recommendation.
    if policy.challenge_on_high_risk
        && matches!(risk_level, RiskLevel::High | RiskLevel::Medium)
    {
        return DecisionResult::challenge();
    }

    // 6. Fallthrough.
    DecisionResult::allow()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Action;

    fn rule(action: RuleAction) -> TriggeredRule {
        TriggeredRule::new("R", 10, action, 50.0)
    }

    #[test]
    fn test_missing_level_blocks() {
        let d = determine_decision_hint(None, &[], None, &DecisionPolicy::default());
        assert_eq!(d.block_reason, Some(BlockReason::UnknownRiskLevel));
    }

    #[test]
    fn test_critical_always_blocks() {
        // Rules and signals cannot rescue a critical level.
        let signals = DecisionSignals {
            reputation_score: Some(99.0),
        };
        let d = determine_decision_hint(
            Some(RiskLevel::Critical),
            &[],
            Some(&signals),
            &DecisionPolicy::default(),
        );
        assert_eq!(d.block_reason, Some(BlockReason::CriticalRisk));
    }

    #[test]
    fn test_critical_reputation_blocks_even_on_low_risk() {
        let signals = DecisionSignals {
            reputation_score: Some(5.0),
        };
        let d = determine_decision_hint(
            Some(RiskLevel::Low),
            &[],
            Some(&signals),
            &DecisionPolicy::default(),
        );
        assert_eq!(d.block_reason, Some(BlockReason::CriticalReputation));
    }

    #[test]
    fn test_reputation_at_threshold_passes() {
        let signals = DecisionSignals {
            reputation_score: Some(10.0),
        };
        let d = determine_decision_hint(
            Some(RiskLevel::Low),
            &[],
            Some(&signals),
            &DecisionPolicy::default(),
        );
        assert_eq!(d.action, Action::Allow);
    }

    #[test]
    fn test_non_finite_reputation_ignored() {
        let signals = DecisionSignals {
            reputation_score: Some(f64::NAN),
        };
        let d = determine_decision_hint(
            Some(RiskLevel::Low),
            &[],
            Some(&signals),
            &DecisionPolicy::default(),
        );
        assert_eq!(d.action, Action::Allow);
    }

    #[test]
    fn test_rule_block_wins_over_challenge() {
        let rules = vec![rule(RuleAction::Challenge), rule(RuleAction::Block)];
        let d = determine_decision_hint(
            Some(RiskLevel::Low),
            &rules,
            None,
            &DecisionPolicy::default(),
        );
        assert_eq!(d.block_reason, Some(BlockReason::RuleBlock));
    }

    #[test]
    fn test_rule_order_does_not_matter() {
        let forward = vec![rule(RuleAction::Challenge), rule(RuleAction::Block)];
        let backward = vec![rule(RuleAction::Block), rule(RuleAction::Challenge)];
        let policy = DecisionPolicy::default();

        assert_eq!(
            determine_decision_hint(Some(RiskLevel::Low), &forward, None, &policy),
            determine_decision_hint(Some(RiskLevel::Low), &backward, None, &policy),
        );
    }

    #[test]
    fn test_block_rule_degrades_when_disabled() {
        let policy = DecisionPolicy {
            block_on_critical_rules: false,
            ..DecisionPolicy::default()
        };
        let rules = vec![rule(RuleAction::Block)];
        let d = determine_decision_hint(Some(RiskLevel::Low), &rules, None, &policy);
        assert_eq!(d.action, Action::Challenge);
    }

    #[test]
    fn test_high_and_medium_challenge() {
        let policy = DecisionPolicy::default();
        for level in [RiskLevel::High, RiskLevel::Medium] {
            let d = determine_decision_hint(Some(level), &[], None, &policy);
            assert_eq!(d.action, Action::Challenge);
        }
    }

    #[test]
    fn test_high_risk_allows_when_challenge_disabled() {
        let policy = DecisionPolicy {
            challenge_on_high_risk: false,
            ..DecisionPolicy::default()
        };
        let d = determine_decision_hint(Some(RiskLevel::High), &[], None, &policy);
        assert_eq!(d.action, Action::Allow);
    }

    #[test]
    fn test_low_risk_allows() {
        let d = determine_decision_hint(Some(RiskLevel::Low), &[], None, &DecisionPolicy::default());
        assert_eq!(d, DecisionResult::allow());
    }

    #[test]
    fn test_observe_rules_do_not_challenge() {
        let rules = vec![rule(RuleAction::Observe)];
        let d = determine_decision_hint(
            Some(RiskLevel::Low),
            &rules,
            None,
            &DecisionPolicy::default(),
        );
        assert_eq!(d.action, Action::Allow);
    }
}
