use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::aggregate::aggregate_risk_sources;
use crate::config::EngineConfig;
use crate::domain::{
    AggregatedRisk, DecisionResult, DecisionSignals, RiskContext, RiskSource,
};
use crate::observability::metrics as obs;
use crate::rollout::{resolve_version, Version};
use crate::rules::RuleSet;
use crate::shadow::DisagreementMetric;

use super::provider::{assess_with_timeout, RiskProvider};

/// Result of one full pipeline evaluation.
pub struct EvaluationOutcome {
    pub evaluation_id: Uuid,

    /// Which version selection applied to this request
    pub version: Version,

    /// Authoritative aggregated risk
    pub risk: AggregatedRisk,

    /// Authoritative decision hint
    pub decision: DecisionResult,

    /// Pending shadow comparison, present only under `ShadowV2`.
    ///
    /// The caller may await it to collect the metric or drop it outright;
    /// either way the authoritative path above was never gated on it.
    pub shadow: Option<JoinHandle<DisagreementMetric>>,
}

/// Orchestrates v1/v2 evaluation under the rollout selection.
///
/// v1 is the synchronous local-rules pipeline; v2 adds the remote
/// provider source behind timeout isolation. Shadow execution is
/// decoupled: the authoritative path never waits on, or fails because
/// of, the comparison run.
#[derive(Clone)]
pub struct RiskEngine {
    config: Arc<EngineConfig>,
    rules: Arc<RuleSet>,
    provider: Option<Arc<dyn RiskProvider>>,
}

impl RiskEngine {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        let blocked: HashSet<String> = config.blocked_ips.iter().cloned().collect();
        let rules = Arc::new(RuleSet::standard(blocked, config.velocity_threshold));

        RiskEngine {
            config,
            rules,
            provider: None,
        }
    }

    /// Inject the remote risk provider used by the v2 pipeline.
    pub fn with_provider(mut self, provider: Arc<dyn RiskProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// v1: local classification rules only. Synchronous and total.
    pub fn evaluate_v1(
        &self,
        ctx: &RiskContext,
        signals: Option<&DecisionSignals>,
    ) -> (AggregatedRisk, DecisionResult) {
        let sources = vec![self
            .rules
            .to_risk_source(ctx, self.config.local_source_weight)];

        self.decide(ctx, sources, signals)
    }

    /// v2: local rules plus the remote provider behind timeout isolation.
    pub async fn evaluate_v2(
        &self,
        ctx: &RiskContext,
        signals: Option<&DecisionSignals>,
    ) -> (AggregatedRisk, DecisionResult) {
        let mut sources = vec![self
            .rules
            .to_risk_source(ctx, self.config.local_source_weight)];

        if let Some(provider) = &self.provider {
            let result = assess_with_timeout(
                provider.as_ref(),
                ctx.device.as_ref(),
                ctx,
                self.config.provider_timeout(),
            )
            .await;
            sources.push(RiskSource::new(result, self.config.provider_source_weight));
        }

        self.decide(ctx, sources, signals)
    }

    fn decide(
        &self,
        ctx: &RiskContext,
        sources: Vec<RiskSource>,
        signals: Option<&DecisionSignals>,
    ) -> (AggregatedRisk, DecisionResult) {
        let risk = aggregate_risk_sources(&sources, Some(self.config.decision.thresholds));
        let decision = super::determine_decision_hint(
            Some(risk.risk_level),
            &risk.triggered_rules,
            signals,
            &self.config.decision,
        );

        debug!(
            evaluation_id = %ctx.evaluation_id,
            risk_score = risk.risk_score,
            risk_level = %risk.risk_level,
            action = %decision.action,
            "evaluation completed"
        );

        (risk, decision)
    }

    /// Evaluate under the rollout selection for this request.
    pub async fn evaluate(
        &self,
        ctx: &RiskContext,
        signals: Option<&DecisionSignals>,
    ) -> EvaluationOutcome {
        let version = resolve_version(ctx, &self.config.rollout);

        match version {
            Version::ActiveV2 => {
                let (risk, decision) = self.evaluate_v2(ctx, signals).await;
                EvaluationOutcome {
                    evaluation_id: ctx.evaluation_id,
                    version,
                    risk,
                    decision,
                    shadow: None,
                }
            }
            Version::ForcedV1 => {
                let (risk, decision) = self.evaluate_v1(ctx, signals);
                EvaluationOutcome {
                    evaluation_id: ctx.evaluation_id,
                    version,
                    risk,
                    decision,
                    shadow: None,
                }
            }
            Version::ShadowV2 => {
                let (risk, decision) = self.evaluate_v1(ctx, signals);
                let shadow = self.spawn_shadow(ctx, signals, &risk, &decision);

                EvaluationOutcome {
                    evaluation_id: ctx.evaluation_id,
                    version,
                    risk,
                    decision,
                    shadow: Some(shadow),
                }
            }
        }
    }

    /// Run the v2 comparison on its own task.
    ///
    /// The spawned future owns clones of everything it touches, so the
    /// authoritative evaluation cannot be slowed, blocked, or poisoned by
    /// it.
    fn spawn_shadow(
        &self,
        ctx: &RiskContext,
        signals: Option<&DecisionSignals>,
        v1_risk: &AggregatedRisk,
        v1_decision: &DecisionResult,
    ) -> JoinHandle<DisagreementMetric> {
        obs::record_shadow_run();

        let engine = self.clone();
        let ctx = ctx.clone();
        let signals = signals.copied();
        let threshold = self.config.rollout.exact_match_threshold;
        let v1_score = v1_risk.risk_score;
        let v1_action = v1_decision.action;

        tokio::spawn(async move {
            let (v2_risk, v2_decision) = engine.evaluate_v2(&ctx, signals.as_ref()).await;

            DisagreementMetric::compare(
                ctx.evaluation_id,
                v1_score,
                v2_risk.risk_score,
                v1_action,
                v2_decision.action,
                threshold,
            )
        })
    }
}
