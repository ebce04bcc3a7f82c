use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::domain::{AssessmentResult, DeviceInfo, RiskContext};
use crate::observability::metrics as obs;

/// Default timeout for the remote provider call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_millis(5000);

/// Injected remote risk provider (the v2 pipeline's external source).
///
/// The one fallible, asynchronous boundary in the engine. Implementations
/// may do network I/O; everything downstream of `assess_with_timeout` is
/// synchronous and total.
#[async_trait]
pub trait RiskProvider: Send + Sync {
    async fn assess(
        &self,
        device: Option<&DeviceInfo>,
        ctx: &RiskContext,
    ) -> anyhow::Result<AssessmentResult>;
}

/// Call the provider with timeout isolation.
///
/// Never fails: a timeout or provider error resolves to the synthetic
/// maximal-risk, zero-confidence result so aggregation always completes.
pub async fn assess_with_timeout(
    provider: &dyn RiskProvider,
    device: Option<&DeviceInfo>,
    ctx: &RiskContext,
    timeout: Duration,
) -> AssessmentResult {
    match tokio::time::timeout(timeout, provider.assess(device, ctx)).await {
        Ok(Ok(result)) => result,
        Ok(Err(error)) => {
            warn!(
                evaluation_id = %ctx.evaluation_id,
                error = %error,
                "remote risk provider failed, substituting synthetic maximal risk"
            );
            obs::record_provider_failure("error");
            AssessmentResult::synthetic_failure()
        }
        Err(_) => {
            warn!(
                evaluation_id = %ctx.evaluation_id,
                timeout_ms = timeout.as_millis() as u64,
                "remote risk provider timed out, substituting synthetic maximal risk"
            );
            obs::record_provider_failure("timeout");
            AssessmentResult::synthetic_failure()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct HealthyProvider;

    #[async_trait]
    impl RiskProvider for HealthyProvider {
        async fn assess(
            &self,
            _device: Option<&DeviceInfo>,
            _ctx: &RiskContext,
        ) -> anyhow::Result<AssessmentResult> {
            Ok(AssessmentResult::with_score(25.0))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl RiskProvider for FailingProvider {
        async fn assess(
            &self,
            _device: Option<&DeviceInfo>,
            _ctx: &RiskContext,
        ) -> anyhow::Result<AssessmentResult> {
            Err(anyhow!("upstream returned 503"))
        }
    }

    struct HangingProvider;

    #[async_trait]
    impl RiskProvider for HangingProvider {
        async fn assess(
            &self,
            _device: Option<&DeviceInfo>,
            _ctx: &RiskContext,
        ) -> anyhow::Result<AssessmentResult> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(AssessmentResult::with_score(0.0))
        }
    }

    #[tokio::test]
    async fn test_healthy_provider_passes_through() {
        let ctx = RiskContext::new();
        let result =
            assess_with_timeout(&HealthyProvider, None, &ctx, DEFAULT_PROVIDER_TIMEOUT).await;
        assert_eq!(result.risk_score, 25.0);
    }

    #[tokio::test]
    async fn test_provider_error_becomes_synthetic_maximal_risk() {
        let ctx = RiskContext::new();
        let result =
            assess_with_timeout(&FailingProvider, None, &ctx, DEFAULT_PROVIDER_TIMEOUT).await;
        assert_eq!(result.risk_score, 100.0);
        assert_eq!(result.confidence, Some(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_timeout_becomes_synthetic_maximal_risk() {
        let ctx = RiskContext::new();
        let result =
            assess_with_timeout(&HangingProvider, None, &ctx, Duration::from_millis(50)).await;
        assert_eq!(result.risk_score, 100.0);
        assert_eq!(result.confidence, Some(0.0));
    }
}
