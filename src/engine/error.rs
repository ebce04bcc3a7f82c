use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline step a boundary error originated from.
///
/// Carried on errors as an explicit tag so classification never has to
/// guess from message text when the source is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Fingerprint,
    RiskAssessment,
    /// The timeout guard wrapping the remote provider call
    Timeout,
    Isolation,
}

/// Normalized taxonomy for errors crossing the pipeline boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("fingerprint collection failed: {0}")]
    FingerprintFailed(String),

    #[error("risk assessment failed: {0}")]
    RiskAssessmentFailed(String),

    #[error("pipeline step timed out: {0}")]
    Timeout(String),

    #[error("shadow isolation failed: {0}")]
    IsolationError(String),
}

impl PipelineError {
    /// Stable reason code for audit records.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::FingerprintFailed(_) => "fingerprint_failed",
            PipelineError::RiskAssessmentFailed(_) => "risk_assessment_failed",
            PipelineError::Timeout(_) => "timeout",
            PipelineError::IsolationError(_) => "isolation_error",
        }
    }
}

/// Classify an error into the pipeline taxonomy.
///
/// The explicit step tag is the primary mechanism; message sniffing is only
/// a fallback for untyped errors from injected collaborators.
pub fn classify_pipeline_error(step: Option<PipelineStep>, message: &str) -> PipelineError {
    let message = message.to_string();

    match step {
        Some(PipelineStep::Fingerprint) => PipelineError::FingerprintFailed(message),
        Some(PipelineStep::RiskAssessment) => PipelineError::RiskAssessmentFailed(message),
        Some(PipelineStep::Timeout) => PipelineError::Timeout(message),
        Some(PipelineStep::Isolation) => PipelineError::IsolationError(message),
        None => classify_by_message(message),
    }
}

fn classify_by_message(message: String) -> PipelineError {
    let lower = message.to_lowercase();

    if lower.contains("timed out") || lower.contains("timeout") {
        PipelineError::Timeout(message)
    } else if lower.contains("fingerprint") {
        PipelineError::FingerprintFailed(message)
    } else if lower.contains("isolation") || lower.contains("shadow") {
        PipelineError::IsolationError(message)
    } else {
        PipelineError::RiskAssessmentFailed(message)
    }
}
