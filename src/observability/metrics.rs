//! Metric names and recording helpers.
//!
//! Uses the `metrics` facade; the embedding service installs whichever
//! exporter it runs. Every fail-closed degradation is counted so a
//! misbehaving signal source shows up on a dashboard instead of silently
//! inflating block rates.

use metrics::{counter, describe_counter};

use crate::domain::Action;

pub const DECISIONS_TOTAL: &str = "riskgate_decisions_total";
pub const FAIL_CLOSED_TOTAL: &str = "riskgate_fail_closed_total";
pub const PROVIDER_FAILURES_TOTAL: &str = "riskgate_provider_failures_total";
pub const V2_WEAKER_TOTAL: &str = "riskgate_v2_weaker_total";
pub const SHADOW_RUNS_TOTAL: &str = "riskgate_shadow_runs_total";

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(DECISIONS_TOTAL, "Decision hints issued, by action");
    describe_counter!(
        FAIL_CLOSED_TOTAL,
        "Aggregations that degraded to the fail-closed fallback, by cause"
    );
    describe_counter!(
        PROVIDER_FAILURES_TOTAL,
        "Remote provider calls replaced by the synthetic maximal-risk result"
    );
    describe_counter!(
        V2_WEAKER_TOTAL,
        "Shadow comparisons where v2 found less risk than v1"
    );
    describe_counter!(SHADOW_RUNS_TOTAL, "Non-authoritative v2 comparison runs");
}

pub fn record_decision(action: Action) {
    let label = match action {
        Action::Allow => "allow",
        Action::Challenge => "challenge",
        Action::Block => "block",
    };
    counter!(DECISIONS_TOTAL, "action" => label).increment(1);
}

pub fn record_fail_closed(cause: &'static str) {
    counter!(FAIL_CLOSED_TOTAL, "cause" => cause).increment(1);
}

pub fn record_provider_failure(kind: &'static str) {
    counter!(PROVIDER_FAILURES_TOTAL, "kind" => kind).increment(1);
}

pub fn record_v2_weaker() {
    counter!(V2_WEAKER_TOTAL).increment(1);
}

pub fn record_shadow_run() {
    counter!(SHADOW_RUNS_TOTAL).increment(1);
}
