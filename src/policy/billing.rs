use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PolicyDecision, Violation};

/// Actions subject to billing authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingAction {
    ConsumeTokens,
    InvokeBot,
    CreateThread,
    ExportData,
}

/// What kind of subject is being billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    User,
    Bot,
    Workspace,
}

impl SubjectKind {
    fn allows(&self, action: BillingAction) -> bool {
        match self {
            SubjectKind::User => true,
            // Bots consume and invoke but never export tenant data.
            SubjectKind::Bot => matches!(
                action,
                BillingAction::ConsumeTokens | BillingAction::InvokeBot
            ),
            // Workspace-level billing covers structural actions only.
            SubjectKind::Workspace => matches!(
                action,
                BillingAction::CreateThread | BillingAction::ExportData
            ),
        }
    }
}

/// What happens when usage would exceed the plan limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OveruseStrategy {
    Block,
    Allow,
    /// Allows, but the decision is reason-tagged so callers can attach
    /// warning metadata later
    AllowWarn,
}

/// Subscription plan snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Units allowed per billing period; `None` means unmetered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_limit: Option<u64>,

    pub overuse_strategy: OveruseStrategy,
}

impl Default for Plan {
    fn default() -> Self {
        Plan {
            expires_at: None,
            period_limit: None,
            overuse_strategy: OveruseStrategy::Block,
        }
    }
}

/// The billed subject as assembled by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingSubject {
    pub kind: SubjectKind,
    pub blocked: bool,
    pub plan: Plan,
}

/// Usage counters for the limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub used_in_period: u64,

    /// Units this action would consume
    pub amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingAllow {
    Permitted,
    /// Over the limit under `AllowWarn`
    OveruseWarning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingDeny {
    SubjectBlocked,
    PlanExpired,
    ActionNotAllowed,
    PlanLimitExceeded,
}

/// Billing authorization checks, first denial wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct BillingPolicy;

impl BillingPolicy {
    pub fn can_perform(
        &self,
        action: BillingAction,
        subject: &BillingSubject,
        usage: Option<&Usage>,
        now: DateTime<Utc>,
    ) -> PolicyDecision<BillingAllow, BillingDeny> {
        if subject.blocked {
            return PolicyDecision::deny(BillingDeny::SubjectBlocked);
        }

        if let Some(expires_at) = subject.plan.expires_at {
            if expires_at <= now {
                return PolicyDecision::deny(BillingDeny::PlanExpired);
            }
        }

        if !subject.kind.allows(action) {
            return PolicyDecision::deny(BillingDeny::ActionNotAllowed);
        }

        if let (Some(usage), Some(limit)) = (usage, subject.plan.period_limit) {
            let projected = usage.used_in_period.saturating_add(usage.amount);
            if projected > limit {
                return match subject.plan.overuse_strategy {
                    OveruseStrategy::Block => PolicyDecision::deny_with(
                        BillingDeny::PlanLimitExceeded,
                        Violation::new(
                            "plan_limit_exceeded",
                            format!("{projected} > {limit}"),
                        ),
                    ),
                    OveruseStrategy::Allow => PolicyDecision::allow(BillingAllow::Permitted),
                    OveruseStrategy::AllowWarn => {
                        PolicyDecision::allow(BillingAllow::OveruseWarning)
                    }
                };
            }
        }

        PolicyDecision::allow(BillingAllow::Permitted)
    }
}
