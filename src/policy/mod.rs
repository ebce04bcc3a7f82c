//! Pre-flight authorization policies over a shared decision algebra.
//!
//! Each policy is a stateless value with one `can_*` entry point running
//! ordered invariant checks: first denial wins, fallthrough is allow.
//! `ComposedPolicy` owns the five policies and exposes one facade method
//! per check.

pub mod auth;
pub mod billing;
pub mod bot;
pub mod bot_permissions;
pub mod chat;

pub use auth::{AccountState, AuthAllow, AuthDeny, AuthPolicy};
pub use billing::{
    BillingAction, BillingAllow, BillingDeny, BillingPolicy, BillingSubject, OveruseStrategy,
    Plan, SubjectKind, Usage,
};
pub use bot::{BotAllow, BotDeny, BotPolicy};
pub use bot_permissions::{
    BotCapability, BotPermissionsAllow, BotPermissionsDeny, BotPermissionsPolicy, BotProfile,
};
pub use chat::{
    ChatAction, ChatActor, ChatAllow, ChatDeny, ChatMode, ChatPolicy, ChatRole, ChatState,
    ChatActorKind, MessagePayload,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::TenantId;

/// Structured detail attached to a denial for the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Stable machine-readable code
    pub code: String,

    /// Human-oriented detail, safe to log
    pub detail: String,
}

impl Violation {
    pub fn new(code: impl Into<String>, detail: impl Into<String>) -> Self {
        Violation {
            code: code.into(),
            detail: detail.into(),
        }
    }
}

/// Shared allow/deny algebra for all authorization policies.
///
/// A sealed sum type: matching is exhaustive at compile time, so callers
/// cannot forget the deny arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDecision<A, D> {
    Allow {
        reason: A,
    },
    Deny {
        reason: D,
        #[serde(skip_serializing_if = "Option::is_none")]
        violation: Option<Violation>,
    },
}

impl<A, D> PolicyDecision<A, D> {
    #[inline]
    pub fn allow(reason: A) -> Self {
        PolicyDecision::Allow { reason }
    }

    #[inline]
    pub fn deny(reason: D) -> Self {
        PolicyDecision::Deny {
            reason,
            violation: None,
        }
    }

    #[inline]
    pub fn deny_with(reason: D, violation: Violation) -> Self {
        PolicyDecision::Deny {
            reason,
            violation: Some(violation),
        }
    }

    #[inline]
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allow { .. })
    }

    pub fn deny_reason(&self) -> Option<&D> {
        match self {
            PolicyDecision::Allow { .. } => None,
            PolicyDecision::Deny { reason, .. } => Some(reason),
        }
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            PolicyDecision::Allow { .. } => None,
            PolicyDecision::Deny { violation, .. } => violation.as_ref(),
        }
    }
}

/// Facade over the five authorization policies.
///
/// Ownership composition, not inheritance: the composer holds five
/// independent stateless policy values and passes each check through.
#[derive(Debug, Clone, Default)]
pub struct ComposedPolicy {
    auth: AuthPolicy,
    bot_permissions: BotPermissionsPolicy,
    bot: BotPolicy,
    chat: ChatPolicy,
    billing: BillingPolicy,
}

impl ComposedPolicy {
    pub fn new() -> Self {
        ComposedPolicy::default()
    }

    pub fn can_authenticate(&self, account: &AccountState) -> PolicyDecision<AuthAllow, AuthDeny> {
        self.auth.can_authenticate(account)
    }

    pub fn can_invoke_capability(
        &self,
        bot: &BotProfile,
        capability: BotCapability,
        tenant: &TenantId,
    ) -> PolicyDecision<BotPermissionsAllow, BotPermissionsDeny> {
        self.bot_permissions.can_invoke(bot, capability, tenant)
    }

    pub fn can_operate_in_chat(
        &self,
        bot: &BotProfile,
        chat: &ChatState,
        attached: bool,
    ) -> PolicyDecision<BotAllow, BotDeny> {
        self.bot.can_operate(bot, chat, attached)
    }

    pub fn can_perform_chat_action(
        &self,
        action: ChatAction,
        chat: &ChatState,
        actor: &ChatActor,
        payload: Option<&MessagePayload>,
    ) -> PolicyDecision<ChatAllow, ChatDeny> {
        self.chat.can_perform(action, chat, actor, payload)
    }

    pub fn can_perform_billing_action(
        &self,
        action: BillingAction,
        subject: &BillingSubject,
        usage: Option<&Usage>,
        now: DateTime<Utc>,
    ) -> PolicyDecision<BillingAllow, BillingDeny> {
        self.billing.can_perform(action, subject, usage, now)
    }
}
