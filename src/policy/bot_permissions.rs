use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::PolicyDecision;
use crate::domain::TenantId;

/// Capabilities a bot can be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotCapability {
    ReadMessages,
    SendMessages,
    ManageWebhooks,
    InvokeTools,
}

/// Bot registration snapshot as assembled by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotProfile {
    pub bot_id: String,
    pub tenant_id: TenantId,

    /// Platform-wide suspension (abuse, key compromise)
    pub suspended: bool,

    /// Tenant-level enablement toggle
    pub enabled: bool,

    pub capabilities: HashSet<BotCapability>,
}

impl BotProfile {
    pub fn new(bot_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        BotProfile {
            bot_id: bot_id.into(),
            tenant_id: TenantId::new(tenant_id),
            suspended: false,
            enabled: true,
            capabilities: HashSet::new(),
        }
    }

    pub fn with_capability(mut self, capability: BotCapability) -> Self {
        self.capabilities.insert(capability);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotPermissionsAllow {
    Permitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotPermissionsDeny {
    BotSuspended,
    CapabilityNotGranted,
    TenantScopeMismatch,
}

/// Capability checks for bot invocations, first denial wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct BotPermissionsPolicy;

impl BotPermissionsPolicy {
    pub fn can_invoke(
        &self,
        bot: &BotProfile,
        capability: BotCapability,
        tenant: &TenantId,
    ) -> PolicyDecision<BotPermissionsAllow, BotPermissionsDeny> {
        if bot.suspended {
            return PolicyDecision::deny(BotPermissionsDeny::BotSuspended);
        }

        if !bot.capabilities.contains(&capability) {
            return PolicyDecision::deny(BotPermissionsDeny::CapabilityNotGranted);
        }

        if &bot.tenant_id != tenant {
            return PolicyDecision::deny(BotPermissionsDeny::TenantScopeMismatch);
        }

        PolicyDecision::allow(BotPermissionsAllow::Permitted)
    }
}
