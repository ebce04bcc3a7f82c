use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use uuid::Uuid;

/// Unique user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tenant (workspace) identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        TenantId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Device fingerprint data supplied by the out-of-process collector.
///
/// Input only; this crate never derives fingerprints itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub fingerprint: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl DeviceInfo {
    pub fn new(fingerprint: impl Into<String>) -> Self {
        DeviceInfo {
            fingerprint: fingerprint.into(),
            user_agent: None,
            platform: None,
        }
    }
}

/// Everything known about one evaluation request.
///
/// Assembled by the caller's context builder; all fields are inputs and
/// nothing here is mutated during evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskContext {
    /// Correlation id for audit records and shadow comparisons
    pub evaluation_id: Uuid,

    pub user_id: Option<UserId>,
    pub tenant_id: Option<TenantId>,

    /// Client IP as observed at the edge
    pub ip: Option<String>,

    pub device: Option<DeviceInfo>,

    /// Fingerprints previously seen for this user
    #[serde(default)]
    pub known_fingerprints: SmallVec<[String; 2]>,

    /// Failed authentication attempts within the velocity window
    #[serde(default)]
    pub recent_failures: u32,

    pub observed_at: DateTime<Utc>,
}

impl RiskContext {
    pub fn new() -> Self {
        RiskContext {
            evaluation_id: Uuid::new_v4(),
            user_id: None,
            tenant_id: None,
            ip: None,
            device: None,
            known_fingerprints: SmallVec::new(),
            recent_failures: 0,
            observed_at: Utc::now(),
        }
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        RiskContext {
            user_id: Some(UserId::new(user_id)),
            ..RiskContext::new()
        }
    }

    /// Stable identity used for deterministic rollout bucketing.
    ///
    /// Preference order: user, tenant, IP, then the evaluation id. The
    /// last resort keeps bucketing deterministic per request instead of
    /// falling back to randomness.
    pub fn stable_identity(&self) -> String {
        if let Some(user) = &self.user_id {
            return user.as_str().to_string();
        }
        if let Some(tenant) = &self.tenant_id {
            return tenant.as_str().to_string();
        }
        if let Some(ip) = &self.ip {
            return ip.clone();
        }
        self.evaluation_id.to_string()
    }
}

impl Default for RiskContext {
    fn default() -> Self {
        RiskContext::new()
    }
}
