//! Deterministic engine-version selection for shadow rollout.
//!
//! Same identity + same config => same version, always. There is no random
//! fallback: a request without user, tenant, or IP buckets on its own
//! evaluation id, which is still stable for that request.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::domain::RiskContext;

/// Engine version selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Version {
    /// v1 only (the default)
    ForcedV1,
    /// v1 authoritative, v2 evaluated for comparison only
    ShadowV2,
    /// v2 authoritative
    ActiveV2,
}

impl Version {
    /// The pipeline version that is authoritative for this selection.
    #[inline]
    pub fn pipeline_version(&self) -> u8 {
        match self {
            Version::ForcedV1 | Version::ShadowV2 => 1,
            Version::ActiveV2 => 2,
        }
    }

    #[inline]
    pub fn is_shadow(&self) -> bool {
        *self == Version::ShadowV2
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::ForcedV1 => write!(f, "forced_v1"),
            Version::ShadowV2 => write!(f, "shadow_v2"),
            Version::ActiveV2 => write!(f, "active_v2"),
        }
    }
}

/// Process-wide rollout configuration.
///
/// Loaded at startup, read-only during request handling; reconfiguration
/// is an atomic swap seen only by subsequently-started evaluations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutConfig {
    /// Percentage of traffic evaluated in shadow mode, in [0,100]
    pub shadow_percentage: f64,

    /// Percentage of traffic served by v2, in [0,100]
    pub active_percentage: f64,

    /// Per-tenant forced selections; checked before bucketing
    pub tenant_overrides: HashMap<String, Version>,

    /// Per-user forced selections; checked after tenant overrides
    pub user_overrides: HashMap<String, Version>,

    /// Score delta below which v1 and v2 are considered in agreement
    pub exact_match_threshold: f64,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        RolloutConfig {
            shadow_percentage: 0.0,
            active_percentage: 0.0,
            tenant_overrides: HashMap::new(),
            user_overrides: HashMap::new(),
            exact_match_threshold: 10.0,
        }
    }
}

impl RolloutConfig {
    /// Normalize percentages into [0,100] with shadow+active <= 100.
    ///
    /// Invalid values degrade to zero v2 traffic rather than rejecting
    /// the config.
    pub fn validated(mut self) -> Self {
        let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 };

        self.shadow_percentage = clamp(self.shadow_percentage);
        self.active_percentage = clamp(self.active_percentage);

        if self.shadow_percentage + self.active_percentage > 100.0 {
            tracing::warn!(
                shadow = self.shadow_percentage,
                active = self.active_percentage,
                "rollout percentages exceed 100, disabling v2 traffic"
            );
            self.shadow_percentage = 0.0;
            self.active_percentage = 0.0;
        }

        if !self.exact_match_threshold.is_finite() || self.exact_match_threshold < 0.0 {
            self.exact_match_threshold = 10.0;
        }

        self
    }
}

/// Non-cryptographic polynomial string hash (h = h*31 + byte, wrapping).
///
/// Cheap, stable across processes, and uniform enough for percentage
/// bucketing. Not for anything security-sensitive.
fn polynomial_hash(identity: &str) -> u32 {
    identity
        .bytes()
        .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(b as u32))
}

/// Bucket an identity into [0,100).
pub fn bucket_for(identity: &str) -> u32 {
    polynomial_hash(identity) % 100
}

/// One strategy in the version-resolution chain.
pub trait VersionResolver: Send + Sync {
    /// Resolve a version for the request, `ForcedV1` meaning "no opinion".
    fn resolve(&self, ctx: &RiskContext, config: &RolloutConfig) -> Version;
}

/// Forces a version for specific tenants.
pub struct TenantOverrideResolver;

impl VersionResolver for TenantOverrideResolver {
    fn resolve(&self, ctx: &RiskContext, config: &RolloutConfig) -> Version {
        ctx.tenant_id
            .as_ref()
            .and_then(|t| config.tenant_overrides.get(t.as_str()))
            .copied()
            .unwrap_or(Version::ForcedV1)
    }
}

/// Forces a version for specific users.
pub struct UserOverrideResolver;

impl VersionResolver for UserOverrideResolver {
    fn resolve(&self, ctx: &RiskContext, config: &RolloutConfig) -> Version {
        ctx.user_id
            .as_ref()
            .and_then(|u| config.user_overrides.get(u.as_str()))
            .copied()
            .unwrap_or(Version::ForcedV1)
    }
}

/// Buckets the stable identity against the global traffic percentages.
pub struct TrafficPercentageResolver;

impl VersionResolver for TrafficPercentageResolver {
    fn resolve(&self, ctx: &RiskContext, config: &RolloutConfig) -> Version {
        let bucket = bucket_for(&ctx.stable_identity()) as f64;

        if bucket < config.shadow_percentage {
            Version::ShadowV2
        } else if bucket < config.shadow_percentage + config.active_percentage {
            Version::ActiveV2
        } else {
            Version::ForcedV1
        }
    }
}

/// Resolvers composed in priority order; the first non-default wins.
pub struct ResolverChain {
    resolvers: Vec<Box<dyn VersionResolver>>,
}

impl ResolverChain {
    pub fn new(resolvers: Vec<Box<dyn VersionResolver>>) -> Self {
        ResolverChain { resolvers }
    }

    /// Tenant override, then user override, then traffic percentage.
    pub fn standard() -> Self {
        ResolverChain {
            resolvers: vec![
                Box::new(TenantOverrideResolver),
                Box::new(UserOverrideResolver),
                Box::new(TrafficPercentageResolver),
            ],
        }
    }

    pub fn resolve(&self, ctx: &RiskContext, config: &RolloutConfig) -> Version {
        for resolver in &self.resolvers {
            let version = resolver.resolve(ctx, config);
            if version != Version::ForcedV1 {
                return version;
            }
        }
        Version::ForcedV1
    }
}

/// Resolve which version handles this request, via the standard chain.
pub fn resolve_version(ctx: &RiskContext, config: &RolloutConfig) -> Version {
    ResolverChain::standard().resolve(ctx, config)
}

/// The authoritative pipeline version (1 or 2) for this request.
pub fn resolve_pipeline_version(ctx: &RiskContext, config: &RolloutConfig) -> u8 {
    resolve_version(ctx, config).pipeline_version()
}

/// Whether a non-authoritative v2 comparison run should happen.
pub fn should_use_shadow_mode(ctx: &RiskContext, config: &RolloutConfig) -> bool {
    resolve_version(ctx, config).is_shadow()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TenantId;

    fn ctx_for(user: &str) -> RiskContext {
        RiskContext::for_user(user)
    }

    fn config(shadow: f64, active: f64) -> RolloutConfig {
        RolloutConfig {
            shadow_percentage: shadow,
            active_percentage: active,
            ..RolloutConfig::default()
        }
    }

    #[test]
    fn test_bucket_in_range_and_stable() {
        for identity in ["U1", "tenant-42", "203.0.113.9", ""] {
            let bucket = bucket_for(identity);
            assert!(bucket < 100);
            assert_eq!(bucket, bucket_for(identity));
        }
    }

    #[test]
    fn test_same_identity_same_version() {
        let cfg = config(30.0, 20.0);
        let ctx = ctx_for("U1");
        let first = resolve_version(&ctx, &cfg);
        for _ in 0..10 {
            assert_eq!(resolve_version(&ctx, &cfg), first);
        }
    }

    #[test]
    fn test_full_shadow_rollout() {
        let cfg = config(100.0, 0.0);
        assert_eq!(resolve_version(&ctx_for("anyone"), &cfg), Version::ShadowV2);
        assert!(should_use_shadow_mode(&ctx_for("anyone"), &cfg));
        assert_eq!(resolve_pipeline_version(&ctx_for("anyone"), &cfg), 1);
    }

    #[test]
    fn test_full_active_rollout() {
        let cfg = config(0.0, 100.0);
        assert_eq!(resolve_version(&ctx_for("anyone"), &cfg), Version::ActiveV2);
        assert_eq!(resolve_pipeline_version(&ctx_for("anyone"), &cfg), 2);
        assert!(!should_use_shadow_mode(&ctx_for("anyone"), &cfg));
    }

    #[test]
    fn test_zero_rollout_is_v1() {
        let cfg = config(0.0, 0.0);
        assert_eq!(resolve_version(&ctx_for("anyone"), &cfg), Version::ForcedV1);
        assert_eq!(resolve_pipeline_version(&ctx_for("anyone"), &cfg), 1);
    }

    #[test]
    fn test_tenant_override_beats_bucketing() {
        let mut cfg = config(0.0, 0.0);
        cfg.tenant_overrides
            .insert("T1".to_string(), Version::ActiveV2);

        let mut ctx = ctx_for("U1");
        ctx.tenant_id = Some(TenantId::new("T1"));

        assert_eq!(resolve_version(&ctx, &cfg), Version::ActiveV2);
    }

    #[test]
    fn test_tenant_override_beats_user_override() {
        let mut cfg = config(0.0, 0.0);
        cfg.tenant_overrides
            .insert("T1".to_string(), Version::ShadowV2);
        cfg.user_overrides
            .insert("U1".to_string(), Version::ActiveV2);

        let mut ctx = ctx_for("U1");
        ctx.tenant_id = Some(TenantId::new("T1"));

        assert_eq!(resolve_version(&ctx, &cfg), Version::ShadowV2);
    }

    #[test]
    fn test_user_override_applies() {
        let mut cfg = config(0.0, 0.0);
        cfg.user_overrides
            .insert("U9".to_string(), Version::ShadowV2);

        assert_eq!(resolve_version(&ctx_for("U9"), &cfg), Version::ShadowV2);
        assert_eq!(resolve_version(&ctx_for("U8"), &cfg), Version::ForcedV1);
    }

    #[test]
    fn test_identityless_request_is_deterministic() {
        let cfg = config(50.0, 0.0);
        let ctx = RiskContext::new();
        let first = resolve_version(&ctx, &cfg);
        assert_eq!(resolve_version(&ctx, &cfg), first);
    }

    #[test]
    fn test_validation_degrades_to_no_v2_traffic() {
        let cfg = config(80.0, 80.0).validated();
        assert_eq!(cfg.shadow_percentage, 0.0);
        assert_eq!(cfg.active_percentage, 0.0);

        let cfg = config(f64::NAN, 30.0).validated();
        assert_eq!(cfg.shadow_percentage, 0.0);
        assert_eq!(cfg.active_percentage, 30.0);
    }

    #[test]
    fn test_invalid_threshold_resets_to_default() {
        let mut cfg = config(0.0, 0.0);
        cfg.exact_match_threshold = -3.0;
        assert_eq!(cfg.validated().exact_match_threshold, 10.0);
    }

    #[test]
    fn test_split_covers_all_buckets() {
        // With 30/20 the user population lands in all three versions.
        let cfg = config(30.0, 20.0);
        let mut seen = std::collections::HashSet::new();
        for i in 0..200 {
            let ctx = ctx_for(&format!("user-{i}"));
            seen.insert(resolve_version(&ctx, &cfg));
        }
        assert!(seen.contains(&Version::ForcedV1));
        assert!(seen.contains(&Version::ShadowV2));
        assert!(seen.contains(&Version::ActiveV2));
    }

    #[test]
    fn test_user_id_preferred_over_tenant_for_bucketing() {
        let cfg = config(50.0, 0.0);
        let mut with_tenant = ctx_for("U1");
        with_tenant.tenant_id = Some(TenantId::new("T-other"));

        assert_eq!(
            resolve_version(&with_tenant, &cfg),
            resolve_version(&ctx_for("U1"), &cfg)
        );
    }
}
