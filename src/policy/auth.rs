use serde::{Deserialize, Serialize};

use super::PolicyDecision;

/// Account flags consulted at authentication time.
///
/// Snapshot assembled by the caller; the policy never reads storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub locked: bool,
    pub disabled: bool,
    pub credential_expired: bool,
    pub mfa_required: bool,
    pub mfa_enrolled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthAllow {
    Permitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthDeny {
    AccountLocked,
    AccountDisabled,
    CredentialExpired,
    MfaNotEnrolled,
}

/// Authentication pre-flight checks, first denial wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthPolicy;

impl AuthPolicy {
    pub fn can_authenticate(&self, account: &AccountState) -> PolicyDecision<AuthAllow, AuthDeny> {
        if account.locked {
            return PolicyDecision::deny(AuthDeny::AccountLocked);
        }

        if account.disabled {
            return PolicyDecision::deny(AuthDeny::AccountDisabled);
        }

        if account.credential_expired {
            return PolicyDecision::deny(AuthDeny::CredentialExpired);
        }

        if account.mfa_required && !account.mfa_enrolled {
            return PolicyDecision::deny(AuthDeny::MfaNotEnrolled);
        }

        PolicyDecision::allow(AuthAllow::Permitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_account_allowed() {
        let decision = AuthPolicy.can_authenticate(&AccountState::default());
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_locked_wins_over_later_checks() {
        let account = AccountState {
            locked: true,
            disabled: true,
            credential_expired: true,
            ..AccountState::default()
        };
        assert_eq!(
            AuthPolicy.can_authenticate(&account).deny_reason(),
            Some(&AuthDeny::AccountLocked)
        );
    }

    #[test]
    fn test_mfa_required_but_not_enrolled() {
        let account = AccountState {
            mfa_required: true,
            mfa_enrolled: false,
            ..AccountState::default()
        };
        assert_eq!(
            AuthPolicy.can_authenticate(&account).deny_reason(),
            Some(&AuthDeny::MfaNotEnrolled)
        );
    }

    #[test]
    fn test_mfa_enrolled_allowed() {
        let account = AccountState {
            mfa_required: true,
            mfa_enrolled: true,
            ..AccountState::default()
        };
        assert!(AuthPolicy.can_authenticate(&account).is_allowed());
    }
}
