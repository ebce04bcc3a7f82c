use serde::{Deserialize, Serialize};

use super::bot_permissions::BotProfile;
use super::chat::ChatState;
use super::PolicyDecision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotAllow {
    Permitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotDeny {
    BotDisabled,
    NotAttachedToChat,
    ChatDisallowsBots,
}

/// Whether a bot may operate inside a given chat, first denial wins.
///
/// Distinct from capability checks: this is about placement (is the bot
/// enabled, attached, and welcome here), not about what it may do.
#[derive(Debug, Clone, Copy, Default)]
pub struct BotPolicy;

impl BotPolicy {
    pub fn can_operate(
        &self,
        bot: &BotProfile,
        chat: &ChatState,
        attached: bool,
    ) -> PolicyDecision<BotAllow, BotDeny> {
        if !bot.enabled {
            return PolicyDecision::deny(BotDeny::BotDisabled);
        }

        if !attached {
            return PolicyDecision::deny(BotDeny::NotAttachedToChat);
        }

        if !chat.bots_allowed {
            return PolicyDecision::deny(BotDeny::ChatDisallowsBots);
        }

        PolicyDecision::allow(BotAllow::Permitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_attached_bot_allowed() {
        let decision = BotPolicy.can_operate(
            &BotProfile::new("B1", "T1"),
            &ChatState::default(),
            true,
        );
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_disabled_wins_over_later_checks() {
        let mut bot = BotProfile::new("B1", "T1");
        bot.enabled = false;

        let chat = ChatState {
            bots_allowed: false,
            ..ChatState::default()
        };
        let decision = BotPolicy.can_operate(&bot, &chat, false);
        assert_eq!(decision.deny_reason(), Some(&BotDeny::BotDisabled));
    }

    #[test]
    fn test_unattached_bot_denied() {
        let decision = BotPolicy.can_operate(
            &BotProfile::new("B1", "T1"),
            &ChatState::default(),
            false,
        );
        assert_eq!(decision.deny_reason(), Some(&BotDeny::NotAttachedToChat));
    }

    #[test]
    fn test_chat_disallowing_bots_denied() {
        let chat = ChatState {
            bots_allowed: false,
            ..ChatState::default()
        };
        let decision = BotPolicy.can_operate(&BotProfile::new("B1", "T1"), &chat, true);
        assert_eq!(decision.deny_reason(), Some(&BotDeny::ChatDisallowsBots));
    }
}
