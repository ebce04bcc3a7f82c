use serde::{Deserialize, Serialize};

use super::{PolicyDecision, Violation};

/// Actions subject to chat authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    SendMessage,
    EditMessage,
    DeleteMessage,
    PinMessage,
    InviteParticipant,
}

/// Posting mode of a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    /// No mode restrictions
    Open,
    /// Membership is curated; participants cannot invite
    Moderated,
    /// One-way channel; posting is disabled at the mode level
    Announcement,
}

impl ChatMode {
    fn allows(&self, action: ChatAction) -> bool {
        match self {
            ChatMode::Open => true,
            ChatMode::Moderated => action != ChatAction::InviteParticipant,
            ChatMode::Announcement => {
                !matches!(action, ChatAction::SendMessage | ChatAction::EditMessage)
            }
        }
    }
}

/// Participant role within a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    Owner,
    Moderator,
    Member,
    /// Read-only participant
    Observer,
}

impl ChatRole {
    fn allows(&self, action: ChatAction) -> bool {
        match self {
            ChatRole::Owner => true,
            // Inviting is owner-only; moderators handle content, not membership.
            ChatRole::Moderator => action != ChatAction::InviteParticipant,
            ChatRole::Member => matches!(
                action,
                ChatAction::SendMessage | ChatAction::EditMessage | ChatAction::DeleteMessage
            ),
            ChatRole::Observer => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatActorKind {
    User,
    Bot,
}

/// Who is attempting the action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatActor {
    pub kind: ChatActorKind,

    /// `None` means the actor is not a participant of this chat
    pub role: Option<ChatRole>,
}

impl ChatActor {
    pub fn user(role: ChatRole) -> Self {
        ChatActor {
            kind: ChatActorKind::User,
            role: Some(role),
        }
    }

    pub fn bot(role: ChatRole) -> Self {
        ChatActor {
            kind: ChatActorKind::Bot,
            role: Some(role),
        }
    }

    pub fn stranger() -> Self {
        ChatActor {
            kind: ChatActorKind::User,
            role: None,
        }
    }
}

/// Chat flags and limits consulted by the policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatState {
    pub archived: bool,
    pub read_only: bool,
    pub mode: ChatMode,
    pub bots_allowed: bool,
    pub max_message_bytes: usize,
    pub rate_limit_per_minute: u32,
}

impl Default for ChatState {
    fn default() -> Self {
        ChatState {
            archived: false,
            read_only: false,
            mode: ChatMode::Open,
            bots_allowed: true,
            max_message_bytes: 50_000,
            rate_limit_per_minute: 30,
        }
    }
}

/// Size and recent-send counters for the message being checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub size_bytes: usize,

    /// Messages this actor already sent within the rate window
    pub sent_in_window: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAllow {
    Permitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatDeny {
    ChatArchived,
    ChatReadOnly,
    BotActorNotAllowed,
    NotParticipant,
    ModeDisallowsAction,
    RoleDisallowsAction,
    MessageTooLarge,
    RateLimitExceeded,
}

/// Chat authorization checks.
///
/// Check order is significant for audit reproducibility: archived,
/// read-only send, bot actor, participation, mode, role, then payload
/// limits. Each step short-circuits on first violation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatPolicy;

impl ChatPolicy {
    pub fn can_perform(
        &self,
        action: ChatAction,
        chat: &ChatState,
        actor: &ChatActor,
        payload: Option<&MessagePayload>,
    ) -> PolicyDecision<ChatAllow, ChatDeny> {
        if chat.archived {
            return PolicyDecision::deny(ChatDeny::ChatArchived);
        }

        if chat.read_only && action == ChatAction::SendMessage {
            return PolicyDecision::deny(ChatDeny::ChatReadOnly);
        }

        if actor.kind == ChatActorKind::Bot && !chat.bots_allowed {
            return PolicyDecision::deny(ChatDeny::BotActorNotAllowed);
        }

        let role = match actor.role {
            Some(role) => role,
            None => return PolicyDecision::deny(ChatDeny::NotParticipant),
        };

        if !chat.mode.allows(action) {
            return PolicyDecision::deny(ChatDeny::ModeDisallowsAction);
        }

        if !role.allows(action) {
            return PolicyDecision::deny(ChatDeny::RoleDisallowsAction);
        }

        if let Some(payload) = payload {
            if payload.size_bytes > chat.max_message_bytes {
                return PolicyDecision::deny_with(
                    ChatDeny::MessageTooLarge,
                    Violation::new(
                        "message_too_large",
                        format!("{} > {}", payload.size_bytes, chat.max_message_bytes),
                    ),
                );
            }

            if payload.sent_in_window >= chat.rate_limit_per_minute {
                return PolicyDecision::deny_with(
                    ChatDeny::RateLimitExceeded,
                    Violation::new(
                        "rate_limit_exceeded",
                        format!("{} >= {}", payload.sent_in_window, chat.rate_limit_per_minute),
                    ),
                );
            }
        }

        PolicyDecision::allow(ChatAllow::Permitted)
    }
}
