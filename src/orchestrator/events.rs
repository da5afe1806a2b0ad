//! Gateway events consumed by the orchestrator and the report it returns.

use serde::{Deserialize, Serialize};

use crate::access::AccessChange;
use crate::model::{ChannelId, GuildId, MemberId, MemberSnapshot};
use crate::session::Transition;

/// An event delivered by the chat-platform gateway.
///
/// Serialised with a `type` tag so captured logs can be replayed:
///
/// ```json
/// {"type":"voice_state_updated","old":{"guild_id":1,"member_id":5},"new":{"guild_id":1,"member_id":5,"channel_id":10}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// The member joined, left or moved between voice rooms, or changed
    /// mute/deafen state.
    VoiceStateUpdated {
        old: MemberSnapshot,
        new: MemberSnapshot,
    },
    /// The member's roles or nickname changed.
    MemberUpdated {
        old: MemberSnapshot,
        new: MemberSnapshot,
    },
}

impl GatewayEvent {
    pub fn guild_id(&self) -> GuildId {
        match self {
            GatewayEvent::VoiceStateUpdated { new, .. } | GatewayEvent::MemberUpdated { new, .. } => {
                new.guild_id
            }
        }
    }

    pub fn member_id(&self) -> MemberId {
        match self {
            GatewayEvent::VoiceStateUpdated { new, .. } | GatewayEvent::MemberUpdated { new, .. } => {
                new.member_id
            }
        }
    }
}

/// Everything one event changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventReport {
    /// First contact with the guild: a default configuration was saved and
    /// nothing else happened.
    pub bootstrapped: bool,
    /// The member's server mute was lifted.
    pub unmuted: bool,
    /// `None` when no room was needed or the creation failed.
    pub created_room: Option<ChannelId>,
    pub reclaimed_room: Option<ChannelId>,
    pub unlocked_room: Option<ChannelId>,
    /// `None` when the access update failed or did not run.
    pub access: Option<AccessChange>,
    /// `None` for member updates, bootstrap events and commits the practice
    /// log rejected.
    pub session: Option<Transition>,
}

impl EventReport {
    pub(crate) fn bootstrap() -> Self {
        Self {
            bootstrapped: true,
            ..Self::default()
        }
    }
}
