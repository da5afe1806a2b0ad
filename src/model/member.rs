//! Member presence snapshots and the practice-session start marker.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{ChannelId, GuildId, MemberId};

// ---------------------------------------------------------------------------
// SessionStart
// ---------------------------------------------------------------------------

/// Where a member stands in their current practice session.
///
/// Only [`SessionStart::Active`] carries a timestamp, so elapsed time can
/// only ever be computed from a real start.
///
/// ```text
/// NeverStarted ──goes live──▶ Active(t) ──stops──▶ Committed
///                                ▲                     │
///                                └──────goes live──────┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "started_at")]
pub enum SessionStart {
    /// The bot has not seen this member go live yet.
    #[default]
    NeverStarted,
    /// Live since the given unix timestamp (seconds).
    Active(i64),
    /// The last session was just committed to the practice log.
    Committed,
}

impl SessionStart {
    pub fn is_active(self) -> bool {
        matches!(self, SessionStart::Active(_))
    }
}

// ---------------------------------------------------------------------------
// MemberSnapshot
// ---------------------------------------------------------------------------

/// A member's voice presence as delivered with a gateway event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub guild_id: GuildId,
    pub member_id: MemberId,
    /// Voice channel the member is connected to, `None` when disconnected.
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub self_mute: bool,
    #[serde(default)]
    pub self_deaf: bool,
    #[serde(default)]
    pub server_mute: bool,
    #[serde(default)]
    pub server_deaf: bool,
    /// Role names held by the member.
    #[serde(default)]
    pub roles: BTreeSet<String>,
    /// Hydrated from the session book before processing; never trusted from
    /// the wire.
    #[serde(skip)]
    pub session: SessionStart,
}

impl MemberSnapshot {
    /// A connected-nowhere, unmuted, role-less member.
    pub fn new(guild_id: GuildId, member_id: MemberId) -> Self {
        Self {
            guild_id,
            member_id,
            channel_id: None,
            is_bot: false,
            self_mute: false,
            self_deaf: false,
            server_mute: false,
            server_deaf: false,
            roles: BTreeSet::new(),
            session: SessionStart::NeverStarted,
        }
    }

    /// Muted by either the member or a moderator.
    pub fn is_muted(&self) -> bool {
        self.self_mute || self.server_mute
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.contains(name)
    }

    pub fn in_channel(mut self, channel: ChannelId) -> Self {
        self.channel_id = Some(channel);
        self
    }

    pub fn with_role(mut self, name: &str) -> Self {
        self.roles.insert(name.to_string());
        self
    }
}
