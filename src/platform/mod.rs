//! Chat-platform collaborator interfaces.
//!
//! This module provides:
//! * [`Platform`]: async trait over the gateway client: room directory,
//!   channel/role lookup, permission overwrites, mute and room lifecycle.
//! * [`RoomLocks`]: async trait over the room-lock manager.
//! * [`PlatformError`]: error variants for platform commands.
//! * [`SimulatedPlatform`]: in-memory platform that records every command,
//!   used for event replays and tests.

pub mod sim;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    ChannelId, ChannelOverwrite, GuildId, MemberId, PermissionOverwrite, RoleId, RoomDirectory,
    VoiceRoom,
};

pub use sim::{PlatformCall, SimulatedGuild, SimulatedPlatform};

// ---------------------------------------------------------------------------
// PlatformError
// ---------------------------------------------------------------------------

/// Errors returned by platform commands.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    /// The guild, channel or member no longer exists (e.g. the member
    /// disconnected before the command landed).
    #[error("unknown {kind} {id}")]
    Unknown { kind: &'static str, id: u64 },

    /// The bot lacks the permission to perform the command.
    #[error("missing permission: {0}")]
    Forbidden(String),

    /// Transport or API failure.
    #[error("platform request failed: {0}")]
    Request(String),
}

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// A text channel located by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChannel {
    pub id: ChannelId,
    pub name: String,
    /// Category the channel lives under.
    #[serde(default)]
    pub category: Option<ChannelId>,
}

/// Parameters for a new voice room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewVoiceRoom {
    pub name: String,
    pub bitrate: u32,
    pub category: Option<ChannelId>,
    /// Position within the category; `None` lets the platform append.
    pub position: Option<u32>,
    pub overwrites: Vec<ChannelOverwrite>,
}

// ---------------------------------------------------------------------------
// Platform trait
// ---------------------------------------------------------------------------

/// Async interface to the chat platform.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// behind an `Arc<dyn Platform>`.  Lookups that find nothing return `None`
/// rather than an error.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Every voice room currently in `guild`, collected into a
    /// [`RoomDirectory`] so tiers come from bitrate.
    async fn voice_rooms(&self, guild: GuildId) -> Result<RoomDirectory, PlatformError>;

    /// A single voice room, if it still exists.
    async fn voice_room(
        &self,
        guild: GuildId,
        channel: ChannelId,
    ) -> Result<Option<VoiceRoom>, PlatformError>;

    async fn text_channel_by_name(
        &self,
        guild: GuildId,
        name: &str,
    ) -> Result<Option<TextChannel>, PlatformError>;

    /// Number of channels under `category`.
    async fn category_size(&self, guild: GuildId, category: ChannelId)
        -> Result<u32, PlatformError>;

    async fn role_by_name(&self, guild: GuildId, name: &str)
        -> Result<Option<RoleId>, PlatformError>;

    async fn member_overwrite(
        &self,
        channel: ChannelId,
        member: MemberId,
    ) -> Result<Option<PermissionOverwrite>, PlatformError>;

    /// Create or replace the member's overwrite on `channel`.
    async fn put_member_overwrite(
        &self,
        channel: ChannelId,
        member: MemberId,
        overwrite: PermissionOverwrite,
    ) -> Result<(), PlatformError>;

    async fn delete_member_overwrite(
        &self,
        channel: ChannelId,
        member: MemberId,
    ) -> Result<(), PlatformError>;

    async fn set_server_mute(
        &self,
        guild: GuildId,
        member: MemberId,
        muted: bool,
    ) -> Result<(), PlatformError>;

    async fn create_voice_room(
        &self,
        guild: GuildId,
        room: NewVoiceRoom,
    ) -> Result<ChannelId, PlatformError>;

    async fn delete_channel(&self, guild: GuildId, channel: ChannelId)
        -> Result<(), PlatformError>;
}

// ---------------------------------------------------------------------------
// RoomLocks trait
// ---------------------------------------------------------------------------

/// Releases exclusive room locks held by members.
#[async_trait]
pub trait RoomLocks: Send + Sync {
    async fn unlock_room(
        &self,
        guild: GuildId,
        member: MemberId,
        room: ChannelId,
    ) -> Result<(), PlatformError>;
}
