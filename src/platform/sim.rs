//! In-memory [`Platform`] and [`RoomLocks`] implementation.
//!
//! [`SimulatedPlatform`] holds one or more [`SimulatedGuild`]s, applies every
//! command to that state and records it as a [`PlatformCall`].  The replay
//! binary drives it from captured event logs; tests use it to assert exactly
//! which commands an event produced.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{
    CapacityTier, ChannelId, GuildId, MemberId, Occupant, PermissionOverwrite, RoleId,
    RoomDirectory, VoiceRoom,
};

use super::{NewVoiceRoom, Platform, PlatformError, RoomLocks, TextChannel};

/// First id handed out to rooms created through the simulator.
const FIRST_CREATED_ID: u64 = 900_000;

// ---------------------------------------------------------------------------
// SimulatedGuild
// ---------------------------------------------------------------------------

/// Seed state for one guild.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedGuild {
    pub guild_id: GuildId,
    pub voice_rooms: Vec<VoiceRoom>,
    pub text_channels: Vec<TextChannel>,
    /// Role name → id.
    pub roles: BTreeMap<String, RoleId>,
}

impl SimulatedGuild {
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// PlatformCall
// ---------------------------------------------------------------------------

/// A mutating command received by the simulator.  Lookups are not recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "call")]
pub enum PlatformCall {
    PutOverwrite {
        channel: ChannelId,
        member: MemberId,
        overwrite: PermissionOverwrite,
    },
    DeleteOverwrite {
        channel: ChannelId,
        member: MemberId,
    },
    SetServerMute {
        guild: GuildId,
        member: MemberId,
        muted: bool,
    },
    CreateVoiceRoom {
        guild: GuildId,
        id: ChannelId,
        room: NewVoiceRoom,
    },
    DeleteChannel {
        guild: GuildId,
        channel: ChannelId,
    },
    UnlockRoom {
        guild: GuildId,
        member: MemberId,
        room: ChannelId,
    },
}

// ---------------------------------------------------------------------------
// SimulatedPlatform
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SimState {
    guilds: HashMap<GuildId, SimulatedGuild>,
    overwrites: HashMap<(ChannelId, MemberId), PermissionOverwrite>,
    calls: Vec<PlatformCall>,
    next_id: u64,
    fail_unmute: bool,
    fail_unlock: bool,
    fail_delete: bool,
    fail_create: bool,
    fail_listing: bool,
}

/// Thread-safe in-memory platform.
///
/// The internal lock is a `std::sync::Mutex` held only for the duration of a
/// single command, never across an `.await`.
#[derive(Debug)]
pub struct SimulatedPlatform {
    low_bitrate: u32,
    state: Mutex<SimState>,
}

impl SimulatedPlatform {
    /// Create a simulator.  `low_bitrate` classifies the rooms it lists.
    pub fn new(low_bitrate: u32) -> Self {
        Self {
            low_bitrate,
            state: Mutex::new(SimState {
                next_id: FIRST_CREATED_ID,
                ..SimState::default()
            }),
        }
    }

    pub fn with_guild(self, guild: SimulatedGuild) -> Self {
        self.lock().guilds.insert(guild.guild_id, guild);
        self
    }

    pub fn fail_unmute(self, fail: bool) -> Self {
        self.lock().fail_unmute = fail;
        self
    }

    pub fn fail_unlock(self, fail: bool) -> Self {
        self.lock().fail_unlock = fail;
        self
    }

    pub fn fail_delete(self, fail: bool) -> Self {
        self.lock().fail_delete = fail;
        self
    }

    pub fn fail_create(self, fail: bool) -> Self {
        self.lock().fail_create = fail;
        self
    }

    /// Make [`Platform::voice_rooms`] fail; single-room lookups still work.
    pub fn fail_listing(self, fail: bool) -> Self {
        self.lock().fail_listing = fail;
        self
    }

    /// Every mutating command received so far.
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.lock().calls.clone()
    }

    /// Drain the recorded commands.
    pub fn take_calls(&self) -> Vec<PlatformCall> {
        std::mem::take(&mut self.lock().calls)
    }

    /// Seed or overwrite a member's permission overwrite without recording.
    pub fn seed_overwrite(
        &self,
        channel: ChannelId,
        member: MemberId,
        overwrite: PermissionOverwrite,
    ) {
        self.lock().overwrites.insert((channel, member), overwrite);
    }

    pub fn overwrite(&self, channel: ChannelId, member: MemberId) -> Option<PermissionOverwrite> {
        self.lock().overwrites.get(&(channel, member)).copied()
    }

    /// Current copy of a voice room.
    pub fn room(&self, guild: GuildId, channel: ChannelId) -> Option<VoiceRoom> {
        self.lock()
            .guilds
            .get(&guild)
            .and_then(|g| g.voice_rooms.iter().find(|r| r.id == channel).cloned())
    }

    /// Move `member` into `channel` (or disconnect with `None`), removing
    /// them from whichever room they were in.
    pub fn move_member(&self, guild: GuildId, member: MemberId, channel: Option<ChannelId>) {
        let mut st = self.lock();
        let Some(g) = st.guilds.get_mut(&guild) else {
            return;
        };
        for room in &mut g.voice_rooms {
            room.occupants.retain(|o| o.member_id != member);
        }
        if let Some(target) = channel {
            if let Some(room) = g.voice_rooms.iter_mut().find(|r| r.id == target) {
                room.occupants.push(Occupant::present(member));
            }
        }
    }

    pub fn set_lock(&self, guild: GuildId, channel: ChannelId, owner: Option<MemberId>) {
        let mut st = self.lock();
        if let Some(room) = st
            .guilds
            .get_mut(&guild)
            .and_then(|g| g.voice_rooms.iter_mut().find(|r| r.id == channel))
        {
            room.locked_by = owner;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        // A panic while holding the lock only happens in a failing test; keep
        // serving the state rather than cascading the panic.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn unknown(kind: &'static str, id: u64) -> PlatformError {
    PlatformError::Unknown { kind, id }
}

#[async_trait]
impl Platform for SimulatedPlatform {
    async fn voice_rooms(&self, guild: GuildId) -> Result<RoomDirectory, PlatformError> {
        let st = self.lock();
        if st.fail_listing {
            return Err(PlatformError::Request("simulated listing failure".into()));
        }
        let g = st.guilds.get(&guild).ok_or_else(|| unknown("guild", guild.0))?;
        Ok(RoomDirectory::classify(
            self.low_bitrate,
            g.voice_rooms.iter().cloned(),
        ))
    }

    async fn voice_room(
        &self,
        guild: GuildId,
        channel: ChannelId,
    ) -> Result<Option<VoiceRoom>, PlatformError> {
        Ok(self.room(guild, channel))
    }

    async fn text_channel_by_name(
        &self,
        guild: GuildId,
        name: &str,
    ) -> Result<Option<TextChannel>, PlatformError> {
        let st = self.lock();
        let g = st.guilds.get(&guild).ok_or_else(|| unknown("guild", guild.0))?;
        Ok(g.text_channels.iter().find(|c| c.name == name).cloned())
    }

    async fn category_size(
        &self,
        guild: GuildId,
        category: ChannelId,
    ) -> Result<u32, PlatformError> {
        let st = self.lock();
        let g = st.guilds.get(&guild).ok_or_else(|| unknown("guild", guild.0))?;
        let voice = g
            .voice_rooms
            .iter()
            .filter(|r| r.category == Some(category))
            .count();
        let text = g
            .text_channels
            .iter()
            .filter(|c| c.category == Some(category))
            .count();
        Ok((voice + text) as u32)
    }

    async fn role_by_name(
        &self,
        guild: GuildId,
        name: &str,
    ) -> Result<Option<RoleId>, PlatformError> {
        let st = self.lock();
        let g = st.guilds.get(&guild).ok_or_else(|| unknown("guild", guild.0))?;
        Ok(g.roles.get(name).copied())
    }

    async fn member_overwrite(
        &self,
        channel: ChannelId,
        member: MemberId,
    ) -> Result<Option<PermissionOverwrite>, PlatformError> {
        Ok(self.overwrite(channel, member))
    }

    async fn put_member_overwrite(
        &self,
        channel: ChannelId,
        member: MemberId,
        overwrite: PermissionOverwrite,
    ) -> Result<(), PlatformError> {
        let mut st = self.lock();
        st.overwrites.insert((channel, member), overwrite);
        st.calls.push(PlatformCall::PutOverwrite {
            channel,
            member,
            overwrite,
        });
        Ok(())
    }

    async fn delete_member_overwrite(
        &self,
        channel: ChannelId,
        member: MemberId,
    ) -> Result<(), PlatformError> {
        let mut st = self.lock();
        st.calls.push(PlatformCall::DeleteOverwrite { channel, member });
        st.overwrites
            .remove(&(channel, member))
            .map(|_| ())
            .ok_or_else(|| unknown("overwrite", member.0))
    }

    async fn set_server_mute(
        &self,
        guild: GuildId,
        member: MemberId,
        muted: bool,
    ) -> Result<(), PlatformError> {
        let mut st = self.lock();
        st.calls.push(PlatformCall::SetServerMute {
            guild,
            member,
            muted,
        });
        if st.fail_unmute {
            return Err(unknown("member", member.0));
        }
        Ok(())
    }

    async fn create_voice_room(
        &self,
        guild: GuildId,
        room: NewVoiceRoom,
    ) -> Result<ChannelId, PlatformError> {
        let mut st = self.lock();
        if st.fail_create {
            return Err(PlatformError::Forbidden("manage channels".into()));
        }
        let id = ChannelId(st.next_id);
        st.next_id += 1;

        let g = st
            .guilds
            .get_mut(&guild)
            .ok_or_else(|| unknown("guild", guild.0))?;
        g.voice_rooms.push(VoiceRoom {
            id,
            name: room.name.clone(),
            bitrate: room.bitrate,
            tier: CapacityTier::default(),
            category: room.category,
            occupants: Vec::new(),
            locked_by: None,
        });
        st.calls.push(PlatformCall::CreateVoiceRoom { guild, id, room });
        Ok(id)
    }

    async fn delete_channel(
        &self,
        guild: GuildId,
        channel: ChannelId,
    ) -> Result<(), PlatformError> {
        let mut st = self.lock();
        st.calls.push(PlatformCall::DeleteChannel { guild, channel });
        if st.fail_delete {
            return Err(PlatformError::Request("simulated delete failure".into()));
        }
        let g = st
            .guilds
            .get_mut(&guild)
            .ok_or_else(|| unknown("guild", guild.0))?;
        let before = g.voice_rooms.len();
        g.voice_rooms.retain(|r| r.id != channel);
        if g.voice_rooms.len() == before {
            return Err(unknown("channel", channel.0));
        }
        Ok(())
    }
}

#[async_trait]
impl RoomLocks for SimulatedPlatform {
    async fn unlock_room(
        &self,
        guild: GuildId,
        member: MemberId,
        room: ChannelId,
    ) -> Result<(), PlatformError> {
        {
            let mut st = self.lock();
            st.calls.push(PlatformCall::UnlockRoom {
                guild,
                member,
                room,
            });
            if st.fail_unlock {
                return Err(PlatformError::Forbidden("manage channel".into()));
            }
        }
        self.set_lock(guild, room, None);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
