//! Room lifecycle orchestrator: drives every component for each event.
//!
//! [`RoomOrchestrator`] owns the collaborators and responds to
//! [`GatewayEvent`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Voice-state flow
//!
//! ```text
//! VoiceStateUpdated(old, new)
//!   ├─ server-muted in unlocked practice room → unmute
//!   ├─ guild config absent → save default, stop
//!   ├─ all primary rooms full?
//!   │     ├─ yes → create overflow room, record id
//!   │     └─ no  → reclaim one overflow room: forget id, then delete
//!   ├─ left a room they had locked → unlock
//!   ├─ update practice-chat access
//!   └─ advance session; on commit → practice log
//! ```
//!
//! Every step is awaited in sequence, and a failed step is logged and
//! skipped so the rest of the event still runs.  Only a guild config or room
//! directory that cannot be read ends the event early, since every later
//! step depends on them; [`run`](RoomOrchestrator::run) logs that and keeps
//! going with the next event.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::access::update_chat_access;
use crate::config::RoomsConfig;
use crate::model::{
    ChannelId, ChannelOverwrite, GuildConfig, GuildField, GuildId, MemberSnapshot, Permissions,
    RoomDirectory, VoiceRoom,
};
use crate::platform::{NewVoiceRoom, Platform, PlatformError, RoomLocks};
use crate::rooms::{all_rooms_full, find_room_to_reclaim};
use crate::session::{
    advance, is_live, mark_committed, new_session_book, Clock, SessionBook, SessionTable,
    SystemClock, Transition,
};
use crate::store::{GuildRepository, PracticeLog, StoreError};

use super::events::{EventReport, GatewayEvent};

// ---------------------------------------------------------------------------
// OrchestratorError
// ---------------------------------------------------------------------------

/// Failures that abort processing of a single event.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("guild store: {0}")]
    Store(#[from] StoreError),

    #[error("platform: {0}")]
    Platform(#[from] PlatformError),
}

// ---------------------------------------------------------------------------
// RoomOrchestrator
// ---------------------------------------------------------------------------

/// Coordinates room inventory, chat access and practice sessions.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use practice_rooms::config::BotConfig;
/// use practice_rooms::orchestrator::RoomOrchestrator;
/// use practice_rooms::platform::SimulatedPlatform;
/// use practice_rooms::store::{JsonPracticeLog, MemoryGuildStore};
///
/// # async fn example() {
/// let config = BotConfig::default();
/// let platform = Arc::new(SimulatedPlatform::new(config.rooms.low_bitrate));
/// let orchestrator = RoomOrchestrator::new(
///     config.rooms.clone(),
///     platform.clone(),
///     platform,
///     Arc::new(MemoryGuildStore::new()),
///     Arc::new(JsonPracticeLog::open(&config.storage.practice_log_file)),
/// );
///
/// let (event_tx, event_rx) = tokio::sync::mpsc::channel(64);
/// # drop(event_tx);
/// orchestrator.run(event_rx).await;
/// # }
/// ```
pub struct RoomOrchestrator {
    config: RoomsConfig,
    platform: Arc<dyn Platform>,
    locks: Arc<dyn RoomLocks>,
    guilds: Arc<dyn GuildRepository>,
    practice_log: Arc<dyn PracticeLog>,
    clock: Arc<dyn Clock>,
    sessions: SessionBook,
}

impl RoomOrchestrator {
    /// Create an orchestrator using the system clock and an empty session
    /// book.
    pub fn new(
        config: RoomsConfig,
        platform: Arc<dyn Platform>,
        locks: Arc<dyn RoomLocks>,
        guilds: Arc<dyn GuildRepository>,
        practice_log: Arc<dyn PracticeLog>,
    ) -> Self {
        Self {
            config,
            platform,
            locks,
            guilds,
            practice_log,
            clock: Arc::new(SystemClock),
            sessions: new_session_book(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn session_book(&self) -> SessionBook {
        Arc::clone(&self.sessions)
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Process events until `events` is closed.
    pub async fn run(self, mut events: mpsc::Receiver<GatewayEvent>) {
        while let Some(event) = events.recv().await {
            let guild = event.guild_id();
            let member = event.member_id();
            if let Err(e) = self.dispatch(event).await {
                log::error!("orchestrator: event for member {member} in guild {guild} failed: {e}");
            }
        }

        log::info!("orchestrator: event channel closed, shutting down");
    }

    /// Process one event, carrying the member's session through the book.
    pub async fn dispatch(&self, event: GatewayEvent) -> Result<EventReport, OrchestratorError> {
        match event {
            GatewayEvent::VoiceStateUpdated { mut old, mut new } => {
                let session = self.book().get(new.guild_id, new.member_id);
                old.session = session;
                new.session = session;

                let result = self.handle_voice_state(&mut old, &mut new).await;

                self.book()
                    .store(new.guild_id, new.member_id, new.session);
                result
            }
            GatewayEvent::MemberUpdated { new, .. } => self.handle_member_update(&new).await,
        }
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    /// Handle a voice-state change.  `old.session` and `new.session` must
    /// hold the member's current session; both are updated in place.
    pub async fn handle_voice_state(
        &self,
        old: &mut MemberSnapshot,
        new: &mut MemberSnapshot,
    ) -> Result<EventReport, OrchestratorError> {
        let guild = new.guild_id;
        let mut report = EventReport::default();
        let loaded = self.guilds.load(guild).await;

        // ── 1. Lift a leftover server mute ──────────────────────────────
        // Locked rooms server-mute guests; once the member is back in an
        // unlocked practice room the mute has to go.
        if let Ok(Some(config)) = &loaded {
            if self.should_unmute(config, new).await {
                match self.platform.set_server_mute(guild, new.member_id, false).await {
                    Ok(()) => report.unmuted = true,
                    Err(e) => log::warn!("orchestrator: could not unmute member {}: {e}", new.member_id),
                }
            }
        }

        let Some(mut config) = self.config_or_bootstrap(guild, loaded?).await? else {
            return Ok(EventReport::bootstrap());
        };
        let mut rooms = self.platform.voice_rooms(guild).await?;

        // ── 2. Room inventory ───────────────────────────────────────────
        if all_rooms_full(&config.permitted_channels, &rooms) {
            match self.create_overflow_room(&mut config).await {
                Ok(id) => {
                    match self.platform.voice_room(guild, id).await {
                        Ok(Some(room)) => rooms.insert(room),
                        Ok(None) => {}
                        Err(e) => log::warn!("orchestrator: could not look up new room {id}: {e}"),
                    }
                    report.created_room = Some(id);
                }
                Err(e) => log::warn!("orchestrator: could not create overflow room in guild {guild}: {e}"),
            }
        } else {
            report.reclaimed_room = self.reclaim_overflow_room(&mut config, &rooms).await;
        }

        // ── 3. Release a lock the member walked away from ───────────────
        if let Some(room) = self.abandoned_lock(old, new, &rooms, report.reclaimed_room) {
            match self.locks.unlock_room(guild, old.member_id, room).await {
                Ok(()) => report.unlocked_room = Some(room),
                Err(e) => log::warn!("orchestrator: could not unlock room {room}: {e}"),
            }
        }

        // ── 4. Practice chat access ─────────────────────────────────────
        report.access = self.refresh_access(&config, new).await;

        // ── 5. Session bookkeeping ──────────────────────────────────────
        let current_room = new.channel_id.and_then(|c| rooms.get(c));
        let live = is_live(new, &config.permitted_channels, current_room);
        let now = self.clock.now();

        let transition = advance(old.session, &mut new.session, live, now);
        report.session = Some(transition);
        if let Transition::Commit { seconds, .. } = transition {
            match self.practice_log.save_user_time(guild, new.member_id, seconds).await {
                Ok(_) => mark_committed(&mut old.session, &mut new.session),
                Err(e) => {
                    // The start stays active so the next event commits it.
                    log::warn!(
                        "orchestrator: could not record {seconds}s for member {}: {e}",
                        new.member_id
                    );
                    report.session = None;
                }
            }
        }
        log::debug!("orchestrator: member {} session {:?}", new.member_id, transition);

        Ok(report)
    }

    /// Handle a member update: role changes can affect practice-chat access.
    pub async fn handle_member_update(
        &self,
        new: &MemberSnapshot,
    ) -> Result<EventReport, OrchestratorError> {
        let loaded = self.guilds.load(new.guild_id).await?;
        let Some(config) = self.config_or_bootstrap(new.guild_id, loaded).await? else {
            return Ok(EventReport::bootstrap());
        };

        Ok(EventReport {
            access: self.refresh_access(&config, new).await,
            ..EventReport::default()
        })
    }

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    /// Pass a loaded configuration through; on first contact save a default
    /// one and return `None`.
    async fn config_or_bootstrap(
        &self,
        guild: GuildId,
        loaded: Option<GuildConfig>,
    ) -> Result<Option<GuildConfig>, OrchestratorError> {
        if let Some(config) = loaded {
            return Ok(Some(config));
        }
        self.guilds.save(&GuildConfig::new(guild)).await?;
        log::info!("orchestrator: created configuration for guild {guild}");
        Ok(None)
    }

    async fn should_unmute(&self, config: &GuildConfig, member: &MemberSnapshot) -> bool {
        if !member.server_mute || member.has_role(&self.config.temp_muted_role) {
            return false;
        }
        let Some(channel) = member.channel_id.filter(|c| config.is_permitted(*c)) else {
            return false;
        };
        match self.platform.voice_room(member.guild_id, channel).await {
            Ok(room) => room.is_some_and(|r| r.locked_by.is_none()),
            Err(e) => {
                log::warn!("orchestrator: could not look up room {channel}: {e}");
                false
            }
        }
    }

    async fn create_overflow_room(
        &self,
        config: &mut GuildConfig,
    ) -> Result<ChannelId, OrchestratorError> {
        let guild = config.guild_id;

        let chat = self
            .platform
            .text_channel_by_name(guild, &self.config.practice_chat_name)
            .await?;
        let category = chat.and_then(|c| c.category);
        if category.is_none() {
            log::warn!("orchestrator: no practice chat category in guild {guild}; creating overflow room at top level");
        }
        let position = match category {
            Some(c) => Some(self.platform.category_size(guild, c).await?),
            None => None,
        };

        let mut overwrites = Vec::new();
        if let Some(role) = self
            .platform
            .role_by_name(guild, &self.config.temp_muted_role)
            .await?
        {
            overwrites.push(ChannelOverwrite::deny_role(role, Permissions::SPEAK));
        }
        if let Some(role) = self
            .platform
            .role_by_name(guild, &self.config.verification_role)
            .await?
        {
            overwrites.push(ChannelOverwrite::deny_role(role, Permissions::VIEW_CHANNEL));
        }

        let id = self
            .platform
            .create_voice_room(
                guild,
                NewVoiceRoom {
                    name: self.config.overflow_room_name.clone(),
                    bitrate: self.config.effective_overflow_bitrate(),
                    category,
                    position,
                    overwrites,
                },
            )
            .await?;

        self.guilds
            .add_to_field(config, GuildField::PermittedChannels, id)
            .await?;
        self.guilds
            .add_to_field(config, GuildField::OverflowChannels, id)
            .await?;

        log::info!("orchestrator: all practice rooms full in guild {guild}; created overflow room {id}");
        Ok(id)
    }

    /// Reclaim one overflow room, if any can go.  The id is removed from
    /// the store before the room is deleted; when the store update fails the
    /// room is left alone.
    async fn reclaim_overflow_room(
        &self,
        config: &mut GuildConfig,
        rooms: &RoomDirectory,
    ) -> Option<ChannelId> {
        let is_overflow = |room: &VoiceRoom| {
            config.is_overflow(room.id) || room.name == self.config.overflow_room_name
        };
        let id = find_room_to_reclaim(&config.permitted_channels, rooms, is_overflow)?;
        let guild = config.guild_id;

        if let Err(e) = self.forget_room(config, id).await {
            log::warn!("orchestrator: could not forget overflow room {id}, keeping it: {e}");
            return None;
        }

        if let Err(e) = self.platform.delete_channel(guild, id).await {
            log::warn!("orchestrator: could not delete overflow room {id}: {e}");
        } else {
            log::info!("orchestrator: reclaimed overflow room {id} in guild {guild}");
        }
        Some(id)
    }

    async fn forget_room(&self, config: &mut GuildConfig, id: ChannelId) -> Result<(), StoreError> {
        self.guilds
            .remove_from_field(config, GuildField::PermittedChannels, id)
            .await?;
        self.guilds
            .remove_from_field(config, GuildField::OverflowChannels, id)
            .await
    }

    /// The room `old` had locked and has now left, if any.
    fn abandoned_lock(
        &self,
        old: &MemberSnapshot,
        new: &MemberSnapshot,
        rooms: &RoomDirectory,
        reclaimed: Option<ChannelId>,
    ) -> Option<ChannelId> {
        let room = old.channel_id?;
        if Some(room) == reclaimed || new.channel_id == Some(room) {
            return None;
        }
        rooms
            .get(room)
            .filter(|r| r.locked_by == Some(old.member_id))
            .map(|r| r.id)
    }

    async fn refresh_access(
        &self,
        config: &GuildConfig,
        member: &MemberSnapshot,
    ) -> Option<crate::access::AccessChange> {
        match update_chat_access(
            self.platform.as_ref(),
            &self.config,
            &config.permitted_channels,
            member,
        )
        .await
        {
            Ok(change) => Some(change),
            Err(e) => {
                log::warn!(
                    "orchestrator: could not update practice chat access for member {}: {e}",
                    member.member_id
                );
                None
            }
        }
    }

    fn book(&self) -> std::sync::MutexGuard<'_, SessionTable> {
        // The table holds plain data; a panic elsewhere cannot leave it
        // half-updated.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::access::AccessChange;
    use crate::model::{CapacityTier, MemberId, OverwriteTarget, RoleId, SessionStart};
    use crate::platform::{PlatformCall, SimulatedGuild, SimulatedPlatform, TextChannel};
    use crate::session::ManualClock;
    use crate::store::MemoryGuildStore;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Practice log that remembers every commit.
    #[derive(Default)]
    struct RecordingLog(Mutex<Vec<(GuildId, MemberId, u64)>>);

    impl RecordingLog {
        fn commits(&self) -> Vec<u64> {
            self.0.lock().unwrap().iter().map(|(_, _, s)| *s).collect()
        }
    }

    #[async_trait]
    impl PracticeLog for RecordingLog {
        async fn save_user_time(
            &self,
            guild: GuildId,
            member: MemberId,
            seconds: u64,
        ) -> Result<u64, StoreError> {
            let mut commits = self.0.lock().unwrap();
            commits.push((guild, member, seconds));
            Ok(commits.iter().map(|(_, _, s)| s).sum())
        }

        async fn total(&self, _guild: GuildId, _member: MemberId) -> Result<u64, StoreError> {
            Ok(self.commits().iter().sum())
        }
    }

    /// Practice log whose disk is full.
    struct BrokenLog;

    #[async_trait]
    impl PracticeLog for BrokenLog {
        async fn save_user_time(
            &self,
            _guild: GuildId,
            _member: MemberId,
            _seconds: u64,
        ) -> Result<u64, StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }

        async fn total(&self, _guild: GuildId, _member: MemberId) -> Result<u64, StoreError> {
            Ok(0)
        }
    }

    // -----------------------------------------------------------------------
    // Fixture
    // -----------------------------------------------------------------------

    const GUILD: GuildId = GuildId(1);
    const CATEGORY: ChannelId = ChannelId(2);
    const CHAT: ChannelId = ChannelId(3);
    const ROOM_A: ChannelId = ChannelId(10);
    const ROOM_B: ChannelId = ChannelId(11);
    const TEMP_MUTED: RoleId = RoleId(50);
    const UNVERIFIED: RoleId = RoleId(51);
    const ALICE: MemberId = MemberId(100);
    const BOB: MemberId = MemberId(101);

    struct Fixture {
        orchestrator: RoomOrchestrator,
        sim: Arc<SimulatedPlatform>,
        store: Arc<MemoryGuildStore>,
        log: Arc<RecordingLog>,
        clock: Arc<ManualClock>,
    }

    fn primary(id: ChannelId) -> VoiceRoom {
        VoiceRoom {
            id,
            name: format!("Practice Room {id}"),
            bitrate: 96_000,
            tier: CapacityTier::Primary,
            category: Some(CATEGORY),
            occupants: Vec::new(),
            locked_by: None,
        }
    }

    fn seeded_platform() -> SimulatedPlatform {
        let mut g = SimulatedGuild::new(GUILD);
        g.voice_rooms = vec![primary(ROOM_A), primary(ROOM_B)];
        g.text_channels.push(TextChannel {
            id: CHAT,
            name: "practice-room-chat".into(),
            category: Some(CATEGORY),
        });
        g.roles.insert("Temp Muted".into(), TEMP_MUTED);
        g.roles.insert("Verification Required".into(), UNVERIFIED);
        SimulatedPlatform::new(64_000).with_guild(g)
    }

    async fn fixture_with(sim: SimulatedPlatform, configured: bool) -> Fixture {
        let sim = Arc::new(sim);
        let store = Arc::new(MemoryGuildStore::new());
        if configured {
            let mut cfg = GuildConfig::new(GUILD);
            cfg.permitted_channels = vec![ROOM_A, ROOM_B];
            store.save(&cfg).await.unwrap();
        }
        let log = Arc::new(RecordingLog::default());
        let clock = Arc::new(ManualClock::new(1_000));

        let orchestrator = RoomOrchestrator::new(
            RoomsConfig::default(),
            sim.clone(),
            sim.clone(),
            store.clone(),
            log.clone(),
        )
        .with_clock(clock.clone());

        Fixture {
            orchestrator,
            sim,
            store,
            log,
            clock,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(seeded_platform(), true).await
    }

    fn member(id: MemberId) -> MemberSnapshot {
        MemberSnapshot::new(GUILD, id)
    }

    fn voice(old: MemberSnapshot, new: MemberSnapshot) -> GatewayEvent {
        GatewayEvent::VoiceStateUpdated { old, new }
    }

    impl Fixture {
        /// Move `who` on the platform and deliver the matching event.
        async fn moved(
            &self,
            who: MemberId,
            from: Option<ChannelId>,
            to: Option<ChannelId>,
        ) -> EventReport {
            self.sim.move_member(GUILD, who, to);
            let mut old = member(who);
            old.channel_id = from;
            let mut new = member(who);
            new.channel_id = to;
            self.orchestrator.dispatch(voice(old, new)).await.unwrap()
        }

        async fn config(&self) -> GuildConfig {
            self.store.load(GUILD).await.unwrap().unwrap()
        }
    }

    // -----------------------------------------------------------------------
    // Bootstrap
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn first_contact_saves_default_and_stops() {
        let fx = fixture_with(seeded_platform(), false).await;
        fx.sim.move_member(GUILD, ALICE, Some(ROOM_A));

        let report = fx
            .orchestrator
            .dispatch(voice(member(ALICE), member(ALICE).in_channel(ROOM_A)))
            .await
            .unwrap();

        assert!(report.bootstrapped);
        assert_eq!(report.session, None);
        assert_eq!(fx.config().await, GuildConfig::new(GUILD));
        assert!(fx.sim.calls().is_empty());
        assert_eq!(
            fx.orchestrator.session_book().lock().unwrap().live_count(),
            0
        );
    }

    // -----------------------------------------------------------------------
    // Room inventory
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn full_rooms_create_overflow_then_reclaim_it() {
        let fx = fixture().await;
        fx.moved(ALICE, None, Some(ROOM_A)).await;
        let report = fx.moved(BOB, None, Some(ROOM_B)).await;

        let created = report.created_room.expect("overflow room created");
        let cfg = fx.config().await;
        assert_eq!(cfg.permitted_channels, vec![ROOM_A, ROOM_B, created]);
        assert_eq!(cfg.overflow_channels, vec![created]);

        let create_call = fx
            .sim
            .calls()
            .into_iter()
            .find_map(|c| match c {
                PlatformCall::CreateVoiceRoom { room, .. } => Some(room),
                _ => None,
            })
            .expect("create call");
        assert_eq!(create_call.name, "Extra Practice Room");
        assert_eq!(create_call.bitrate, 256_000);
        assert_eq!(create_call.category, Some(CATEGORY));
        assert_eq!(create_call.position, Some(3));
        assert_eq!(
            create_call.overwrites,
            vec![
                ChannelOverwrite::deny_role(TEMP_MUTED, Permissions::SPEAK),
                ChannelOverwrite::deny_role(UNVERIFIED, Permissions::VIEW_CHANNEL),
            ]
        );
        assert!(matches!(
            create_call.overwrites[0].target,
            OverwriteTarget::Role(TEMP_MUTED)
        ));

        // Bob leaves: room B and the overflow room are both empty.
        fx.sim.take_calls();
        let report = fx.moved(BOB, Some(ROOM_B), None).await;

        assert_eq!(report.reclaimed_room, Some(created));
        let cfg = fx.config().await;
        assert_eq!(cfg.permitted_channels, vec![ROOM_A, ROOM_B]);
        assert!(cfg.overflow_channels.is_empty());
        assert!(fx.sim.calls().contains(&PlatformCall::DeleteChannel {
            guild: GUILD,
            channel: created
        }));
        assert!(fx.sim.room(GUILD, created).is_none());
    }

    #[tokio::test]
    async fn occupied_overflow_room_is_kept() {
        let fx = fixture().await;
        fx.moved(ALICE, None, Some(ROOM_A)).await;
        let created = fx
            .moved(BOB, None, Some(ROOM_B))
            .await
            .created_room
            .unwrap();

        // Bob moves into the overflow room, leaving room B as the only empty one.
        let report = fx.moved(BOB, Some(ROOM_B), Some(created)).await;

        assert_eq!(report.created_room, None);
        assert_eq!(report.reclaimed_room, None);
        assert_eq!(
            fx.config().await.permitted_channels,
            vec![ROOM_A, ROOM_B, created]
        );
    }

    #[tokio::test]
    async fn reclaimed_room_is_forgotten_even_if_delete_fails() {
        let fx = fixture_with(seeded_platform().fail_delete(true), true).await;
        fx.moved(ALICE, None, Some(ROOM_A)).await;
        let created = fx
            .moved(BOB, None, Some(ROOM_B))
            .await
            .created_room
            .unwrap();

        let report = fx.moved(BOB, Some(ROOM_B), None).await;

        assert_eq!(report.reclaimed_room, Some(created));
        assert!(!fx.config().await.permitted_channels.contains(&created));
    }

    #[tokio::test]
    async fn failed_room_creation_still_commits_and_updates_access() {
        let fx = fixture_with(seeded_platform().fail_create(true), true).await;
        fx.sim.move_member(GUILD, ALICE, Some(ROOM_A));
        fx.sim.move_member(GUILD, BOB, Some(ROOM_B));
        fx.orchestrator
            .session_book()
            .lock()
            .unwrap()
            .store(GUILD, ALICE, SessionStart::Active(985));

        let mut muted = member(ALICE).in_channel(ROOM_A);
        muted.self_mute = true;
        let report = fx
            .orchestrator
            .dispatch(voice(member(ALICE).in_channel(ROOM_A), muted))
            .await
            .unwrap();

        assert_eq!(report.created_room, None);
        assert_eq!(report.access, Some(AccessChange::Granted));
        assert_eq!(
            report.session,
            Some(Transition::Commit {
                started_at: 985,
                seconds: 15
            })
        );
        assert_eq!(fx.log.commits(), vec![15]);
        assert_eq!(fx.config().await.permitted_channels, vec![ROOM_A, ROOM_B]);
        assert_eq!(
            fx.orchestrator.session_book().lock().unwrap().live_count(),
            0
        );
    }

    #[tokio::test]
    async fn stale_permitted_id_is_ignored() {
        let fx = fixture().await;
        let mut cfg = fx.config().await;
        cfg.permitted_channels.push(ChannelId(999));
        fx.store.save(&cfg).await.unwrap();

        let report = fx.moved(ALICE, None, Some(ROOM_A)).await;

        assert_eq!(report.created_room, None);
        assert_eq!(report.reclaimed_room, None);
    }

    // -----------------------------------------------------------------------
    // Unmute / unlock
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn server_muted_member_in_unlocked_room_is_unmuted() {
        let fx = fixture().await;
        fx.sim.move_member(GUILD, ALICE, Some(ROOM_A));
        let mut new = member(ALICE).in_channel(ROOM_A);
        new.server_mute = true;

        let report = fx
            .orchestrator
            .dispatch(voice(member(ALICE), new))
            .await
            .unwrap();

        assert!(report.unmuted);
        assert!(fx.sim.calls().contains(&PlatformCall::SetServerMute {
            guild: GUILD,
            member: ALICE,
            muted: false
        }));
    }

    #[tokio::test]
    async fn unmute_runs_before_the_room_listing() {
        let fx = fixture_with(seeded_platform().fail_listing(true), true).await;
        fx.sim.move_member(GUILD, ALICE, Some(ROOM_A));
        let mut new = member(ALICE).in_channel(ROOM_A);
        new.server_mute = true;

        let result = fx.orchestrator.dispatch(voice(member(ALICE), new)).await;

        assert!(matches!(result, Err(OrchestratorError::Platform(_))));
        assert!(fx.sim.calls().contains(&PlatformCall::SetServerMute {
            guild: GUILD,
            member: ALICE,
            muted: false
        }));
    }

    #[tokio::test]
    async fn temp_muted_or_locked_room_keeps_server_mute() {
        let fx = fixture().await;
        fx.sim.move_member(GUILD, ALICE, Some(ROOM_A));

        let mut new = member(ALICE).in_channel(ROOM_A).with_role("Temp Muted");
        new.server_mute = true;
        let report = fx
            .orchestrator
            .dispatch(voice(member(ALICE), new))
            .await
            .unwrap();
        assert!(!report.unmuted);

        fx.sim.set_lock(GUILD, ROOM_A, Some(BOB));
        let mut new = member(ALICE).in_channel(ROOM_A);
        new.server_mute = true;
        let report = fx
            .orchestrator
            .dispatch(voice(member(ALICE), new))
            .await
            .unwrap();
        assert!(!report.unmuted);

        assert!(!fx
            .sim
            .calls()
            .iter()
            .any(|c| matches!(c, PlatformCall::SetServerMute { .. })));
    }

    #[tokio::test]
    async fn failed_unmute_does_not_abort_the_event() {
        let fx = fixture_with(seeded_platform().fail_unmute(true), true).await;
        fx.sim.move_member(GUILD, ALICE, Some(ROOM_A));
        let mut new = member(ALICE).in_channel(ROOM_A);
        new.server_mute = true;

        let report = fx
            .orchestrator
            .dispatch(voice(member(ALICE), new))
            .await
            .unwrap();

        assert!(!report.unmuted);
        assert_eq!(report.access, Some(AccessChange::Granted));
    }

    #[tokio::test]
    async fn leaving_a_locked_room_unlocks_it() {
        let fx = fixture().await;
        fx.sim.move_member(GUILD, ALICE, Some(ROOM_A));
        fx.sim.set_lock(GUILD, ROOM_A, Some(ALICE));

        let report = fx.moved(ALICE, Some(ROOM_A), Some(ROOM_B)).await;

        assert_eq!(report.unlocked_room, Some(ROOM_A));
        assert_eq!(fx.sim.room(GUILD, ROOM_A).unwrap().locked_by, None);
    }

    #[tokio::test]
    async fn staying_in_a_locked_room_keeps_the_lock() {
        let fx = fixture().await;
        fx.sim.move_member(GUILD, ALICE, Some(ROOM_A));
        fx.sim.set_lock(GUILD, ROOM_A, Some(ALICE));

        let mut new = member(ALICE).in_channel(ROOM_A);
        new.self_mute = true;
        let report = fx
            .orchestrator
            .dispatch(voice(member(ALICE).in_channel(ROOM_A), new))
            .await
            .unwrap();

        assert_eq!(report.unlocked_room, None);
        assert_eq!(fx.sim.room(GUILD, ROOM_A).unwrap().locked_by, Some(ALICE));
    }

    #[tokio::test]
    async fn failed_unlock_is_swallowed() {
        let fx = fixture_with(seeded_platform().fail_unlock(true), true).await;
        fx.sim.move_member(GUILD, ALICE, Some(ROOM_A));
        fx.sim.set_lock(GUILD, ROOM_A, Some(ALICE));

        let report = fx.moved(ALICE, Some(ROOM_A), None).await;

        assert_eq!(report.unlocked_room, None);
        assert!(report.session.is_some());
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn fifteen_second_session_commits_once() {
        let fx = fixture().await;

        let report = fx.moved(ALICE, None, Some(ROOM_A)).await;
        assert_eq!(report.session, Some(Transition::Started(1_000)));

        fx.clock.advance(15);
        let report = fx.moved(ALICE, Some(ROOM_A), None).await;
        assert_eq!(
            report.session,
            Some(Transition::Commit {
                started_at: 1_000,
                seconds: 15
            })
        );

        let report = fx.moved(ALICE, None, None).await;
        assert_eq!(report.session, Some(Transition::Idle));
        assert_eq!(fx.log.commits(), vec![15]);
    }

    #[tokio::test]
    async fn moving_between_rooms_keeps_the_start() {
        let fx = fixture().await;

        fx.moved(ALICE, None, Some(ROOM_A)).await;
        fx.clock.advance(10);
        let report = fx.moved(ALICE, Some(ROOM_A), Some(ROOM_B)).await;
        assert_eq!(report.session, Some(Transition::Continued(1_000)));

        fx.clock.advance(20);
        fx.moved(ALICE, Some(ROOM_B), None).await;
        assert_eq!(fx.log.commits(), vec![30]);
    }

    #[tokio::test]
    async fn muting_ends_the_session() {
        let fx = fixture().await;
        fx.moved(ALICE, None, Some(ROOM_A)).await;
        fx.clock.advance(42);

        let mut muted = member(ALICE).in_channel(ROOM_A);
        muted.self_mute = true;
        let report = fx
            .orchestrator
            .dispatch(voice(member(ALICE).in_channel(ROOM_A), muted))
            .await
            .unwrap();

        assert!(matches!(
            report.session,
            Some(Transition::Commit { seconds: 42, .. })
        ));
        assert_eq!(fx.log.commits(), vec![42]);
    }

    #[tokio::test]
    async fn room_locked_by_someone_else_is_not_practice() {
        let fx = fixture().await;
        fx.sim.set_lock(GUILD, ROOM_A, Some(BOB));

        let report = fx.moved(ALICE, None, Some(ROOM_A)).await;

        assert_eq!(report.session, Some(Transition::Idle));
    }

    #[tokio::test]
    async fn rejected_commit_keeps_the_session_open() {
        let sim = Arc::new(seeded_platform());
        let store = Arc::new(MemoryGuildStore::new());
        let mut cfg = GuildConfig::new(GUILD);
        cfg.permitted_channels = vec![ROOM_A, ROOM_B];
        store.save(&cfg).await.unwrap();

        let orchestrator = RoomOrchestrator::new(
            RoomsConfig::default(),
            sim.clone(),
            sim.clone(),
            store,
            Arc::new(BrokenLog),
        )
        .with_clock(Arc::new(ManualClock::new(1_000)));
        let book = orchestrator.session_book();
        book.lock()
            .unwrap()
            .store(GUILD, ALICE, SessionStart::Active(985));

        let report = orchestrator
            .dispatch(voice(member(ALICE).in_channel(ROOM_A), member(ALICE)))
            .await
            .unwrap();

        assert_eq!(report.session, None);
        assert_eq!(report.access, Some(AccessChange::Unchanged));
        assert_eq!(book.lock().unwrap().get(GUILD, ALICE), SessionStart::Active(985));
    }

    #[tokio::test]
    async fn handle_voice_state_clears_both_snapshots_on_commit() {
        let fx = fixture().await;
        fx.sim.move_member(GUILD, ALICE, None);

        let mut old = member(ALICE).in_channel(ROOM_A);
        old.session = SessionStart::Active(990);
        let mut new = member(ALICE);
        new.session = SessionStart::Active(990);

        fx.orchestrator
            .handle_voice_state(&mut old, &mut new)
            .await
            .unwrap();

        assert_eq!(old.session, SessionStart::Committed);
        assert_eq!(new.session, SessionStart::Committed);
        assert_eq!(fx.log.commits(), vec![10]);
    }

    // -----------------------------------------------------------------------
    // Member updates
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn temp_mute_role_revokes_chat_access() {
        let fx = fixture().await;
        fx.moved(ALICE, None, Some(ROOM_A)).await;
        assert!(fx.sim.overwrite(CHAT, ALICE).is_some());

        let report = fx
            .orchestrator
            .dispatch(GatewayEvent::MemberUpdated {
                old: member(ALICE).in_channel(ROOM_A),
                new: member(ALICE).in_channel(ROOM_A).with_role("Temp Muted"),
            })
            .await
            .unwrap();

        assert_eq!(report.access, Some(AccessChange::OverwriteDeleted));
        assert!(fx.sim.overwrite(CHAT, ALICE).is_none());
        assert_eq!(report.session, None);
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn run_keeps_going_after_a_failed_event() {
        let fx = fixture().await;
        let log = fx.log.clone();
        let book = fx.orchestrator.session_book();
        book.lock()
            .unwrap()
            .store(GUILD, ALICE, SessionStart::Active(985));

        // Guild 7 is configured in the store but unknown to the platform.
        let mut stray = GuildConfig::new(GuildId(7));
        stray.permitted_channels = vec![ROOM_A];
        fx.store.save(&stray).await.unwrap();

        let (tx, rx) = mpsc::channel(8);
        tx.send(voice(
            MemberSnapshot::new(GuildId(7), BOB),
            MemberSnapshot::new(GuildId(7), BOB).in_channel(ROOM_A),
        ))
        .await
        .unwrap();
        tx.send(voice(member(ALICE).in_channel(ROOM_A), member(ALICE)))
            .await
            .unwrap();
        drop(tx);
        fx.orchestrator.run(rx).await;

        assert_eq!(log.commits(), vec![15]);
        assert_eq!(book.lock().unwrap().live_count(), 0);
    }

    #[tokio::test]
    async fn run_carries_sessions_between_events() {
        let fx = fixture().await;
        let log = fx.log.clone();
        let clock = fx.clock.clone();
        let sim = fx.sim.clone();
        let book = fx.orchestrator.session_book();

        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(fx.orchestrator.run(rx));

        sim.move_member(GUILD, ALICE, Some(ROOM_A));
        tx.send(voice(member(ALICE), member(ALICE).in_channel(ROOM_A)))
            .await
            .unwrap();
        // Wait until the first event has been processed.
        while book.lock().unwrap().live_count() == 0 {
            tokio::task::yield_now().await;
        }

        clock.advance(15);
        sim.move_member(GUILD, ALICE, None);
        tx.send(voice(member(ALICE).in_channel(ROOM_A), member(ALICE)))
            .await
            .unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(log.commits(), vec![15]);
        assert_eq!(book.lock().unwrap().live_count(), 0);
    }
}
