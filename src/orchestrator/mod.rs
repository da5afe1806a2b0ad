//! Event-driven orchestrator for the practice rooms.
//!
//! The gateway delivers [`GatewayEvent`]s over a `tokio::sync::mpsc` channel;
//! [`RoomOrchestrator::run`] handles them one at a time, in arrival order.
//!
//! # Architecture
//!
//! ```text
//! GatewayEvent (mpsc)
//!        │
//!        ▼
//! RoomOrchestrator::run()  ← async tokio task
//!        │
//!        ├─ VoiceStateUpdated
//!        │     ├─ GuildRepository::load     (first contact → bootstrap)
//!        │     ├─ Platform::set_server_mute (leftover lock mute)
//!        │     ├─ all_rooms_full / find_room_to_reclaim
//!        │     ├─ RoomLocks::unlock_room
//!        │     ├─ update_chat_access
//!        │     └─ is_live + advance       → PracticeLog::save_user_time
//!        │
//!        └─ MemberUpdated
//!              └─ update_chat_access
//!
//! SessionBook (Arc<Mutex<SessionTable>>) ←─── carries session starts between events
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use practice_rooms::config::BotConfig;
//! use practice_rooms::orchestrator::RoomOrchestrator;
//! use practice_rooms::platform::SimulatedPlatform;
//! use practice_rooms::store::{JsonGuildStore, JsonPracticeLog};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = BotConfig::default();
//!     let platform = Arc::new(SimulatedPlatform::new(config.rooms.low_bitrate));
//!
//!     let orchestrator = RoomOrchestrator::new(
//!         config.rooms.clone(),
//!         platform.clone(),
//!         platform,
//!         Arc::new(JsonGuildStore::open(&config.storage.guilds_file)),
//!         Arc::new(JsonPracticeLog::open(&config.storage.practice_log_file)),
//!     );
//!
//!     let (event_tx, event_rx) = mpsc::channel(64);
//!     tokio::spawn(async move { orchestrator.run(event_rx).await });
//!
//!     // event_tx is handed to the gateway connection
//!     # drop(event_tx);
//! }
//! ```

pub mod events;
pub mod runner;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use events::{EventReport, GatewayEvent};
pub use runner::{OrchestratorError, RoomOrchestrator};
