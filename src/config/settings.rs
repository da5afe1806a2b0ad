//! Bot settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// RoomsConfig
// ---------------------------------------------------------------------------

/// Names and audio settings used when managing practice rooms.
///
/// The bot finds channels and roles by name, so these must match what the
/// guild's moderators set up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomsConfig {
    /// Text channel whose send permission follows voice presence.  Overflow
    /// rooms are created in this channel's category.
    pub practice_chat_name: String,
    /// Name given to bot-created overflow rooms.  Rooms carrying this name
    /// but missing from the persisted overflow set are still treated as
    /// overflow rooms.
    pub overflow_room_name: String,
    /// Role that silences a member in practice rooms and the practice chat.
    pub temp_muted_role: String,
    /// Role of members who have not passed verification yet; overflow rooms
    /// are hidden from them.
    pub verification_role: String,
    /// Bitrate (bps) that marks a room as low-capacity.
    pub low_bitrate: u32,
    /// Bitrate (bps) of newly created overflow rooms.
    pub overflow_bitrate: u32,
    /// Bitrate used instead of `overflow_bitrate` when `dev_mode` is on
    /// (unboosted test guilds cap bitrate at 96 kbps).
    pub dev_overflow_bitrate: u32,
    pub dev_mode: bool,
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            practice_chat_name: "practice-room-chat".into(),
            overflow_room_name: "Extra Practice Room".into(),
            temp_muted_role: "Temp Muted".into(),
            verification_role: "Verification Required".into(),
            low_bitrate: 64_000,
            overflow_bitrate: 256_000,
            dev_overflow_bitrate: 96_000,
            dev_mode: false,
        }
    }
}

impl RoomsConfig {
    /// Bitrate to request for a new overflow room.
    pub fn effective_overflow_bitrate(&self) -> u32 {
        if self.dev_mode {
            self.dev_overflow_bitrate
        } else {
            self.overflow_bitrate
        }
    }
}

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

/// Locations of the JSON-backed stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub guilds_file: PathBuf,
    pub practice_log_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let paths = AppPaths::new();
        Self {
            guilds_file: paths.guilds_file,
            practice_log_file: paths.practice_log_file,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` filter used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// BotConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level bot configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use practice_rooms::config::BotConfig;
///
/// // Load (returns Default when file is missing)
/// let config = BotConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub rooms: RoomsConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl BotConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(BotConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
