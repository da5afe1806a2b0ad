//! Persistent stores for guild configuration and practice time.
//!
//! This module provides:
//! * [`GuildRepository`]: async trait for load / save / set-field updates of
//!   [`GuildConfig`].
//! * [`MemoryGuildStore`] and [`JsonGuildStore`]: in-memory and JSON-file
//!   implementations.
//! * [`PracticeLog`]: async trait that accumulates practice seconds per
//!   member, with the JSON-file implementation [`JsonPracticeLog`].
//! * [`StoreError`]: error variants shared by all stores.
//!
//! There is no in-process cache: every orchestrator decision re-reads the
//! store, and every set update is a read-modify-write against it.  The JSON
//! files are replaced by rename, so a reader sees either the old or the new
//! document and never a partial one.

pub mod json;
pub mod memory;
pub mod practice_log;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::model::{ChannelId, GuildConfig, GuildField, GuildId};

pub use json::JsonGuildStore;
pub use memory::MemoryGuildStore;
pub use practice_log::{JsonPracticeLog, PracticeLog};

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store contents are not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    /// A set update targeted a guild that was never saved.
    #[error("no configuration stored for guild {0}")]
    MissingGuild(GuildId),
}

// ---------------------------------------------------------------------------
// GuildRepository trait
// ---------------------------------------------------------------------------

/// Keyed store of [`GuildConfig`]s.
#[async_trait]
pub trait GuildRepository: Send + Sync {
    /// The stored configuration, or `None` on first contact.
    async fn load(&self, guild: GuildId) -> Result<Option<GuildConfig>, StoreError>;

    async fn save(&self, config: &GuildConfig) -> Result<(), StoreError>;

    /// Add `value` to the set `field` of the stored configuration for
    /// `config.guild_id`.  `config` is updated to mirror the stored value.
    async fn add_to_field(
        &self,
        config: &mut GuildConfig,
        field: GuildField,
        value: ChannelId,
    ) -> Result<(), StoreError>;

    /// Remove `value` from the set `field`; see [`add_to_field`](Self::add_to_field).
    async fn remove_from_field(
        &self,
        config: &mut GuildConfig,
        field: GuildField,
        value: ChannelId,
    ) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// JSON file helpers
// ---------------------------------------------------------------------------

/// Read a JSON document; a missing or blank file yields `T::default()`.
pub(crate) async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) if content.trim().is_empty() => Ok(T::default()),
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Write `value` next to `path` and rename it into place.
pub(crate) async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let staging = staging_path(path);
    tokio::fs::write(&staging, json).await?;
    tokio::fs::rename(&staging, path).await?;
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".into());
    path.with_file_name(format!("{name}.tmp"))
}
