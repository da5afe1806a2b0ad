//! JSON-file [`GuildRepository`].
//!
//! The whole store is a single pretty-printed JSON document:
//!
//! ```json
//! { "guilds": [ { "guild_id": 1, "permitted_channels": [10, 11], "overflow_channels": [] } ] }
//! ```
//!
//! Every operation reads the file afresh and every mutation replaces it, so
//! edits made by hand (or by another process) are picked up on the next
//! event.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::model::{ChannelId, GuildConfig, GuildField, GuildId};

use super::{read_json, write_json, GuildRepository, StoreError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct GuildFile {
    #[serde(default)]
    guilds: Vec<GuildConfig>,
}

impl GuildFile {
    fn get_mut(&mut self, guild: GuildId) -> Option<&mut GuildConfig> {
        self.guilds.iter_mut().find(|g| g.guild_id == guild)
    }
}

/// Guild configurations persisted in a JSON file.
pub struct JsonGuildStore {
    path: PathBuf,
    /// Held by every read and every read-modify-write in this process.
    lock: Mutex<()>,
}

impl JsonGuildStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<GuildFile, StoreError> {
        read_json(&self.path).await
    }

    async fn write(&self, file: &GuildFile) -> Result<(), StoreError> {
        write_json(&self.path, file).await
    }

    async fn update(
        &self,
        config: &mut GuildConfig,
        apply: impl FnOnce(&mut GuildConfig) -> bool,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut file = self.read().await?;
        let stored = file
            .get_mut(config.guild_id)
            .ok_or(StoreError::MissingGuild(config.guild_id))?;
        let changed = apply(stored);
        *config = stored.clone();
        if changed {
            self.write(&file).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl GuildRepository for JsonGuildStore {
    async fn load(&self, guild: GuildId) -> Result<Option<GuildConfig>, StoreError> {
        let _guard = self.lock.lock().await;
        let file = self.read().await?;
        Ok(file.guilds.into_iter().find(|g| g.guild_id == guild))
    }

    async fn save(&self, config: &GuildConfig) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut file = self.read().await?;
        match file.get_mut(config.guild_id) {
            Some(stored) => *stored = config.clone(),
            None => file.guilds.push(config.clone()),
        }
        self.write(&file).await
    }

    async fn add_to_field(
        &self,
        config: &mut GuildConfig,
        field: GuildField,
        value: ChannelId,
    ) -> Result<(), StoreError> {
        log::debug!("store: add {value} to {} of guild {}", field.name(), config.guild_id);
        self.update(config, |g| g.add_to(field, value)).await
    }

    async fn remove_from_field(
        &self,
        config: &mut GuildConfig,
        field: GuildField,
        value: ChannelId,
    ) -> Result<(), StoreError> {
        log::debug!(
            "store: remove {value} from {} of guild {}",
            field.name(),
            config.guild_id
        );
        self.update(config, |g| g.remove_from(field, value)).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
