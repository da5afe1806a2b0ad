//! In-memory [`GuildRepository`].

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::model::{ChannelId, GuildConfig, GuildField, GuildId};

use super::{GuildRepository, StoreError};

/// Guild configurations kept in a map; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryGuildStore {
    guilds: Mutex<HashMap<GuildId, GuildConfig>>,
}

impl MemoryGuildStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update(
        &self,
        config: &mut GuildConfig,
        apply: impl FnOnce(&mut GuildConfig) -> bool,
    ) -> Result<(), StoreError> {
        let mut guilds = self.guilds.lock().await;
        let stored = guilds
            .get_mut(&config.guild_id)
            .ok_or(StoreError::MissingGuild(config.guild_id))?;
        apply(stored);
        *config = stored.clone();
        Ok(())
    }
}

#[async_trait]
impl GuildRepository for MemoryGuildStore {
    async fn load(&self, guild: GuildId) -> Result<Option<GuildConfig>, StoreError> {
        Ok(self.guilds.lock().await.get(&guild).cloned())
    }

    async fn save(&self, config: &GuildConfig) -> Result<(), StoreError> {
        self.guilds
            .lock()
            .await
            .insert(config.guild_id, config.clone());
        Ok(())
    }

    async fn add_to_field(
        &self,
        config: &mut GuildConfig,
        field: GuildField,
        value: ChannelId,
    ) -> Result<(), StoreError> {
        self.update(config, |g| g.add_to(field, value)).await
    }

    async fn remove_from_field(
        &self,
        config: &mut GuildConfig,
        field: GuildField,
        value: ChannelId,
    ) -> Result<(), StoreError> {
        self.update(config, |g| g.remove_from(field, value)).await
    }
}
