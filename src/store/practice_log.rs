//! Accumulated practice time per member.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::model::{GuildId, MemberId};

use super::{read_json, write_json, StoreError};

// ---------------------------------------------------------------------------
// PracticeLog trait
// ---------------------------------------------------------------------------

/// Persists committed practice sessions.
#[async_trait]
pub trait PracticeLog: Send + Sync {
    /// Add `seconds` to the member's stored total and return the new total.
    async fn save_user_time(
        &self,
        guild: GuildId,
        member: MemberId,
        seconds: u64,
    ) -> Result<u64, StoreError>;

    /// The member's stored total, zero if never recorded.
    async fn total(&self, guild: GuildId, member: MemberId) -> Result<u64, StoreError>;
}

// ---------------------------------------------------------------------------
// JsonPracticeLog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimeEntry {
    guild_id: GuildId,
    member_id: MemberId,
    seconds: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LogFile {
    #[serde(default)]
    entries: Vec<TimeEntry>,
}

/// Practice totals persisted in a JSON file, replaced after every commit.
pub struct JsonPracticeLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonPracticeLog {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read(&self) -> Result<LogFile, StoreError> {
        read_json(&self.path).await
    }
}

#[async_trait]
impl PracticeLog for JsonPracticeLog {
    async fn save_user_time(
        &self,
        guild: GuildId,
        member: MemberId,
        seconds: u64,
    ) -> Result<u64, StoreError> {
        let _guard = self.lock.lock().await;
        let mut file = self.read().await?;

        let total = match file
            .entries
            .iter_mut()
            .find(|e| e.guild_id == guild && e.member_id == member)
        {
            Some(entry) => {
                entry.seconds = entry.seconds.saturating_add(seconds);
                entry.seconds
            }
            None => {
                file.entries.push(TimeEntry {
                    guild_id: guild,
                    member_id: member,
                    seconds,
                });
                seconds
            }
        };

        write_json(&self.path, &file).await?;

        log::info!("practice log: member {member} in guild {guild} +{seconds}s (total {total}s)");
        Ok(total)
    }

    async fn total(&self, guild: GuildId, member: MemberId) -> Result<u64, StoreError> {
        let _guard = self.lock.lock().await;
        let file = self.read().await?;
        Ok(file
            .entries
            .iter()
            .find(|e| e.guild_id == guild && e.member_id == member)
            .map_or(0, |e| e.seconds))
    }
}
