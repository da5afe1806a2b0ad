//! Persisted per-guild configuration.

use serde::{Deserialize, Serialize};

use super::{ChannelId, GuildId};

/// Names of the set-valued fields of [`GuildConfig`] that the store can
/// update in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuildField {
    PermittedChannels,
    OverflowChannels,
}

impl GuildField {
    pub fn name(self) -> &'static str {
        match self {
            GuildField::PermittedChannels => "permitted_channels",
            GuildField::OverflowChannels => "overflow_channels",
        }
    }
}

/// Configuration the bot keeps for each guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildConfig {
    pub guild_id: GuildId,
    /// Voice rooms that count as practice rooms, in display order.
    #[serde(default)]
    pub permitted_channels: Vec<ChannelId>,
    /// Subset of `permitted_channels` created by the bot and eligible for
    /// deletion.
    #[serde(default)]
    pub overflow_channels: Vec<ChannelId>,
}

impl GuildConfig {
    /// Configuration written on first contact with a guild.
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            permitted_channels: Vec::new(),
            overflow_channels: Vec::new(),
        }
    }

    pub fn is_permitted(&self, channel: ChannelId) -> bool {
        self.permitted_channels.contains(&channel)
    }

    pub fn is_overflow(&self, channel: ChannelId) -> bool {
        self.overflow_channels.contains(&channel)
    }

    /// Append `value` to `field` unless already present.  Returns `true`
    /// when the field changed.
    pub fn add_to(&mut self, field: GuildField, value: ChannelId) -> bool {
        let set = self.field_mut(field);
        if set.contains(&value) {
            return false;
        }
        set.push(value);
        true
    }

    /// Remove `value` from `field`.  Returns `true` when the field changed.
    pub fn remove_from(&mut self, field: GuildField, value: ChannelId) -> bool {
        let set = self.field_mut(field);
        let before = set.len();
        set.retain(|c| *c != value);
        set.len() != before
    }

    fn field_mut(&mut self, field: GuildField) -> &mut Vec<ChannelId> {
        match field {
            GuildField::PermittedChannels => &mut self.permitted_channels,
            GuildField::OverflowChannels => &mut self.overflow_channels,
        }
    }
}
