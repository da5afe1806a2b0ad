//! Snowflake-style identifiers for guilds, channels, members and roles.
//!
//! Each id is a thin `u64` newtype so a channel id can never be passed where a
//! member id is expected.  All of them serialise transparently as plain
//! numbers.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

snowflake!(
    /// Identifies a guild (community server).
    GuildId
);
snowflake!(
    /// Identifies a voice or text channel, or a category.
    ChannelId
);
snowflake!(
    /// Identifies a guild member (user).
    MemberId
);
snowflake!(
    /// Identifies a guild role.
    RoleId
);
