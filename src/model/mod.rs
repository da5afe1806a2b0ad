//! Domain types shared by every component: ids, rooms, member snapshots,
//! guild configuration and permission bits.

pub mod guild;
pub mod ids;
pub mod member;
pub mod permissions;
pub mod room;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use guild::{GuildConfig, GuildField};
pub use ids::{ChannelId, GuildId, MemberId, RoleId};
pub use member::{MemberSnapshot, SessionStart};
pub use permissions::{ChannelOverwrite, OverwriteTarget, PermissionOverwrite, Permissions};
pub use room::{CapacityTier, Occupant, RoomDirectory, VoiceRoom};
