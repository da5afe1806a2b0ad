//! Decides whether every primary practice room is taken.
//!
//! Occupancy alone decides: a room whose occupants are all muted still
//! counts as taken, since someone may have been practicing there a moment
//! ago and only muted briefly.

use crate::model::{ChannelId, RoomDirectory};

/// `true` when no permitted primary room is empty.
///
/// Stale ids (rooms that no longer exist) and low-capacity rooms are
/// ignored, so they can neither cause nor prevent a "full" verdict.
///
/// ```
/// use practice_rooms::model::{ChannelId, RoomDirectory};
/// use practice_rooms::rooms::all_rooms_full;
///
/// // Nothing resolves, so there is no free room to send anyone to.
/// assert!(all_rooms_full(&[ChannelId(1)], &RoomDirectory::new(64_000)));
/// ```
pub fn all_rooms_full(permitted: &[ChannelId], rooms: &RoomDirectory) -> bool {
    !permitted
        .iter()
        .filter_map(|id| rooms.get(*id))
        .any(|room| room.is_primary() && room.is_empty())
}
