//! Picks an overflow room to delete once capacity pressure is gone.

use crate::model::{ChannelId, RoomDirectory, VoiceRoom};

/// Choose at most one empty overflow room to delete.
///
/// Nothing is reclaimed unless at least two permitted rooms are empty at the
/// same time.  When at most one of the empty rooms is primary-capacity the
/// only candidates are low-capacity overflow rooms; otherwise the first empty
/// overflow room in permitted order is chosen.  `is_overflow` decides which
/// rooms the bot created; no other room is ever a candidate.
pub fn find_room_to_reclaim(
    permitted: &[ChannelId],
    rooms: &RoomDirectory,
    is_overflow: impl Fn(&VoiceRoom) -> bool,
) -> Option<ChannelId> {
    let empty: Vec<&VoiceRoom> = permitted
        .iter()
        .filter_map(|id| rooms.get(*id))
        .filter(|room| room.is_empty())
        .collect();

    if empty.len() < 2 {
        return None;
    }

    let empty_primary = empty.iter().filter(|room| room.is_primary()).count();
    let candidate = if empty_primary <= 1 {
        empty
            .iter()
            .copied()
            .find(|room| !room.is_primary() && is_overflow(*room))
    } else {
        empty.iter().copied().find(|room| is_overflow(*room))
    };

    candidate.map(|room| room.id)
}
