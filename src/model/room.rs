//! Voice rooms as seen by the bot at the moment an event is processed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{ChannelId, MemberId};

// ---------------------------------------------------------------------------
// CapacityTier
// ---------------------------------------------------------------------------

/// Audio quality tier of a voice room.
///
/// Primary rooms run at a high bitrate; legacy spill-over rooms run at the
/// low bitrate and are never counted when deciding whether the practice
/// rooms are full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityTier {
    #[default]
    Primary,
    Low,
}

impl CapacityTier {
    /// Classify a room by bitrate: exactly `low_bitrate` is `Low`, anything
    /// else is `Primary`.
    ///
    /// ```
    /// use practice_rooms::model::CapacityTier;
    ///
    /// assert_eq!(CapacityTier::from_bitrate(64_000, 64_000), CapacityTier::Low);
    /// assert_eq!(CapacityTier::from_bitrate(96_000, 64_000), CapacityTier::Primary);
    /// ```
    pub fn from_bitrate(bitrate: u32, low_bitrate: u32) -> Self {
        if bitrate == low_bitrate {
            CapacityTier::Low
        } else {
            CapacityTier::Primary
        }
    }
}

// ---------------------------------------------------------------------------
// Occupant / VoiceRoom
// ---------------------------------------------------------------------------

/// A member connected to a voice room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub member_id: MemberId,
    /// The connection is already being torn down; the member no longer
    /// counts as present.
    #[serde(default)]
    pub departed: bool,
}

impl Occupant {
    pub fn present(member_id: MemberId) -> Self {
        Self {
            member_id,
            departed: false,
        }
    }
}

/// A voice room in a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceRoom {
    pub id: ChannelId,
    pub name: String,
    pub bitrate: u32,
    /// Derived from `bitrate` when the room enters a [`RoomDirectory`];
    /// never read from the wire.
    #[serde(skip)]
    pub tier: CapacityTier,
    /// Category channel the room lives under, if any.
    #[serde(default)]
    pub category: Option<ChannelId>,
    #[serde(default)]
    pub occupants: Vec<Occupant>,
    /// Member holding an exclusive lock on the room.
    #[serde(default)]
    pub locked_by: Option<MemberId>,
}

impl VoiceRoom {
    /// `true` when no occupant has a live connection.
    pub fn is_empty(&self) -> bool {
        !self.occupants.iter().any(|o| !o.departed)
    }

    pub fn is_primary(&self) -> bool {
        self.tier == CapacityTier::Primary
    }

    /// `true` when the room is unlocked or locked by `member`.
    pub fn admits(&self, member: MemberId) -> bool {
        self.locked_by.map_or(true, |owner| owner == member)
    }
}

// ---------------------------------------------------------------------------
// RoomDirectory
// ---------------------------------------------------------------------------

/// Point-in-time lookup of a guild's voice rooms by id.
///
/// The directory is the only place a room's [`CapacityTier`] is decided:
/// every room is classified against `low_bitrate` as it is inserted,
/// whatever tier it arrived with.
///
/// A permitted id that is missing from the directory is a stale reference
/// (the room was deleted out from under the bot).
#[derive(Debug, Clone)]
pub struct RoomDirectory {
    low_bitrate: u32,
    rooms: HashMap<ChannelId, VoiceRoom>,
}

impl RoomDirectory {
    pub fn new(low_bitrate: u32) -> Self {
        Self {
            low_bitrate,
            rooms: HashMap::new(),
        }
    }

    /// Build a directory from `rooms`, classifying each one.
    pub fn classify(low_bitrate: u32, rooms: impl IntoIterator<Item = VoiceRoom>) -> Self {
        let mut directory = Self::new(low_bitrate);
        for room in rooms {
            directory.insert(room);
        }
        directory
    }

    pub fn get(&self, id: ChannelId) -> Option<&VoiceRoom> {
        self.rooms.get(&id)
    }

    pub fn insert(&mut self, mut room: VoiceRoom) {
        room.tier = CapacityTier::from_bitrate(room.bitrate, self.low_bitrate);
        self.rooms.insert(room.id, room);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(occupants: Vec<Occupant>) -> VoiceRoom {
        VoiceRoom {
            id: ChannelId(1),
            name: "Practice Room 1".into(),
            bitrate: 96_000,
            tier: CapacityTier::Primary,
            category: None,
            occupants,
            locked_by: None,
        }
    }

    #[test]
    fn departed_occupants_do_not_count() {
        let r = room(vec![Occupant {
            member_id: MemberId(5),
            departed: true,
        }]);
        assert!(r.is_empty());
    }

    #[test]
    fn present_occupant_makes_room_non_empty() {
        let r = room(vec![Occupant::present(MemberId(5))]);
        assert!(!r.is_empty());
    }

    #[test]
    fn directory_derives_tier_from_bitrate() {
        let mut mislabelled = room(vec![]);
        mislabelled.bitrate = 64_000;
        mislabelled.tier = CapacityTier::Primary;

        let rooms = RoomDirectory::classify(64_000, [mislabelled]);
        assert_eq!(rooms.get(ChannelId(1)).unwrap().tier, CapacityTier::Low);
    }

    #[test]
    fn tier_is_not_read_from_the_wire() {
        let json = r#"{"id":1,"name":"Practice Room 1","bitrate":64000,"tier":"primary"}"#;
        let parsed: VoiceRoom = serde_json::from_str(json).unwrap();
        let rooms = RoomDirectory::classify(64_000, [parsed]);
        assert!(!rooms.get(ChannelId(1)).unwrap().is_primary());
    }

    #[test]
    fn lock_admits_only_owner() {
        let mut r = room(vec![]);
        assert!(r.admits(MemberId(1)));
        r.locked_by = Some(MemberId(2));
        assert!(r.admits(MemberId(2)));
        assert!(!r.admits(MemberId(1)));
    }
}
