//! Room inventory decisions.
//!
//! * [`all_rooms_full`]: are all primary practice rooms occupied?
//! * [`find_room_to_reclaim`]: which overflow room, if any, can go?
//!
//! Both are pure functions over a [`RoomDirectory`](crate::model::RoomDirectory)
//! snapshot; the orchestrator acts on their verdicts.

pub mod capacity;
pub mod reclaim;

pub use capacity::all_rooms_full;
pub use reclaim::find_room_to_reclaim;
