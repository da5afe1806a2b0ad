//! Practice-session bookkeeping.
//!
//! * [`is_live`]: classifies a snapshot as actively practicing or not.
//! * [`advance`] / [`mark_committed`]: the session state machine.
//! * [`SessionBook`]: session starts carried between events.
//! * [`Clock`]: time source, [`SystemClock`] in production.

pub mod accountant;
pub mod book;
pub mod classifier;
pub mod clock;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use accountant::{advance, elapsed, mark_committed, Transition};
pub use book::{new_session_book, SessionBook, SessionTable};
pub use classifier::is_live;
pub use clock::{Clock, SystemClock};

#[cfg(test)]
pub use clock::ManualClock;
