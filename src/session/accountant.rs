//! Practice-session state machine.
//!
//! Each event compares the member's previous and new snapshot:
//!
//! ```text
//! old session      new verdict   result
//! ───────────────  ───────────   ──────────────────────────────────────
//! not active       live          new = Active(now)              Started
//! Active(t)        live          new = Active(t)                Continued
//! Active(t)        not live      new = Active(t), then commit   Commit
//! not active       not live      nothing (unless new is active) Idle
//! ```
//!
//! Carrying `t` over unchanged is what lets a session span several rooms.
//! After the caller has persisted a [`Transition::Commit`] it calls
//! [`mark_committed`] so a replayed "not live" event finds nothing left to
//! commit.

use crate::model::SessionStart;

/// What an event did to the member's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A new session began at the given timestamp.
    Started(i64),
    /// A running session carried over from the previous snapshot.
    Continued(i64),
    /// The session ended; `seconds` must be added to the member's total.
    Commit { started_at: i64, seconds: u64 },
    /// No session running and none starting.
    Idle,
}

/// Advance `new` from `old` given the live verdict for the new snapshot.
///
/// ```
/// use practice_rooms::model::SessionStart;
/// use practice_rooms::session::{advance, Transition};
///
/// let mut new = SessionStart::NeverStarted;
/// assert_eq!(advance(SessionStart::NeverStarted, &mut new, true, 100), Transition::Started(100));
/// assert_eq!(new, SessionStart::Active(100));
/// ```
pub fn advance(old: SessionStart, new: &mut SessionStart, live: bool, now: i64) -> Transition {
    match old {
        SessionStart::Active(t) => *new = SessionStart::Active(t),
        SessionStart::NeverStarted | SessionStart::Committed if live => {
            *new = SessionStart::Active(now)
        }
        SessionStart::NeverStarted | SessionStart::Committed => {}
    }

    match (*new, live) {
        (SessionStart::Active(t), true) if old.is_active() => Transition::Continued(t),
        (SessionStart::Active(t), true) => Transition::Started(t),
        (SessionStart::Active(t), false) => Transition::Commit {
            started_at: t,
            seconds: elapsed(t, now),
        },
        (SessionStart::NeverStarted | SessionStart::Committed, _) => Transition::Idle,
    }
}

/// Clear both snapshots after a commit has been persisted.
pub fn mark_committed(old: &mut SessionStart, new: &mut SessionStart) {
    *old = SessionStart::Committed;
    *new = SessionStart::Committed;
}

/// Whole seconds from `started_at` to `now`; zero if the clock went
/// backwards.
pub fn elapsed(started_at: i64, now: i64) -> u64 {
    u64::try_from(now.saturating_sub(started_at)).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
