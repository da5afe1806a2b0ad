//! Cross-event storage of each member's session start.
//!
//! [`SessionBook`] is the only piece of member state that outlives a single
//! event.  It is a type alias for `Arc<Mutex<SessionTable>>`, cheap to clone
//! and safe to share across tasks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::model::{GuildId, MemberId, SessionStart};

/// Running sessions keyed by guild and member.
///
/// Only active sessions are stored; a committed session folds back to
/// "never started" once the event that committed it has been processed.
#[derive(Debug, Default)]
pub struct SessionTable {
    active: HashMap<(GuildId, MemberId), i64>,
}

impl SessionTable {
    pub fn get(&self, guild: GuildId, member: MemberId) -> SessionStart {
        self.active
            .get(&(guild, member))
            .map_or(SessionStart::NeverStarted, |t| SessionStart::Active(*t))
    }

    pub fn store(&mut self, guild: GuildId, member: MemberId, session: SessionStart) {
        match session {
            SessionStart::Active(t) => {
                self.active.insert((guild, member), t);
            }
            SessionStart::NeverStarted | SessionStart::Committed => {
                self.active.remove(&(guild, member));
            }
        }
    }

    /// Number of members currently practicing.
    pub fn live_count(&self) -> usize {
        self.active.len()
    }
}

/// Thread-safe handle to a [`SessionTable`].
///
/// Lock for a short critical section; do **not** hold the lock across
/// `.await` points.
pub type SessionBook = Arc<Mutex<SessionTable>>;

/// Construct an empty [`SessionBook`].
pub fn new_session_book() -> SessionBook {
    Arc::new(Mutex::new(SessionTable::default()))
}
