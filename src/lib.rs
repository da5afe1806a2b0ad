//! Voice practice-room bot core.
//!
//! Keeps a guild's pool of voice practice rooms sized to demand, mirrors
//! voice presence into write access on the practice text channel and
//! accumulates each member's practice time.

pub mod access;
pub mod config;
pub mod model;
pub mod orchestrator;
pub mod platform;
pub mod rooms;
pub mod session;
pub mod store;
