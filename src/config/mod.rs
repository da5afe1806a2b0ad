//! Configuration module.
//!
//! Provides `BotConfig` (top-level settings), sub-configs for room handling,
//! storage and logging, `AppPaths` for cross-platform directories, and TOML
//! persistence via `BotConfig::load` / `BotConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{BotConfig, LoggingConfig, RoomsConfig, StorageConfig};
