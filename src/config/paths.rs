//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\practice-rooms\
//!   macOS:   ~/Library/Application Support/practice-rooms/
//!   Linux:   ~/.config/practice-rooms/
//!
//! Data dir (guild store, practice log):
//!   Windows: %LOCALAPPDATA%\practice-rooms\
//!   macOS:   ~/Library/Application Support/practice-rooms/
//!   Linux:   ~/.local/share/practice-rooms/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory for the JSON stores.
    pub data_dir: PathBuf,
    /// Full path to `guilds.json`.
    pub guilds_file: PathBuf,
    /// Full path to `practice-log.json`.
    pub practice_log_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "practice-rooms";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self {
            settings_file: config_dir.join("settings.toml"),
            guilds_file: data_dir.join("guilds.json"),
            practice_log_file: data_dir.join("practice-log.json"),
            config_dir,
            data_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
