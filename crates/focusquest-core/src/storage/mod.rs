mod accounts;
mod config;
pub mod database;
pub mod memory;
pub mod migrations;
mod traits;

pub use config::{Config, NotificationsConfig};
pub use database::SqliteStore;
pub use memory::MemoryStore;
pub use traits::{FocusSession, FocusStats, SessionType, Store, StoreWrite};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the directory holding the database and config file.
///
/// `FOCUSQUEST_DATA_DIR` wins when set. Otherwise `~/.config/focusquest[-dev]/`,
/// with the `-dev` suffix when `FOCUSQUEST_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSQUEST_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSQUEST_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusquest-dev")
            } else {
                base_dir.join("focusquest")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
