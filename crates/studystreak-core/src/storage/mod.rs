mod config;
pub mod database;

pub use config::{Config, DatesConfig, GamificationConfig, PollerSection};
pub use database::{Database, UserProfile};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/studystreak[-dev]/` based on STUDYSTREAK_ENV.
///
/// Set STUDYSTREAK_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYSTREAK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studystreak-dev")
    } else {
        base_dir.join("studystreak")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
