//! TOML-based application configuration.
//!
//! Stores the date anchor, poller cadence, and optional level-threshold
//! override at `~/.config/studystreak/config.toml`.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::dates::{parse_clock, DateAnchor};
use crate::error::{ConfigError, Result};
use crate::gamification::LevelThresholds;
use crate::reminders::PollerConfig;

/// Date handling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatesConfig {
    /// Timezone anchor used for "today" and due-time conversion.
    #[serde(default)]
    pub anchor: DateAnchor,
    /// Wall-clock time assumed when a due date has no due time.
    #[serde(default = "default_reminder_time")]
    pub default_due_time: String,
}

/// Reminder poller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerSection {
    /// Tick period in minutes; also the width of the firing window.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: i64,
    /// How far past its fire time a reminder may still be delivered
    /// (covers restarts that span a firing window).
    #[serde(default = "default_late_grace_minutes")]
    pub late_grace_minutes: i64,
}

/// Gamification configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GamificationConfig {
    /// Override for the level threshold table. Must be strictly
    /// increasing; validated on load.
    #[serde(default)]
    pub level_thresholds: Option<Vec<u64>>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/studystreak/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub dates: DatesConfig,
    #[serde(default)]
    pub poller: PollerSection,
    #[serde(default)]
    pub gamification: GamificationConfig,
}

fn default_reminder_time() -> String {
    "09:00".to_string()
}
fn default_interval_minutes() -> i64 {
    5
}
fn default_late_grace_minutes() -> i64 {
    60
}

impl Default for DatesConfig {
    fn default() -> Self {
        Self {
            anchor: DateAnchor::default(),
            default_due_time: default_reminder_time(),
        }
    }
}

impl Default for PollerSection {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            late_grace_minutes: default_late_grace_minutes(),
        }
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed,
    /// fails validation, or the default cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.clone(),
                        message: e.to_string(),
                    })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poller.interval_minutes <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "poller.interval_minutes".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.poller.late_grace_minutes < 0 {
            return Err(ConfigError::InvalidValue {
                key: "poller.late_grace_minutes".to_string(),
                message: "must not be negative".to_string(),
            });
        }
        if parse_clock(&self.dates.default_due_time).is_err() {
            return Err(ConfigError::InvalidValue {
                key: "dates.default_due_time".to_string(),
                message: format!("'{}' is not HH:MM", self.dates.default_due_time),
            });
        }
        // Threshold monotonicity is a hard invariant: a broken table
        // would make higher levels silently unreachable.
        self.level_thresholds()?;
        Ok(())
    }

    /// The validated threshold table (override or default).
    pub fn level_thresholds(&self) -> Result<LevelThresholds, ConfigError> {
        match &self.gamification.level_thresholds {
            Some(t) => LevelThresholds::new(t.clone()),
            None => Ok(LevelThresholds::default()),
        }
    }

    /// The parsed default due time.
    pub fn default_due_time(&self) -> NaiveTime {
        parse_clock(&self.dates.default_due_time)
            .unwrap_or_else(|_| crate::task::default_due_time())
    }

    /// Poller configuration derived from this config.
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval_minutes: self.poller.interval_minutes,
            late_grace_minutes: self.poller.late_grace_minutes,
        }
    }
}
