//! Core error types for studystreak-core.
//!
//! This module defines the error hierarchy using thiserror. Engine-level
//! failures (missing records, malformed input) propagate to the caller;
//! per-task dispatch failures inside the poller are logged and swallowed.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studystreak-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// No profile record exists for the user
    #[error("no profile found for user '{0}'")]
    ProfileNotFound(String),

    /// No task record exists with the given id
    #[error("no task found with id '{0}'")]
    TaskNotFound(String),

    /// Malformed date/time input
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// Database-related errors
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Notification delivery errors
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Malformed user-supplied date/time strings.
#[derive(Error, Debug)]
pub enum InvalidInput {
    /// Not a canonical `YYYY-MM-DD` date
    #[error("'{0}' is not a valid YYYY-MM-DD date")]
    BadDate(String),

    /// Not a `HH:MM` 24-hour clock time
    #[error("'{0}' is not a valid HH:MM time")]
    BadTime(String),

    /// Not an RFC 3339 datetime
    #[error("'{0}' is not a valid RFC 3339 datetime")]
    BadInstant(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("database migration failed: {0}")]
    MigrationFailed(String),

    /// Conditional update lost against a concurrent writer
    #[error("write conflict updating profile '{user_id}': stale version {version}")]
    WriteConflict { user_id: String, version: i64 },

    /// Database is locked
    #[error("database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Level thresholds must be strictly increasing
    #[error("level thresholds must be strictly increasing (violation at index {index})")]
    ThresholdsNotIncreasing { index: usize },
}

/// Notification delivery errors.
///
/// These are transient by design: the poller logs them per task and moves
/// on to the next task without retrying.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Provider rejected or failed the send
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Provider did not respond in time
    #[error("delivery timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
