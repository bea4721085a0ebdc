//! # Studystreak Core Library
//!
//! This library provides the streak, gamification, and reminder logic for
//! the Studystreak student productivity app. It implements a CLI-first
//! philosophy: all operations are available via a standalone CLI binary,
//! with any GUI or HTTP layer being a thin shell over the same core.
//!
//! ## Architecture
//!
//! - **Streak Engine**: pure day-level transition rules over canonical
//!   `YYYY-MM-DD` dates, anchored to an explicit timezone choice
//! - **Points Engine**: cumulative points with a validated level
//!   threshold table
//! - **Reminder Poller**: a recurring scan over incomplete tasks that
//!   computes fire times and claims a durable delivery marker before
//!   dispatching, so reminders fire at most once
//! - **Storage**: SQLite profile/task store and TOML configuration
//!
//! ## Key Components
//!
//! - [`StreakEngine`]: records qualifying actions and reports milestones
//! - [`PointsEngine`]: awards points and derives levels
//! - [`ReminderPoller`]: periodic reminder dispatch
//! - [`Database`]: profile and task persistence
//! - [`Config`]: application configuration management

pub mod dates;
pub mod error;
pub mod gamification;
pub mod reminders;
pub mod storage;
pub mod streak;
pub mod task;

pub use dates::DateAnchor;
pub use error::{ConfigError, CoreError, DatabaseError, DispatchError, InvalidInput};
pub use gamification::{ActivityType, AwardResult, GamificationState, LevelThresholds, PointsEngine};
pub use reminders::{
    DeliveryReceipt, LogDispatcher, Notification, NotificationDispatcher, PollerConfig,
    PollerState, ReminderPoller, TickSummary,
};
pub use storage::{Config, Database, UserProfile};
pub use streak::{StreakEngine, StreakState, StreakUpdate, MILESTONES};
pub use task::{reminder_fire_time, ReminderKind, Task};
