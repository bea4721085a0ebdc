//! Points and level engine.
//!
//! Points accumulate monotonically; the level is derived from cumulative
//! points via a fixed threshold table. Activity tags bump per-category
//! counters; unrecognized tags leave the counters untouched.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::storage::Database;

/// Highest reachable level.
pub const MAX_LEVEL: u32 = 10;

/// Cumulative points required to reach level N+1, for N = 1..=10.
pub const DEFAULT_THRESHOLDS: [u64; 10] =
    [150, 500, 750, 1000, 2000, 3000, 4000, 5000, 6000, 7000];

/// Per-user gamification state, embedded in the profile record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamificationState {
    /// Cumulative points; never decreases.
    pub points: u64,
    /// Derived level in `[1, MAX_LEVEL]`.
    pub level: u32,
    pub habits_completed: u32,
    pub features_used: u32,
    pub goals_completed: u32,
}

impl Default for GamificationState {
    fn default() -> Self {
        Self {
            points: 0,
            level: 1,
            habits_completed: 0,
            features_used: 0,
            goals_completed: 0,
        }
    }
}

/// Activity category recognized by the points engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Habit,
    Feature,
    Goal,
}

impl ActivityType {
    /// Parse an activity tag. Unknown tags yield `None`; the caller
    /// treats that as "count points only".
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "habit" => Some(Self::Habit),
            "feature" => Some(Self::Feature),
            "goal" => Some(Self::Goal),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Habit => "habit",
            Self::Feature => "feature",
            Self::Goal => "goal",
        }
    }
}

/// Validated level threshold table.
///
/// The level scan stops at the first unmet threshold, so a non-monotonic
/// table would silently make higher levels unreachable. Construction
/// rejects any table that is not strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelThresholds(Vec<u64>);

impl LevelThresholds {
    /// Build a threshold table, enforcing strict monotonicity.
    ///
    /// # Errors
    /// Returns `ThresholdsNotIncreasing` naming the first offending index.
    pub fn new(thresholds: Vec<u64>) -> Result<Self, ConfigError> {
        for (i, pair) in thresholds.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(ConfigError::ThresholdsNotIncreasing { index: i + 1 });
            }
        }
        Ok(Self(thresholds))
    }

    /// Derive the level for a cumulative point total.
    ///
    /// Scans thresholds in order and stops at the first unmet one; the
    /// result is clamped to [`MAX_LEVEL`].
    pub fn calculate_level(&self, points: u64) -> u32 {
        let mut level = 1u32;
        for (i, &threshold) in self.0.iter().enumerate() {
            if points >= threshold {
                level = i as u32 + 2;
            } else {
                break;
            }
        }
        level.min(MAX_LEVEL)
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLDS.to_vec())
    }
}

/// Result of one points award.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardResult {
    /// New cumulative point total.
    pub points: u64,
    /// New derived level.
    pub level: u32,
    /// Whether this award crossed a level threshold.
    pub leveled_up: bool,
}

/// Points engine bound to a threshold table.
pub struct PointsEngine {
    thresholds: LevelThresholds,
}

impl PointsEngine {
    /// Create an engine with the default threshold table.
    pub fn new() -> Self {
        Self {
            thresholds: LevelThresholds::default(),
        }
    }

    /// Create an engine with a custom (validated) threshold table.
    pub fn with_thresholds(thresholds: LevelThresholds) -> Self {
        Self { thresholds }
    }

    /// Award points to a user, bump the matching activity counter, and
    /// re-derive the level. Persists the updated profile atomically.
    ///
    /// # Errors
    /// Returns `ProfileNotFound` if no profile exists for `user_id`.
    pub fn award_points(
        &self,
        db: &mut Database,
        user_id: &str,
        points: u64,
        activity_tag: &str,
    ) -> Result<AwardResult> {
        let activity = ActivityType::from_tag(activity_tag);
        db.update_profile(user_id, |profile| {
            let game = &mut profile.game;
            let previous_level = game.level;
            game.points = game.points.saturating_add(points);
            match activity {
                Some(ActivityType::Habit) => game.habits_completed += 1,
                Some(ActivityType::Feature) => game.features_used += 1,
                Some(ActivityType::Goal) => game.goals_completed += 1,
                None => {}
            }
            game.level = self.thresholds.calculate_level(game.points);
            AwardResult {
                points: game.points,
                level: game.level,
                leveled_up: game.level > previous_level,
            }
        })
    }
}

impl Default for PointsEngine {
    fn default() -> Self {
        Self::new()
    }
}
