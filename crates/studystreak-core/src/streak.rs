//! Daily streak engine.
//!
//! A streak counts consecutive calendar days with at least one qualifying
//! action (typically a completed task). The transition rules are pure over
//! canonical dates; persistence happens through a single conditional
//! profile update per qualifying action.

use serde::{Deserialize, Serialize};

use crate::dates::{format_canonical, DateAnchor};
use crate::error::Result;
use crate::storage::Database;

/// Streak lengths that trigger a one-time celebratory signal.
pub const MILESTONES: [u32; 6] = [3, 7, 14, 30, 50, 100];

/// Per-user streak state, embedded in the profile record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StreakState {
    /// Consecutive qualifying days.
    pub current: u32,
    /// Maximum `current` ever observed; never decreases.
    pub longest: u32,
    /// Canonical date of the last qualifying action.
    pub last_completion_date: Option<String>,
    /// Lifetime qualifying-action counter; never decreases.
    pub total_tasks_completed: u64,
    /// Reserved: freezes are tracked but not yet consumed by any rule.
    pub streak_freezes: u32,
}

/// Outcome of recording one qualifying action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakUpdate {
    pub current: u32,
    pub longest: u32,
    pub total_tasks_completed: u64,
    /// Whether this action advanced the streak (first action of the day).
    pub increased: bool,
    /// Set when the streak just reached a value in [`MILESTONES`].
    pub milestone: Option<u32>,
}

/// Apply one qualifying action to a streak state for the given day.
///
/// Pure transition function: returns the updated state and the update
/// summary without touching storage.
pub fn record_action(state: &StreakState, today: chrono::NaiveDate) -> (StreakState, StreakUpdate) {
    let today_s = format_canonical(today);
    // Canonical dates compare correctly as strings.
    let yesterday_s = format_canonical(today - chrono::Duration::days(1));

    let mut next = state.clone();
    next.total_tasks_completed = state.total_tasks_completed.saturating_add(1);

    let increased = match state.last_completion_date.as_deref() {
        // Already recorded today (or a later date, if the clock moved
        // backward): count the action, leave the streak alone.
        Some(last) if last >= today_s.as_str() => false,
        Some(last) if last == yesterday_s => {
            next.current = state.current.saturating_add(1);
            next.last_completion_date = Some(today_s);
            true
        }
        // Gap of two or more days, or first-ever action.
        _ => {
            next.current = 1;
            next.last_completion_date = Some(today_s);
            true
        }
    };

    if next.current > next.longest {
        next.longest = next.current;
    }

    let milestone = if increased && MILESTONES.contains(&next.current) {
        Some(next.current)
    } else {
        None
    };

    let update = StreakUpdate {
        current: next.current,
        longest: next.longest,
        total_tasks_completed: next.total_tasks_completed,
        increased,
        milestone,
    };
    (next, update)
}

/// Streak engine bound to a date anchor.
pub struct StreakEngine {
    anchor: DateAnchor,
}

impl StreakEngine {
    /// Create an engine using the given anchor for "today".
    pub fn new(anchor: DateAnchor) -> Self {
        Self { anchor }
    }

    /// Record one qualifying action for the user, persisting the updated
    /// state atomically.
    ///
    /// # Errors
    /// Returns `ProfileNotFound` if no profile exists for `user_id`, or a
    /// database error if the conditional write fails.
    pub fn update_streak(&self, db: &mut Database, user_id: &str) -> Result<StreakUpdate> {
        self.update_streak_at(db, user_id, self.anchor.today())
    }

    /// Clock-injected variant of [`update_streak`](Self::update_streak).
    pub fn update_streak_at(
        &self,
        db: &mut Database,
        user_id: &str,
        today: chrono::NaiveDate,
    ) -> Result<StreakUpdate> {
        db.update_profile(user_id, |profile| {
            let (next, update) = record_action(&profile.streak, today);
            profile.streak = next;
            update
        })
    }

    /// Read the stored streak state without modifying it.
    ///
    /// # Errors
    /// Returns `ProfileNotFound` if no profile exists for `user_id`.
    pub fn streak_data(&self, db: &Database, user_id: &str) -> Result<StreakState> {
        Ok(db.find_profile(user_id)?.streak)
    }
}

impl Default for StreakEngine {
    fn default() -> Self {
        Self::new(DateAnchor::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn state(current: u32, longest: u32, last: Option<&str>, total: u64) -> StreakState {
        StreakState {
            current,
            longest,
            last_completion_date: last.map(str::to_string),
            total_tasks_completed: total,
            streak_freezes: 0,
        }
    }

    #[test]
    fn first_ever_action_starts_streak() {
        let (next, update) = record_action(&StreakState::default(), day(2025, 6, 10));
        assert_eq!(next.current, 1);
        assert_eq!(next.longest, 1);
        assert_eq!(next.last_completion_date.as_deref(), Some("2025-06-10"));
        assert_eq!(update.total_tasks_completed, 1);
        assert!(update.increased);
        assert_eq!(update.milestone, None);
    }

    #[test]
    fn second_action_same_day_only_counts_tasks() {
        let s = state(4, 9, Some("2025-06-10"), 20);
        let (next, update) = record_action(&s, day(2025, 6, 10));
        assert_eq!(next.current, 4);
        assert_eq!(next.longest, 9);
        assert_eq!(next.total_tasks_completed, 21);
        assert!(!update.increased);
        assert_eq!(update.milestone, None);
    }

    #[test]
    fn action_after_yesterday_extends_streak() {
        let s = state(4, 4, Some("2025-06-09"), 20);
        let (next, update) = record_action(&s, day(2025, 6, 10));
        assert_eq!(next.current, 5);
        assert_eq!(next.longest, 5);
        assert_eq!(next.last_completion_date.as_deref(), Some("2025-06-10"));
        assert!(update.increased);
    }

    #[test]
    fn longest_is_preserved_when_current_is_behind() {
        let s = state(2, 30, Some("2025-06-09"), 50);
        let (next, _) = record_action(&s, day(2025, 6, 10));
        assert_eq!(next.current, 3);
        assert_eq!(next.longest, 30);
    }

    #[test]
    fn gap_resets_streak_to_one() {
        let s = state(15, 15, Some("2025-06-01"), 80);
        let (next, update) = record_action(&s, day(2025, 6, 10));
        assert_eq!(next.current, 1);
        assert_eq!(next.longest, 15);
        assert!(update.increased);
        assert_eq!(update.milestone, None);
    }

    #[test]
    fn milestone_reported_exactly_on_threshold() {
        let s = state(2, 10, Some("2025-06-09"), 12);
        let (_, update) = record_action(&s, day(2025, 6, 10));
        assert_eq!(update.milestone, Some(3));

        // Next day: 4 is not a milestone.
        let s = state(3, 10, Some("2025-06-10"), 13);
        let (_, update) = record_action(&s, day(2025, 6, 11));
        assert_eq!(update.milestone, None);
    }

    #[test]
    fn milestone_never_reported_without_increase() {
        // Streak already at 7 today: repeating the action must not
        // re-announce the milestone.
        let s = state(7, 7, Some("2025-06-10"), 30);
        let (_, update) = record_action(&s, day(2025, 6, 10));
        assert!(!update.increased);
        assert_eq!(update.milestone, None);
    }

    #[test]
    fn streak_extends_across_month_boundary() {
        let s = state(5, 5, Some("2025-05-31"), 10);
        let (next, update) = record_action(&s, day(2025, 6, 1));
        assert_eq!(next.current, 6);
        assert!(update.increased);
    }

    #[test]
    fn backward_clock_does_not_rewind_last_completion() {
        let s = state(5, 5, Some("2025-06-10"), 10);
        let (next, update) = record_action(&s, day(2025, 6, 9));
        assert_eq!(next.last_completion_date.as_deref(), Some("2025-06-10"));
        assert_eq!(next.current, 5);
        assert!(!update.increased);
    }

    proptest! {
        /// current <= longest holds after any sequence of actions, and
        /// the lifetime counters never decrease.
        #[test]
        fn invariants_hold_under_arbitrary_day_sequences(
            steps in prop::collection::vec(0i64..4, 1..60)
        ) {
            let mut state = StreakState::default();
            let mut today = day(2025, 1, 1);
            let mut prev_total = 0u64;
            let mut prev_longest = 0u32;

            for gap in steps {
                today += chrono::Duration::days(gap);
                let (next, update) = record_action(&state, today);

                prop_assert!(next.current <= next.longest);
                prop_assert!(next.total_tasks_completed == prev_total + 1);
                prop_assert!(next.longest >= prev_longest);
                prop_assert_eq!(update.current, next.current);

                prev_total = next.total_tasks_completed;
                prev_longest = next.longest;
                state = next;
            }
        }
    }
}
