//! SQLite-backed profile and task storage.
//!
//! One row per user profile carrying the embedded streak and gamification
//! state, plus a tasks table carrying reminder fields inline. The handle
//! owns its connection; there is no process-wide connection state.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, DatabaseError, Result};
use crate::gamification::GamificationState;
use crate::streak::StreakState;
use crate::task::Task;

/// A user profile record: streak state and gamification state embedded in
/// one row, guarded by a version counter for conditional writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub streak: StreakState,
    pub game: GamificationState,
    /// Incremented on every write; conditional updates check it.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// SQLite database for profiles and tasks.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/studystreak/studystreak.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = super::data_dir()?.join("studystreak.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        // Brief writer contention (e.g. CLI invocations racing) waits
        // instead of surfacing SQLITE_BUSY.
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and dry runs).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS profiles (
                    user_id               TEXT PRIMARY KEY,
                    streak_current        INTEGER NOT NULL DEFAULT 0,
                    streak_longest        INTEGER NOT NULL DEFAULT 0,
                    last_completion_date  TEXT,
                    total_tasks_completed INTEGER NOT NULL DEFAULT 0,
                    streak_freezes        INTEGER NOT NULL DEFAULT 0,
                    points                INTEGER NOT NULL DEFAULT 0,
                    level                 INTEGER NOT NULL DEFAULT 1,
                    habits_completed      INTEGER NOT NULL DEFAULT 0,
                    features_used         INTEGER NOT NULL DEFAULT 0,
                    goals_completed       INTEGER NOT NULL DEFAULT 0,
                    version               INTEGER NOT NULL DEFAULT 0,
                    created_at            TEXT NOT NULL,
                    updated_at            TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS tasks (
                    id                 TEXT PRIMARY KEY,
                    user_id            TEXT NOT NULL,
                    title              TEXT NOT NULL DEFAULT '',
                    due_date           TEXT,
                    due_time           TEXT,
                    reminder           TEXT,
                    custom_reminder_at TEXT,
                    completed          INTEGER NOT NULL DEFAULT 0,
                    reminder_fired_at  TEXT,
                    created_at         TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_tasks_completed ON tasks(completed);
                CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // ── Profiles ─────────────────────────────────────────────────────

    /// Create a profile with default-zero state, or return the existing
    /// one if the user is already registered.
    pub fn create_profile(&self, user_id: &str) -> Result<UserProfile> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT OR IGNORE INTO profiles (user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?2)",
                params![user_id, now],
            )
            .map_err(DatabaseError::from)?;
        self.find_profile(user_id)
    }

    /// Look up a profile.
    ///
    /// # Errors
    /// Returns `ProfileNotFound` if the user has no record.
    pub fn find_profile(&self, user_id: &str) -> Result<UserProfile> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT user_id, streak_current, streak_longest, last_completion_date,
                        total_tasks_completed, streak_freezes, points, level,
                        habits_completed, features_used, goals_completed,
                        version, created_at, updated_at
                 FROM profiles WHERE user_id = ?1",
            )
            .map_err(DatabaseError::from)?;
        stmt.query_row(params![user_id], profile_from_row)
            .optional()
            .map_err(DatabaseError::from)?
            .ok_or_else(|| CoreError::ProfileNotFound(user_id.to_string()))
    }

    /// Read-modify-write a profile inside a transaction with a version
    /// compare-and-swap, so a concurrent writer cannot be silently
    /// overwritten from a stale read.
    ///
    /// # Errors
    /// Returns `ProfileNotFound` if the user has no record, or
    /// `WriteConflict` if the version moved under us.
    pub fn update_profile<F, T>(&mut self, user_id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut UserProfile) -> T,
    {
        let tx = self.conn.transaction().map_err(DatabaseError::from)?;

        let mut profile = {
            let mut stmt = tx
                .prepare(
                    "SELECT user_id, streak_current, streak_longest, last_completion_date,
                            total_tasks_completed, streak_freezes, points, level,
                            habits_completed, features_used, goals_completed,
                            version, created_at, updated_at
                     FROM profiles WHERE user_id = ?1",
                )
                .map_err(DatabaseError::from)?;
            stmt.query_row(params![user_id], profile_from_row)
                .optional()
                .map_err(DatabaseError::from)?
                .ok_or_else(|| CoreError::ProfileNotFound(user_id.to_string()))?
        };

        let old_version = profile.version;
        let out = f(&mut profile);

        let changed = tx
            .execute(
                "UPDATE profiles SET
                    streak_current = ?1, streak_longest = ?2, last_completion_date = ?3,
                    total_tasks_completed = ?4, streak_freezes = ?5,
                    points = ?6, level = ?7,
                    habits_completed = ?8, features_used = ?9, goals_completed = ?10,
                    version = ?11, updated_at = ?12
                 WHERE user_id = ?13 AND version = ?14",
                params![
                    profile.streak.current,
                    profile.streak.longest,
                    profile.streak.last_completion_date,
                    profile.streak.total_tasks_completed as i64,
                    profile.streak.streak_freezes,
                    profile.game.points as i64,
                    profile.game.level,
                    profile.game.habits_completed,
                    profile.game.features_used,
                    profile.game.goals_completed,
                    old_version + 1,
                    Utc::now().to_rfc3339(),
                    user_id,
                    old_version,
                ],
            )
            .map_err(DatabaseError::from)?;

        if changed == 0 {
            return Err(DatabaseError::WriteConflict {
                user_id: user_id.to_string(),
                version: old_version,
            }
            .into());
        }

        tx.commit().map_err(DatabaseError::from)?;
        Ok(out)
    }

    // ── Tasks ────────────────────────────────────────────────────────

    /// Insert a task.
    pub fn insert_task(&self, task: &Task) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO tasks (id, user_id, title, due_date, due_time, reminder,
                                    custom_reminder_at, completed, reminder_fired_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    task.id,
                    task.user_id,
                    task.title,
                    task.due_date,
                    task.due_time,
                    task.reminder,
                    task.custom_reminder_at.map(|t| t.to_rfc3339()),
                    task.completed,
                    task.reminder_fired_at.map(|t| t.to_rfc3339()),
                    task.created_at.to_rfc3339(),
                ],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    /// Look up a task by id.
    ///
    /// # Errors
    /// Returns `TaskNotFound` if no task has the given id.
    pub fn find_task(&self, task_id: &str) -> Result<Task> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"
            ))
            .map_err(DatabaseError::from)?;
        stmt.query_row(params![task_id], task_from_row)
            .optional()
            .map_err(DatabaseError::from)?
            .ok_or_else(|| CoreError::TaskNotFound(task_id.to_string()))
    }

    /// All tasks for a user, newest first.
    pub fn tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 ORDER BY created_at DESC"
            ))
            .map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map(params![user_id], task_from_row)
            .map_err(DatabaseError::from)?;
        collect_tasks(rows)
    }

    /// All incomplete tasks across users: the poller's scan set.
    pub fn incomplete_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE completed = 0 ORDER BY created_at"
            ))
            .map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map([], task_from_row)
            .map_err(DatabaseError::from)?;
        collect_tasks(rows)
    }

    /// Mark a task completed.
    ///
    /// # Errors
    /// Returns `TaskNotFound` if no task has the given id.
    pub fn complete_task(&self, task_id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE tasks SET completed = 1 WHERE id = ?1",
                params![task_id],
            )
            .map_err(DatabaseError::from)?;
        if changed == 0 {
            return Err(CoreError::TaskNotFound(task_id.to_string()));
        }
        Ok(())
    }

    /// Atomically claim a task's reminder for dispatch.
    ///
    /// The claim succeeds at most once per task: the conditional update
    /// only matches while `reminder_fired_at` is null and the task is
    /// still incomplete. Returns `false` when another tick (or an earlier
    /// run of this process) already claimed it.
    pub fn claim_reminder(&self, task_id: &str, fired_at: DateTime<Utc>) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "UPDATE tasks SET reminder_fired_at = ?1
                 WHERE id = ?2 AND completed = 0 AND reminder_fired_at IS NULL",
                params![fired_at.to_rfc3339(), task_id],
            )
            .map_err(DatabaseError::from)?;
        Ok(changed == 1)
    }
}

const TASK_COLUMNS: &str = "id, user_id, title, due_date, due_time, reminder, \
                            custom_reminder_at, completed, reminder_fired_at, created_at";

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        user_id: row.get(0)?,
        streak: StreakState {
            current: row.get(1)?,
            longest: row.get(2)?,
            last_completion_date: row.get(3)?,
            total_tasks_completed: row.get::<_, i64>(4)? as u64,
            streak_freezes: row.get(5)?,
        },
        game: GamificationState {
            points: row.get::<_, i64>(6)? as u64,
            level: row.get(7)?,
            habits_completed: row.get(8)?,
            features_used: row.get(9)?,
            goals_completed: row.get(10)?,
        },
        version: row.get(11)?,
        created_at: stored_instant(row, 12)?,
        updated_at: stored_instant(row, 13)?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        due_date: row.get(3)?,
        due_time: row.get(4)?,
        reminder: row.get(5)?,
        custom_reminder_at: optional_stored_instant(row, 6)?,
        completed: row.get(7)?,
        reminder_fired_at: optional_stored_instant(row, 8)?,
        created_at: stored_instant(row, 9)?,
    })
}

fn stored_instant(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let value: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_stored_instant(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let value: Option<String> = row.get(idx)?;
    value
        .map(|v| {
            DateTime::parse_from_rfc3339(&v)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
                })
        })
        .transpose()
}

fn collect_tasks(
    rows: rusqlite::MappedRows<'_, impl FnMut(&Row<'_>) -> rusqlite::Result<Task>>,
) -> Result<Vec<Task>> {
    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row.map_err(DatabaseError::from)?);
    }
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::ReminderKind;

    #[test]
    fn create_profile_is_idempotent() {
        let db = Database::open_memory().unwrap();
        let first = db.create_profile("ada").unwrap();
        assert_eq!(first.streak, StreakState::default());
        assert_eq!(first.game.level, 1);

        let again = db.create_profile("ada").unwrap();
        assert_eq!(again.version, first.version);
    }

    #[test]
    fn find_profile_not_found() {
        let db = Database::open_memory().unwrap();
        match db.find_profile("ghost") {
            Err(CoreError::ProfileNotFound(id)) => assert_eq!(id, "ghost"),
            other => panic!("expected ProfileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn update_profile_bumps_version_and_persists() {
        let mut db = Database::open_memory().unwrap();
        db.create_profile("ada").unwrap();

        let out = db
            .update_profile("ada", |p| {
                p.streak.current = 3;
                p.streak.longest = 3;
                p.game.points = 200;
                "done"
            })
            .unwrap();
        assert_eq!(out, "done");

        let profile = db.find_profile("ada").unwrap();
        assert_eq!(profile.streak.current, 3);
        assert_eq!(profile.game.points, 200);
        assert_eq!(profile.version, 1);
    }

    #[test]
    fn update_missing_profile_fails() {
        let mut db = Database::open_memory().unwrap();
        assert!(matches!(
            db.update_profile("ghost", |_| ()),
            Err(CoreError::ProfileNotFound(_))
        ));
    }

    #[test]
    fn task_roundtrip_preserves_reminder_fields() {
        let db = Database::open_memory().unwrap();
        let task = Task::new("ada", "essay")
            .with_due_date("2025-06-10")
            .with_due_time("14:00")
            .with_reminder(ReminderKind::TwoHours);
        db.insert_task(&task).unwrap();

        let loaded = db.find_task(&task.id).unwrap();
        assert_eq!(loaded.due_date.as_deref(), Some("2025-06-10"));
        assert_eq!(loaded.due_time.as_deref(), Some("14:00"));
        assert_eq!(loaded.reminder.as_deref(), Some("2h"));
        assert!(!loaded.completed);
        assert!(loaded.reminder_fired_at.is_none());
    }

    #[test]
    fn incomplete_scan_excludes_completed_tasks() {
        let db = Database::open_memory().unwrap();
        let open = Task::new("ada", "open");
        let done = Task::new("ada", "done");
        db.insert_task(&open).unwrap();
        db.insert_task(&done).unwrap();
        db.complete_task(&done.id).unwrap();

        let scan = db.incomplete_tasks().unwrap();
        assert_eq!(scan.len(), 1);
        assert_eq!(scan[0].id, open.id);
    }

    #[test]
    fn reminder_claim_succeeds_exactly_once() {
        let db = Database::open_memory().unwrap();
        let task = Task::new("ada", "essay");
        db.insert_task(&task).unwrap();

        let now = Utc::now();
        assert!(db.claim_reminder(&task.id, now).unwrap());
        assert!(!db.claim_reminder(&task.id, now).unwrap());

        let loaded = db.find_task(&task.id).unwrap();
        assert!(loaded.reminder_fired_at.is_some());
    }

    #[test]
    fn completed_task_cannot_be_claimed() {
        let db = Database::open_memory().unwrap();
        let task = Task::new("ada", "essay");
        db.insert_task(&task).unwrap();
        db.complete_task(&task.id).unwrap();
        assert!(!db.claim_reminder(&task.id, Utc::now()).unwrap());
    }
}
