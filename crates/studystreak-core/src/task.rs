//! Task model and reminder-time calculation.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::{parse_canonical, parse_clock, DateAnchor};
use crate::error::InvalidInput;

/// Wall-clock time assumed for a due date with no explicit due time.
pub fn default_due_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).expect("09:00 is a valid time")
}

/// Reminder offset relative to the due date/time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    /// One hour before the due instant.
    #[serde(rename = "1h")]
    OneHour,
    /// Two hours before the due instant.
    #[serde(rename = "2h")]
    TwoHours,
    /// One calendar day before the due instant.
    #[serde(rename = "1d")]
    OneDay,
    /// Two calendar days before the due instant.
    #[serde(rename = "2d")]
    TwoDays,
    /// An absolute instant chosen by the user; the due date is ignored.
    Custom,
}

impl ReminderKind {
    /// Parse a reminder tag. Unknown tags yield `None`, which callers
    /// treat as "no reminder".
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "1h" => Some(Self::OneHour),
            "2h" => Some(Self::TwoHours),
            "1d" => Some(Self::OneDay),
            "2d" => Some(Self::TwoDays),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::TwoHours => "2h",
            Self::OneDay => "1d",
            Self::TwoDays => "2d",
            Self::Custom => "custom",
        }
    }
}

/// A task, reduced to the fields the streak and reminder engines need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// Canonical `YYYY-MM-DD` due date.
    pub due_date: Option<String>,
    /// `HH:MM` 24-hour due time; defaults to 09:00 when absent.
    pub due_time: Option<String>,
    /// Raw reminder tag (`1h`, `2h`, `1d`, `2d`, `custom`). Stored
    /// verbatim so unknown tags degrade to "no reminder" rather than
    /// failing the row.
    pub reminder: Option<String>,
    /// Absolute reminder instant, required when `reminder = custom`.
    pub custom_reminder_at: Option<DateTime<Utc>>,
    pub completed: bool,
    /// Durable delivery marker set when a reminder is claimed for
    /// dispatch. A non-null marker means the reminder fired.
    pub reminder_fired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create an incomplete task with a fresh id and no due date.
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: title.into(),
            due_date: None,
            due_time: None,
            reminder: None,
            custom_reminder_at: None,
            completed: false,
            reminder_fired_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn with_due_time(mut self, due_time: impl Into<String>) -> Self {
        self.due_time = Some(due_time.into());
        self
    }

    pub fn with_reminder(mut self, kind: ReminderKind) -> Self {
        self.reminder = Some(kind.as_tag().to_string());
        self
    }

    pub fn with_custom_reminder(mut self, at: DateTime<Utc>) -> Self {
        self.reminder = Some(ReminderKind::Custom.as_tag().to_string());
        self.custom_reminder_at = Some(at);
        self
    }
}

/// Compute the absolute instant a task's reminder should fire.
///
/// Returns `Ok(None)` when no reminder is possible: missing due date or
/// reminder tag, an unrecognized tag, or `custom` without an instant.
/// The returned instant may be in the past; callers decide whether a
/// late reminder is still worth delivering.
///
/// # Errors
/// Returns `InvalidInput` when the due date or due time is malformed.
pub fn reminder_fire_time(
    task: &Task,
    anchor: DateAnchor,
    default_time: NaiveTime,
) -> Result<Option<DateTime<Utc>>, InvalidInput> {
    let (Some(due_date), Some(reminder)) = (task.due_date.as_deref(), task.reminder.as_deref())
    else {
        return Ok(None);
    };
    let Some(kind) = ReminderKind::from_tag(reminder) else {
        return Ok(None);
    };

    // Custom reminders ignore the due date entirely.
    if kind == ReminderKind::Custom {
        return Ok(task.custom_reminder_at);
    }

    let date = parse_canonical(due_date)?;
    let time = match task.due_time.as_deref() {
        Some(t) => parse_clock(t)?,
        None => default_time,
    };

    // Offsets apply to the naive wall-clock datetime, so a "1d" reminder
    // lands on the same wall-clock time one calendar day earlier even
    // across DST transitions.
    let due = date.and_time(time);
    let fire = match kind {
        ReminderKind::OneHour => due - Duration::hours(1),
        ReminderKind::TwoHours => due - Duration::hours(2),
        ReminderKind::OneDay => due - Duration::days(1),
        ReminderKind::TwoDays => due - Duration::days(2),
        ReminderKind::Custom => unreachable!("handled above"),
    };

    Ok(Some(anchor.to_utc(fire)))
}
