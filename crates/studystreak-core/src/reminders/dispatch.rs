//! Notification dispatch interface.
//!
//! Delivery providers (push, email) live outside this crate; the poller
//! only sees the [`NotificationDispatcher`] trait.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::task::Task;

/// A reminder notification ready for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: String,
    pub title: String,
    pub body: String,
    /// Structured payload for the delivery channel (task id, fire time).
    pub data: serde_json::Value,
}

impl Notification {
    /// Build the reminder notification for a task.
    pub fn for_task(task: &Task, fire_time: DateTime<Utc>) -> Self {
        let body = match (task.due_date.as_deref(), task.due_time.as_deref()) {
            (Some(date), Some(time)) => format!("\"{}\" is due {} at {}", task.title, date, time),
            (Some(date), None) => format!("\"{}\" is due {}", task.title, date),
            _ => format!("\"{}\" is due soon", task.title),
        };
        Self {
            user_id: task.user_id.clone(),
            title: "Task reminder".to_string(),
            body,
            data: serde_json::json!({
                "task_id": task.id,
                "fire_time": fire_time.to_rfc3339(),
            }),
        }
    }
}

/// Receipt returned by a successful delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Provider-side message id, when the channel reports one.
    pub provider_id: Option<String>,
    pub delivered_at: DateTime<Utc>,
}

/// Delivery channel for reminder notifications.
///
/// `send` is invoked at most once per task; failures are logged by the
/// poller and never retried.
pub trait NotificationDispatcher {
    fn send(&self, notification: &Notification) -> Result<DeliveryReceipt, DispatchError>;
}

/// Dispatcher that only writes to the log. Used by the CLI and as a
/// stand-in where no delivery provider is wired up.
#[derive(Debug, Default)]
pub struct LogDispatcher;

impl NotificationDispatcher for LogDispatcher {
    fn send(&self, notification: &Notification) -> Result<DeliveryReceipt, DispatchError> {
        log::info!(
            "reminder for {}: {} -- {}",
            notification.user_id,
            notification.title,
            notification.body
        );
        Ok(DeliveryReceipt {
            provider_id: None,
            delivered_at: Utc::now(),
        })
    }
}
