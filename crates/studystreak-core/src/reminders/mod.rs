//! Reminder dispatch and polling.

pub mod dispatch;
pub mod poller;

pub use dispatch::{DeliveryReceipt, LogDispatcher, Notification, NotificationDispatcher};
pub use poller::{PollerConfig, PollerState, ReminderPoller, TickSummary};
