pub mod config;
pub mod points;
pub mod poller;
pub mod profile;
pub mod streak;
pub mod task;
