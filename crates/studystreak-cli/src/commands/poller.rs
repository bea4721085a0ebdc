use chrono::Utc;
use clap::Subcommand;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use studystreak_core::reminders::{LogDispatcher, ReminderPoller};
use studystreak_core::storage::{Config, Database};

#[derive(Subcommand)]
pub enum PollerAction {
    /// Run one tick now and print the summary
    Tick,
    /// Run the poller until interrupted
    Run,
}

pub fn run(action: PollerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut poller = ReminderPoller::with_config(
        LogDispatcher,
        config.poller_config(),
        config.dates.anchor,
    )
    .with_default_due_time(config.default_due_time());

    match action {
        PollerAction::Tick => {
            let summary = poller.tick(&db, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        PollerAction::Run => {
            let interval = poller.config().interval_minutes;
            eprintln!("poller running every {interval} minutes; Ctrl-C to stop");
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async {
                let shutdown = Arc::new(AtomicBool::new(false));
                tokio::select! {
                    result = poller.run(&db, shutdown) => result.map_err(Into::into),
                    _ = tokio::signal::ctrl_c() => {
                        eprintln!("stopping");
                        Ok::<(), Box<dyn std::error::Error>>(())
                    }
                }
            })?;
        }
    }
    Ok(())
}
