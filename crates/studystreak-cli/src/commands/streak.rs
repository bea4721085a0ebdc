use clap::Subcommand;
use studystreak_core::storage::{Config, Database};
use studystreak_core::streak::StreakEngine;

#[derive(Subcommand)]
pub enum StreakAction {
    /// Show the stored streak state
    Show { user_id: String },
    /// Record one qualifying action for today
    Record { user_id: String },
}

pub fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut db = Database::open()?;
    let engine = StreakEngine::new(config.dates.anchor);

    match action {
        StreakAction::Show { user_id } => {
            let state = engine.streak_data(&db, &user_id)?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        StreakAction::Record { user_id } => {
            let update = engine.update_streak(&mut db, &user_id)?;
            println!("{}", serde_json::to_string_pretty(&update)?);
            if let Some(milestone) = update.milestone {
                eprintln!("Milestone reached: {milestone}-day streak!");
            }
        }
    }
    Ok(())
}
