use clap::Subcommand;
use studystreak_core::gamification::PointsEngine;
use studystreak_core::storage::{Config, Database};

#[derive(Subcommand)]
pub enum PointsAction {
    /// Award points for an activity
    Award {
        user_id: String,
        points: u64,
        /// Activity tag: habit, feature, or goal. Anything else counts
        /// points only.
        #[arg(long, default_value = "habit")]
        activity: String,
    },
    /// Show points, level, and activity counters
    Show { user_id: String },
}

pub fn run(action: PointsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut db = Database::open()?;
    let engine = PointsEngine::with_thresholds(config.level_thresholds()?);

    match action {
        PointsAction::Award {
            user_id,
            points,
            activity,
        } => {
            let result = engine.award_points(&mut db, &user_id, points, &activity)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if result.leveled_up {
                eprintln!("Level up! Now level {}", result.level);
            }
        }
        PointsAction::Show { user_id } => {
            let profile = db.find_profile(&user_id)?;
            println!("{}", serde_json::to_string_pretty(&profile.game)?);
        }
    }
    Ok(())
}
