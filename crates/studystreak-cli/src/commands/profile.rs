use clap::Subcommand;
use studystreak_core::storage::Database;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Create a profile (no-op if it already exists)
    Create { user_id: String },
    /// Show a profile as JSON
    Show { user_id: String },
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        ProfileAction::Create { user_id } => {
            let profile = db.create_profile(&user_id)?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        ProfileAction::Show { user_id } => {
            let profile = db.find_profile(&user_id)?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
    }
    Ok(())
}
