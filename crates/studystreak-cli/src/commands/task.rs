use clap::Subcommand;
use studystreak_core::dates::{parse_canonical, parse_clock, parse_instant};
use studystreak_core::storage::{Config, Database};
use studystreak_core::streak::StreakEngine;
use studystreak_core::task::{reminder_fire_time, ReminderKind, Task};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add {
        user_id: String,
        title: String,
        /// Due date as YYYY-MM-DD
        #[arg(long)]
        due_date: Option<String>,
        /// Due time as HH:MM (defaults to the configured hour)
        #[arg(long)]
        due_time: Option<String>,
        /// Reminder offset: 1h, 2h, 1d, 2d, or custom
        #[arg(long)]
        reminder: Option<String>,
        /// Absolute reminder instant (RFC 3339); required with
        /// --reminder custom
        #[arg(long)]
        custom_at: Option<String>,
    },
    /// List a user's tasks as JSON
    List { user_id: String },
    /// Mark a task completed and record the qualifying action
    Complete { task_id: String },
    /// Show when a task's reminder would fire
    PreviewReminder { task_id: String },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut db = Database::open()?;

    match action {
        TaskAction::Add {
            user_id,
            title,
            due_date,
            due_time,
            reminder,
            custom_at,
        } => {
            let mut task = Task::new(user_id, title);
            if let Some(date) = due_date {
                parse_canonical(&date)?;
                task.due_date = Some(date);
            }
            if let Some(time) = due_time {
                parse_clock(&time)?;
                task.due_time = Some(time);
            }
            if let Some(tag) = reminder {
                // The engine tolerates unknown tags; the CLI rejects them
                // up front so typos don't silently disable the reminder.
                let kind = ReminderKind::from_tag(&tag)
                    .ok_or_else(|| format!("unknown reminder '{tag}' (use 1h, 2h, 1d, 2d, custom)"))?;
                task.reminder = Some(tag);
                if kind == ReminderKind::Custom {
                    let at = custom_at
                        .ok_or("--reminder custom requires --custom-at")?;
                    task.custom_reminder_at = Some(parse_instant(&at)?);
                }
            }
            db.insert_task(&task)?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List { user_id } => {
            let tasks = db.tasks_for_user(&user_id)?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        TaskAction::Complete { task_id } => {
            let task = db.find_task(&task_id)?;
            db.complete_task(&task_id)?;
            let engine = StreakEngine::new(config.dates.anchor);
            let update = engine.update_streak(&mut db, &task.user_id)?;
            println!("{}", serde_json::to_string_pretty(&update)?);
            if let Some(milestone) = update.milestone {
                eprintln!("Milestone reached: {milestone}-day streak!");
            }
        }
        TaskAction::PreviewReminder { task_id } => {
            let task = db.find_task(&task_id)?;
            match reminder_fire_time(&task, config.dates.anchor, config.default_due_time())? {
                Some(at) => println!("{}", at.to_rfc3339()),
                None => println!("null"),
            }
        }
    }
    Ok(())
}
