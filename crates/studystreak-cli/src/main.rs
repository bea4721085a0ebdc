use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "studystreak-cli", version, about = "Studystreak CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Profile management
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Daily streak operations
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Points and levels
    Points {
        #[command(subcommand)]
        action: commands::points::PointsAction,
    },
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Reminder poller control
    Poller {
        #[command(subcommand)]
        action: commands::poller::PollerAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Profile { action } => commands::profile::run(action),
        Commands::Streak { action } => commands::streak::run(action),
        Commands::Points { action } => commands::points::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Poller { action } => commands::poller::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
