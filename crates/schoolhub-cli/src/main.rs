//! schoolhub CLI: command-line front end for the school-management API.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

use commands::notifications::NotificationAction;
use commands::prefs::PrefsAction;
use commands::progress::ProgressTarget;
use commands::school::SchoolAction;

#[derive(Parser)]
#[command(
    name = "schoolhub",
    version,
    about = "Take exercises, follow progress and read school notifications"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter schoolhub.toml
    Init,

    /// Render an exercise JSON file offline and check it for mistakes
    Preview {
        /// Path to the exercise JSON
        #[arg(long)]
        file: PathBuf,
    },

    /// Answer and submit an exercise
    Take {
        /// Exercise id
        #[arg(long)]
        exercise: String,

        /// Student id
        #[arg(long)]
        student: String,

        /// Multiple-choice answer as QUESTION=OPTION (e.g. "1=b"), 1-based question
        #[arg(long = "answer")]
        answers: Vec<String>,

        /// Blank value as QUESTION.BLANK=TEXT (e.g. "2.1=chat"), 1-based
        #[arg(long = "blank")]
        blanks: Vec<String>,
    },

    /// Show the corrections for a past attempt
    Review {
        /// Exercise id
        #[arg(long)]
        exercise: String,

        /// Student id
        #[arg(long)]
        student: String,

        /// Attempt number (default: latest)
        #[arg(long)]
        attempt: Option<u32>,
    },

    /// List a student's attempts across a class's exercises
    Attempts {
        /// Student id
        #[arg(long)]
        student: String,

        /// Restrict to one class
        #[arg(long)]
        class: Option<String>,
    },

    /// Progress dashboards
    Progress {
        #[command(subcommand)]
        target: ProgressTarget,
    },

    /// Read, send and watch notifications
    Notifications {
        #[command(subcommand)]
        action: NotificationAction,
    },

    /// School administration
    School {
        #[command(subcommand)]
        action: SchoolAction,
    },

    /// Local display preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "schoolhub=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Preview { file } => commands::preview::execute(&file),
        Commands::Take {
            exercise,
            student,
            answers,
            blanks,
        } => commands::take::execute(config, &exercise, &student, &answers, &blanks).await,
        Commands::Review {
            exercise,
            student,
            attempt,
        } => commands::review::execute(config, &exercise, &student, attempt).await,
        Commands::Attempts { student, class } => {
            commands::attempts::execute(config, &student, class.as_deref()).await
        }
        Commands::Progress { target } => commands::progress::execute(config, target).await,
        Commands::Notifications { action } => {
            commands::notifications::execute(config, action).await
        }
        Commands::School { action } => commands::school::execute(config, action).await,
        Commands::Prefs { action } => commands::prefs::execute(action),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
