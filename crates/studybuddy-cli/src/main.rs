//! studybuddy CLI: interactive quizzes and session reports.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "studybuddy", version, about = "Quiz yourself and track your progress")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take quizzes in an interactive study session
    Quiz(commands::quiz::QuizArgs),

    /// Render PDF reports from a saved session
    Report {
        /// Session JSON written by `studybuddy quiz`
        #[arg(long)]
        session: PathBuf,

        /// Earlier session JSON to compare against
        #[arg(long)]
        previous: Option<PathBuf>,

        /// Output directory
        #[arg(long, default_value = "./studybuddy-sessions")]
        output: PathBuf,

        /// Also print the session report as a data URL
        #[arg(long)]
        data_url: bool,
    },

    /// Validate question set files
    Validate {
        /// Path to a question set file or directory
        #[arg(long)]
        questions: PathBuf,
    },

    /// Create starter config and example question set
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("studybuddy=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Quiz(args) => commands::quiz::execute(args).await,
        Commands::Report {
            session,
            previous,
            output,
            data_url,
        } => commands::report::execute(session, previous, output, data_url),
        Commands::Validate { questions } => commands::validate::execute(questions),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
