use crate::commands::{run_bulk, run_check, run_recommend, BulkArgs, CheckArgs, RecommendArgs};
use crate::server;
use campus_placement::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Campus Placement",
    about = "Run the campus placement eligibility service or screen students from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate eligibility and recommendations without the HTTP service
    Eligibility {
        #[command(subcommand)]
        command: EligibilityCommand,
    },
}

#[derive(Subcommand, Debug)]
enum EligibilityCommand {
    /// Check one student document against one job document
    Check(CheckArgs),
    /// Screen a roster CSV against a job and print the CSV report
    Bulk(BulkArgs),
    /// Rank open jobs for a student from a seed file
    Recommend(RecommendArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON file with `jobs` and `students` to load at startup
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Eligibility { command } => match command {
            EligibilityCommand::Check(args) => run_check(args),
            EligibilityCommand::Bulk(args) => run_bulk(args),
            EligibilityCommand::Recommend(args) => run_recommend(args),
        },
    }
}
