use crate::commands::{run_context, run_predict, run_table, ContextArgs, PredictArgs, TableArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use edu_insight::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "EduInsight",
    about = "Score student cohorts into learner personas and dropout-risk tiers",
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
    /// Score a student CSV and report personas, risk and rejected rows
    Predict(PredictArgs),
    /// Print one page of the filtered, sorted student table
    Table(TableArgs),
    /// Print the dataset briefing handed to the assistant
    Context(ContextArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Predict(args) => run_predict(args),
        Command::Table(args) => run_table(args),
        Command::Context(args) => run_context(args),
    }
}
