mod commands;
mod helpers;

use clap::Parser;
use fierro_regress_core::domain::RegressError;
use tracing_subscriber::{EnvFilter, fmt};

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let regress_error = error.as_regress_error();
            eprintln!("{}", regress_error.diagnostic_line());
            if let Some(summary_line) = regress_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            regress_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("fierro-regress".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            init_logging(cli.verbose, cli.quiet);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "fierro-regress",
    version,
    about = "Regression harness for the Fierro explicit solver"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Run the solver on each scenario and compare against reference results
    Run(commands::RunArgs),
    /// Compare one field between two result files without running the solver
    Compare(commands::CompareArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Run(args) => commands::run_regression_command(args),
        CliCommand::Compare(args) => commands::run_compare_command(args),
    }
}

/// `RUST_LOG` wins over the verbosity flags. Logs go to stderr so stdout
/// stays the report.
fn init_logging(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed when `run` is invoked repeatedly.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(RegressError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<RegressError> for CliError {
    fn from(error: RegressError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_regress_error(&self) -> RegressError {
        match self {
            Self::Usage(message) => {
                RegressError::input_validation("INPUT.CLI_USAGE", message.clone())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => RegressError::internal("SYS.CLI", format!("{error:#}")),
        }
    }
}
