mod commands;
mod helpers;

use clap::Parser;
use srcdeck_core::domain::SourceError;
use tracing_subscriber::EnvFilter;

pub fn run_from_env() -> i32 {
    init_logging();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let source_error = error.as_source_error();
            eprintln!("{}", source_error.diagnostic_line());
            eprintln!("{}", source_error.fatal_exit_line());
            source_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("srcdeck".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    match Cli::try_parse_from(&full_args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

/// `RUST_LOG` filtered, `warn` by default, always on stderr so card text on
/// stdout stays clean.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Parser)]
#[command(name = "srcdeck", about = "Monte-Carlo source card writer")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Build one source from a variable table and write its cards
    Write(commands::WriteArgs),
    /// List source kinds and the transport codes each can be written for
    Kinds,
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Write(args) => commands::run_write_command(args),
        CliCommand::Kinds => commands::run_kinds_command(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Source(#[from] SourceError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_source_error(&self) -> SourceError {
        match self {
            Self::Usage(message) => SourceError::validation("INPUT.CLI_USAGE", message.clone()),
            Self::Source(error) => error.clone(),
            Self::Internal(error) => SourceError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
