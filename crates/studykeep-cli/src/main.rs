// crates/studykeep-cli/src/main.rs
// ============================================================================
// Module: Studykeep CLI Entry Point
// Description: Command dispatcher for the studykeep gateway.
// Purpose: Provide a safe CLI for server execution and config checks.
// Dependencies: clap, studykeep-config, studykeep-gateway, tokio
// ============================================================================

//! ## Overview
//! The studykeep CLI starts the gateway server and validates
//! configuration files. All failures surface as one stderr line and a
//! failing exit code; the process never exits from inside command
//! handlers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use studykeep_config::StudykeepConfig;
use studykeep_gateway::GatewayServer;

// ============================================================================
// SECTION: CLI Definition
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "studykeep", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the studykeep gateway server.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Path to the gateway configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override the configured bind address.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file and report the outcome.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Path to the gateway configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI result alias.
type CliResult<T> = Result<T, CliError>;

/// CLI failure carrying a user-facing message.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct CliError {
    /// User-facing failure description.
    message: String,
}

impl CliError {
    /// Creates a CLI error from a message.
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("studykeep {version}"))
            .map_err(|err| CliError::new(format!("stdout write failed: {err}")))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => command_config(&command),
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    Cli::command()
        .print_help()
        .map_err(|err| CliError::new(format!("help output failed: {err}")))
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let mut config = StudykeepConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    if let Some(bind) = command.bind {
        config.server.bind = bind;
        config
            .validate()
            .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    }
    let bind = config.server.bind.clone();
    // The blocking transport client must be built off the async reactor.
    let server = tokio::task::block_in_place(|| GatewayServer::from_config(config))
        .map_err(|err| CliError::new(err.to_string()))?;
    write_stderr_line(&format!("studykeep gateway listening on {bind}"))
        .map_err(|err| CliError::new(format!("stderr write failed: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(err.to_string()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Executes the `config` subcommands.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => {
            StudykeepConfig::load(command.config.as_deref())
                .map_err(|err| CliError::new(err.to_string()))?;
            write_stdout_line("configuration is valid")
                .map_err(|err| CliError::new(format!("stdout write failed: {err}")))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes one line to stdout.
fn write_stdout_line(line: &str) -> io::Result<()> {
    writeln!(io::stdout(), "{line}")
}

/// Writes one line to stderr.
fn write_stderr_line(line: &str) -> io::Result<()> {
    writeln!(io::stderr(), "{line}")
}

/// Emits a failure line and returns the failing exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = writeln!(io::stderr(), "studykeep: {message}");
    ExitCode::FAILURE
}

// ============================================================================
// SECTION: Tests
// ============================================================================
