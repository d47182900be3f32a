//! TNS Energo CLI - command-line front end for the TNS Energo client
//!
//! This is the main entry point for the `tns-energo` binary, providing
//! commands for inspecting accounts, meters, payments and readings and for
//! submitting new readings.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Set up colored output
    control::set_override(cli.use_color());

    // Load configuration before logging so its `logging` section applies
    let config = Config::load_with_file(cli.config.as_deref());

    if let Err(e) = init_logging(&cli, config.as_ref().ok()) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip_all, fields(command = ?cli.command))]
async fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let use_color = cli.use_color() && config.output.color;
    let mut output = OutputWriter::new(cli.output, use_color, cli.quiet, config.output.progress);

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        "Executing command"
    );

    let command = match cli.command {
        Commands::Config(args) => {
            return handlers::handle_config(args, &config, &mut output).await;
        }
        Commands::Completions(args) => {
            return handlers::handle_completions(args);
        }
        command => command,
    };

    let session = handlers::open_session(cli.username.as_deref(), cli.password.as_deref(), &config)?;

    let result = match command {
        Commands::Login => handlers::handle_login(&session, &mut output).await,
        Commands::Accounts => handlers::handle_accounts(&session, &mut output).await,
        Commands::Info(args) => handlers::handle_info(args, &session, &mut output).await,
        Commands::Meters(args) => handlers::handle_meters(args, &session, &mut output).await,
        Commands::Payments(args) => handlers::handle_payments(args, &session, &mut output).await,
        Commands::Indications(args) => {
            handlers::handle_indications(args, &session, &mut output).await
        }
        Commands::Send(args) => handlers::handle_send(args, &session, &mut output).await,
        Commands::Config(_) | Commands::Completions(_) => Ok(()),
    };

    session.close();
    result
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: Option<&Config>) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());

    if let Some(config) = config {
        logging_config.merge_with_file(&config.logging, cli.verbosity_level());
    }

    // Environment overrides the file
    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["tns-energo", "login"]);
        assert_eq!(cli.verbosity_level(), 0);

        let cli = Cli::parse_from(["tns-energo", "-vv", "meters"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["tns-energo", "--quiet", "accounts"]);
        assert_eq!(cli.verbosity_level(), 0);
    }
}
