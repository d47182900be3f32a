//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// TNS Energo CLI - accounts, meters, payments and readings from the command line
///
/// Talks to the mobile API of the TNS Energo utility provider on behalf of
/// one personal account holder.
#[derive(Parser, Debug)]
#[command(
    name = "tns-energo",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TNS_ENERGO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Personal account code used to log in
    #[arg(short, long, global = true, env = "TNS_ENERGO_USERNAME")]
    pub username: Option<String>,

    /// Account password
    #[arg(short, long, global = true, env = "TNS_ENERGO_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and show the account with its dependents
    Login,

    /// List accounts reachable with these credentials
    Accounts,

    /// Show registration details of an account
    Info(AccountArgs),

    /// List meters and their tariff zones
    Meters(AccountArgs),

    /// Show payment history
    Payments(PaymentsArgs),

    /// Show readings history
    Indications(IndicationsArgs),

    /// Submit new meter readings
    Send(SendArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Account selection shared by per-account commands
#[derive(Parser, Debug, Clone, Default)]
pub struct AccountArgs {
    /// Act on a dependent account instead of the logged-in one
    #[arg(short, long, value_name = "CODE")]
    pub account: Option<String>,
}

/// Arguments for the payments command
#[derive(Parser, Debug)]
pub struct PaymentsArgs {
    #[command(flatten)]
    pub account: AccountArgs,

    /// First day to include (YYYY-MM-DD or DD.MM.YYYY)
    #[arg(long, value_parser = parse_date_arg)]
    pub start: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD or DD.MM.YYYY)
    #[arg(long, value_parser = parse_date_arg)]
    pub end: Option<NaiveDate>,

    /// Only show the most recent payment
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub last: bool,
}

/// Arguments for the indications command
#[derive(Parser, Debug)]
pub struct IndicationsArgs {
    #[command(flatten)]
    pub account: AccountArgs,

    /// First day to include (YYYY-MM-DD or DD.MM.YYYY)
    #[arg(long, value_parser = parse_date_arg)]
    pub start: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD or DD.MM.YYYY)
    #[arg(long, value_parser = parse_date_arg)]
    pub end: Option<NaiveDate>,

    /// Restrict to meters with these codes (repeatable)
    #[arg(short, long, value_name = "CODE")]
    pub meter: Vec<String>,

    /// Only show the most recent reading
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub last: bool,
}

/// Arguments for the send command
#[derive(Parser, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub account: AccountArgs,

    /// Meter code (factory number) to submit readings for
    #[arg(short, long, value_name = "CODE")]
    pub meter: String,

    /// Reading for the first tariff zone
    #[arg(long)]
    pub t1: Option<i64>,

    /// Reading for the second tariff zone
    #[arg(long)]
    pub t2: Option<i64>,

    /// Reading for the third tariff zone
    #[arg(long)]
    pub t3: Option<i64>,

    /// Reading for an arbitrary zone as ZONE=VALUE (repeatable)
    #[arg(long, value_name = "ZONE=VALUE", value_parser = parse_zone_arg)]
    pub zone: Vec<(String, i64)>,

    /// Skip the check that new readings exceed the last known ones
    #[arg(long)]
    pub ignore_values: bool,

    /// Validate and print the payload without submitting it
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init(ConfigInitArgs),

    /// Show the effective configuration
    Show(ConfigShowArgs),
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the file (defaults to the user config directory)
    #[arg(long, value_name = "FILE")]
    pub path: Option<PathBuf>,

    /// Force overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,

    /// Print the password instead of masking it
    #[arg(long)]
    pub reveal: bool,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

/// Accepts ISO dates as well as the vendor's `dd.mm.yyyy`
fn parse_date_arg(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| tns_energo_core::convert::parse_date(text))
        .map_err(|_| format!("'{text}' is not a date (expected YYYY-MM-DD or DD.MM.YYYY)"))
}

fn parse_zone_arg(text: &str) -> Result<(String, i64), String> {
    let (zone, value) = text
        .split_once('=')
        .ok_or_else(|| format!("'{text}' must look like ZONE=VALUE"))?;

    let zone = zone.trim();
    if zone.is_empty() {
        return Err(format!("'{text}' has an empty zone name"));
    }

    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("'{text}' has an invalid value: {e}"))?;

    Ok((zone.to_string(), value))
}
