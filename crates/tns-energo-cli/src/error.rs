//! Error types and handling for the CLI
//!
//! Every failure is mapped to a distinct process exit code so scripts can
//! tell a rejected login from a timeout or a malformed config file.

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from the client library
    #[error(transparent)]
    Core(#[from] tns_energo_core::Error),

    /// Config file does not exist
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// Neither flags, environment nor config file provide credentials
    #[error("Missing {what}. Pass --{what}, set TNS_ENERGO_{} or add it to the config file", what.to_uppercase())]
    MissingCredentials { what: &'static str },

    /// `--account` names neither the logged-in account nor a dependent
    #[error("Account '{code}' is not accessible with these credentials")]
    AccountNotFound { code: String },

    /// `--meter` does not match any meter of the selected account
    #[error("Meter '{code}' not found (available: {available})")]
    MeterNotFound { code: String, available: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Failure with attached context
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(core) => core_exit_code(core),
            Self::FileNotFound { .. } => 3,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::MissingCredentials { .. } => 7,
            Self::AccountNotFound { .. } => 8,
            Self::MeterNotFound { .. } => 9,
            Self::Json(_) => 20,
            Self::Yaml(_) => 21,
            Self::Other(_) => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgs(_) | Self::MissingCredentials { .. }
        )
    }
}

fn core_exit_code(error: &tns_energo_core::Error) -> i32 {
    use tns_energo_core::Error as Core;

    match error {
        Core::Configuration { .. } => 5,
        Core::RequestTimeout { .. } => 11,
        _ if error.is_request_error() => 10,
        Core::Response { .. } => 12,
        _ if error.is_response_error() => 13,
        _ if error.is_mapping_error() => 14,
        _ if error.is_argument_error() => 15,
        _ => 2,
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    let mut message = error.to_string();

    if let Error::Other(inner) = error {
        message = format!("{inner:#}");
    }

    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), message)
    } else {
        format!("Error: {}", message)
    }
}
