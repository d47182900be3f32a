//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON)
//! - Command-line arguments and their environment fallbacks

use crate::error::{Error, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tns_energo_core::{SessionBuilder, Timeout};

const APP_DIR: &str = "tns-energo";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Login credentials
    pub credentials: CredentialsConfig,

    /// API connection settings
    pub api: ApiConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Login credentials; flags and environment variables take precedence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Overrides for the session defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Static `hash` query parameter
    pub hash: Option<String>,

    /// App version embedded in the endpoint path
    pub app_version: Option<String>,

    /// Request timeout in seconds
    pub timeout: Option<f64>,

    /// Replacement for the endpoint base URL
    pub base_url: Option<String>,

    /// Additional account prefix to region mappings
    pub extra_regions: BTreeMap<String, String>,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colored output by default
    pub color: bool,

    /// Show progress indicators
    pub progress: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,

    /// Log file path
    pub file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            progress: true,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;

        let config = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        tracing::debug!("Loaded configuration from {}", path.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        // Return default config if no config file found
        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".tns-energo.yaml"),
            PathBuf::from(".tns-energo.json"),
        ];

        if let Some(path) = Self::user_config_path() {
            paths.push(path.clone());
            paths.push(path.with_extension("json"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".tns-energo.yaml"));
            paths.push(home_dir.join(".tns-energo.json"));
        }

        paths
    }

    /// Default location written by `config init`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.yaml"))
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Resolve credentials, preferring explicit values over the file
    pub fn credentials(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<(String, String)> {
        let username = username
            .map(str::to_string)
            .or_else(|| self.credentials.username.clone())
            .filter(|u| !u.trim().is_empty())
            .ok_or(Error::MissingCredentials { what: "username" })?;

        let password = password
            .map(str::to_string)
            .or_else(|| self.credentials.password.clone())
            .ok_or(Error::MissingCredentials { what: "password" })?;

        Ok((username.trim().to_string(), password))
    }

    /// Session builder carrying the API overrides of this configuration
    pub fn session_builder(&self, username: &str, password: &str) -> Result<SessionBuilder> {
        let mut builder = SessionBuilder::new(username, password);

        if let Some(hash) = &self.api.hash {
            builder = builder.hash(hash.clone());
        }
        if let Some(version) = &self.api.app_version {
            builder = builder.app_version(version.clone());
        }
        if let Some(seconds) = self.api.timeout {
            builder = builder.timeout(Timeout::from_secs_f64(seconds)?);
        }
        if let Some(url) = &self.api.base_url {
            builder = builder.base_url(url.clone());
        }
        for (prefix, region) in &self.api.extra_regions {
            if prefix.len() != 2 || !prefix.chars().all(|c| c.is_ascii_digit()) {
                return Err(Error::config(format!(
                    "extra region prefix '{prefix}' must be two digits"
                )));
            }
            builder = builder.extra_region(prefix.clone(), region.clone());
        }

        Ok(builder)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}
