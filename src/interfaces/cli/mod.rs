//! CLI interface module
//!
//! This module provides command-line interface functionality for geolookup.

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands};
use crate::config::StaticConfig;
use crate::errors::GeoLookupError;
use commands::{config_generate, list_providers, lookup_ip};

#[derive(Debug)]
pub enum CliError {
    ConfigError(String),
    LookupError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::ConfigError(msg) => format!("Config error: {}", msg),
            CliError::LookupError(msg) => format!("Lookup error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::ConfigError(msg) => {
                format!("{} {}", "Config error:".yellow().bold(), msg.white())
            }
            CliError::LookupError(msg) => {
                format!("{} {}", "Lookup error:".red().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<GeoLookupError> for CliError {
    fn from(err: GeoLookupError) -> Self {
        match err {
            GeoLookupError::Config(msg) => CliError::ConfigError(msg),
            GeoLookupError::FileOperation(_) | GeoLookupError::Serialization(_) => {
                CliError::CommandError(err.message())
            }
            other => CliError::LookupError(other.message()),
        }
    }
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands, config: &StaticConfig) -> Result<(), CliError> {
    match cmd {
        Commands::Lookup { ip, json } => lookup_ip(config, &ip, json).await,
        Commands::Providers => list_providers(config),
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => config_generate(output_path, force),
        Commands::Serve => Err(CliError::CommandError(
            "serve runs in server mode, not as a CLI command".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err: CliError = GeoLookupError::config("bad provider").into();
        assert!(matches!(err, CliError::ConfigError(ref m) if m == "bad provider"));

        let err: CliError = GeoLookupError::NoProviderAvailable.into();
        assert!(matches!(err, CliError::LookupError(_)));
        assert!(err.format_simple().starts_with("Lookup error:"));
    }
}
