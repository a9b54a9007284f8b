//! CLI mode
//!
//! This module contains the CLI mode startup logic.
//! It delegates to the actual CLI implementation.

use crate::cli::Commands;
use crate::config::get_config;
use crate::interfaces::cli::{CliError, run_cli_command};

/// Run CLI mode with the globally loaded configuration
pub async fn run_cli(command: Commands) -> Result<(), CliError> {
    let config = get_config();
    run_cli_command(command, &config).await
}
