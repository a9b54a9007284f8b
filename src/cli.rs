//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for geolookup using clap's derive macros.

use clap::{Parser, Subcommand};

/// geolookup - IP geolocation across rate-limited upstream providers
#[derive(Parser)]
#[command(name = "geolookup")]
#[command(version)]
#[command(about = "IP geolocation across rate-limited upstream providers", long_about = None)]
pub struct Cli {
    /// Configuration file path (default: config.toml if present)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Look up a single IP address
    Lookup {
        /// IP address to look up
        ip: String,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configured providers and their limits
    Providers,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}
