use clap::Parser;
use colored::Colorize;

use geolookup::cli::Cli;
use geolookup::config::init_config;
use geolookup::runtime::modes::{Mode, detect_mode, run_cli, run_server};
use geolookup::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match init_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    match detect_mode(cli.command.as_ref()) {
        Mode::Server => {
            let _guard = init_logging(&config.logging);
            run_server().await
        }
        Mode::Cli => {
            let Some(command) = cli.command else {
                return Ok(());
            };
            if let Err(e) = run_cli(command).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
            Ok(())
        }
        Mode::Unknown => {
            eprintln!("{}", "No execution mode available".red());
            std::process::exit(2);
        }
    }
}
