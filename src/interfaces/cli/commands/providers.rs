//! List providers command

use colored::Colorize;

use crate::config::StaticConfig;
use crate::interfaces::cli::CliError;
use crate::services::geoip::ProviderRegistry;

pub fn list_providers(config: &StaticConfig) -> Result<(), CliError> {
    let registry = ProviderRegistry::from_config(
        &config.providers,
        std::time::Duration::from_millis(config.lookup.default_timeout),
    )?;

    if registry.is_empty() {
        println!("{} No providers configured", "ℹ".bold().blue());
        return Ok(());
    }

    println!("{}", "Providers:".bold().green());
    println!();
    for provider in registry.iter() {
        let state = if provider.enabled {
            "enabled".green()
        } else {
            "disabled".red()
        };
        println!(
            "  {} [{}] {} req / {}s, timeout {}ms",
            provider.name.cyan(),
            state,
            provider.max_requests,
            provider.window.as_secs(),
            provider.timeout.as_millis()
        );
        println!("    {}", provider.url_template.dimmed());
    }
    println!();
    println!(
        "{} Strategy: {}, retries: {}",
        "ℹ".bold().blue(),
        config.lookup.load_balance_strategy.as_str().green(),
        config.lookup.retry_count
    );
    Ok(())
}
