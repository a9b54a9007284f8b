//! Lookup command

use colored::Colorize;

use crate::config::StaticConfig;
use crate::interfaces::cli::CliError;
use crate::services::geoip::GeoResolver;

pub async fn lookup_ip(config: &StaticConfig, ip: &str, json: bool) -> Result<(), CliError> {
    let resolver = GeoResolver::from_config(config)?;
    let result = resolver.resolve(ip).await?;

    if json {
        let output = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::CommandError(format!("Failed to serialize result: {}", e)))?;
        println!("{}", output);
        return Ok(());
    }

    println!(
        "{} {} {}",
        ip.cyan().bold(),
        "via".dimmed(),
        result.source.green()
    );
    for (field, value) in &result.data {
        let rendered = match value.as_str() {
            Some(s) => s.to_string(),
            None => value.to_string(),
        };
        println!("  {:<10} {}", field.blue(), rendered);
    }
    Ok(())
}
