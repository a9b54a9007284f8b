use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;
use crate::errors::Result;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks. Falls back to in-memory defaults when
/// `init_config` was never called.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()))
        .load_full()
}

/// Initialize the global configuration
///
/// Loads configuration from `path` (or "config.toml" in the current
/// directory when `None`) plus `GEO__*` environment overrides.
/// A second call replaces the active configuration.
///
/// # Examples
/// ```no_run
/// use geolookup::config::init_config;
/// init_config(None).expect("invalid configuration");
/// ```
pub fn init_config(path: Option<&str>) -> Result<Arc<StaticConfig>> {
    set_config(StaticConfig::load(path)?);
    Ok(get_config())
}

/// Replace the active configuration (used by tests and the CLI)
pub fn set_config(config: StaticConfig) {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()))
        .store(Arc::new(config));
}
