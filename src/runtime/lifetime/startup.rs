use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::{IpHeader, StaticConfig};
use crate::services::geoip::GeoResolver;

pub struct StartupContext {
    pub resolver: Arc<GeoResolver>,
    pub ip_headers: Vec<IpHeader>,
}

/// 准备服务器启动的上下文
///
/// provider 配置有误时直接失败，不带病启动。
pub fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let resolver = GeoResolver::from_config(config)
        .map_err(|e| anyhow::anyhow!(e.format_simple()))
        .context("Failed to load upstream providers")?;

    let available = resolver.available_count();
    if available == 0 {
        warn!("No enabled provider, every lookup will fail");
    } else {
        info!(
            "{} of {} providers available",
            available,
            resolver.registry().len()
        );
    }

    debug!("Pre-startup processing completed in {:?}", start_time.elapsed());

    Ok(StartupContext {
        resolver: Arc::new(resolver),
        ip_headers: config.ip_headers.clone(),
    })
}
