//! Server mode
//!
//! This module contains the HTTP server startup logic.
//! It configures and starts the HTTP server with all necessary routes.

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::warn;

use crate::api::services::{AppStartTime, ClientIpHeaders, geoip_routes, health_routes};
use crate::config::get_config;
use crate::runtime::lifetime;

/// 开放的只读查询接口，允许任意来源
pub fn build_cors_middleware() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "HEAD", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let app_start_time = AppStartTime::now();
    let config = get_config();

    let startup = lifetime::startup::prepare_server_startup(&config).map_err(|e| {
        tracing::error!("Server startup failed: {:#}", e);
        e
    })?;
    let resolver = startup.resolver.clone();
    let ip_headers = ClientIpHeaders(startup.ip_headers.clone());

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(build_cors_middleware())
            .wrap(Compress::default())
            .app_data(web::Data::new(resolver.clone()))
            .app_data(web::Data::new(ip_headers.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .service(geoip_routes())
            .service(health_routes())
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .workers(cpu_count)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?;

    warn!("Starting server at http://{}", bind_address);
    let server = server.run();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown() => {
            warn!("Graceful shutdown");
        }
    }

    Ok(())
}
