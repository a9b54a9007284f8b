use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use std::sync::Arc;
use tracing::trace;

use crate::services::geoip::GeoResolver;

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

impl AppStartTime {
    pub fn now() -> Self {
        Self {
            start_datetime: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    /// 运行秒数
    pub uptime: u64,
    pub providers_total: usize,
    pub providers_available: usize,
}

pub struct HealthService;

impl HealthService {
    /// 进程存活即视为健康，provider 全部耗尽时标记为 degraded
    pub async fn health_check(
        resolver: web::Data<Arc<GeoResolver>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        trace!("Received health check request");

        let now = chrono::Utc::now();
        let uptime = (now - app_start_time.start_datetime).num_seconds().max(0) as u64;
        let providers_available = resolver.available_count();

        HttpResponse::Ok().json(HealthResponse {
            status: if providers_available > 0 {
                "healthy"
            } else {
                "degraded"
            },
            timestamp: now.to_rfc3339(),
            uptime,
            providers_total: resolver.registry().len(),
            providers_available,
        })
    }

    // 活跃性检查
    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");

        HttpResponse::NoContent().finish()
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/live", web::head().to(HealthService::liveness_check))
}
