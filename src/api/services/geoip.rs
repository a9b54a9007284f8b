use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, trace};

use crate::config::{IpHeader, LoadBalanceStrategy};
use crate::services::geoip::{CacheItem, GeoResolver, ProviderStatus};
use crate::utils::client_ip_from_request;

/// 用于识别客户端 IP 的请求头
#[derive(Debug, Clone, Default)]
pub struct ClientIpHeaders(pub Vec<IpHeader>);

#[derive(Debug, Deserialize)]
pub struct IpQuery {
    pub ip: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CacheInfo {
    pub enabled: bool,
    pub ttl: u64,
    pub size: usize,
    pub items: Vec<CacheItem>,
}

#[derive(Debug, Serialize)]
pub struct LoadBalanceInfo {
    pub strategy: LoadBalanceStrategy,
    pub strategies_available: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct LookupConfigInfo {
    /// 毫秒
    pub default_timeout: u64,
    pub retry_count: u32,
    /// 秒
    pub cache_ttl: u64,
    pub load_balance_strategy: LoadBalanceStrategy,
}

#[derive(Debug, Serialize)]
pub struct ProviderListResponse {
    pub success: bool,
    pub apis: Vec<ProviderStatus>,
    pub cache: CacheInfo,
    pub load_balance: LoadBalanceInfo,
    pub config: LookupConfigInfo,
}

pub struct GeoIpService;

impl GeoIpService {
    /// 查询 `?ip=`，未提供时查询客户端 IP
    pub async fn lookup_query(
        req: HttpRequest,
        query: web::Query<IpQuery>,
        resolver: web::Data<Arc<GeoResolver>>,
        ip_headers: web::Data<ClientIpHeaders>,
    ) -> impl Responder {
        let ip = match query.into_inner().ip.filter(|ip| !ip.trim().is_empty()) {
            Some(ip) => ip.trim().to_string(),
            None => client_ip_from_request(&req, &ip_headers.0),
        };
        Self::handle_lookup(&resolver, &ip).await
    }

    /// 查询路径中的 IP
    pub async fn lookup_path(
        path: web::Path<String>,
        resolver: web::Data<Arc<GeoResolver>>,
    ) -> impl Responder {
        let ip = path.into_inner();
        Self::handle_lookup(&resolver, ip.trim()).await
    }

    async fn handle_lookup(resolver: &GeoResolver, ip: &str) -> HttpResponse {
        trace!("Received lookup request for {:?}", ip);
        match resolver.resolve(ip).await {
            Ok(result) => HttpResponse::Ok().json(result),
            Err(e) => {
                error!("GeoIP lookup for {:?} failed: {}", ip, e);
                HttpResponse::InternalServerError().json(json!({ "error": e.message() }))
            }
        }
    }

    /// provider 状态、缓存和负载均衡信息
    pub async fn list_providers(resolver: web::Data<Arc<GeoResolver>>) -> impl Responder {
        let snapshot = resolver.cache_snapshot();
        let settings = resolver.settings();
        let apis = resolver.list_provider_status();

        info!(
            "Returning status of {} providers, {} cached entries",
            apis.len(),
            snapshot.size
        );

        HttpResponse::Ok().json(ProviderListResponse {
            success: true,
            apis,
            cache: CacheInfo {
                enabled: true,
                ttl: snapshot.ttl,
                size: snapshot.size,
                items: snapshot.items,
            },
            load_balance: LoadBalanceInfo {
                strategy: resolver.strategy(),
                strategies_available: LoadBalanceStrategy::names(),
            },
            config: LookupConfigInfo {
                default_timeout: settings.default_timeout.as_millis() as u64,
                retry_count: settings.max_retries,
                cache_ttl: settings.cache_ttl.as_secs(),
                load_balance_strategy: settings.strategy,
            },
        })
    }

    pub async fn clear_cache(resolver: web::Data<Arc<GeoResolver>>) -> impl Responder {
        let cleared = resolver.clear_cache();
        HttpResponse::Ok().json(json!({
            "success": true,
            "message": format!("Cleared {} cached entries", cleared),
            "cleared": cleared,
        }))
    }
}

/// GeoIP 路由配置
///
/// 固定路径需注册在 `/{ip}` 之前。
pub fn geoip_routes() -> actix_web::Scope {
    web::scope("/api/ip")
        .route("", web::get().to(GeoIpService::lookup_query))
        .route("/", web::get().to(GeoIpService::lookup_query))
        .route("/list", web::get().to(GeoIpService::list_providers))
        .route("/clearcache", web::get().to(GeoIpService::clear_cache))
        .route("/{ip}", web::get().to(GeoIpService::lookup_path))
}
