//! 查询编排
//!
//! 缓存 → 选择 provider → 限流占用 → 请求 → 归一化 → 写缓存。
//! 单个 provider 失败在循环内消化，只有全部尝试用尽才向上返回错误。

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::cache::ResponseCache;
use super::fetcher::{GeoFetcher, HttpFetcher};
use super::rate_limiter::RateLimiter;
use super::registry::{Provider, ProviderRegistry};
use super::selector::Selector;
use super::types::{CacheSnapshot, LookupResult, ProviderStatus, ResolverSettings};
use crate::config::{LoadBalanceStrategy, StaticConfig};
use crate::errors::{GeoLookupError, ProviderError, ProviderErrorKind, Result};

/// 单次查询的重试状态
#[derive(Debug, Default)]
struct LookupAttempt {
    round: u32,
    tried: HashSet<String>,
    last_error: Option<ProviderError>,
    /// 是否至少发出过一次请求
    dispatched: bool,
}

impl LookupAttempt {
    fn fail(&mut self, err: ProviderError) {
        self.tried.insert(err.provider.clone());
        self.last_error = Some(err);
    }

    /// 一次请求都没发出（全部被限流拒绝）视为没有可用 provider
    fn into_error(self) -> GeoLookupError {
        match self.last_error {
            Some(err) if self.dispatched => GeoLookupError::AllAttemptsFailed(err),
            _ => GeoLookupError::NoProviderAvailable,
        }
    }
}

/// IP 地理位置查询入口，进程内共享一个实例
pub struct GeoResolver {
    registry: ProviderRegistry,
    limiter: RateLimiter,
    selector: Selector,
    cache: ResponseCache,
    fetcher: Arc<dyn GeoFetcher>,
    settings: ResolverSettings,
}

impl GeoResolver {
    pub fn new(
        registry: ProviderRegistry,
        settings: ResolverSettings,
        fetcher: Arc<dyn GeoFetcher>,
    ) -> Self {
        let limiter = RateLimiter::new(&registry);
        let selector = Selector::new(settings.strategy);
        let cache = ResponseCache::new(settings.cache_ttl, settings.cache_max_entries);

        Self {
            registry,
            limiter,
            selector,
            cache,
            fetcher,
            settings,
        }
    }

    /// 从完整配置构建，使用 HTTP 实现
    pub fn from_config(config: &StaticConfig) -> Result<Self> {
        Self::from_config_with_fetcher(config, Arc::new(HttpFetcher::new()))
    }

    pub fn from_config_with_fetcher(
        config: &StaticConfig,
        fetcher: Arc<dyn GeoFetcher>,
    ) -> Result<Self> {
        let settings = ResolverSettings::from(&config.lookup);
        let registry = ProviderRegistry::from_config(&config.providers, settings.default_timeout)?;

        info!(
            "GeoIP: {} providers loaded, strategy: {}, cache ttl: {:?}",
            registry.len(),
            settings.strategy,
            settings.cache_ttl
        );
        Ok(Self::new(registry, settings, fetcher))
    }

    /// 查询 IP 的地理位置
    pub async fn resolve(&self, ip: &str) -> Result<LookupResult> {
        if let Some(hit) = self.cache.get(ip) {
            debug!("GeoIP: {} served from cache (source: {})", ip, hit.source);
            return Ok(hit);
        }

        if self.limiter.available_providers(&self.registry).is_empty() {
            warn!("GeoIP: no provider available for {}", ip);
            return Err(GeoLookupError::NoProviderAvailable);
        }

        let mut attempt = LookupAttempt::default();
        while attempt.round <= self.settings.max_retries {
            let candidates: Vec<Arc<Provider>> = self
                .limiter
                .available_providers(&self.registry)
                .into_iter()
                .filter(|p| !attempt.tried.contains(&p.name))
                .collect();

            if candidates.is_empty() {
                if attempt.round < self.settings.max_retries {
                    attempt.tried.clear();
                    attempt.round += 1;
                    info!(
                        "GeoIP: all providers failed for {}, starting retry round {}",
                        ip, attempt.round
                    );
                    tokio::time::sleep(self.settings.retry_backoff).await;
                    continue;
                }
                break;
            }

            let Some(provider) = self.selector.select_next(&candidates, &self.limiter) else {
                break;
            };

            if !self.limiter.try_acquire(&provider) {
                debug!(
                    "GeoIP: provider '{}' became unavailable before dispatch",
                    provider.name
                );
                attempt.fail(ProviderError::new(
                    provider.name.clone(),
                    ProviderErrorKind::RateLimited,
                ));
                continue;
            }
            attempt.dispatched = true;

            match self.query_provider(&provider, ip).await {
                Ok(result) => {
                    self.cache.put(ip, result.clone());
                    info!(
                        "GeoIP: {} resolved by '{}' ({} / {} / {})",
                        ip,
                        result.source,
                        result.field_str("country").unwrap_or("-"),
                        result.field_str("city").unwrap_or("-"),
                        result.field_str("isp").unwrap_or("-"),
                    );
                    return Ok(result);
                }
                Err(err) => {
                    warn!("GeoIP: lookup of {} failed: {}", ip, err);
                    attempt.fail(err);
                }
            }
        }

        warn!("GeoIP: every attempt for {} failed", ip);
        Err(attempt.into_error())
    }

    async fn query_provider(
        &self,
        provider: &Provider,
        ip: &str,
    ) -> std::result::Result<LookupResult, ProviderError> {
        let url = provider.url_for(ip);
        let raw = self
            .fetcher
            .fetch(&provider.name, &url, provider.timeout)
            .await?;

        let data = provider
            .mapping
            .normalize(&raw, &self.settings.response_fields);
        Ok(LookupResult {
            source: provider.name.clone(),
            data,
            raw_data: raw,
        })
    }

    /// 所有 provider 的当前状态，保持注册表顺序
    pub fn list_provider_status(&self) -> Vec<ProviderStatus> {
        self.registry
            .iter()
            .map(|p| {
                let usage = self.limiter.usage(p);
                ProviderStatus {
                    name: p.name.clone(),
                    enabled: p.enabled,
                    max_requests: p.max_requests,
                    time_window: p.window.as_secs(),
                    current_requests: usage.count,
                    time_left: usage.remaining.as_secs(),
                    available: usage.available,
                }
            })
            .collect()
    }

    /// 当前可用 provider 数量
    pub fn available_count(&self) -> usize {
        self.limiter.available_providers(&self.registry).len()
    }

    pub fn cache_snapshot(&self) -> CacheSnapshot {
        self.cache.snapshot()
    }

    /// 清空缓存，返回删除条数
    pub fn clear_cache(&self) -> usize {
        let cleared = self.cache.clear();
        info!("GeoIP: cache cleared, {} entries removed", cleared);
        cleared
    }

    pub fn strategy(&self) -> LoadBalanceStrategy {
        self.selector.strategy()
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }
}
