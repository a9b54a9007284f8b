//! GeoIP 服务模块
//!
//! 在多个有频率限制的上游 API 之间分发 IP 地理位置查询：
//! - 按 provider 的固定窗口限流
//! - 轮询 / 随机 / 最少使用 三种负载均衡策略
//! - 失败自动切换 provider，按轮次重试
//! - 结果按 IP 缓存

mod cache;
mod fetcher;
mod mapping;
mod rate_limiter;
mod registry;
mod resolver;
mod selector;
mod types;

pub use cache::ResponseCache;
pub use fetcher::{GeoFetcher, HttpFetcher};
pub use mapping::{FieldExpr, FieldMapping, FieldPath};
pub use rate_limiter::{RateLimiter, WindowUsage};
pub use registry::{Provider, ProviderRegistry};
pub use resolver::GeoResolver;
pub use selector::Selector;
pub use types::{CacheItem, CacheSnapshot, LookupResult, ProviderStatus, ResolverSettings};
