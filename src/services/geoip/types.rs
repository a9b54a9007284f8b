//! 查询结果与状态类型

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{LoadBalanceStrategy, LookupConfig};

/// 一次成功查询的结果，写入缓存后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    /// 返回结果的 provider 名称
    pub source: String,
    /// 归一化并按白名单过滤后的字段
    pub data: Map<String, Value>,
    /// provider 原始响应
    pub raw_data: Value,
}

impl LookupResult {
    /// 读取字符串字段，便于日志输出
    pub fn field_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

/// provider 状态（管理接口使用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub enabled: bool,
    pub max_requests: u32,
    /// 窗口长度（秒）
    pub time_window: u64,
    pub current_requests: u32,
    /// 当前窗口剩余秒数
    pub time_left: u64,
    pub available: bool,
}

/// 单条缓存记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheItem {
    pub ip: String,
    pub source: String,
    /// 已缓存秒数
    pub age: u64,
    /// 距过期秒数
    pub expires_in: u64,
}

/// 缓存快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheSnapshot {
    /// TTL（秒）
    pub ttl: u64,
    pub size: usize,
    pub items: Vec<CacheItem>,
}

/// 查询编排参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    pub default_timeout: Duration,
    /// 额外重试轮数，总轮数为 `max_retries + 1`
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub cache_ttl: Duration,
    /// 0 表示不限制
    pub cache_max_entries: usize,
    pub strategy: LoadBalanceStrategy,
    /// 输出字段白名单，空表示全部保留
    pub response_fields: Vec<String>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_millis(5000),
            max_retries: 2,
            retry_backoff: Duration::from_millis(100),
            cache_ttl: Duration::from_secs(3600),
            cache_max_entries: 0,
            strategy: LoadBalanceStrategy::default(),
            response_fields: Vec::new(),
        }
    }
}

impl From<&LookupConfig> for ResolverSettings {
    fn from(config: &LookupConfig) -> Self {
        Self {
            default_timeout: Duration::from_millis(config.default_timeout),
            max_retries: config.retry_count,
            retry_backoff: Duration::from_millis(config.retry_backoff),
            cache_ttl: Duration::from_secs(config.cache_ttl),
            cache_max_entries: config.cache_max_entries,
            strategy: config.load_balance_strategy,
            response_fields: config.response_fields.clone(),
        }
    }
}
