//! 上游 HTTP 调用
//!
//! 查询编排只依赖 `GeoFetcher` trait，测试中可以替换为内存实现。

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;
use ureq::Agent;

use crate::errors::{ProviderError, ProviderErrorKind};

/// 获取 provider 原始 JSON 响应
#[async_trait]
pub trait GeoFetcher: Send + Sync {
    async fn fetch(
        &self,
        provider: &str,
        url: &str,
        timeout: Duration,
    ) -> Result<Value, ProviderError>;
}

/// 全局 HTTP Agent（ureq 的 Agent 是 Send + Sync）
static HTTP_AGENT: OnceLock<Agent> = OnceLock::new();

fn get_agent() -> &'static Agent {
    HTTP_AGENT.get_or_init(|| {
        Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into()
    })
}

/// 基于 ureq 的实现，同步请求放到 blocking 线程池执行
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl HttpFetcher {
    pub fn new() -> Self {
        Self
    }

    fn fetch_sync(url: &str, timeout: Duration) -> Result<Value, ProviderErrorKind> {
        let resp = get_agent()
            .get(url)
            .config()
            .timeout_global(Some(timeout))
            .build()
            .call()
            .map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderErrorKind::Status(status.as_u16()));
        }

        resp.into_body()
            .read_json::<Value>()
            .map_err(|e| match e {
                ureq::Error::Timeout(_) => ProviderErrorKind::Timeout,
                other => ProviderErrorKind::Decode(other.to_string()),
            })
    }
}

fn classify(err: ureq::Error) -> ProviderErrorKind {
    match err {
        ureq::Error::Timeout(_) => ProviderErrorKind::Timeout,
        ureq::Error::StatusCode(code) => ProviderErrorKind::Status(code),
        other => ProviderErrorKind::Network(other.to_string()),
    }
}

#[async_trait]
impl GeoFetcher for HttpFetcher {
    async fn fetch(
        &self,
        provider: &str,
        url: &str,
        timeout: Duration,
    ) -> Result<Value, ProviderError> {
        trace!("GeoIP: GET {} (timeout {:?})", url, timeout);
        let owned = url.to_string();

        tokio::task::spawn_blocking(move || Self::fetch_sync(&owned, timeout))
            .await
            .unwrap_or_else(|e| Err(ProviderErrorKind::Network(format!("worker failed: {}", e))))
            .map_err(|kind| ProviderError::new(provider, kind))
    }
}
