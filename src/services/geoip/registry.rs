//! Provider 注册表
//!
//! 启动时从配置加载一次，之后只读。配置有误直接返回错误，不会带病启动。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::mapping::FieldMapping;
use crate::config::ProviderConfig;
use crate::config::validators::{IP_PLACEHOLDER, validate_providers};
use crate::errors::{GeoLookupError, Result};

/// 上游 GeoIP provider（加载后不可变）
#[derive(Debug, Clone)]
pub struct Provider {
    pub name: String,
    pub url_template: String,
    pub enabled: bool,
    pub max_requests: u32,
    pub window: Duration,
    pub timeout: Duration,
    pub mapping: FieldMapping,
}

impl Provider {
    /// 从配置构建，`default_timeout` 用于未单独配置超时的 provider
    pub fn from_config(config: &ProviderConfig, default_timeout: Duration) -> Result<Self> {
        let mapping = FieldMapping::compile(&config.field_mapping).map_err(|field| {
            GeoLookupError::config(format!(
                "Provider '{}': invalid mapping for field '{}'",
                config.name, field
            ))
        })?;

        Ok(Self {
            name: config.name.clone(),
            url_template: config.url.clone(),
            enabled: config.enabled,
            max_requests: config.max_requests,
            window: Duration::from_secs(config.time_window),
            timeout: config
                .timeout
                .map(Duration::from_millis)
                .unwrap_or(default_timeout),
            mapping,
        })
    }

    /// 用 IP 填充地址模板（IP 会做 URL 编码）
    pub fn url_for(&self, ip: &str) -> String {
        self.url_template
            .replace(IP_PLACEHOLDER, &urlencoding::encode(ip))
    }
}

/// 只读 provider 列表，保持配置中的顺序
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<Provider>>,
}

impl ProviderRegistry {
    /// 校验并加载 provider 配置
    pub fn from_config(configs: &[ProviderConfig], default_timeout: Duration) -> Result<Self> {
        validate_providers(configs).map_err(GeoLookupError::Config)?;

        let providers = configs
            .iter()
            .map(|c| Provider::from_config(c, default_timeout).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        if providers.is_empty() {
            warn!("GeoIP: no upstream providers configured, every lookup will fail");
        }
        for p in &providers {
            debug!(
                "GeoIP: registered provider '{}' (enabled: {}, {} req / {:?}, timeout {:?})",
                p.name, p.enabled, p.max_requests, p.window, p.timeout
            );
        }

        Ok(Self { providers })
    }

    /// 直接使用已构建的 provider（测试和嵌入场景）
    pub fn from_providers(providers: Vec<Provider>) -> Self {
        Self {
            providers: providers.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Provider>> {
        self.providers.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Provider>> {
        self.providers.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
