//! Shared test fixtures

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use geolookup::errors::{ProviderError, ProviderErrorKind};
use geolookup::services::geoip::{FieldMapping, GeoFetcher, Provider};

/// 按 provider 名称返回预设结果，并记录调用顺序
#[derive(Default)]
pub struct MockFetcher {
    responses: Mutex<HashMap<String, Result<Value, ProviderErrorKind>>>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn succeed(&self, provider: &str, body: Value) {
        self.responses
            .lock()
            .insert(provider.to_string(), Ok(body));
    }

    pub fn fail(&self, provider: &str, kind: ProviderErrorKind) {
        self.responses
            .lock()
            .insert(provider.to_string(), Err(kind));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl GeoFetcher for MockFetcher {
    async fn fetch(
        &self,
        provider: &str,
        url: &str,
        _timeout: Duration,
    ) -> Result<Value, ProviderError> {
        self.calls.lock().push(provider.to_string());
        let ip = url.rsplit('/').next().unwrap_or_default().to_string();
        match self.responses.lock().get(provider) {
            Some(Ok(body)) => {
                let mut body = body.clone();
                body["query"] = Value::String(ip);
                Ok(body)
            }
            Some(Err(kind)) => Err(ProviderError::new(provider, kind.clone())),
            None => Err(ProviderError::new(
                provider,
                ProviderErrorKind::Network("no response configured".to_string()),
            )),
        }
    }
}

pub fn provider(name: &str, max_requests: u32) -> Provider {
    let mapping = BTreeMap::from([
        ("ip".to_string(), "query".to_string()),
        ("country".to_string(), "country".to_string()),
        ("city".to_string(), "city".to_string()),
        ("location".to_string(), "country,region,city".to_string()),
    ]);
    Provider {
        name: name.to_string(),
        url_template: format!("http://{}.test/json/{{ip}}", name),
        enabled: true,
        max_requests,
        window: Duration::from_secs(60),
        timeout: Duration::from_secs(1),
        mapping: FieldMapping::compile(&mapping).unwrap(),
    }
}
