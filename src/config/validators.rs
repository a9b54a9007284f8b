//! 配置值验证模块
//!
//! 启动时检查 provider 配置，任何错误都视为致命配置错误。

use std::collections::HashSet;

use super::ProviderConfig;

/// 地址模板中的 IP 占位符
pub const IP_PLACEHOLDER: &str = "{ip}";

/// 验证单个 provider 配置
///
/// - 名称不能为空
/// - url 必须包含 `{ip}` 占位符
/// - field_mapping 不能为空，且每个映射至少包含一个路径
/// - max_requests 和 time_window 必须大于 0
pub fn validate_provider(provider: &ProviderConfig) -> Result<(), String> {
    if provider.name.trim().is_empty() {
        return Err("Provider name must not be empty".to_string());
    }

    if !provider.url.contains(IP_PLACEHOLDER) {
        return Err(format!(
            "Provider '{}': url '{}' lacks the {} placeholder",
            provider.name, provider.url, IP_PLACEHOLDER
        ));
    }

    if provider.field_mapping.is_empty() {
        return Err(format!(
            "Provider '{}': field_mapping must not be empty",
            provider.name
        ));
    }

    for (field, path) in &provider.field_mapping {
        if path.split(',').all(|p| p.trim().is_empty()) {
            return Err(format!(
                "Provider '{}': mapping for '{}' has no source path",
                provider.name, field
            ));
        }
    }

    if provider.max_requests == 0 {
        return Err(format!(
            "Provider '{}': max_requests must be greater than 0",
            provider.name
        ));
    }

    if provider.time_window == 0 {
        return Err(format!(
            "Provider '{}': time_window must be greater than 0",
            provider.name
        ));
    }

    if provider.timeout == Some(0) {
        return Err(format!(
            "Provider '{}': timeout must be greater than 0",
            provider.name
        ));
    }

    Ok(())
}

/// 验证 provider 列表（逐个验证 + 名称唯一）
pub fn validate_providers(providers: &[ProviderConfig]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for provider in providers {
        validate_provider(provider)?;
        if !seen.insert(provider.name.as_str()) {
            return Err(format!("Duplicate provider name: '{}'", provider.name));
        }
    }
    Ok(())
}
