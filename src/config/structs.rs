use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{IpHeader, LoadBalanceStrategy};
use crate::errors::{GeoLookupError, Result};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 服务器地址、端口、CPU 数量
/// - logging: 日志配置
/// - lookup: 查询引擎（超时、重试、缓存、负载均衡、输出字段）
/// - providers: 上游 GeoIP API 列表
/// - ip_headers: 获取客户端 IP 时信任的请求头
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default = "default_ip_headers")]
    pub ip_headers: Vec<IpHeader>,
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > TOML 文件 > 默认值
    /// ENV 前缀：GEO，分隔符：__
    /// 示例：GEO__LOOKUP__CACHE_TTL=60
    ///
    /// 显式指定的路径必须存在；未指定时 `config.toml` 可选。
    pub fn load(path: Option<&str>) -> Result<Self> {
        use config::{Config, Environment, File};

        let (path, required) = match path {
            Some(p) => (p, true),
            None => (DEFAULT_CONFIG_PATH, false),
        };

        let settings = Config::builder()
            .add_source(File::with_name(path).required(required))
            .add_source(
                Environment::with_prefix("GEO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config = settings.try_deserialize::<StaticConfig>()?;
        if std::path::Path::new(path).exists() {
            eprintln!("[INFO] Configuration loaded from: {}", path);
        }
        Ok(config)
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(GeoLookupError::from)
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            lookup: LookupConfig::default(),
            ip_headers: default_ip_headers(),
            providers: default_providers(),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 查询引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// 上游请求默认超时（毫秒），provider 可单独覆盖
    #[serde(default = "default_timeout_ms")]
    pub default_timeout: u64,
    /// 所有 provider 都失败后额外重试的轮数
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    /// 两轮之间的等待时间（毫秒）
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff: u64,
    /// 查询结果缓存时间（秒）
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: u64,
    /// 缓存最大条目数，0 表示不限制
    ///
    /// 并发写入时可能短暂超出，下一次写入会裁回上限。
    #[serde(default)]
    pub cache_max_entries: usize,
    #[serde(default)]
    pub load_balance_strategy: LoadBalanceStrategy,
    /// 返回给调用方的标准字段白名单，为空时保留全部映射字段
    #[serde(default = "default_response_fields")]
    pub response_fields: Vec<String>,
}

/// 上游 provider 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    /// 请求地址模板，使用 `{ip}` 作为占位符
    pub url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// 单个时间窗口内允许的最大请求数
    pub max_requests: u32,
    /// 时间窗口长度（秒）
    pub time_window: u64,
    /// 覆盖全局超时（毫秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// 标准字段 → provider 响应路径，逗号分隔表示拼接多个字段
    #[serde(default)]
    pub field_mapping: BTreeMap<String, String>,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    100
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_enabled() -> bool {
    true
}

fn default_response_fields() -> Vec<String> {
    ["ip", "country", "region", "city", "isp", "location"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_ip_headers() -> Vec<IpHeader> {
    vec![
        IpHeader::new("x-forwarded-for", 1),
        IpHeader::new("x-real-ip", 2),
    ]
}

fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            name: "ip-api".to_string(),
            url: "http://ip-api.com/json/{ip}?lang=zh-CN".to_string(),
            enabled: true,
            max_requests: 45,
            time_window: 60,
            timeout: None,
            field_mapping: mapping(&[
                ("ip", "query"),
                ("country", "country"),
                ("region", "regionName"),
                ("city", "city"),
                ("isp", "isp"),
                ("location", "country,regionName,city"),
            ]),
        },
        ProviderConfig {
            name: "ipwho.is".to_string(),
            url: "https://ipwho.is/{ip}".to_string(),
            enabled: true,
            max_requests: 60,
            time_window: 60,
            timeout: None,
            field_mapping: mapping(&[
                ("ip", "ip"),
                ("country", "country"),
                ("region", "region"),
                ("city", "city"),
                ("isp", "connection.isp"),
                ("location", "country,region,city"),
            ]),
        },
        ProviderConfig {
            name: "ipapi.co".to_string(),
            url: "https://ipapi.co/{ip}/json/".to_string(),
            enabled: true,
            max_requests: 30,
            time_window: 60,
            timeout: None,
            field_mapping: mapping(&[
                ("ip", "ip"),
                ("country", "country_name"),
                ("region", "region"),
                ("city", "city"),
                ("isp", "org"),
                ("location", "country_name,region,city"),
            ]),
        },
    ]
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            default_timeout: default_timeout_ms(),
            retry_count: default_retry_count(),
            retry_backoff: default_retry_backoff_ms(),
            cache_ttl: default_cache_ttl(),
            cache_max_entries: 0,
            load_balance_strategy: LoadBalanceStrategy::default(),
            response_fields: default_response_fields(),
        }
    }
}
