use std::fmt;

/// 单个上游 provider 调用失败的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// 请求超过 provider 配置的超时时间
    Timeout,
    /// 上游返回非 2xx 状态码
    Status(u16),
    /// 连接、DNS、TLS 等网络层错误
    Network(String),
    /// 响应体不是合法 JSON
    Decode(String),
    /// 派发前 provider 已达到窗口上限或被禁用
    RateLimited,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::Timeout => write!(f, "request timed out"),
            ProviderErrorKind::Status(code) => write!(f, "upstream returned HTTP {}", code),
            ProviderErrorKind::Network(msg) => write!(f, "network error: {}", msg),
            ProviderErrorKind::Decode(msg) => write!(f, "invalid response body: {}", msg),
            ProviderErrorKind::RateLimited => write!(f, "request limit reached or provider disabled"),
        }
    }
}

/// 上游调用失败，携带 provider 名称和原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub provider: String,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new<T: Into<String>>(provider: T, kind: ProviderErrorKind) -> Self {
        Self {
            provider: provider.into(),
            kind,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider '{}': {}", self.provider, self.kind)
    }
}

impl std::error::Error for ProviderError {}

#[derive(Debug, Clone)]
pub enum GeoLookupError {
    Config(String),
    NoProviderAvailable,
    Provider(ProviderError),
    AllAttemptsFailed(ProviderError),
    FileOperation(String),
    Serialization(String),
}

impl GeoLookupError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            GeoLookupError::Config(_) => "E001",
            GeoLookupError::NoProviderAvailable => "E002",
            GeoLookupError::Provider(_) => "E003",
            GeoLookupError::AllAttemptsFailed(_) => "E004",
            GeoLookupError::FileOperation(_) => "E005",
            GeoLookupError::Serialization(_) => "E006",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            GeoLookupError::Config(_) => "Configuration Error",
            GeoLookupError::NoProviderAvailable => "No Provider Available",
            GeoLookupError::Provider(_) => "Provider Error",
            GeoLookupError::AllAttemptsFailed(_) => "All Attempts Failed",
            GeoLookupError::FileOperation(_) => "File Operation Error",
            GeoLookupError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> String {
        match self {
            GeoLookupError::Config(msg) => msg.clone(),
            GeoLookupError::NoProviderAvailable => {
                "all providers are disabled or have reached their request limit".to_string()
            }
            GeoLookupError::Provider(err) => err.to_string(),
            GeoLookupError::AllAttemptsFailed(last) => {
                format!("every provider failed, last error: {}", last)
            }
            GeoLookupError::FileOperation(msg) => msg.clone(),
            GeoLookupError::Serialization(msg) => msg.clone(),
        }
    }

    /// 最后一次上游失败（如果有）
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            GeoLookupError::Provider(err) | GeoLookupError::AllAttemptsFailed(err) => Some(err),
            _ => None,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    #[cfg(feature = "server")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for GeoLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GeoLookupError {}

// 便捷的构造函数
impl GeoLookupError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        GeoLookupError::Config(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        GeoLookupError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        GeoLookupError::Serialization(msg.into())
    }
}

impl From<ProviderError> for GeoLookupError {
    fn from(err: ProviderError) -> Self {
        GeoLookupError::Provider(err)
    }
}

impl From<std::io::Error> for GeoLookupError {
    fn from(err: std::io::Error) -> Self {
        GeoLookupError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for GeoLookupError {
    fn from(err: serde_json::Error) -> Self {
        GeoLookupError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for GeoLookupError {
    fn from(err: config::ConfigError) -> Self {
        GeoLookupError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for GeoLookupError {
    fn from(err: toml::ser::Error) -> Self {
        GeoLookupError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeoLookupError>;
