//! 配置类型定义模块
//!
//! 定义负载均衡策略、IP 请求头等配置中使用的枚举与值类型。

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumMessage, IntoEnumIterator};

/// 负载均衡策略
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    EnumIter,
    AsRefStr,
    EnumMessage,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LoadBalanceStrategy {
    #[default]
    #[strum(message = "Global cursor rotating over the available providers")]
    RoundRobin,
    #[strum(message = "Uniform random pick among the available providers")]
    Random,
    #[strum(message = "Provider with the lowest request count in its current window")]
    LeastUsed,
}

impl LoadBalanceStrategy {
    /// 所有可选策略名称，按声明顺序
    pub fn names() -> Vec<&'static str> {
        Self::iter().map(|s| s.as_str()).collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoundRobin => "round_robin",
            Self::Random => "random",
            Self::LeastUsed => "least_used",
        }
    }

    pub fn description(&self) -> &'static str {
        self.get_message().unwrap_or("")
    }
}

impl std::fmt::Display for LoadBalanceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoadBalanceStrategy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "round_robin" => Ok(Self::RoundRobin),
            "random" => Ok(Self::Random),
            "least_used" => Ok(Self::LeastUsed),
            _ => Err(format!(
                "Invalid load balance strategy: '{}'. Valid: {}",
                s,
                Self::names().join(", ")
            )),
        }
    }
}

/// 可信的客户端 IP 请求头
///
/// 配置中既可以写成纯字符串 `"x-real-ip"`，也可以写成
/// `{ name = "x-forwarded-for", priority = 1 }`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IpHeaderRepr")]
pub struct IpHeader {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl IpHeader {
    pub fn new<T: Into<String>>(name: T, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority: Some(priority),
        }
    }

    /// 不带优先级，排在所有带优先级的请求头之后
    pub fn named<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            priority: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IpHeaderRepr {
    Name(String),
    Prioritized {
        name: String,
        #[serde(default)]
        priority: Option<i32>,
    },
}

impl From<IpHeaderRepr> for IpHeader {
    fn from(repr: IpHeaderRepr) -> Self {
        match repr {
            IpHeaderRepr::Name(name) => Self::named(name),
            IpHeaderRepr::Prioritized { name, priority } => Self { name, priority },
        }
    }
}
