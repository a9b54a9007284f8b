//! 客户端 IP 提取
//!
//! 按配置的请求头优先级查找客户端 IP，都没有时回退到连接地址。

use std::net::{IpAddr, SocketAddr};

#[cfg(feature = "server")]
use actix_web::HttpRequest;
use tracing::debug;

use crate::config::IpHeader;

/// 按优先级升序排列请求头（稳定排序，未设置优先级的按配置顺序排在最后）
pub fn ordered_headers(headers: &[IpHeader]) -> Vec<&IpHeader> {
    let mut ordered: Vec<&IpHeader> = headers.iter().collect();
    ordered.sort_by_key(|h| (h.priority.is_none(), h.priority.unwrap_or_default()));
    ordered
}

/// 取逗号分隔列表中第一个非空项
fn first_entry(value: &str) -> Option<&str> {
    value.split(',').map(str::trim).find(|s| !s.is_empty())
}

/// 规范化连接地址：去掉端口，IPv4 映射的 IPv6 地址还原为 IPv4
pub fn normalize_remote_addr(addr: &str) -> String {
    let ip = if let Ok(socket) = addr.parse::<SocketAddr>() {
        socket.ip()
    } else if let Ok(ip) = addr.parse::<IpAddr>() {
        ip
    } else {
        return addr.trim().to_string();
    };

    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        v4 => v4.to_string(),
    }
}

/// 提取客户端 IP
///
/// `lookup` 按小写请求头名返回请求头的值；`remote` 为连接地址。
/// 都取不到时返回空字符串。
pub fn extract_client_ip<F>(ip_headers: &[IpHeader], lookup: F, remote: Option<&str>) -> String
where
    F: Fn(&str) -> Option<String>,
{
    for header in ordered_headers(ip_headers) {
        let name = header.name.to_ascii_lowercase();
        if let Some(value) = lookup(&name)
            && let Some(ip) = first_entry(&value)
        {
            debug!("Client IP {} taken from header {}", ip, name);
            return ip.to_string();
        }
    }

    let ip = remote.map(normalize_remote_addr).unwrap_or_default();
    debug!("Client IP {:?} taken from remote address", ip);
    ip
}

/// actix-web 请求上的客户端 IP
#[cfg(feature = "server")]
pub fn client_ip_from_request(req: &HttpRequest, ip_headers: &[IpHeader]) -> String {
    let headers = req.headers();
    let remote = req.peer_addr().map(|addr| addr.to_string());
    extract_client_ip(
        ip_headers,
        |name| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        },
        remote.as_deref(),
    )
}
