//! 固定窗口限流器
//!
//! 每个 provider 一个计数窗口：窗口过期后清零重开，未过期时计数必须严格小于上限。
//! 检查与计数放在同一把锁里完成，避免并发查询在"检查可用"和"占用额度"之间
//! 共同突破上限。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use super::registry::{Provider, ProviderRegistry};

/// 单个 provider 的计数窗口
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    started_at: Instant,
}

impl RateWindow {
    fn new(now: Instant) -> Self {
        Self {
            count: 0,
            started_at: now,
        }
    }

    /// 窗口已过期则重置，然后判断是否还有额度
    fn check(&mut self, provider: &Provider, now: Instant) -> bool {
        if !provider.enabled {
            return false;
        }
        if now.duration_since(self.started_at) > provider.window {
            *self = Self::new(now);
            return true;
        }
        self.count < provider.max_requests
    }
}

/// provider 当前窗口的使用情况
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowUsage {
    pub count: u32,
    pub elapsed: Duration,
    pub remaining: Duration,
    pub available: bool,
}

/// 所有 provider 的窗口都由这里持有，查询编排层不直接访问计数
pub struct RateLimiter {
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl RateLimiter {
    /// 为注册表中的每个 provider 开启一个新窗口
    pub fn new(registry: &ProviderRegistry) -> Self {
        let now = Instant::now();
        let windows = registry
            .iter()
            .map(|p| (p.name.clone(), RateWindow::new(now)))
            .collect();
        Self {
            windows: Mutex::new(windows),
        }
    }

    /// provider 是否可用（启用且未达到窗口上限）
    ///
    /// 副作用：窗口过期时会被重置。发请求前请用 `try_acquire`，
    /// 它在同一把锁内完成检查和计数。
    pub fn is_available(&self, provider: &Provider) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        windows
            .entry(provider.name.clone())
            .or_insert_with(|| RateWindow::new(now))
            .check(provider, now)
    }

    /// 记录一次即将发出的请求，不做检查
    ///
    /// 查询路径使用 `try_acquire`。
    pub fn record_attempt(&self, provider: &Provider) {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        let window = windows
            .entry(provider.name.clone())
            .or_insert_with(|| RateWindow::new(now));
        window.count = window.count.saturating_add(1);
        debug!(
            "GeoIP: provider '{}' request count {}/{}",
            provider.name, window.count, provider.max_requests
        );
    }

    /// 检查并占用一次额度（同一把锁内完成）
    ///
    /// 返回 false 表示 provider 此刻不可用，计数不变。
    pub fn try_acquire(&self, provider: &Provider) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        let window = windows
            .entry(provider.name.clone())
            .or_insert_with(|| RateWindow::new(now));

        if !window.check(provider, now) {
            return false;
        }
        window.count = window.count.saturating_add(1);
        debug!(
            "GeoIP: provider '{}' request count {}/{}",
            provider.name, window.count, provider.max_requests
        );
        true
    }

    /// 当前可用的 provider，保持注册表顺序
    pub fn available_providers(&self, registry: &ProviderRegistry) -> Vec<Arc<Provider>> {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        registry
            .iter()
            .filter(|p| {
                windows
                    .entry(p.name.clone())
                    .or_insert_with(|| RateWindow::new(now))
                    .check(p, now)
            })
            .cloned()
            .collect()
    }

    /// 当前窗口内的请求数（不触发窗口重置）
    pub fn current_count(&self, provider: &Provider) -> u32 {
        self.windows
            .lock()
            .get(&provider.name)
            .map(|w| w.count)
            .unwrap_or(0)
    }

    /// 当前窗口的使用详情，供状态接口展示
    pub fn usage(&self, provider: &Provider) -> WindowUsage {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        let window = windows
            .entry(provider.name.clone())
            .or_insert_with(|| RateWindow::new(now));
        let available = window.check(provider, now);
        let elapsed = now.duration_since(window.started_at);

        WindowUsage {
            count: window.count,
            elapsed,
            remaining: provider.window.saturating_sub(elapsed),
            available,
        }
    }

    #[cfg(test)]
    fn rewind(&self, provider: &str, by: Duration) {
        let mut windows = self.windows.lock();
        if let Some(w) = windows.get_mut(provider)
            && let Some(earlier) = w.started_at.checked_sub(by)
        {
            w.started_at = earlier;
        }
    }
}
