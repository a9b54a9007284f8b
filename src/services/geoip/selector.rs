//! 负载均衡选择器

use std::sync::Arc;

use parking_lot::Mutex;

use super::rate_limiter::RateLimiter;
use super::registry::Provider;
use crate::config::LoadBalanceStrategy;

/// 每次尝试从候选 provider 中选出一个
///
/// 轮询游标是进程级的，所有并发查询共享，而不是按 IP 区分。
pub struct Selector {
    strategy: LoadBalanceStrategy,
    cursor: Mutex<Option<usize>>,
}

impl Selector {
    pub fn new(strategy: LoadBalanceStrategy) -> Self {
        Self {
            strategy,
            cursor: Mutex::new(None),
        }
    }

    pub fn strategy(&self) -> LoadBalanceStrategy {
        self.strategy
    }

    /// 选出下一个 provider，候选为空时返回 None
    pub fn select_next(
        &self,
        candidates: &[Arc<Provider>],
        limiter: &RateLimiter,
    ) -> Option<Arc<Provider>> {
        match candidates.len() {
            0 => return None,
            1 => return Some(candidates[0].clone()),
            _ => {}
        }

        let index = match self.strategy {
            LoadBalanceStrategy::RoundRobin => self.advance_cursor(candidates.len()),
            LoadBalanceStrategy::Random => rand::random_range(0..candidates.len()),
            LoadBalanceStrategy::LeastUsed => least_used_index(candidates, limiter),
        };
        candidates.get(index).cloned()
    }

    fn advance_cursor(&self, len: usize) -> usize {
        let mut cursor = self.cursor.lock();
        let next = cursor.map_or(0, |c| (c + 1) % len);
        *cursor = Some(next);
        next
    }
}

/// 计数最小者胜出，计数相同取靠前的
fn least_used_index(candidates: &[Arc<Provider>], limiter: &RateLimiter) -> usize {
    let mut best = 0;
    let mut best_count = limiter.current_count(&candidates[0]);
    for (i, p) in candidates.iter().enumerate().skip(1) {
        let count = limiter.current_count(p);
        if count < best_count {
            best = i;
            best_count = count;
        }
    }
    best
}
