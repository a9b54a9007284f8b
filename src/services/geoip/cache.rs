//! 查询结果缓存
//!
//! 按 IP 缓存成功结果，读取时惰性过期。每个 key 独立读写，后写覆盖先写。

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, trace};

use super::types::{CacheItem, CacheSnapshot, LookupResult};

#[derive(Debug, Clone)]
struct CacheEntry {
    result: LookupResult,
    written_at: Instant,
}

impl CacheEntry {
    fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.written_at)
    }
}

pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl ResponseCache {
    /// `max_entries` 为 0 时不限制条数
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// 取未过期的结果；过期条目会被删除
    pub fn get(&self, ip: &str) -> Option<LookupResult> {
        let now = Instant::now();
        {
            let entry = self.entries.get(ip)?;
            if entry.age(now) < self.ttl {
                trace!("GeoIP cache hit for {}", ip);
                return Some(entry.result.clone());
            }
        }

        // 读锁释放后再删，且只删仍然过期的那条（期间可能被重新写入）
        self.entries
            .remove_if(ip, |_, entry| entry.age(now) >= self.ttl);
        debug!("GeoIP cache entry for {} expired", ip);
        None
    }

    /// 写入结果，已存在则覆盖并刷新时间
    ///
    /// 有上限时先插入再裁剪。并发写入下条数可能短暂超过上限，
    /// 随后的写入会把它裁回去。
    pub fn put(&self, ip: &str, result: LookupResult) {
        self.entries.insert(
            ip.to_string(),
            CacheEntry {
                result,
                written_at: Instant::now(),
            },
        );

        if self.max_entries > 0 && self.entries.len() > self.max_entries {
            self.trim();
        }
    }

    /// 清空缓存，返回删除的条数
    pub fn clear(&self) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, _| {
            removed += 1;
            false
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        let now = Instant::now();
        let ttl_secs = self.ttl.as_secs();
        let mut items: Vec<CacheItem> = self
            .entries
            .iter()
            .map(|kv| {
                let age = kv.value().age(now).as_secs();
                CacheItem {
                    ip: kv.key().clone(),
                    source: kv.value().result.source.clone(),
                    age,
                    expires_in: ttl_secs.saturating_sub(age),
                }
            })
            .collect();
        items.sort_by(|a, b| a.ip.cmp(&b.ip));

        CacheSnapshot {
            ttl: ttl_secs,
            size: items.len(),
            items,
        }
    }

    /// 超出容量：先清过期条目，仍超出则按写入时间从早到晚淘汰
    fn trim(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.age(now) < self.ttl);

        while self.entries.len() > self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|kv| kv.value().written_at)
                .map(|kv| kv.key().clone());
            let Some(ip) = oldest else {
                break;
            };
            self.entries.remove(&ip);
            debug!("GeoIP cache full, evicted {}", ip);
        }
    }

    #[cfg(test)]
    fn backdate(&self, ip: &str, by: Duration) {
        if let Some(mut entry) = self.entries.get_mut(ip)
            && let Some(earlier) = entry.written_at.checked_sub(by)
        {
            entry.written_at = earlier;
        }
    }
}
