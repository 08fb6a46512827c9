//! TTL付きインメモリキャッシュ
//!
//! 期限切れエントリは読み出し時に削除する（バックグラウンド掃除なし）。

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// デフォルトTTL（1時間）
pub const DEFAULT_TTL: Duration = Duration::from_millis(3_600_000);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 値を保存（既存キーは上書き、期限は now + ttl にリセット）
    pub fn set(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.lock().insert(key.into(), entry);
    }

    /// 期限内の値を返す。期限切れならその場で削除して None
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        let expired = entries.get(key)?.is_expired(Instant::now());
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// 保持エントリ数（未削除の期限切れエントリも含む）
    pub fn size(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn test_set_then_get() {
        let cache = TtlCache::default();
        cache.set("search:melk:5", vec!["Halfvolle melk".to_string()]);

        assert_eq!(
            cache.get("search:melk:5"),
            Some(vec!["Halfvolle melk".to_string()])
        );
        assert!(cache.has("search:melk:5"));
        assert!(cache.get("search:kaas:5").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_last_set_wins() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("k", 1);
        cache.set("k", 2);

        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.size(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_after_ttl() {
        let cache = TtlCache::new(Duration::from_millis(100));
        cache.set("k", "v");

        // 境界ちょうどはまだ有効
        advance(Duration::from_millis(100)).await;
        assert_eq!(cache.get("k"), Some("v"));

        advance(Duration::from_millis(1)).await;
        assert!(cache.get("k").is_none());
        assert!(!cache.has("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_eviction_on_read() {
        let cache = TtlCache::new(Duration::from_millis(10));
        cache.set("a", 1);
        cache.set("b", 2);
        advance(Duration::from_millis(20)).await;

        // 読むまでは期限切れエントリも数に含まれる
        assert_eq!(cache.size(), 2);
        assert!(cache.get("a").is_none());
        assert_eq!(cache.size(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_resets_expiry() {
        let cache = TtlCache::new(Duration::from_millis(100));
        cache.set("k", 1);
        advance(Duration::from_millis(80)).await;
        cache.set("k", 2);
        advance(Duration::from_millis(80)).await;

        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn test_clear() {
        let cache = TtlCache::default();
        cache.set("a", 1);
        cache.set("b", 2);
        cache.clear();

        assert_eq!(cache.size(), 0);
        assert!(cache.get("a").is_none());
    }
}
