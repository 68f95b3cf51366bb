//! 엔트리별 TTL을 갖는 범용 키-값 캐시.
//!
//! 만료는 `get` 시점에 지연 검사되며, 만료된 엔트리는 그 자리에서
//! 제거됩니다 (별도 백그라운드 스위퍼 불필요). 한 번 조회되고 다시
//! 요청되지 않는 키의 메모리를 회수하려면 `purge_expired`를 주기적으로
//! 호출할 수 있습니다.
//!
//! 모든 티어가 하나의 인스턴스를 공유하며, 티어 구분은 키 네임스페이스
//! (`{tier}:{time_bucket}`)로 이뤄집니다.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, trace};

/// 캐시 엔트리.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// `now - stored_at < ttl`인 동안에만 유효합니다.
    fn is_valid(&self) -> bool {
        self.stored_at.elapsed() < self.ttl
    }
}

/// 엔트리별 TTL을 갖는 인메모리 캐시.
///
/// 값은 저장 시점에 통째로 소유되며, 갱신은 제자리 수정이 아니라
/// 엔트리 교체로만 일어납니다.
#[derive(Debug)]
pub struct TierCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> Default for TierCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TierCache<V> {
    /// 빈 캐시를 생성합니다.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone> TierCache<V> {
    /// 키 조회. 미스는 오류가 아니라 정상적인 결과입니다.
    ///
    /// 만료된 엔트리는 미스로 동작하며 이 시점에 제거됩니다.
    pub async fn get(&self, key: &str) -> Option<V> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_valid() => return Some(entry.value.clone()),
                None => return None,
                Some(_) => {} // 만료 - 아래에서 쓰기 락으로 제거
            }
        }

        let mut entries = self.entries.write().await;
        // 락 전환 사이에 다른 태스크가 같은 키를 갱신했을 수 있음
        if let Some(entry) = entries.get(key) {
            if entry.is_valid() {
                return Some(entry.value.clone());
            }
        }
        entries.remove(key);
        trace!(key = %key, "만료 엔트리 제거");
        None
    }

    /// 무조건 덮어쓰기 저장.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        debug!(key = %key, ttl_secs = ttl.as_secs(), "캐시 저장");
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// 엔트리 조기 제거 (강제 갱신용).
    pub async fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }

    /// 만료된 엔트리를 일괄 제거하고 제거된 개수를 반환합니다.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid());
        before - entries.len()
    }

    /// 현재 엔트리 수 (만료 여부 무관).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// 캐시가 비어 있는지 확인합니다.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_roundtrip() {
        let cache: TierCache<String> = TierCache::new();
        assert!(cache.get("k").await.is_none());

        cache.set("k", "v1".to_string(), Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v1"));

        // 무조건 덮어쓰기
        cache.set("k", "v2".to_string(), Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_boundary() {
        let cache: TierCache<u32> = TierCache::new();
        cache.set("k", 7, Duration::from_secs(60)).await;

        // ttl - ε: 적중
        tokio::time::advance(Duration::from_millis(59_900)).await;
        assert_eq!(cache.get("k").await, Some(7));

        // ttl + ε: 미스, 엔트리는 그 자리에서 제거됨
        tokio::time::advance(Duration::from_millis(200)).await;
        assert_eq!(cache.get("k").await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache: TierCache<u32> = TierCache::new();
        cache.set("k", 1, Duration::from_secs(60)).await;
        cache.invalidate("k").await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache: TierCache<u32> = TierCache::new();
        cache.set("short", 1, Duration::from_secs(10)).await;
        cache.set("long", 2, Duration::from_secs(100)).await;

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.get("long").await, Some(2));
    }
}
