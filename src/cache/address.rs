//! Owner lookup cache for the address registry

use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

/// Caches `address -> owner address` for registry hits.
///
/// Misses are never cached: an address can be provisioned after a webhook for
/// it was seen, and a stale negative would drop the next deposit. Hits are
/// safe to keep because registry rows are never updated or deleted.
#[derive(Clone)]
pub struct OwnerCache {
    cache: Cache<String, String>,
}

impl OwnerCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, address: &str) -> Option<String> {
        let owner = self.cache.get(address).await;
        if owner.is_some() {
            debug!("Owner cache hit for {}", address);
        }
        owner
    }

    pub async fn insert(&self, address: &str, owner: &str) {
        self.cache.insert(address.to_string(), owner.to_string()).await;
        debug!("Cached owner {} for {}", owner, address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hit_and_miss() {
        let cache = OwnerCache::new(10, Duration::from_secs(60));
        assert_eq!(cache.get("0xsmart").await, None);

        cache.insert("0xsmart", "0xowner").await;
        assert_eq!(cache.get("0xsmart").await.as_deref(), Some("0xowner"));
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let cache = OwnerCache::new(10, Duration::from_millis(100));
        cache.insert("0xabc", "0xabc").await;
        assert!(cache.get("0xabc").await.is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(cache.get("0xabc").await.is_none(), "entry should expire after TTL");
    }
}
