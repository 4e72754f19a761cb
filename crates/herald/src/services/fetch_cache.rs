//! Fetch Cache - single-flight, TTL-expiring cache for remote resources
//!
//! Concurrent `get` calls for the same key share one in-flight fetch. Results
//! are kept for a TTL; failures are not cached, so the next `get` retries.
//! Expired values are pruned on every insert, and past `max_entries` the
//! value closest to expiry is evicted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::ports::ResourceFetcher;

type PendingFetch<T> = Shared<BoxFuture<'static, Option<T>>>;

/// Fetch cache configuration
#[derive(Debug, Clone)]
pub struct FetchCacheConfig {
    /// How long a fetched value stays fresh
    pub ttl: Duration,
    /// Upper bound on one remote fetch
    pub fetch_timeout: Duration,
    /// Upper bound on cached values plus in-flight fetches
    pub max_entries: usize,
}

impl Default for FetchCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(12 * 60 * 60), // 12 hours
            fetch_timeout: Duration::from_secs(10),
            max_entries: 256,
        }
    }
}

enum Slot<T> {
    Ready {
        value: T,
        expires_at: Instant,
    },
    Pending {
        generation: u64,
        fetch: PendingFetch<T>,
    },
}

struct Inner<F: ResourceFetcher> {
    fetcher: F,
    config: FetchCacheConfig,
    entries: Mutex<HashMap<String, Slot<F::Output>>>,
    next_generation: AtomicU64,
}

impl<F: ResourceFetcher> Inner<F> {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Slot<F::Output>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop expired values, then evict the soonest-expiring values until at
    /// most `limit` slots remain. In-flight fetches are never evicted.
    fn prune(&self, entries: &mut HashMap<String, Slot<F::Output>>, limit: usize) {
        let now = Instant::now();
        entries.retain(|_, slot| !matches!(slot, Slot::Ready { expires_at, .. } if *expires_at <= now));

        while entries.len() > limit {
            let victim = entries
                .iter()
                .filter_map(|(key, slot)| match slot {
                    Slot::Ready { expires_at, .. } => Some((*expires_at, key)),
                    Slot::Pending { .. } => None,
                })
                .min_by_key(|(expires_at, _)| *expires_at)
                .map(|(_, key)| key.clone());
            let Some(key) = victim else {
                break;
            };
            debug!(key = %key, "Evicting cached resource");
            entries.remove(&key);
        }
    }

    fn start(self: Arc<Self>, key: String, generation: u64) -> PendingFetch<F::Output> {
        async move {
            debug!(key = %key, "Fetching remote resource");
            let value =
                match tokio::time::timeout(self.config.fetch_timeout, self.fetcher.fetch(&key))
                    .await
                {
                    Ok(Ok(value)) => Some(value),
                    Ok(Err(e)) => {
                        warn!(key = %key, error = %e, "Remote fetch failed");
                        None
                    }
                    Err(_) => {
                        warn!(key = %key, timeout = ?self.config.fetch_timeout, "Remote fetch timed out");
                        None
                    }
                };
            self.complete(&key, generation, value.clone());
            value
        }
        .boxed()
        .shared()
    }

    fn complete(&self, key: &str, generation: u64, value: Option<F::Output>) {
        let mut entries = self.entries();
        // The slot may have been cleared or replaced while the fetch ran
        let owned = matches!(
            entries.get(key),
            Some(Slot::Pending { generation: g, .. }) if *g == generation
        );
        if !owned {
            return;
        }
        match value {
            Some(value) => {
                let expires_at = Instant::now() + self.config.ttl;
                entries.insert(key.to_string(), Slot::Ready { value, expires_at });
                self.prune(&mut entries, self.config.max_entries.max(1));
            }
            None => {
                entries.remove(key);
            }
        }
    }
}

pub struct FetchDedupCache<F: ResourceFetcher> {
    inner: Arc<Inner<F>>,
}

impl<F: ResourceFetcher> FetchDedupCache<F> {
    pub fn new(fetcher: F, config: FetchCacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                config,
                entries: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Fresh cached value, or the result of the (shared) fetch.
    /// `None` when the fetch fails or times out.
    pub async fn get(&self, key: &str) -> Option<F::Output> {
        let fetch = {
            let mut entries = self.inner.entries();
            match entries.get(key) {
                Some(Slot::Ready { value, expires_at }) if Instant::now() < *expires_at => {
                    return Some(value.clone());
                }
                Some(Slot::Pending { fetch, .. }) => fetch.clone(),
                _ => {
                    // Room for the new in-flight slot
                    let limit = self.inner.config.max_entries.max(1) - 1;
                    self.inner.prune(&mut entries, limit);
                    let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
                    let fetch = self.inner.clone().start(key.to_string(), generation);
                    entries.insert(
                        key.to_string(),
                        Slot::Pending {
                            generation,
                            fetch: fetch.clone(),
                        },
                    );
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Number of fresh cached values
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .entries()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready { expires_at, .. } if now < *expires_at))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.inner.entries().len()
    }

    /// Drop every cached value and forget in-flight fetches.
    pub fn clear(&self) {
        let dropped = {
            let mut entries = self.inner.entries();
            std::mem::take(&mut *entries)
        };
        debug!(entries = dropped.len(), "Fetch cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::RelayError;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct CountingFetcher {
        calls: Arc<AtomicUsize>,
        delay: Duration,
        fail: bool,
    }

    impl CountingFetcher {
        fn new(delay: Duration) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: calls.clone(),
                    delay,
                    fail: false,
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl ResourceFetcher for CountingFetcher {
        type Output = String;

        async fn fetch(&self, key: &str) -> Result<String, RelayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(RelayError::TransientFetch(format!("{key} unreachable")));
            }
            Ok(format!("value:{key}"))
        }
    }

    fn config(ttl_secs: u64) -> FetchCacheConfig {
        FetchCacheConfig {
            ttl: Duration::from_secs(ttl_secs),
            fetch_timeout: Duration::from_secs(10),
            max_entries: 256,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_gets_share_one_fetch() {
        let (fetcher, calls) = CountingFetcher::new(Duration::from_millis(50));
        let cache = Arc::new(FetchDedupCache::new(fetcher, config(3600)));

        let gets = (0..10).map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get("url1").await })
        });
        let results = futures::future::join_all(gets).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap().as_deref(), Some("value:url1"));
        }
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_refetched() {
        let (fetcher, calls) = CountingFetcher::new(Duration::ZERO);
        let cache = FetchDedupCache::new(fetcher, config(60));

        assert!(cache.get("avatar").await.is_some());
        assert!(cache.get("avatar").await.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.is_empty());
        assert!(cache.get("avatar").await.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_not_cached() {
        let (mut fetcher, calls) = CountingFetcher::new(Duration::ZERO);
        fetcher.fail = true;
        let cache = FetchDedupCache::new(fetcher, config(60));

        assert_eq!(cache.get("broken").await, None);
        assert_eq!(cache.get("broken").await, None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_fetch_times_out() {
        let (fetcher, calls) = CountingFetcher::new(Duration::from_secs(3600));
        let cache = FetchDedupCache::new(fetcher, config(60));

        assert_eq!(cache.get("slow").await, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_drops_values() {
        let (fetcher, calls) = CountingFetcher::new(Duration::ZERO);
        let cache = FetchDedupCache::new(fetcher, config(60));

        assert!(cache.get("a").await.is_some());
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("a").await.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_values_are_pruned_on_insert() {
        let (fetcher, _) = CountingFetcher::new(Duration::ZERO);
        let cache = FetchDedupCache::new(
            fetcher,
            FetchCacheConfig {
                max_entries: 2000,
                ..config(60)
            },
        );

        for i in 0..1000 {
            let key = format!("https://cdn.discordapp.com/a.png?size={i}");
            assert!(cache.get(&key).await.is_some());
        }
        assert_eq!(cache.slot_count(), 1000);

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(cache.get("https://cdn.discordapp.com/b.png").await.is_some());
        assert_eq!(cache.slot_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_soonest_expiring() {
        let (fetcher, calls) = CountingFetcher::new(Duration::ZERO);
        let cache = FetchDedupCache::new(
            fetcher,
            FetchCacheConfig {
                max_entries: 3,
                ..config(60)
            },
        );

        for key in ["a", "b", "c", "d", "e"] {
            assert!(cache.get(key).await.is_some());
            tokio::time::advance(Duration::from_secs(1)).await;
        }
        assert_eq!(cache.slot_count(), 3);

        // "c".."e" survive; "a" was evicted and is fetched again
        assert!(cache.get("e").await.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(cache.get("a").await.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert!(cache.slot_count() <= 3);
    }
}
