//! TTL cache with per-key single-flight
//!
//! Each key owns a slot guarded by an async mutex. A caller holds the slot
//! for the whole check-fetch-store sequence, so concurrent lookups for the
//! same key wait for the first fetch instead of issuing their own.
//!
//! Guarantees:
//! - An entry is fresh while `age <= ttl` and is never returned afterwards
//! - A failed fetch stores nothing; an empty slot nobody waits on is dropped
//! - Dropping a caller mid-fetch releases the slot without writing

use crate::cache::clock::{Clock, SystemClock};
use crate::errors::Result;
use crate::fetch::{RawRecord, SeriesRequest};
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Default time-to-live (1 hour)
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Cache of raw fetch results keyed by request
pub type SeriesCache = TtlCache<SeriesRequest, Arc<Vec<RawRecord>>>;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
}

type Slot<V> = Arc<tokio::sync::Mutex<Option<Entry<V>>>>;

/// Generic TTL cache
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Cache with the default TTL and the system clock
    pub fn new() -> Self {
        Self::with_clock(DEFAULT_TTL, Arc::new(SystemClock))
    }

    /// Cache with an explicit TTL and clock
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Default TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value for `key`, or run `fetch_fn` and store its result
    pub async fn get_or_fetch<F, Fut>(&self, key: &K, fetch_fn: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        self.get_or_fetch_with_ttl(key, self.ttl, fetch_fn).await
    }

    /// Same as `get_or_fetch` with a per-call TTL
    pub async fn get_or_fetch_with_ttl<F, Fut>(&self, key: &K, ttl: Duration, fetch_fn: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let slot = self.slot(key);
        let mut guard = slot.lock().await;

        if let Some(entry) = guard.as_ref() {
            if self.is_fresh(entry, ttl) {
                trace!(?key, "cache hit");
                return Ok(entry.value.clone());
            }
            debug!(?key, "cache entry expired");
        } else {
            debug!(?key, "cache miss");
        }

        let value = match fetch_fn().await {
            Ok(value) => value,
            Err(e) => {
                if guard.is_none() {
                    self.release_empty(key, &slot);
                }
                return Err(e);
            }
        };
        *guard = Some(Entry {
            value: value.clone(),
            stored_at: self.clock.now(),
        });
        Ok(value)
    }

    /// Number of stored values (fresh or stale)
    pub async fn len(&self) -> usize {
        let mut count = 0;
        for slot in self.snapshot() {
            if slot.lock().await.is_some() {
                count += 1;
            }
        }
        count
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove slots whose entry has expired under the default TTL.
    ///
    /// Slots with a fetch in flight are left alone.
    pub fn purge_expired(&self) -> usize {
        let mut slots = self.lock_slots();
        let before = slots.len();
        slots.retain(|_, slot| match slot.try_lock() {
            Ok(entry) => entry.as_ref().map_or(false, |e| self.is_fresh(e, self.ttl)),
            Err(_) => true,
        });
        before - slots.len()
    }

    /// Forget a slot left empty by a failed fetch, unless another caller holds it
    fn release_empty(&self, key: &K, slot: &Slot<V>) {
        let mut slots = self.lock_slots();
        let current = slots.get(key).map_or(false, |held| Arc::ptr_eq(held, slot));
        // one reference in the map, one here
        if current && Arc::strong_count(slot) == 2 {
            slots.remove(key);
        }
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.lock_slots().len()
    }

    fn is_fresh(&self, entry: &Entry<V>, ttl: Duration) -> bool {
        self.clock.now().saturating_duration_since(entry.stored_at) <= ttl
    }

    fn slot(&self, key: &K) -> Slot<V> {
        self.lock_slots().entry(key.clone()).or_default().clone()
    }

    fn snapshot(&self) -> Vec<Slot<V>> {
        self.lock_slots().values().cloned().collect()
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<K, Slot<V>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::errors::MonitorError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn cache_with_clock(ttl_secs: u64) -> (TtlCache<String, u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::with_clock(Duration::from_secs(ttl_secs), clock.clone());
        (cache, clock)
    }

    #[tokio::test]
    async fn test_hit_within_ttl_skips_fetch() {
        let (cache, clock) = cache_with_clock(60);
        let calls = AtomicU32::new(0);
        let key = "k".to_string();

        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        };
        assert_eq!(cache.get_or_fetch(&key, fetch).await, Ok(7));

        clock.advance(Duration::from_secs(60));
        let value = cache
            .get_or_fetch(&key, || async { Ok::<u32, MonitorError>(99) })
            .await;
        assert_eq!(value, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let (cache, clock) = cache_with_clock(60);
        let key = "k".to_string();

        cache.get_or_fetch(&key, || async { Ok(1) }).await.unwrap();
        clock.advance(Duration::from_secs(60) + Duration::from_millis(1));

        let value = cache.get_or_fetch(&key, || async { Ok(2) }).await;
        assert_eq!(value, Ok(2));
    }

    #[tokio::test]
    async fn test_failed_fetch_does_not_poison() {
        let (cache, clock) = cache_with_clock(60);
        let key = "k".to_string();

        let err = cache
            .get_or_fetch(&key, || async {
                Err::<u32, _>(MonitorError::NetworkError("down".to_string()))
            })
            .await;
        assert!(err.is_err());
        assert_eq!(cache.len().await, 0);

        cache.get_or_fetch(&key, || async { Ok(5) }).await.unwrap();
        clock.advance(Duration::from_secs(61));

        // refresh fails: old stale value must not be served
        let err = cache
            .get_or_fetch(&key, || async {
                Err::<u32, _>(MonitorError::RateLimited { retry_after_secs: None })
            })
            .await;
        assert_eq!(err, Err(MonitorError::RateLimited { retry_after_secs: None }));
    }

    #[tokio::test]
    async fn test_failed_fetches_do_not_accumulate_slots() {
        let (cache, _clock) = cache_with_clock(60);

        for i in 0..20 {
            let key = format!("k{}", i);
            let result = cache
                .get_or_fetch(&key, || async {
                    Err::<u32, _>(MonitorError::NetworkError("down".to_string()))
                })
                .await;
            assert!(result.is_err());
        }
        assert_eq!(cache.slot_count(), 0);

        cache.get_or_fetch(&"ok".to_string(), || async { Ok(1) }).await.unwrap();
        assert_eq!(cache.slot_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_slot_for_waiters() {
        let cache: Arc<TtlCache<String, u32>> = Arc::new(TtlCache::new());
        let calls = Arc::new(AtomicU32::new(0));

        let first = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch(&"k".to_string(), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(40)).await;
                        Err::<u32, _>(MonitorError::NetworkError("down".to_string()))
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let second = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch(&"k".to_string(), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(3)
                    })
                    .await
            })
        };

        assert!(first.await.unwrap().is_err());
        assert_eq!(second.await.unwrap(), Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get_or_fetch(&"k".to_string(), || async { Ok(9) }).await, Ok(3));
    }

    #[tokio::test]
    async fn test_per_call_ttl() {
        let (cache, clock) = cache_with_clock(3600);
        let key = "k".to_string();

        cache.get_or_fetch(&key, || async { Ok(1) }).await.unwrap();
        clock.advance(Duration::from_secs(10));

        let short = cache
            .get_or_fetch_with_ttl(&key, Duration::from_secs(5), || async { Ok(2) })
            .await;
        assert_eq!(short, Ok(2));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (cache, clock) = cache_with_clock(60);
        let old = "old".to_string();
        let new = "new".to_string();

        cache.get_or_fetch(&old, || async { Ok(1) }).await.unwrap();
        clock.advance(Duration::from_secs(45));
        cache.get_or_fetch(&new, || async { Ok(2) }).await.unwrap();
        clock.advance(Duration::from_secs(30));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_single_flight() {
        let cache: Arc<TtlCache<String, u32>> = Arc::new(TtlCache::new());
        let calls = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                let key = "shared".to_string();
                let result = cache
                    .get_or_fetch(&key, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(42)
                    })
                    .await;
                result
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
