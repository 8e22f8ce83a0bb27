//! Time-to-live cache for slow static queries.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
}

/// Caches values per key and refreshes them once they are older than a TTL.
///
/// A failed refresh keeps the previous value; a key that has never been
/// fetched successfully reads as `None`.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use powerwatch::system::TtlCache;
///
/// let mut cache = TtlCache::new();
/// let ttl = Duration::from_secs(300);
/// assert_eq!(cache.get_or_refresh("gpu_cores", ttl, || Some(10)), Some(10));
/// // Within the TTL the fetch function is not consulted.
/// assert_eq!(cache.get_or_refresh("gpu_cores", ttl, || Some(99)), Some(10));
/// ```
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + std::fmt::Debug,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, calling `fetch` first if the entry
    /// is missing or older than `ttl`.
    pub fn get_or_refresh<F>(&mut self, key: K, ttl: Duration, fetch: F) -> Option<V>
    where
        F: FnOnce() -> Option<V>,
    {
        self.get_or_refresh_at(key, ttl, Instant::now(), fetch)
    }

    /// Same as [`get_or_refresh`](Self::get_or_refresh) with an explicit clock.
    pub fn get_or_refresh_at<F>(
        &mut self,
        key: K,
        ttl: Duration,
        now: Instant,
        fetch: F,
    ) -> Option<V>
    where
        F: FnOnce() -> Option<V>,
    {
        let stale = match self.entries.get(&key) {
            None => true,
            Some(entry) => now.saturating_duration_since(entry.fetched_at) > ttl,
        };

        if stale {
            match fetch() {
                Some(value) => {
                    debug!(?key, "static info refreshed");
                    self.entries.insert(
                        key,
                        CacheEntry {
                            value: value.clone(),
                            fetched_at: now,
                        },
                    );
                    return Some(value);
                }
                None => warn!(?key, "static info refresh failed, keeping previous value"),
            }
        }

        self.entries.get(&key).map(|entry| entry.value.clone())
    }

    #[cfg(test)]
    fn age(&self, key: &K, now: Instant) -> Option<Duration> {
        self.entries
            .get(key)
            .map(|entry| now.saturating_duration_since(entry.fetched_at))
    }
}
