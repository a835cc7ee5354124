//! Query/mutation cache keyed by resource and parameters.
//!
//! Entries remember when they were fetched; a read within the query's stale time is
//! served from memory, anything older (or explicitly invalidated) is refetched.
//! Mutations invalidate by key prefix.

mod queries;

pub use queries::Queries;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);
pub const FEATURED_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Ordered key segments such as `offers / organization / org-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub stale_time: Duration,
    pub enabled: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            enabled: true,
        }
    }
}

impl QueryOptions {
    pub fn stale_after(stale_time: Duration) -> Self {
        Self {
            stale_time,
            ..Self::default()
        }
    }

    pub fn enabled(self, enabled: bool) -> Self {
        Self { enabled, ..self }
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
    invalidated: bool,
}

#[derive(Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.lock().len())
            .finish()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves a fresh entry or runs `fetcher`. Disabled queries return `None` untouched.
    pub async fn fetch<T, E, F, Fut>(
        &self,
        key: &QueryKey,
        options: QueryOptions,
        fetcher: F,
    ) -> Result<Option<T>, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !options.enabled {
            return Ok(None);
        }
        if let Some(value) = self.fresh::<T>(key, options.stale_time) {
            debug!(%key, "query cache hit");
            return Ok(Some(value));
        }

        let value = fetcher().await?;
        self.set(key.clone(), value.clone());
        Ok(Some(value))
    }

    /// Last stored value regardless of staleness.
    pub fn get<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.lock()
            .get(key)
            .and_then(|entry| entry.value.downcast_ref::<T>().cloned())
    }

    pub fn set<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        self.lock().insert(
            key,
            CacheEntry {
                value: Arc::new(value),
                fetched_at: Instant::now(),
                invalidated: false,
            },
        );
    }

    pub fn is_stale(&self, key: &QueryKey, stale_time: Duration) -> bool {
        self.lock()
            .get(key)
            .map_or(true, |entry| Self::expired(entry, stale_time))
    }

    /// Marks every key under `prefix` stale. Returns how many entries were touched.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.lock();
        let mut touched = 0;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                touched += 1;
            }
        }
        debug!(%prefix, touched, "invalidated queries");
        touched
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fresh<T: Clone + 'static>(&self, key: &QueryKey, stale_time: Duration) -> Option<T> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        if Self::expired(entry, stale_time) {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    fn expired(entry: &CacheEntry, stale_time: Duration) -> bool {
        entry.invalidated || entry.fetched_at.elapsed() >= stale_time
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_fetch(
        calls: &AtomicUsize,
        value: u32,
    ) -> impl Future<Output = Result<u32, String>> + '_ {
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_entries_are_served_from_memory() {
        let cache = QueryCache::new();
        let key = QueryKey::new(["offers"]);
        let calls = AtomicUsize::new(0);

        let first = cache
            .fetch(&key, QueryOptions::default(), || counting_fetch(&calls, 1))
            .await
            .expect("fetches");
        let second = cache
            .fetch(&key, QueryOptions::default(), || counting_fetch(&calls, 2))
            .await
            .expect("cached");

        assert_eq!(first, Some(1));
        assert_eq!(second, Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entries_are_refetched() {
        let cache = QueryCache::new();
        let key = QueryKey::new(["offers"]);
        let calls = AtomicUsize::new(0);

        cache
            .fetch(&key, QueryOptions::default(), || counting_fetch(&calls, 1))
            .await
            .expect("fetches");
        tokio::time::advance(DEFAULT_STALE_TIME).await;
        let refreshed = cache
            .fetch(&key, QueryOptions::default(), || counting_fetch(&calls, 2))
            .await
            .expect("refetches");

        assert_eq!(refreshed, Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn disabled_queries_do_not_fetch() {
        let cache = QueryCache::new();
        let key = QueryKey::new(["students", ""]);
        let calls = AtomicUsize::new(0);

        let result = cache
            .fetch(&key, QueryOptions::default().enabled(false), || {
                counting_fetch(&calls, 1)
            })
            .await
            .expect("no error");

        assert_eq!(result, None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidation_is_prefix_based() {
        let cache = QueryCache::new();
        let offers = QueryKey::new(["offers"]);
        cache.set(offers.clone(), 1_u32);
        cache.set(offers.child("organization").child("org-1"), 2_u32);
        cache.set(QueryKey::new(["students"]), 3_u32);

        assert_eq!(cache.invalidate(&offers), 2);
        assert!(cache.is_stale(&offers, DEFAULT_STALE_TIME));
        assert!(!cache.is_stale(&QueryKey::new(["students"]), DEFAULT_STALE_TIME));
        assert_eq!(cache.get::<u32>(&offers), Some(1));
    }

    #[test]
    fn key_prefix_matching_respects_segments() {
        let key = QueryKey::new(["students", "careers", "1032"]);
        assert!(key.starts_with(&QueryKey::new(["students"])));
        assert!(key.starts_with(&QueryKey::new(["students", "careers"])));
        assert!(!key.starts_with(&QueryKey::new(["students", "1032"])));
        assert_eq!(key.to_string(), "students/careers/1032");
    }
}
