//! In-memory cache manager with a fixed TTL
//!
//! Provides a `CacheManager` holding one entry with its creation time. An
//! entry is fresh while its age is strictly below the TTL; it is replaced
//! wholesale on write and dropped entirely on clear.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Wrapper struct for the cached value
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    /// The cached data
    data: T,
    /// When the data was cached
    cached_at: DateTime<Utc>,
}

/// Result of reading from cache, including metadata about cache freshness
#[derive(Debug, Clone)]
pub struct CachedData<T> {
    /// The cached data
    pub data: T,
    /// When the data was originally cached
    pub cached_at: DateTime<Utc>,
    /// Whether the cache entry has expired
    pub is_expired: bool,
}

/// Holds at most one value together with the time it was stored
#[derive(Debug)]
pub struct CacheManager<T> {
    entry: Mutex<Option<CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> CacheManager<T> {
    /// Creates an empty cache whose entries stay fresh for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: Mutex::new(None),
            ttl,
        }
    }

    fn entry(&self) -> MutexGuard<'_, Option<CacheEntry<T>>> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `data` as of now, replacing any previous entry
    pub fn write(&self, data: T) {
        self.write_at(data, Utc::now());
    }

    /// Stores `data` as of `cached_at`, replacing any previous entry
    pub fn write_at(&self, data: T, cached_at: DateTime<Utc>) {
        *self.entry() = Some(CacheEntry { data, cached_at });
    }

    /// Reads the entry as of now
    pub fn read(&self) -> Option<CachedData<T>> {
        self.read_at(Utc::now())
    }

    /// Reads the entry as of `now`
    ///
    /// Returns `None` when empty. Expired entries are still returned with
    /// `is_expired = true`; callers decide whether to serve them.
    pub fn read_at(&self, now: DateTime<Utc>) -> Option<CachedData<T>> {
        let guard = self.entry();
        let entry = guard.as_ref()?;

        Some(CachedData {
            data: entry.data.clone(),
            cached_at: entry.cached_at,
            is_expired: now - entry.cached_at >= self.ttl,
        })
    }

    /// Returns the data only if it is still fresh
    pub fn fresh(&self) -> Option<T> {
        self.read().filter(|cached| !cached.is_expired).map(|cached| cached.data)
    }

    /// Drops the entry
    pub fn clear(&self) {
        *self.entry() = None;
    }
}
