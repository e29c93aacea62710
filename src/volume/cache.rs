//! Expiring cache of volume locations
//!
//! Entries expire `ttl` after insertion. Expired entries are never returned and are
//! dropped either lazily on access or by a background sweep every `sweep_interval`.
//! The cache only speeds up lookups: callers must cope with misses and with stale
//! hits (a volume that moved since it was cached).

use crate::common::CacheConfig;
use crate::volume::location::VolumeLocations;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::task::JoinHandle;
use tokio::time::Instant;

struct CacheEntry {
    locations: Arc<VolumeLocations>,
    expires_at: Instant,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

struct Inner {
    entries: Mutex<HashMap<String, CacheEntry>>,
    counters: Counters,
    ttl: std::time::Duration,
}

impl Inner {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // Every mutation is a single insert, remove or retain, so a poisoned map is still whole.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let evicted = before - entries.len();
        self.counters
            .evictions
            .fetch_add(evicted as u64, Ordering::Relaxed);
        evicted
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Volume id → locations, safe for concurrent use
pub struct LocationCache {
    inner: Arc<Inner>,
    sweeper: Option<JoinHandle<()>>,
}

impl LocationCache {
    /// Create a cache and, when called inside a tokio runtime, start its sweeper.
    ///
    /// Without a runtime expired entries are still dropped lazily on access.
    pub fn new(config: CacheConfig) -> Self {
        let inner = Arc::new(Inner {
            entries: Mutex::new(HashMap::new()),
            counters: Counters::default(),
            ttl: config.ttl,
        });

        let sweeper = match tokio::runtime::Handle::try_current() {
            Ok(handle) => Some(handle.spawn(sweep_loop(
                Arc::downgrade(&inner),
                config.sweep_interval,
            ))),
            Err(_) => {
                tracing::debug!("No tokio runtime, location cache sweeper not started");
                None
            }
        };

        Self { inner, sweeper }
    }

    /// Cached locations of `volume_id`, unless absent or expired
    pub fn get(&self, volume_id: &str) -> Option<Arc<VolumeLocations>> {
        let mut entries = self.inner.entries();
        let found = match entries.get(volume_id) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.locations.clone()),
            Some(_) => {
                entries.remove(volume_id);
                self.inner.counters.evictions.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => None,
        };
        drop(entries);

        let counter = if found.is_some() {
            &self.inner.counters.hits
        } else {
            &self.inner.counters.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Insert or overwrite the locations of `volume_id`, expiring `ttl` from now
    pub fn put(&self, volume_id: &str, locations: Arc<VolumeLocations>) {
        let entry = CacheEntry {
            locations,
            expires_at: Instant::now() + self.inner.ttl,
        };
        self.inner.entries().insert(volume_id.to_string(), entry);
    }

    /// Drop every expired entry now; returns how many were removed
    pub fn sweep(&self) -> usize {
        self.inner.sweep()
    }

    pub fn len(&self) -> usize {
        self.inner.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.entries().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let counters = &self.inner.counters;
        CacheStats {
            entries: self.len(),
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            evictions: counters.evictions.load(Ordering::Relaxed),
        }
    }

    /// Stop the sweeper and drop all entries
    pub fn close(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
        self.clear();
    }
}

impl Drop for LocationCache {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

async fn sweep_loop(inner: Weak<Inner>, period: std::time::Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let evicted = inner.sweep();
        if evicted > 0 {
            tracing::debug!("Location cache sweep evicted {} entries", evicted);
        }
    }
}
