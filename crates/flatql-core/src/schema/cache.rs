//! Schema cache keyed by (source, column); process-wide and time-bounded.

use crate::{
    obs::sink::{MetricsEvent, record},
    schema::{Schema, SourceKey},
};
use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex, OnceLock, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

///
/// CachedSchema
///

struct CachedSchema {
    schema: Arc<Schema>,
    inserted_at: Instant,
}

///
/// SchemaCache
///
/// Entries are inserted only after a successful inference and evicted lazily
/// when a lookup finds them at or past the TTL. There is no background sweep.
///

pub struct SchemaCache {
    entries: Mutex<BTreeMap<SourceKey, CachedSchema>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

// NOTE:
// The host may run invocations concurrently, so the map is behind a Mutex.
// The lock is never held across a fetch; concurrent misses on one key both
// sample and the last insert wins.
static GLOBAL: OnceLock<SchemaCache> = OnceLock::new();

///
/// CacheStats
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl SchemaCache {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The process-wide cache, initialized empty on first use.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::new)
    }

    /// Look up `key`, evicting it if it is `ttl` old or older at `now`.
    pub fn get(&self, key: &SourceKey, ttl: Duration, now: Instant) -> Option<Arc<Schema>> {
        let mut entries = self.lock();

        let fresh = entries
            .get(key)
            .map(|cached| now.saturating_duration_since(cached.inserted_at) < ttl);

        match fresh {
            Some(true) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                record(MetricsEvent::CacheHit);
                entries.get(key).map(|cached| Arc::clone(&cached.schema))
            }
            Some(false) => {
                entries.remove(key);
                self.record_miss();
                None
            }
            None => {
                self.record_miss();
                None
            }
        }
    }

    pub fn insert(&self, key: SourceKey, schema: Arc<Schema>, now: Instant) {
        self.lock().insert(
            key,
            CachedSchema {
                schema,
                inserted_at: now,
            },
        );
    }

    /// Drop one key; returns whether it was present.
    pub fn invalidate(&self, key: &SourceKey) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    // Counters are best-effort; relaxed ordering is enough.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.lock().len(),
        }
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        record(MetricsEvent::CacheMiss);
    }

    // Entries are replaced whole; a poisoned map is still consistent.
    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<SourceKey, CachedSchema>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}
