use super::clock::{Clock, SystemClock};
use super::store::{CacheEntry, CacheKey, CacheStore};
use crate::error::ExtractError;
use crate::models::CorpusResult;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Entries older than this are recomputed
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Counters for cache behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    /// Lookups that had to compute, expired entries included
    pub misses: u64,
    pub expirations: u64,
    /// Store reads or writes that failed and were worked around
    pub store_failures: u64,
}

/// TTL cache in front of corpus extraction
///
/// Store failures never reach the caller: a failed read is treated as a miss
/// and a failed write just leaves the store without the entry.
pub struct CorpusCache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    stats: Mutex<CacheStats>,
}

impl CorpusCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            ttl: DEFAULT_TTL,
            stats: Mutex::new(CacheStats::default()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        update(&mut self.stats.lock().unwrap_or_else(|e| e.into_inner()));
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        // A clock that went backwards makes the entry look new
        let age = self.clock.unix_secs().saturating_sub(entry.created_at);
        age < self.ttl.as_secs()
    }

    /// Return the cached corpus for `key` if it is younger than the TTL,
    /// otherwise run `compute` and store its result. Errors from `compute` are
    /// returned unchanged and nothing is stored.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &CacheKey,
        compute: F,
    ) -> Result<CorpusResult, ExtractError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CorpusResult, ExtractError>>,
    {
        let storage_key = key.storage_key();

        match self.store.get(&storage_key).await {
            Ok(Some(entry)) if self.is_fresh(&entry) => {
                self.record(|s| s.hits += 1);
                debug!(directory = %key.directory.display(), "corpus cache hit");
                return Ok(entry.corpus);
            }
            Ok(Some(_)) => {
                self.record(|s| {
                    s.misses += 1;
                    s.expirations += 1;
                });
                debug!(directory = %key.directory.display(), "corpus cache entry expired");
            }
            Ok(None) => {
                self.record(|s| s.misses += 1);
                debug!(directory = %key.directory.display(), "corpus cache miss");
            }
            Err(e) => {
                self.record(|s| {
                    s.misses += 1;
                    s.store_failures += 1;
                });
                warn!(store = self.store.name(), error = %e, "Cache read failed, recomputing");
            }
        }

        let corpus = compute().await?;

        let entry = CacheEntry {
            key: storage_key.clone(),
            created_at: self.clock.unix_secs(),
            corpus,
        };
        if let Err(e) = self.store.put(&storage_key, &entry).await {
            self.record(|s| s.store_failures += 1);
            warn!(store = self.store.name(), error = %e, "Cache write failed");
        }

        Ok(entry.corpus)
    }
}

impl std::fmt::Debug for CorpusCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusCache")
            .field("store", &self.store.name())
            .field("ttl", &self.ttl)
            .field("stats", &self.stats())
            .finish()
    }
}
