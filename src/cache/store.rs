//! Cache store contract and the in-memory implementation.
//!
//! The engine mutates the side-cache exclusively through [`CacheStore`]'s
//! two removal operations; it never reads cached values. The store instance
//! is an explicitly injected dependency, shared via `Arc`, never ambient
//! state.
//!
//! [`MemoryStore`] is the store the Squadra services run with in-process:
//! an LRU-bounded key/value map holding serialized query results and
//! resolved Graph identifiers, with hit/miss/eviction counters.

use std::sync::RwLock;

use async_trait::async_trait;
use lru::LruCache;
use metrics::counter;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::CacheSettings;

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_CACHE_HIT: &str = "squadra_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "squadra_cache_miss_total";
pub(crate) const METRIC_CACHE_EVICTED: &str = "squadra_cache_evicted_total";
pub(crate) const METRIC_CACHE_INVALIDATED: &str = "squadra_cache_invalidated_keys_total";

/// Store-level failure during batch or pattern removal.
#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
    #[error("cache store operation failed: {0}")]
    Backend(String),
}

/// The two removal operations the invalidation engine drives.
///
/// `operation` is a human-readable label composed by the orchestrator
/// (event name + entity identity); stores carry it through to their own
/// logs/metrics and must not derive behavior from it.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Remove every given key. The batch is already deduplicated.
    async fn invalidate_batch(
        &self,
        keys: &[String],
        operation: &str,
    ) -> Result<(), CacheStoreError>;

    /// Best-effort wildcard removal (`*` matches any run of characters).
    ///
    /// Optional capability: a store without prefix/wildcard scanning
    /// implements this as a logged no-op and reports it via
    /// [`CacheStore::supports_patterns`]. Callers never rely on it as the
    /// sole invalidation path.
    async fn invalidate_pattern(
        &self,
        pattern: &str,
        operation: &str,
    ) -> Result<(), CacheStoreError>;

    fn supports_patterns(&self) -> bool {
        false
    }
}

/// In-process LRU side-cache.
pub struct MemoryStore {
    entries: RwLock<LruCache<String, Value>>,
    enabled: bool,
    pattern_invalidation: bool,
}

impl MemoryStore {
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(settings.max_entries_non_zero())),
            enabled: settings.enabled,
            pattern_invalidation: settings.pattern_invalidation,
        }
    }

    /// Fetch a cached value, recording a hit or miss.
    pub fn get(&self, key: &str) -> Option<Value> {
        if !self.enabled {
            counter!(METRIC_CACHE_MISS).increment(1);
            return None;
        }
        // LruCache::get updates recency, so a write guard is required.
        let found = rw_write(&self.entries, SOURCE, "get").get(key).cloned();
        match found {
            Some(value) => {
                counter!(METRIC_CACHE_HIT).increment(1);
                Some(value)
            }
            None => {
                counter!(METRIC_CACHE_MISS).increment(1);
                None
            }
        }
    }

    /// Store a value, evicting the least-recently-used entry when full.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        if !self.enabled {
            return;
        }
        let key = key.into();
        // `push` also returns the displaced pair when it overwrites the same
        // key; only a displaced *other* key is an eviction.
        let displaced = rw_write(&self.entries, SOURCE, "set").push(key.clone(), value);
        if matches!(displaced, Some((evicted, _)) if evicted != key) {
            counter!(METRIC_CACHE_EVICTED).increment(1);
        }
    }

    /// Remove a single key. Returns true when an entry was present.
    pub fn remove(&self, key: &str) -> bool {
        rw_write(&self.entries, SOURCE, "remove").pop(key).is_some()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn invalidate_batch(
        &self,
        keys: &[String],
        operation: &str,
    ) -> Result<(), CacheStoreError> {
        let mut removed = 0u64;
        {
            let mut entries = rw_write(&self.entries, SOURCE, "invalidate_batch");
            for key in keys {
                if entries.pop(key).is_some() {
                    removed += 1;
                }
            }
        }
        counter!(METRIC_CACHE_INVALIDATED).increment(removed);
        debug!(
            operation,
            submitted = keys.len(),
            removed,
            "Batch invalidation applied"
        );
        Ok(())
    }

    async fn invalidate_pattern(
        &self,
        pattern: &str,
        operation: &str,
    ) -> Result<(), CacheStoreError> {
        if !self.pattern_invalidation {
            debug!(operation, pattern, "Pattern invalidation disabled; skipped");
            return Ok(());
        }
        let mut removed = 0u64;
        {
            let mut entries = rw_write(&self.entries, SOURCE, "invalidate_pattern");
            let matching: Vec<String> = entries
                .iter()
                .filter(|(key, _)| wildcard_match(pattern, key))
                .map(|(key, _)| key.clone())
                .collect();
            for key in matching {
                if entries.pop(&key).is_some() {
                    removed += 1;
                }
            }
        }
        counter!(METRIC_CACHE_INVALIDATED).increment(removed);
        debug!(operation, pattern, removed, "Pattern invalidation applied");
        Ok(())
    }

    fn supports_patterns(&self) -> bool {
        self.pattern_invalidation
    }
}

/// Glob-style match where `*` spans any run of bytes and `?` one byte.
fn wildcard_match(pattern: &str, candidate: &str) -> bool {
    let pattern = pattern.as_bytes();
    let text = candidate.as_bytes();
    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut mark = 0usize;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == b'?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == b'*' {
            star = Some(p);
            mark = t;
            p += 1;
        } else if let Some(star_at) = star {
            p = star_at + 1;
            mark += 1;
            t = mark;
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}
