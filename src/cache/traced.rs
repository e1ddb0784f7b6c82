//! Observability decorator for cache stores.
//!
//! Logging and latency metrics are a cross-cutting concern: the orchestrator
//! core stays log-free and the decorator wraps whichever store is injected.
//! Failures are logged with the operation label and elapsed time, then
//! re-raised unchanged.

use std::time::Instant;

use async_trait::async_trait;
use metrics::histogram;
use tracing::{error, info};
use uuid::Uuid;

use super::store::{CacheStore, CacheStoreError};

const METRIC_INVALIDATE_MS: &str = "squadra_cache_invalidate_ms";

/// Wraps a [`CacheStore`] with `tracing` logs and a latency histogram.
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: CacheStore> CacheStore for TracedStore<S> {
    async fn invalidate_batch(
        &self,
        keys: &[String],
        operation: &str,
    ) -> Result<(), CacheStoreError> {
        let call_id = Uuid::new_v4();
        let started_at = Instant::now();
        let result = self.inner.invalidate_batch(keys, operation).await;
        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_INVALIDATE_MS, "call" => "batch").record(elapsed_ms);

        match &result {
            Ok(()) => info!(
                operation,
                call_id = %call_id,
                key_count = keys.len(),
                elapsed_ms,
                "Cache batch invalidated"
            ),
            Err(error) => error!(
                operation,
                call_id = %call_id,
                key_count = keys.len(),
                elapsed_ms,
                error = %error,
                "Cache batch invalidation failed"
            ),
        }
        result
    }

    async fn invalidate_pattern(
        &self,
        pattern: &str,
        operation: &str,
    ) -> Result<(), CacheStoreError> {
        let call_id = Uuid::new_v4();
        let started_at = Instant::now();
        let result = self.inner.invalidate_pattern(pattern, operation).await;
        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_INVALIDATE_MS, "call" => "pattern").record(elapsed_ms);

        match &result {
            Ok(()) => info!(
                operation,
                call_id = %call_id,
                pattern,
                elapsed_ms,
                "Cache pattern invalidated"
            ),
            Err(error) => error!(
                operation,
                call_id = %call_id,
                pattern,
                elapsed_ms,
                error = %error,
                "Cache pattern invalidation failed"
            ),
        }
        result
    }

    fn supports_patterns(&self) -> bool {
        self.inner.supports_patterns()
    }
}
