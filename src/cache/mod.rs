//! Squadra cache-invalidation engine.
//!
//! Keeps the side-cache consistent with domain mutations:
//!
//! - **keys**: the one place cache-key strings are rendered
//! - **events**: the closed set of domain mutations
//! - **rules**: cascade expansion over active entity relationships
//! - **orchestrator**: one operation per mutation, one batch per call
//! - **store**: the abstract store contract plus the in-memory LRU store
//! - **traced**: logging/metrics decorator around any store
//!
//! ## Configuration
//!
//! The in-memory store is tuned via `squadra.toml`:
//!
//! ```toml
//! enabled = true
//! max_entries = 2000
//! pattern_invalidation = true
//! ```

mod batch;
mod events;
mod keys;
mod lock;
mod orchestrator;
mod rules;
mod store;
mod traced;

pub use batch::InvalidationBatch;
pub use events::{DomainEvent, EventKind};
pub use keys::{CacheKey, team_wipe_pattern};
pub use orchestrator::{CacheInvalidator, InvalidationError};
pub use rules::{CascadeRegistry, CascadeRule};
pub use store::{CacheStore, CacheStoreError, MemoryStore};
pub use traced::TracedStore;
