//! Squadra cache — the cascading cache-invalidation engine of the Squadra
//! school-administration suite.
//!
//! Squadra services mutate departments, users, subjects and the Microsoft
//! Teams/channels provisioned for them, then notify this engine. The engine
//! derives the exact set of cache keys affected by the mutation (direct keys
//! from the entity's own fields, cascade keys from its *active*
//! relationships), deduplicates them, and issues a single batch-remove call
//! against an injected [`cache::CacheStore`].
//!
//! The engine is stateless between calls, performs no retries, and never
//! swallows store failures.

pub mod cache;
pub mod config;
pub mod domain;
