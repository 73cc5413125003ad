//! In-process TTL cache with background sweeping.
//!
//! This crate provides the caching layer that sits in front of the messaging
//! gateway and the credential store:
//! - Per-entry TTL with lazy eviction on read
//! - A cancellable background sweep that reclaims expired entries
//! - Hit/miss/eviction counters for observability
//! - Namespace policies (`session:`, `credential:`) layered on one key space
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use wagate_cache::{CacheConfig, Namespace, TtlCache};
//!
//! let config = CacheConfig::default()
//!     .with_default_ttl(Duration::from_secs(300))
//!     .with_cleanup_interval(Duration::from_secs(60));
//!
//! let cache: TtlCache<String> = TtlCache::new(config)?;
//! cache.namespace(Namespace::SESSION).set("abc", "CONNECTED".to_string())?;
//! ```

mod cache;
mod clock;
mod config;
mod error;
mod global;
mod namespace;
mod sweep;

pub use cache::{CacheStats, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    CacheConfig, DEFAULT_CLEANUP_INTERVAL, DEFAULT_SWEEP_BATCH_SIZE, DEFAULT_TTL,
    duration_from_millis,
};
pub use error::{Error, Result};
pub use global::{JsonCache, global};
pub use namespace::{Namespace, Namespaced};
