//! Process-wide default cache.

use std::sync::{Arc, OnceLock};

use crate::cache::TtlCache;
use crate::clock::SystemClock;
use crate::config::CacheConfig;

/// Cache holding heterogeneous JSON payloads.
pub type JsonCache = TtlCache<serde_json::Value>;

/// Shared cache for callers that do not own one.
///
/// Built on first use with [`CacheConfig::default`]. The sweep task runs on
/// the tokio runtime of that first call and only there: called outside a
/// runtime there is no sweep at all, and if that runtime later shuts down
/// (a `#[tokio::test]` runtime, for instance) the sweep stops for the rest
/// of the process. Both cases log a warning; reads still never return
/// expired values. Check [`TtlCache::is_sweeping`] when it matters.
/// Destroying it closes it for the rest of the process.
pub fn global() -> &'static JsonCache {
    static GLOBAL: OnceLock<JsonCache> = OnceLock::new();
    GLOBAL.get_or_init(|| TtlCache::build(CacheConfig::default(), Arc::new(SystemClock)))
}
