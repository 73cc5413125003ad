//! Key-prefix policies layered on a shared cache.
//!
//! A [`Namespace`] is nothing more than a prefix and a default TTL. Every
//! operation on a [`Namespaced`] view maps to the plain cache operation on
//! `"<prefix>:<id>"`.

use std::time::Duration;

use crate::cache::TtlCache;
use crate::error::{Error, Result};

/// Key prefix plus the TTL its entries get by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    prefix: &'static str,
    ttl: Duration,
}

impl Namespace {
    /// Messaging-session state: last known connection status and gateway metadata.
    pub const SESSION: Namespace = Namespace::new("session", Duration::from_secs(5 * 60));

    /// Credential records looked up by API key id.
    pub const CREDENTIAL: Namespace = Namespace::new("credential", Duration::from_secs(15 * 60));

    /// Create a namespace.
    pub const fn new(prefix: &'static str, ttl: Duration) -> Self {
        Self { prefix, ttl }
    }

    /// Same prefix, different TTL.
    pub const fn with_ttl(self, ttl: Duration) -> Self {
        Self {
            prefix: self.prefix,
            ttl,
        }
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Full cache key for `id`.
    pub fn key(&self, id: &str) -> Result<String> {
        if id.is_empty() {
            return Err(Error::InvalidKey(format!(
                "empty id in namespace '{}'",
                self.prefix
            )));
        }
        Ok(format!("{}:{}", self.prefix, id))
    }
}

/// A cache handle scoped to one [`Namespace`].
pub struct Namespaced<V> {
    cache: TtlCache<V>,
    namespace: Namespace,
}

impl<V: Clone + Send + Sync + 'static> Namespaced<V> {
    /// Scope `cache` to `namespace`.
    pub fn new(cache: TtlCache<V>, namespace: Namespace) -> Self {
        Self { cache, namespace }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// The underlying cache.
    pub fn cache(&self) -> &TtlCache<V> {
        &self.cache
    }

    /// Store `value` for `id` with the namespace TTL.
    pub fn set(&self, id: &str, value: V) -> Result<()> {
        self.set_with_ttl(id, value, self.namespace.ttl)
    }

    /// Store `value` for `id` with an explicit TTL.
    pub fn set_with_ttl(&self, id: &str, value: V, ttl: Duration) -> Result<()> {
        self.cache
            .set_with_ttl(&self.namespace.key(id)?, value, ttl)
    }

    pub fn get(&self, id: &str) -> Result<Option<V>> {
        self.cache.get(&self.namespace.key(id)?)
    }

    pub fn contains(&self, id: &str) -> Result<bool> {
        self.cache.contains(&self.namespace.key(id)?)
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        self.cache.delete(&self.namespace.key(id)?)
    }
}

impl<V> Clone for Namespaced<V> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            namespace: self.namespace,
        }
    }
}
