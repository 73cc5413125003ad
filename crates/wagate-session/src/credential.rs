//! Credential records cached in front of their store.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wagate_cache::{Namespace, Namespaced, TtlCache};

use crate::error::Result;

/// What an API key resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    /// Credential id (the API key identifier).
    pub id: String,
    /// Owning tenant.
    pub company_id: String,
    /// User the key was issued to, if any.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl CredentialRecord {
    pub fn new(id: impl Into<String>, company_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            company_id: company_id.into(),
            user_id: None,
            scopes: Vec::new(),
            active: true,
        }
    }
}

/// Authoritative lookup for credential records (usually the database).
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a record by id. `Ok(None)` when it does not exist.
    async fn find(&self, id: &str) -> Result<Option<CredentialRecord>>;
}

#[async_trait]
impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    async fn find(&self, id: &str) -> Result<Option<CredentialRecord>> {
        (**self).find(id).await
    }
}

/// Credential lookups cached under `credential:<id>` (15 minutes by default).
#[derive(Clone)]
pub struct CredentialCache<S> {
    store: S,
    credentials: Namespaced<CredentialRecord>,
}

impl<S: CredentialStore> CredentialCache<S> {
    pub fn new(store: S, cache: TtlCache<CredentialRecord>) -> Self {
        Self::with_namespace(store, cache, Namespace::CREDENTIAL)
    }

    pub fn with_namespace(
        store: S,
        cache: TtlCache<CredentialRecord>,
        namespace: Namespace,
    ) -> Self {
        Self {
            store,
            credentials: cache.namespace(namespace),
        }
    }

    /// The underlying cache.
    pub fn cache(&self) -> &TtlCache<CredentialRecord> {
        self.credentials.cache()
    }

    /// Resolve a credential, going to the store on a miss.
    ///
    /// Unknown ids are not cached, so a record created later is found on
    /// the next lookup.
    pub async fn lookup(&self, id: &str) -> Result<Option<CredentialRecord>> {
        if let Some(record) = self.credentials.get(id)? {
            return Ok(Some(record));
        }

        let found = self.store.find(id).await?;
        if let Some(ref record) = found {
            self.credentials.set(id, record.clone())?;
            debug!(credential = %id, company = %record.company_id, "Credential cached");
        }
        Ok(found)
    }

    /// Cache a record the caller already has.
    pub fn remember(&self, record: CredentialRecord) -> Result<()> {
        let id = record.id.clone();
        Ok(self.credentials.set(&id, record)?)
    }

    /// Drop a cached record, e.g. after the key was rotated.
    pub fn revoke(&self, id: &str) -> Result<bool> {
        Ok(self.credentials.delete(id)?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use wagate_cache::{CacheConfig, ManualClock};

    use super::*;
    use crate::error::Error;

    struct MapStore {
        records: HashMap<String, CredentialRecord>,
        finds: AtomicUsize,
    }

    #[async_trait]
    impl CredentialStore for MapStore {
        async fn find(&self, id: &str) -> Result<Option<CredentialRecord>> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            Ok(self.records.get(id).cloned())
        }
    }

    /// Store whose backend is down.
    struct UnavailableStore;

    #[async_trait]
    impl CredentialStore for UnavailableStore {
        async fn find(&self, _id: &str) -> Result<Option<CredentialRecord>> {
            Err(Error::Store("connection refused".to_string()))
        }
    }

    fn setup() -> (CredentialCache<Arc<MapStore>>, Arc<MapStore>, Arc<ManualClock>) {
        let mut records = HashMap::new();
        records.insert(
            "key-1".to_string(),
            CredentialRecord::new("key-1", "comp_demo"),
        );
        let store = Arc::new(MapStore {
            records,
            finds: AtomicUsize::new(0),
        });

        let clock = Arc::new(ManualClock::new());
        let config = CacheConfig::new().with_cleanup_task(false);
        let cache = TtlCache::with_clock(config, clock.clone()).unwrap();
        (CredentialCache::new(Arc::clone(&store), cache), store, clock)
    }

    #[tokio::test]
    async fn test_lookup_hits_store_once() {
        let (credentials, store, _) = setup();

        for _ in 0..5 {
            let record = credentials.lookup("key-1").await.unwrap().unwrap();
            assert_eq!(record.company_id, "comp_demo");
        }

        assert_eq!(store.finds.load(Ordering::SeqCst), 1);
        assert!(credentials.cache().contains("credential:key-1").unwrap());
    }

    #[tokio::test]
    async fn test_lookup_expires_after_fifteen_minutes() {
        let (credentials, store, clock) = setup();

        credentials.lookup("key-1").await.unwrap();
        clock.advance(Duration::from_secs(14 * 60));
        credentials.lookup("key-1").await.unwrap();
        assert_eq!(store.finds.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(60));
        credentials.lookup("key-1").await.unwrap();
        assert_eq!(store.finds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_credential_not_cached() {
        let (credentials, store, _) = setup();

        assert!(credentials.lookup("missing").await.unwrap().is_none());
        assert!(credentials.lookup("missing").await.unwrap().is_none());
        assert_eq!(store.finds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_remember_and_revoke() {
        let (credentials, store, _) = setup();

        credentials
            .remember(CredentialRecord::new("key-2", "comp_other"))
            .unwrap();
        let record = credentials.lookup("key-2").await.unwrap().unwrap();
        assert_eq!(record.company_id, "comp_other");
        assert_eq!(store.finds.load(Ordering::SeqCst), 0);

        assert!(credentials.revoke("key-2").unwrap());
        assert!(credentials.lookup("key-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_propagates_and_is_not_cached() {
        let config = CacheConfig::new().with_cleanup_task(false);
        let cache = TtlCache::new(config).unwrap();
        let credentials = CredentialCache::new(UnavailableStore, cache);

        let err = credentials.lookup("key-1").await.unwrap_err();
        assert!(matches!(err, Error::Store(ref message) if message == "connection refused"));
        assert!(credentials.cache().is_empty());
    }
}
