//! Session-state cache in front of the messaging gateway.
//!
//! This module provides a caching layer that:
//! - Serves repeated status checks from the cache instead of the gateway
//! - Writes every successful gateway answer back under `session:<name>`
//! - Drops the cached state when a session is closed
//!
//! The gateway stays the source of truth: a missing entry and an expired
//! one lead to the same upstream call.

use tracing::{debug, info};
use wagate_cache::{Namespace, Namespaced, TtlCache};

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::state::SessionState;

/// Session service that checks the cache before asking the gateway.
#[derive(Clone)]
pub struct SessionService<G> {
    gateway: G,
    sessions: Namespaced<SessionState>,
}

impl<G: Gateway> SessionService<G> {
    /// Create a service using the default session namespace (5 minute TTL).
    pub fn new(gateway: G, cache: TtlCache<SessionState>) -> Self {
        Self::with_namespace(gateway, cache, Namespace::SESSION)
    }

    /// Create a service with a custom namespace (e.g., a configured TTL).
    pub fn with_namespace(gateway: G, cache: TtlCache<SessionState>, namespace: Namespace) -> Self {
        Self {
            gateway,
            sessions: cache.namespace(namespace),
        }
    }

    /// The gateway behind this service.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// The underlying cache.
    pub fn cache(&self) -> &TtlCache<SessionState> {
        self.sessions.cache()
    }

    /// Current state of a session, from cache when fresh.
    pub async fn status(&self, session_name: &str) -> Result<SessionState> {
        if let Some(cached) = self.sessions.get(session_name)? {
            debug!(session = %session_name, status = %cached.status, "Session status served from cache");
            return Ok(cached);
        }

        let state = self.gateway.check_connection(session_name).await?;
        self.sessions.set(session_name, state.clone())?;

        debug!(session = %session_name, status = %state.status, "Session status refreshed from gateway");
        Ok(state)
    }

    /// Start a session unless the cache already knows it is connected.
    pub async fn create(&self, session_name: &str) -> Result<SessionState> {
        if let Some(cached) = self.sessions.get(session_name)?
            && cached.is_connected()
        {
            debug!(session = %session_name, "Session already connected, skipping start");
            return Ok(cached);
        }

        let state = self.gateway.start_session(session_name).await?;
        self.sessions.set(session_name, state.clone())?;

        info!(session = %session_name, status = %state.status, "Session started");
        Ok(state)
    }

    /// Status check that fails unless the session can send messages.
    pub async fn require_connected(&self, session_name: &str) -> Result<SessionState> {
        let state = self.status(session_name).await?;
        if !state.is_connected() {
            return Err(Error::NotConnected(session_name.to_string()));
        }
        Ok(state)
    }

    /// Close a session at the gateway and forget its cached state.
    ///
    /// Returns whether the gateway closed it. The cached state is only
    /// dropped on success.
    pub async fn close(&self, session_name: &str) -> Result<bool> {
        let closed = self.gateway.close_session(session_name).await?;
        if closed {
            self.sessions.delete(session_name)?;
            info!(session = %session_name, "Session closed");
        }
        Ok(closed)
    }

    /// Cached state without contacting the gateway.
    pub fn cached(&self, session_name: &str) -> Result<Option<SessionState>> {
        Ok(self.sessions.get(session_name)?)
    }

    /// Forget the cached state so the next check goes to the gateway.
    pub fn invalidate(&self, session_name: &str) -> Result<bool> {
        Ok(self.sessions.delete(session_name)?)
    }
}
