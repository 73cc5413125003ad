//! The messaging gateway the session cache fronts.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::state::SessionState;

/// Source of truth for messaging-session state.
///
/// Implemented over HTTP by [`HttpGateway`](crate::HttpGateway); tests
/// provide in-memory versions.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Start (or resume) a session, returning its initial state.
    async fn start_session(&self, session_name: &str) -> Result<SessionState>;

    /// Ask the gateway for the current connection state.
    async fn check_connection(&self, session_name: &str) -> Result<SessionState>;

    /// Close a session. Returns whether the gateway accepted the request.
    async fn close_session(&self, session_name: &str) -> Result<bool>;
}

#[async_trait]
impl<G: Gateway + ?Sized> Gateway for Arc<G> {
    async fn start_session(&self, session_name: &str) -> Result<SessionState> {
        (**self).start_session(session_name).await
    }

    async fn check_connection(&self, session_name: &str) -> Result<SessionState> {
        (**self).check_connection(session_name).await
    }

    async fn close_session(&self, session_name: &str) -> Result<bool> {
        (**self).close_session(session_name).await
    }
}
