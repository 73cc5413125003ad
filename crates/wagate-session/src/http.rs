//! HTTP client for the gateway REST API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::state::SessionState;

/// Default timeout for gateway requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Gateway reached over HTTP.
///
/// Endpoints:
/// - `POST /start-session` with `{"session", "waitQrCode"}`
/// - `GET /check-connection-session?sessionkey=`
/// - `POST /close-session` with `{"sessionkey"}`
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpGateway {
    /// Create a client for the gateway at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        // Without a trailing slash `Url::join` would replace the last segment.
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = if body.is_empty() {
            status.canonical_reason().unwrap_or("unknown").to_string()
        } else {
            body
        };
        Err(Error::Gateway {
            status: status.as_u16(),
            message,
        })
    }
}

/// Fill in what the gateway does not echo back.
fn stamp(mut state: SessionState, session_name: &str) -> SessionState {
    if state.session_name.is_empty() {
        state.session_name = session_name.to_string();
    }
    state.checked_at = Utc::now();
    state
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn start_session(&self, session_name: &str) -> Result<SessionState> {
        let response = self
            .http
            .post(self.url("start-session")?)
            .json(&json!({ "session": session_name, "waitQrCode": true }))
            .timeout(self.timeout)
            .send()
            .await?;

        let state: SessionState = Self::handle_response(response).await?;
        debug!(session = %session_name, status = %state.status, "Gateway started session");
        Ok(stamp(state, session_name))
    }

    async fn check_connection(&self, session_name: &str) -> Result<SessionState> {
        let response = self
            .http
            .get(self.url("check-connection-session")?)
            .query(&[("sessionkey", session_name)])
            .timeout(self.timeout)
            .send()
            .await?;

        let state: SessionState = Self::handle_response(response).await?;
        Ok(stamp(state, session_name))
    }

    async fn close_session(&self, session_name: &str) -> Result<bool> {
        let response = self
            .http
            .post(self.url("close-session")?)
            .json(&json!({ "sessionkey": session_name }))
            .timeout(self.timeout)
            .send()
            .await?;

        let closed = response.status().is_success();
        if !closed {
            warn!(
                session = %session_name,
                status = response.status().as_u16(),
                "Gateway refused to close session"
            );
        }
        Ok(closed)
    }
}
