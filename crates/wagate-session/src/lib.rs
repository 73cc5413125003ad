//! Session-state and credential caching in front of the messaging gateway.
//!
//! Both services are policy over a [`wagate_cache::TtlCache`]: a key
//! namespace plus a TTL. A cache miss is always answered by going to the
//! source of truth (the gateway or the credential store) and writing the
//! result back.

mod credential;
mod error;
mod gateway;
mod http;
mod reporter;
mod service;
mod state;

pub use credential::{CredentialCache, CredentialRecord, CredentialStore};
pub use error::{Error, Result};
pub use gateway::Gateway;
pub use http::HttpGateway;
pub use reporter::StatsReporter;
pub use service::SessionService;
pub use state::{ConnectionStatus, SessionState};
