//! Cached session state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Connection status reported by the gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "WireStatus", into = "String")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Initializing,
    QrCode,
    #[default]
    Unknown,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "CONNECTED",
            ConnectionStatus::Disconnected => "DISCONNECTED",
            ConnectionStatus::Initializing => "INITIALIZING",
            ConnectionStatus::QrCode => "QRCODE",
            ConnectionStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `status` as it appears on the wire: a state name, or a bare
/// connected flag from the check-connection endpoint.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireStatus {
    Flag(bool),
    Name(String),
}

impl From<WireStatus> for ConnectionStatus {
    fn from(raw: WireStatus) -> Self {
        match raw {
            WireStatus::Flag(true) => ConnectionStatus::Connected,
            WireStatus::Flag(false) => ConnectionStatus::Disconnected,
            WireStatus::Name(name) => ConnectionStatus::from(name),
        }
    }
}

// The gateway mixes casing and uses several aliases for the same state.
impl From<String> for ConnectionStatus {
    fn from(raw: String) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "CONNECTED" | "ISLOGGED" | "INCHAT" => ConnectionStatus::Connected,
            "DISCONNECTED" | "CLOSED" | "NOTLOGGED" | "BROWSERCLOSE" => {
                ConnectionStatus::Disconnected
            }
            "INITIALIZING" | "STARTING" => ConnectionStatus::Initializing,
            "QRCODE" | "QR_CODE" => ConnectionStatus::QrCode,
            _ => ConnectionStatus::Unknown,
        }
    }
}

impl From<ConnectionStatus> for String {
    fn from(status: ConnectionStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Last known state of a messaging session.
///
/// Fields the gateway returns that are not modeled here are kept in
/// `metadata` so nothing it assigns is lost between checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Session name as known to the gateway.
    #[serde(default, alias = "session")]
    pub session_name: String,

    /// Connection status.
    #[serde(default)]
    pub status: ConnectionStatus,

    /// QR code payload while the session waits for pairing.
    #[serde(default, alias = "qrcode", skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,

    /// Database id of the session record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_id: Option<String>,

    /// When the gateway was last asked.
    #[serde(default = "Utc::now")]
    pub checked_at: DateTime<Utc>,

    /// Provider-assigned fields not listed above.
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl SessionState {
    /// Create a state checked now.
    pub fn new(session_name: impl Into<String>, status: ConnectionStatus) -> Self {
        Self {
            session_name: session_name.into(),
            status,
            qr_code: None,
            db_id: None,
            checked_at: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Set the database id.
    pub fn with_db_id(mut self, db_id: impl Into<String>) -> Self {
        self.db_id = Some(db_id.into());
        self
    }

    /// Set the QR code payload.
    pub fn with_qr_code(mut self, qr_code: impl Into<String>) -> Self {
        self.qr_code = Some(qr_code.into());
        self
    }

    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }
}
