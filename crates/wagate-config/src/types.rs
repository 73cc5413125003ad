//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [cache]        # TTL cache tuning
//! [session]      # session-state namespace
//! [credential]   # credential namespace
//! [gateway]      # messaging gateway connection
//! [logging]      # stats reporting
//! ```
//!
//! TTLs are in milliseconds and signed, so that a negative value in a file
//! surfaces as a validation error rather than a parse error.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use wagate_cache::{CacheConfig, Namespace, duration_from_millis};

use crate::{ConfigError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WagateConfig {
    /// TTL cache settings.
    pub cache: Option<CacheSection>,

    /// Session-state namespace settings.
    pub session: Option<NamespaceSection>,

    /// Credential namespace settings.
    pub credential: Option<NamespaceSection>,

    /// Gateway connection settings.
    pub gateway: Option<GatewayConfig>,

    /// Logging and stats reporting.
    pub logging: Option<LoggingConfig>,
}

impl WagateConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// A config with every section filled in with defaults.
    pub fn with_defaults() -> Self {
        Self {
            cache: Some(CacheSection::default()),
            session: Some(NamespaceSection::session()),
            credential: Some(NamespaceSection::credential()),
            gateway: Some(GatewayConfig::default()),
            logging: Some(LoggingConfig::default()),
        }
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: WagateConfig) {
        if other.cache.is_some() {
            self.cache = other.cache;
        }

        if other.session.is_some() {
            self.session = other.session;
        }

        if other.credential.is_some() {
            self.credential = other.credential;
        }

        if other.gateway.is_some() {
            self.gateway = other.gateway;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Validated cache configuration.
    pub fn cache_config(&self) -> Result<CacheConfig> {
        self.cache.clone().unwrap_or_default().to_cache_config()
    }

    /// Namespace used for session-state entries.
    pub fn session_namespace(&self) -> Result<Namespace> {
        self.session
            .clone()
            .unwrap_or_default()
            .apply(Namespace::SESSION, "session.ttl_ms")
    }

    /// Namespace used for credential records.
    pub fn credential_namespace(&self) -> Result<Namespace> {
        self.credential
            .clone()
            .unwrap_or_default()
            .apply(Namespace::CREDENTIAL, "credential.ttl_ms")
    }

    /// Gateway settings, defaulted when absent.
    pub fn gateway(&self) -> GatewayConfig {
        self.gateway.clone().unwrap_or_default()
    }

    /// Logging settings, defaulted when absent.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Whether this config sets `section` itself.
    pub fn has(&self, section: Section) -> bool {
        match section {
            Section::Cache => self.cache.is_some(),
            Section::Session => self.session.is_some(),
            Section::Credential => self.credential.is_some(),
            Section::Gateway => self.gateway.is_some(),
            Section::Logging => self.logging.is_some(),
        }
    }

    /// Validate every section at once.
    pub fn settings(&self) -> Result<Settings> {
        Ok(Settings {
            cache: self.cache_config()?,
            session: self.session_namespace()?,
            credential: self.credential_namespace()?,
            gateway: self.gateway(),
            logging: self.logging(),
        })
    }
}

/// Top-level config sections, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Cache,
    Session,
    Credential,
    Gateway,
    Logging,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Cache,
        Section::Session,
        Section::Credential,
        Section::Gateway,
        Section::Logging,
    ];

    /// Table name in the TOML file.
    pub fn name(&self) -> &'static str {
        match self {
            Section::Cache => "cache",
            Section::Session => "session",
            Section::Credential => "credential",
            Section::Gateway => "gateway",
            Section::Logging => "logging",
        }
    }
}

/// Validated values the cache and session services are built from.
#[derive(Debug, Clone)]
pub struct Settings {
    pub cache: CacheConfig,
    pub session: Namespace,
    pub credential: Namespace,
    pub gateway: GatewayConfig,
    pub logging: LoggingConfig,
}

fn millis(field: &str, ms: i64) -> Result<Duration> {
    duration_from_millis(ms).map_err(|source| ConfigError::Invalid {
        field: field.to_string(),
        source,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// TTL cache configuration.
///
/// ```toml
/// [cache]
/// default_ttl_ms = 300000
/// cleanup_interval_ms = 300000
/// enable_cleanup_task = true
/// sweep_batch_size = 1024
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// TTL applied when callers do not pass one.
    pub default_ttl_ms: i64,
    /// Interval between background sweeps.
    pub cleanup_interval_ms: i64,
    /// Whether to run the background sweep at all.
    pub enable_cleanup_task: bool,
    /// Expired keys removed per write-lock acquisition.
    pub sweep_batch_size: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            default_ttl_ms: wagate_cache::DEFAULT_TTL.as_millis() as i64,
            cleanup_interval_ms: wagate_cache::DEFAULT_CLEANUP_INTERVAL.as_millis() as i64,
            enable_cleanup_task: true,
            sweep_batch_size: wagate_cache::DEFAULT_SWEEP_BATCH_SIZE,
        }
    }
}

impl CacheSection {
    /// Convert into a validated [`CacheConfig`].
    pub fn to_cache_config(&self) -> Result<CacheConfig> {
        let config = CacheConfig::new()
            .with_default_ttl(millis("cache.default_ttl_ms", self.default_ttl_ms)?)
            .with_cleanup_interval(millis(
                "cache.cleanup_interval_ms",
                self.cleanup_interval_ms,
            )?)
            .with_cleanup_task(self.enable_cleanup_task)
            .with_sweep_batch_size(self.sweep_batch_size);

        config.validate().map_err(|source| ConfigError::Invalid {
            field: "cache".to_string(),
            source,
        })?;
        Ok(config)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Namespace Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// TTL for one cache namespace.
///
/// ```toml
/// [session]
/// ttl_ms = 300000
///
/// [credential]
/// ttl_ms = 900000
/// ```
///
/// A zero TTL is allowed and effectively disables caching for the namespace.
/// A section without `ttl_ms` keeps the namespace's built-in TTL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_ms: Option<i64>,
}

impl NamespaceSection {
    /// Defaults for the session namespace (5 minutes).
    pub fn session() -> Self {
        Self::with_ttl_of(Namespace::SESSION)
    }

    /// Defaults for the credential namespace (15 minutes).
    pub fn credential() -> Self {
        Self::with_ttl_of(Namespace::CREDENTIAL)
    }

    fn with_ttl_of(namespace: Namespace) -> Self {
        Self {
            ttl_ms: Some(namespace.ttl().as_millis() as i64),
        }
    }

    /// `base` with this section's TTL applied.
    fn apply(&self, base: Namespace, field: &str) -> Result<Namespace> {
        match self.ttl_ms {
            Some(ms) => Ok(base.with_ttl(millis(field, ms)?)),
            None => Ok(base),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gateway Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Messaging gateway connection settings.
///
/// ```toml
/// [gateway]
/// base_url = "http://localhost:5000"
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the gateway REST API.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration.
///
/// ```toml
/// [logging]
/// stats_interval_secs = 60
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Interval between cache stats reports. Zero disables reporting.
    pub stats_interval_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval_secs: 60,
        }
    }
}

impl LoggingConfig {
    /// Reporting interval, `None` when disabled.
    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval_secs > 0).then(|| Duration::from_secs(self.stats_interval_secs))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
