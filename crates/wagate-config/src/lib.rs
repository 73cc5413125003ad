//! Configuration system for wagate.
//!
//! Provides TOML-based configuration with:
//! - Cache tuning (`[cache]`): default TTL, sweep interval, sweep batch size
//! - Namespace TTLs (`[session]`, `[credential]`)
//! - Gateway connection settings (`[gateway]`)
//! - Stats reporting (`[logging]`)
//! - Config file layering (user config dir + project-local overrides) with
//!   per-section provenance

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    Layer, LayerKind, LayerStatus, Resolved, read_config_file, resolve, save_config,
    user_config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
