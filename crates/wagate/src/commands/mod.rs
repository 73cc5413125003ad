//! CLI command handlers.

use std::path::PathBuf;

use tracing::warn;
use wagate_config::Resolved;

pub mod config;
pub mod probe;
pub mod run;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// User config directory override.
    pub config_dir: Option<PathBuf>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Resolve config layers, logging any skipped file.
    pub fn resolve_config(&self) -> Resolved {
        let resolved = wagate_config::resolve(self.config_dir.as_deref(), None);
        for warning in resolved.warnings() {
            warn!("{warning}");
        }
        resolved
    }

    /// Path of the user config file.
    pub fn user_config_path(&self) -> Option<PathBuf> {
        match self.config_dir {
            Some(ref dir) => Some(dir.join("config.toml")),
            None => wagate_config::user_config_path(),
        }
    }
}
