//! Finding config files and tracing where each section came from.
//!
//! Two layers are read, lowest precedence first:
//! 1. the user file, `config.toml` in the user config dir
//!    (`$WAGATE_CONFIG_DIR`, else `<platform config dir>/wagate`)
//! 2. the project file, `wagate.toml` in the working directory
//!
//! A section set in a later layer replaces the whole section from an earlier
//! one. Sections set nowhere fall back to built-in defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::{ConfigError, Result, Section, Settings, WagateConfig};

const USER_FILE: &str = "config.toml";
const PROJECT_FILE: &str = "wagate.toml";
const DIR_ENV: &str = "WAGATE_CONFIG_DIR";

/// Which of the two config files a layer is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    User,
    Project,
}

impl LayerKind {
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::User => "user",
            LayerKind::Project => "project",
        }
    }
}

/// What happened when a layer was read.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerStatus {
    /// No file at the path.
    Missing,
    /// Parsed and merged.
    Loaded,
    /// Present but unreadable or malformed; skipped entirely.
    Skipped(String),
}

/// One config file considered during resolution.
#[derive(Debug, Clone)]
pub struct Layer {
    pub kind: LayerKind,
    pub path: PathBuf,
    pub status: LayerStatus,
}

/// Merged config plus the provenance of every section.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Sections as set by the files, without defaults.
    pub config: WagateConfig,
    pub layers: Vec<Layer>,
    origins: BTreeMap<Section, usize>,
}

impl Resolved {
    /// Layer that set `section`, or `None` when it is defaulted.
    pub fn origin(&self, section: Section) -> Option<&Layer> {
        self.origins.get(&section).map(|&i| &self.layers[i])
    }

    /// Files config was actually read from.
    pub fn loaded(&self) -> impl Iterator<Item = &Layer> {
        self.layers
            .iter()
            .filter(|layer| layer.status == LayerStatus::Loaded)
    }

    /// One message per skipped file.
    pub fn warnings(&self) -> Vec<String> {
        self.layers
            .iter()
            .filter_map(|layer| match layer.status {
                LayerStatus::Skipped(ref reason) => Some(format!(
                    "Ignoring {} config {}: {}",
                    layer.kind.name(),
                    layer.path.display(),
                    reason
                )),
                _ => None,
            })
            .collect()
    }

    /// Every section, defaults filled in where no file set it.
    pub fn effective(&self) -> WagateConfig {
        let mut config = WagateConfig::with_defaults();
        config.merge(self.config.clone());
        config
    }

    /// Validated settings for building the cache and services.
    pub fn settings(&self) -> Result<Settings> {
        self.config.settings()
    }

    fn push(&mut self, kind: LayerKind, path: PathBuf) {
        let status = if !path.is_file() {
            LayerStatus::Missing
        } else {
            match read_config_file(&path) {
                Ok(layer) => {
                    let index = self.layers.len();
                    for section in Section::ALL {
                        if layer.has(section) {
                            self.origins.insert(section, index);
                        }
                    }
                    self.config.merge(layer);
                    LayerStatus::Loaded
                }
                Err(e) => LayerStatus::Skipped(e.to_string()),
            }
        };
        self.layers.push(Layer { kind, path, status });
    }
}

/// Resolve config from the user dir and the project dir.
///
/// `user_dir` overrides `WAGATE_CONFIG_DIR` and the platform default;
/// `project_dir` defaults to the working directory. Never fails: files that
/// cannot be used are recorded as [`LayerStatus::Skipped`].
pub fn resolve(user_dir: Option<&Path>, project_dir: Option<&Path>) -> Resolved {
    let mut resolved = Resolved {
        config: WagateConfig::new(),
        layers: Vec::with_capacity(2),
        origins: BTreeMap::new(),
    };

    let user_file = match user_dir {
        Some(dir) => Some(dir.join(USER_FILE)),
        None => user_config_path(),
    };
    if let Some(path) = user_file {
        resolved.push(LayerKind::User, path);
    }

    let project_dir = project_dir.unwrap_or(Path::new("."));
    resolved.push(LayerKind::Project, project_dir.join(PROJECT_FILE));

    resolved
}

/// Parse one config file.
pub fn read_config_file(path: &Path) -> Result<WagateConfig> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    WagateConfig::from_toml(&contents)
}

/// Write `config` to `path`, creating parent directories.
pub fn save_config(config: &WagateConfig, path: &Path) -> Result<()> {
    let write_err = |path: &Path, source| ConfigError::WriteFile {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;
    }
    std::fs::write(path, config.to_toml()?).map_err(|e| write_err(path, e))
}

/// User config directory: `$WAGATE_CONFIG_DIR` if set and non-empty.
pub fn user_config_dir() -> Option<PathBuf> {
    match std::env::var(DIR_ENV) {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join("wagate")),
    }
}

/// The user config file inside [`user_config_dir`].
pub fn user_config_path() -> Option<PathBuf> {
    user_config_dir().map(|d| d.join(USER_FILE))
}
