//! Locating and loading the configuration file.
//!
//! Priority, first hit wins:
//!
//! 1. `--config <path>`
//! 2. `qgate.toml`, then `.qgate.toml`, in the scope root
//! 3. `config.toml` in the global directory (`$QGATE_CONFIG_DIR` or `~/.qgate/`)
//! 4. built-in defaults

use anyhow::{Context, Result};
use qgate_core::Config;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given with `--config`.
    Explicit(PathBuf),
    /// Found in the scope root.
    Project(PathBuf),
    /// Found in the global config directory.
    Global(PathBuf),
    /// Nothing found.
    Default,
}

impl ConfigSource {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Reads and parses the file, or returns defaults for [`ConfigSource::Default`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(&self) -> Result<Config> {
        let Some(path) = self.path() else {
            debug!("No config file found, using defaults");
            return Ok(Config::default());
        };
        if matches!(self, Self::Global(_)) {
            info!("Using global config: {}", path.display());
        }
        Config::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
    }
}

const PROJECT_FILES: [&str; 2] = ["qgate.toml", ".qgate.toml"];
const GLOBAL_FILE: &str = "config.toml";

/// Resolves the configuration source for a run rooted at `scope_root`.
#[must_use]
pub fn resolve(scope_root: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_in(scope_root, explicit, global_config_dir().as_deref())
}

fn resolve_in(scope_root: &Path, explicit: Option<&Path>, global_dir: Option<&Path>) -> ConfigSource {
    if let Some(p) = explicit {
        // trusted as-is; a missing file surfaces when loading
        return ConfigSource::Explicit(p.to_path_buf());
    }

    if let Some(found) = PROJECT_FILES
        .iter()
        .map(|name| scope_root.join(name))
        .find(|p| p.is_file())
    {
        debug!("Found project config: {}", found.display());
        return ConfigSource::Project(found);
    }

    match global_dir.map(|dir| dir.join(GLOBAL_FILE)) {
        Some(found) if found.is_file() => {
            debug!("Found global config: {}", found.display());
            ConfigSource::Global(found)
        }
        _ => ConfigSource::Default,
    }
}

/// `$QGATE_CONFIG_DIR`, else `~/.qgate/`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    std::env::var_os("QGATE_CONFIG_DIR")
        .map(PathBuf::from)
        .or_else(|| home::home_dir().map(|h| h.join(".qgate")))
}
