//! Persisted tool configuration
//!
//! Remembers the download tool executable the user picked so later runs
//! skip discovery. Stored as a small JSON file under the platform config
//! directory.

use crate::utils::error::TubeloaderError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// On-disk settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Explicitly configured path to the download tool executable
    pub tool_path: Option<PathBuf>,
}

impl ToolConfig {
    /// Location of the config file
    /// - macOS: ~/Library/Application Support/tubeloader/config.json
    /// - Windows: %APPDATA%\tubeloader\config.json
    /// - Linux: ~/.config/tubeloader/config.json
    pub fn config_file() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubeloader")
            .join("config.json")
    }

    /// Load the persisted configuration, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(err) => {
                    warn!("ignoring unparseable config at {}: {}", path.display(), err);
                    Self::default()
                }
            },
            Err(err) => {
                debug!("no config at {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    /// Persist the configuration.
    pub fn save(&self) -> Result<(), TubeloaderError> {
        self.save_to(&Self::config_file())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), TubeloaderError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The configured tool path, but only if it still points at a file.
    /// A stale entry (the executable was moved or removed) is ignored.
    pub fn valid_tool_path(&self) -> Option<PathBuf> {
        match &self.tool_path {
            Some(path) if path.is_file() => Some(path.clone()),
            Some(path) => {
                warn!("configured tool path {} no longer exists", path.display());
                None
            }
            None => None,
        }
    }
}
