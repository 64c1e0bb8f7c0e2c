//! Application configuration management.
//!
//! Loads optional defaults (head/tail window, I/O thread count) from a
//! small JSON file under the platform config directory. Command-line flags
//! always win; a missing or unreadable file silently falls back to the
//! built-in defaults.

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::scanner::prober::{DEFAULT_HEADTAIL_BYTES, DEFAULT_IO_THREADS};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default bytes sampled from each file end by the head/tail probe.
    #[serde(default = "default_headtail_bytes")]
    pub headtail_bytes: usize,
    /// Default number of I/O threads for the probe phases.
    #[serde(default = "default_io_threads")]
    pub io_threads: usize,
}

fn default_headtail_bytes() -> usize {
    DEFAULT_HEADTAIL_BYTES
}

fn default_io_threads() -> usize {
    DEFAULT_IO_THREADS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            headtail_bytes: DEFAULT_HEADTAIL_BYTES,
            io_threads: DEFAULT_IO_THREADS,
        }
    }
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    #[must_use]
    pub fn load() -> Self {
        match Self::load_internal() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {e}");
                Self::default()
            }
        }
    }

    fn load_internal() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the configuration to the default platform-specific path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Get the default platform-specific configuration path.
    fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "dupsweep", "dupsweep")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.json"))
    }
}
