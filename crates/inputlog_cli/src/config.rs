//! inputlog configuration file handling

use anyhow::{Context, Result};
use inputlog_recorder::{RecorderConfig, ReplayConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "inputlog.toml";

/// Top-level configuration (inputlog.toml)
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct InputlogConfig {
    /// Recording thresholds. The CLI does not record; `inputlog config`
    /// shows them for applications that build a `SessionControl` from this file.
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

impl InputlogConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `inputlog.toml` in the
    /// current directory is used if present, defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file {} does not exist", path.display());
                }
                Self::load_file(path)
            }
            None => {
                let path = Path::new(CONFIG_FILE);
                if path.exists() {
                    Self::load_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
