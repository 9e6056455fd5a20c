//! YAML configuration for toolkit handles

use crate::extract::ExtractOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Toolkit settings, usually loaded from a YAML file
///
/// Every field is optional; anything left out falls back to the
/// environment (`JAVA_HOME`, `PATH`, the system temp dir) or to the
/// toolkit's own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    /// Explicit java executable
    pub java_path: Option<PathBuf>,
    /// Explicit jar to serve instead of searching for the pinned archive
    pub archive_path: Option<PathBuf>,
    /// Directory containing the pinned archive
    pub archive_dir: Option<PathBuf>,
    /// Override for the archive name requested from the provider
    pub archive_name: Option<String>,
    /// Where the materialized jar and per-call temp files are created
    pub scratch_dir: Option<PathBuf>,
    /// Deadline applied to every subprocess call
    pub timeout_secs: Option<u64>,
    /// Image format for page extraction (`-format`)
    pub image_format: Option<String>,
    /// Render resolution for page extraction (`-dpi`)
    pub dpi: Option<u32>,
}

impl ToolkitConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config: {path}"))?;
        let config: ToolkitConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {path}"))?;
        Ok(config)
    }

    /// Load `path` if given, falling back to defaults when it is missing or invalid
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(path) => Self::load_from_file(path).unwrap_or_else(|e| {
                log::warn!("⚠️  {e:#}, using default config");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Page extraction options derived from this config
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            format: self.image_format.clone(),
            dpi: self.dpi,
        }
    }
}
