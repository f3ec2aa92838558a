//! Project configuration
//!
//! Read from `nbdok.toml` (or `.nbdok.toml`) at the project root, or from an
//! explicit `--config` path. Every field has a default, so an empty or
//! partial file is valid.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use nbdok_core::{IndexConfig, RenderConfig, ScanConfig};

/// Config file names looked up at the project root, in order
pub const CONFIG_CANDIDATES: [&str; 2] = ["nbdok.toml", ".nbdok.toml"];

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Documentation output settings
    pub docs: DocsSettings,
    /// Doc scanner settings
    pub scan: ScanConfig,
    /// Index page settings
    pub index: IndexConfig,
}

/// Documentation output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsSettings {
    /// Docs root, relative to the project root
    pub dir: String,
    /// Image directory, relative to the docs root
    pub images_dir: String,
    /// Language tag of fenced example code
    pub code_language: String,
    /// Remove the docs root before generating
    pub clean: bool,
}

impl Default for DocsSettings {
    fn default() -> Self {
        Self {
            dir: "docs".to_string(),
            images_dir: "nbdok_images".to_string(),
            code_language: "python".to_string(),
            clean: false,
        }
    }
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Page rendering options
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            code_language: self.docs.code_language.clone(),
        }
    }
}

/// Load settings from a config file or use defaults
pub fn load_settings(root: &Path, config_path: Option<&Path>) -> Result<Settings> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            read_settings(path)
        }
        None => {
            for candidate in CONFIG_CANDIDATES {
                let path = root.join(candidate);
                if path.exists() {
                    return read_settings(&path);
                }
            }
            Ok(Settings::default())
        }
    }
}

fn read_settings(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    Settings::from_toml_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))
}
