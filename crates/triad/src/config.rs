//! Project configuration file support for triad.
//!
//! Loads optional settings from `triad.toml` in the working directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use triad_agent::ConfigOverrides;

/// Project-level configuration loaded from `triad.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Model name (env `MODEL_NAME` takes precedence)
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// API base URL (env `OPENAI_BASE_URL` takes precedence)
    pub base_url: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
    /// Path to a YAML prompt template file
    pub prompts: Option<PathBuf>,
    /// Directory for saved reports
    pub output_dir: Option<PathBuf>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "triad.toml";

impl ProjectConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }

    /// Model settings from the file, applied below environment variables
    pub fn model_fallback(&self) -> ConfigOverrides {
        ConfigOverrides {
            model_name: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            base_url: self.base_url.clone(),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}
