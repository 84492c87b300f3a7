//! Configuration loading for EarlyGuard.
//! Reads earlyguard.toml from the current directory or the path in the
//! EARLYGUARD_CONFIG env var. Every field has a default, so a missing file
//! is not an error — embedded/test callers just use `Config::default()`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EarlyGuardError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// Settings for the per-domain prediction service endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String { "http://localhost:5000".to_string() }
fn default_timeout_secs() -> u64 { 10 }

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Settings handed to the text-recognition collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Language hint for the recognizer.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String { "eng".to_string() }

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { language: default_language() }
    }
}

impl Config {
    /// Load configuration from earlyguard.toml.
    /// Checks EARLYGUARD_CONFIG env var first, then the current directory;
    /// falls back to defaults when no file is present.
    pub fn load() -> Result<Self> {
        let path = std::env::var("EARLYGUARD_CONFIG")
            .unwrap_or_else(|_| "earlyguard.toml".to_string());

        if !Path::new(&path).exists() {
            return Ok(Self::default());
        }
        Self::from_path(Path::new(&path))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EarlyGuardError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            EarlyGuardError::Config(format!("cannot parse {}: {e}", path.display()))
        })
    }
}
