//! Layered CLI configuration: flags over `.kairox/config.json` over environment.

use anyhow::{Context, Result};
use kairox_core::models::ModelConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = ".kairox/config.json";

/// Settings that may live in the config file. API keys stay in the environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub deep_research: Option<bool>,
    pub quiet: Option<bool>,
}

impl FileConfig {
    /// Load `path`, or the default location when `path` is `None`.
    ///
    /// A missing default file is an empty config; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !path.exists() && !explicit {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}

/// Model selection given on the command line
#[derive(Debug, Clone, Default)]
pub struct ModelFlags {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Resolve the model config, each setting taken from the first layer that has it
pub fn resolve_model_config(
    flags: &ModelFlags,
    file: &FileConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ModelConfig> {
    let layered = |name: &str| {
        let (flag, from_file) = match name {
            "KAIROX_PROVIDER" => (&flags.provider, &file.provider),
            "KAIROX_MODEL" => (&flags.model, &file.model),
            "KAIROX_BASE_URL" => (&flags.base_url, &file.base_url),
            _ => (&None, &None),
        };
        flag.clone()
            .or_else(|| from_file.clone())
            .or_else(|| env(name))
    };

    ModelConfig::from_vars(layered).context("Failed to resolve model configuration")
}
