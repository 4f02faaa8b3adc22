//! Configuration management
//!
//! Handles loading of the funding-program catalogue from a JSON file with
//! environment variable overrides.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::compliance::ProgramRules;

/// Environment variable naming the config file when `--config` is absent
pub const CONFIG_PATH_ENV: &str = "PROPFIRM_CONFIG";
/// Environment variable overriding `default_program`
pub const DEFAULT_PROGRAM_ENV: &str = "PROPFIRM_DEFAULT_PROGRAM";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Key into `programs` used when no program is named
    #[serde(default = "default_program_key")]
    pub default_program: String,
    /// Funding programs by short key, e.g. "50k"
    #[serde(default = "default_programs")]
    pub programs: BTreeMap<String, ProgramRules>,
}

fn default_program_key() -> String {
    "50k".to_string()
}

fn default_programs() -> BTreeMap<String, ProgramRules> {
    BTreeMap::from([
        ("50k".to_string(), ProgramRules::evaluation_50k()),
        ("100k".to_string(), ProgramRules::evaluation_100k()),
        ("150k".to_string(), ProgramRules::evaluation_150k()),
    ])
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_program: default_program_key(),
            programs: default_programs(),
        }
    }
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;

        debug!("Loaded {} programs from {}", config.programs.len(), path.display());
        config.with_env_overrides().validated()
    }

    /// Load from `path`, else from `PROPFIRM_CONFIG`, else the built-in presets
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match std::env::var(CONFIG_PATH_ENV) {
                Ok(env_path) if !env_path.trim().is_empty() => Self::from_file(env_path.trim()),
                _ => Config::default().with_env_overrides().validated(),
            },
        }
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(DEFAULT_PROGRAM_ENV) {
            if !key.trim().is_empty() {
                self.default_program = key.trim().to_string();
            }
        }
        self
    }

    /// Reject any program whose rules cannot be evaluated
    pub fn validated(self) -> Result<Self> {
        if self.programs.is_empty() {
            return Err(anyhow!("config defines no funding programs"));
        }
        for (key, rules) in &self.programs {
            rules
                .validate()
                .with_context(|| format!("Invalid rules for program '{}'", key))?;
        }
        if !self.programs.contains_key(&self.default_program) {
            return Err(anyhow!(
                "default program '{}' is not defined (available: {})",
                self.default_program,
                self.program_keys().join(", ")
            ));
        }
        Ok(self)
    }

    /// Rules for `key`, or the default program when `key` is `None`
    pub fn program(&self, key: Option<&str>) -> Result<&ProgramRules> {
        let key = key.unwrap_or(&self.default_program);
        self.programs.get(key).ok_or_else(|| {
            anyhow!(
                "unknown program '{}' (available: {})",
                key,
                self.program_keys().join(", ")
            )
        })
    }

    pub fn program_keys(&self) -> Vec<&str> {
        self.programs.keys().map(String::as_str).collect()
    }
}
