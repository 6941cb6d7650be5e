// SPDX-License-Identifier: MIT

//! Recap configuration - YAML file loading with environment overrides
//!
//! Every section is optional. A missing file section falls back to its
//! default, and `MODEL_PROVIDER` / `RECAP_MODEL` override the model section.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::adk::error::RecapError;
use crate::adk::model::Provider;
use crate::recap::workflow::graph::{ExecutionMode, FailurePolicy};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_MAX_INPUT_CHARS: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecapConfig {
    pub model: ModelSettings,
    pub outputs: OutputSettings,
    pub notifications: NotificationSettings,
    pub execution: ExecutionMode,
    pub failure: FailureSettings,
    pub max_input_chars: usize,
}

impl Default for RecapConfig {
    fn default() -> Self {
        Self {
            model: ModelSettings::default(),
            outputs: OutputSettings::default(),
            notifications: NotificationSettings::default(),
            execution: ExecutionMode::default(),
            failure: FailureSettings::default(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// "gemini" or "openai". Inferred from `name` when absent.
    pub provider: Option<String>,
    pub name: String,
    pub temperature: f32,
    /// Replaces the built-in extraction instruction
    pub instruction: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: None,
            name: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            instruction: None,
        }
    }
}

impl ModelSettings {
    pub fn resolve_provider(&self) -> Result<Provider, RecapError> {
        match &self.provider {
            Some(name) => Ok(Provider::parse(name)?),
            None => Ok(Provider::infer(&self.name)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub task_log: String,
    pub reminders: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            task_log: "todo_list.txt".to_string(),
            reminders: "reminders.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub enabled: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Per action step failure policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailureSettings {
    pub todo: FailurePolicy,
    pub followup: FailurePolicy,
}

/// Loads [`RecapConfig`] from YAML files
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a config file and apply environment overrides
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<RecapConfig, RecapError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RecapError::settings(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let config = Self::parse_yaml(&content)?;
        log::info!("Loaded config from {}", path.display());
        Ok(Self::apply_env(config))
    }

    /// Load `path` when given, otherwise start from the defaults
    pub fn load_or_default<P: AsRef<Path>>(
        &self,
        path: Option<P>,
    ) -> Result<RecapConfig, RecapError> {
        match path {
            Some(path) => self.load(path),
            None => Ok(Self::apply_env(RecapConfig::default())),
        }
    }

    /// Parse a config from a YAML string. An empty document is the default.
    pub fn parse_yaml(content: &str) -> Result<RecapConfig, RecapError> {
        if content.trim().is_empty() {
            return Ok(RecapConfig::default());
        }
        let config: RecapConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    fn apply_env(config: RecapConfig) -> RecapConfig {
        Self::apply_overrides(
            config,
            env::var("MODEL_PROVIDER").ok(),
            env::var("RECAP_MODEL").ok(),
        )
    }

    fn apply_overrides(
        mut config: RecapConfig,
        provider: Option<String>,
        model: Option<String>,
    ) -> RecapConfig {
        if let Some(provider) = provider.filter(|p| !p.trim().is_empty()) {
            config.model.provider = Some(provider);
        }
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            config.model.name = model;
        }
        config
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
