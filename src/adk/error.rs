// SPDX-License-Identifier: MIT

//! Typed error handling for recap-rs
//!
//! Three families matter to callers:
//! - [`ConfigurationError`] - malformed graph wiring, always fatal
//! - [`RecapError::StepExecution`] - a step's work failed, carries the step name
//! - [`RecapError::Validation`] - the caller's input was rejected before a run

use thiserror::Error;

/// Top-level error type for recap-rs
#[derive(Debug, Error)]
pub enum RecapError {
    /// Graph wiring errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A step failed while running
    #[error("Step '{step}' failed: {source}")]
    StepExecution {
        step: String,
        #[source]
        source: Box<RecapError>,
    },

    /// Caller supplied unusable input
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Model/LLM errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// API errors from external services
    #[error("API error from {provider}: {message}")]
    Api { provider: String, message: String },

    /// Settings errors (missing env vars, unreadable config file)
    #[error("Settings error: {0}")]
    Settings(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

/// Graph wiring errors, detected at build time or right after a router call
#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("entry step '{0}' is not registered")]
    UnknownEntry(String),

    #[error("step '{0}' is not registered")]
    UnknownStep(String),

    #[error("step '{0}' is registered twice")]
    DuplicateStep(String),

    #[error("step '{0}' already has a router")]
    DuplicateRouter(String),

    #[error("'{0}' is a reserved name")]
    ReservedName(String),

    #[error("router after '{router}' selected unknown step '{target}'")]
    UnknownRouteTarget { router: String, target: String },

    #[error("step '{0}' routes to itself")]
    SelfLoop(String),

    #[error("cycle detected: {0:?}")]
    Cycle(Vec<String>),

    #[error("field '{field}' written by more than one step in one round: {steps:?}")]
    ConflictingWrite { field: String, steps: Vec<String> },

    #[error("step '{step}' writes immutable field '{field}'")]
    ImmutableField { step: String, field: String },

    #[error("step '{step}' wrote undeclared field '{field}'")]
    UndeclaredWrite { step: String, field: String },

    #[error("step '{0}' has a router and cannot degrade to a no-op")]
    DegradeOnRoutedStep(String),

    #[error("invalid state schema: {0}")]
    InvalidSchema(String),
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// Provider not supported
    #[error("Provider not supported: {0}")]
    UnsupportedProvider(String),

    /// Invalid response from model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    /// Response withheld by the provider
    #[error("Response blocked: {0}")]
    Blocked(String),
}

impl RecapError {
    /// Create an API error
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Wrap an error as the failure of `step`
    pub fn step(step: impl Into<String>, source: RecapError) -> Self {
        Self::StepExecution {
            step: step.into(),
            source: Box::new(source),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a settings error
    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings(message.into())
    }

    /// Stable tag for the error family, used in API responses
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::StepExecution { .. } => "step_execution",
            Self::Validation(_) => "validation",
            Self::Model(_) => "model",
            Self::Api { .. } => "api",
            Self::Settings(_) => "settings",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Yaml(_) => "yaml",
            Self::Http(_) => "http",
            Self::Other(_) => "other",
        }
    }

    /// Name of the failing step, if this is a step failure
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            Self::StepExecution { step, .. } => Some(step),
            _ => None,
        }
    }
}

impl From<&str> for RecapError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for RecapError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}
