// SPDX-License-Identifier: MIT

//! Model module - defines LLM model trait and implementations
//!
//! This module provides the core Model trait and shared types.
//! Model implementations are in their own submodules:
//! - [gemini] - Google's Gemini API
//! - [openai] - OpenAI-compatible chat completions

pub mod gemini;
pub mod openai;

use crate::adk::error::{ModelError, RecapError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    /// JSON schema the response must follow. When set, the model is asked
    /// for a JSON document instead of free text.
    pub response_schema: Option<serde_json::Value>,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Concatenated text parts, thinking excluded
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::Thinking(_) => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Parts of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Part {
    /// Regular text output from the model
    Text(String),
    /// Thinking/reasoning content from thinking models
    Thinking(String),
}

/// Core trait for LLM model implementations
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content, RecapError>;
}

/// Supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    Gemini,
    OpenAI,
}

impl Provider {
    /// Parse a provider name, case-insensitive
    pub fn parse(name: &str) -> Result<Self, ModelError> {
        match name.to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            other => Err(ModelError::UnsupportedProvider(other.to_string())),
        }
    }

    /// Infer provider from a model name
    pub fn infer(model_name: &str) -> Self {
        if model_name.starts_with("gpt") || model_name.starts_with("o1") {
            Self::OpenAI
        } else {
            Self::Gemini
        }
    }
}

/// Build a model for `provider`, reading credentials from the environment
pub fn create_model(provider: Provider, model_name: &str) -> Result<Arc<dyn Model>, RecapError> {
    log::info!("Using provider: {:?} with model: {}", provider, model_name);
    let model: Arc<dyn Model> = match provider {
        Provider::Gemini => Arc::new(gemini::GeminiModel::new(model_name.to_string())?),
        Provider::OpenAI => Arc::new(openai::OpenAIModel::new(model_name.to_string())?),
    };
    Ok(model)
}
