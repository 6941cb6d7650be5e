// SPDX-License-Identifier: MIT

//! LLM-backed extraction

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{Extraction, Extractor};
use crate::adk::error::{ModelError, RecapError};
use crate::adk::model::{Content, GenerationConfig, Model};

const DEFAULT_INSTRUCTION: &str =
    "Analyze the meeting text and extract the summary, tasks, and followups.";

// --- Static schema ---

pub static EXTRACTION_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "summary": {
                "type": "string",
                "description": "Brief overview of the meeting"
            },
            "tasks": {
                "type": "array",
                "items": { "type": "string" },
                "description": "List of todos"
            },
            "followup": {
                "type": "string",
                "description": "Details of the next meeting or followup"
            }
        },
        "required": ["summary", "tasks", "followup"]
    })
});

/// Models occasionally send `null` for absent fields
#[derive(Debug, Deserialize)]
struct RawExtraction {
    summary: Option<String>,
    #[serde(default)]
    tasks: Option<Vec<String>>,
    #[serde(default)]
    followup: Option<String>,
}

/// Parse a model reply into an Extraction.
///
/// Accepts a bare JSON object or one wrapped in a Markdown code fence.
pub fn parse_extraction(text: &str) -> Result<Extraction, RecapError> {
    let body = strip_code_fence(text);
    let raw: RawExtraction = serde_json::from_str(body).map_err(|e| {
        ModelError::InvalidResponse(format!("extraction is not valid JSON ({}): {}", e, text))
    })?;

    Extraction {
        summary: raw.summary.unwrap_or_default(),
        tasks: raw.tasks.unwrap_or_default(),
        followup: raw.followup.unwrap_or_default(),
    }
    .normalized()
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Extractor that asks a model for a schema-constrained JSON reply
pub struct LlmExtractor {
    model: Arc<dyn Model>,
    instruction: String,
    config: GenerationConfig,
}

impl LlmExtractor {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self {
            model,
            instruction: DEFAULT_INSTRUCTION.to_string(),
            config: GenerationConfig {
                temperature: Some(0.0),
                max_output_tokens: None,
                response_schema: Some(EXTRACTION_SCHEMA.clone()),
            },
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(&self, text: &str) -> Result<Extraction, RecapError> {
        let history = [
            Content::text("system", self.instruction.clone()),
            Content::text("user", text),
        ];

        let response = self
            .model
            .generate_content(&history, Some(&self.config))
            .await?;

        let reply = response.joined_text();
        log::debug!("Extraction reply: {}", reply);
        parse_extraction(&reply)
    }
}
