// SPDX-License-Identifier: MIT

//! Gemini Model - Google's Gemini API implementation

use super::{Content, GenerationConfig, Model, Part};
use crate::adk::error::{ModelError, RecapError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;

/// Google Gemini model implementation
pub struct GeminiModel {
    client: Client,
    api_key: String,
    model_name: String,
}

impl GeminiModel {
    /// Create a new GeminiModel
    ///
    /// Requires `GOOGLE_API_KEY` environment variable to be set.
    pub fn new(model_name: String) -> Result<Self, RecapError> {
        let api_key = env::var("GOOGLE_API_KEY")
            .map_err(|_| ModelError::ApiKeyMissing("Gemini (GOOGLE_API_KEY)".to_string()))?;
        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
        })
    }
}

/// Build the `generateContent` request body.
///
/// Gemini has no system role in `contents`; system messages go to
/// `systemInstruction`.
pub fn build_request_body(history: &[Content], config: Option<&GenerationConfig>) -> Value {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for c in history {
        let parts: Vec<Value> = c.parts.iter().filter_map(part_to_gemini_json).collect();
        if c.role == "system" {
            system_parts.extend(parts);
        } else {
            contents.push(json!({ "role": c.role, "parts": parts }));
        }
    }

    let mut body = json!({ "contents": contents });
    if !system_parts.is_empty() {
        body["systemInstruction"] = json!({ "parts": system_parts });
    }

    if let Some(cfg) = config {
        let mut generation = json!({});
        if let Some(t) = cfg.temperature {
            generation["temperature"] = json!(t);
        }
        if let Some(max) = cfg.max_output_tokens {
            generation["maxOutputTokens"] = json!(max);
        }
        if let Some(schema) = &cfg.response_schema {
            generation["responseMimeType"] = json!("application/json");
            generation["responseSchema"] = schema.clone();
        }
        body["generationConfig"] = generation;
    }

    body
}

/// Serialize a Part to Gemini API JSON format
/// Returns None for parts that shouldn't be sent (e.g., Thinking)
pub fn part_to_gemini_json(part: &Part) -> Option<Value> {
    match part {
        Part::Text(t) => Some(json!({ "text": t })),
        Part::Thinking(_) => None,
    }
}

/// Parse a Gemini API JSON part into Parts
pub fn parse_gemini_part(p: &Value) -> Vec<Part> {
    let mut parts = Vec::new();

    if p.get("thought").and_then(|t| t.as_bool()) == Some(true) {
        if let Some(text) = p["text"].as_str() {
            parts.push(Part::Thinking(text.to_string()));
        }
        return parts;
    }

    if let Some(text) = p["text"].as_str() {
        parts.push(Part::Text(text.to_string()));
    }

    parts
}

/// Turn a `generateContent` response into Content
pub fn parse_response(resp_json: &Value) -> Result<Content, RecapError> {
    let candidate = resp_json["candidates"]
        .as_array()
        .and_then(|c| c.first())
        .ok_or_else(|| ModelError::InvalidResponse("No candidates in response".to_string()))?;

    if let Some(finish_reason) = candidate.get("finishReason").and_then(|v| v.as_str()) {
        log::debug!("Gemini finish reason: {}", finish_reason);
        if finish_reason == "SAFETY" || finish_reason == "RECITATION" {
            let reason = format!("Gemini finish reason {}", finish_reason);
            return Err(ModelError::Blocked(reason).into());
        }
    }

    let parts_json = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            log::error!("No content parts in candidate: {}", resp_json);
            ModelError::InvalidResponse(format!("No content in Gemini response: {}", candidate))
        })?;

    Ok(Content {
        role: "model".to_string(),
        parts: parts_json.iter().flat_map(parse_gemini_part).collect(),
    })
}

#[async_trait]
impl Model for GeminiModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content, RecapError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model_name, self.api_key
        );

        let body = build_request_body(history, config);
        log::debug!(
            "Gemini request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self.client.post(&url).json(&body).send().await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(RecapError::api("Gemini", text));
        }

        let resp_json: Value = resp.json().await?;
        log::debug!("Gemini response: {}", resp_json);

        parse_response(&resp_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_message_becomes_instruction() {
        let history = [
            Content::text("system", "Extract things."),
            Content::text("user", "Meeting notes"),
        ];
        let body = build_request_body(&history, None);

        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "Extract things."
        );
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_response_schema_sets_json_mime_type() {
        let config = GenerationConfig {
            temperature: Some(0.0),
            max_output_tokens: None,
            response_schema: Some(json!({"type": "object"})),
        };
        let body = build_request_body(&[Content::text("user", "hi")], Some(&config));

        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "object");
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
    }

    #[test]
    fn test_parse_thought_part() {
        let parts = parse_gemini_part(&json!({ "text": "pondering", "thought": true }));
        assert_eq!(parts.len(), 1);
        assert!(matches!(&parts[0], Part::Thinking(t) if t == "pondering"));
    }

    #[test]
    fn test_parse_response_text() {
        let resp = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "{\"summary\":\"s\"}" }] },
                "finishReason": "STOP"
            }]
        });
        let content = parse_response(&resp).unwrap();
        assert_eq!(content.joined_text(), "{\"summary\":\"s\"}");
    }

    #[test]
    fn test_parse_response_safety_block() {
        let resp = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        let err = parse_response(&resp).unwrap_err();
        assert!(matches!(err, RecapError::Model(ModelError::Blocked(_))));
    }

    #[test]
    fn test_parse_response_without_candidates() {
        let err = parse_response(&json!({})).unwrap_err();
        assert!(matches!(err, RecapError::Model(ModelError::InvalidResponse(_))));
    }
}
