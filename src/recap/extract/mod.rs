// SPDX-License-Identifier: MIT

//! Extraction collaborators
//!
//! An [`Extractor`] turns a transcript into an [`Extraction`]: a summary,
//! a task list and an optional follow-up. Implementations:
//! - [`LlmExtractor`] - asks a model for a schema-constrained JSON document
//! - [`KeywordExtractor`] - offline heuristics over marker phrases
//! - [`StaticExtractor`] - returns a fixed result

mod keyword;
mod llm;

pub use keyword::KeywordExtractor;
pub use llm::{parse_extraction, LlmExtractor, EXTRACTION_SCHEMA};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::adk::error::{ModelError, RecapError};

/// Structured record produced from a transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Extraction {
    /// Brief overview of the meeting
    pub summary: String,
    /// List of todos
    #[serde(default)]
    pub tasks: Vec<String>,
    /// Details of the next meeting or follow-up, empty when there is none
    #[serde(default)]
    pub followup: String,
}

impl Extraction {
    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn has_followup(&self) -> bool {
        !self.followup.trim().is_empty()
    }

    /// Trim entries, drop blank tasks and require a summary
    pub fn normalized(self) -> Result<Self, RecapError> {
        let summary = self.summary.trim().to_string();
        if summary.is_empty() {
            let reason = "extraction has an empty summary".to_string();
            return Err(ModelError::InvalidResponse(reason).into());
        }

        Ok(Self {
            summary,
            tasks: self
                .tasks
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            followup: self.followup.trim().to_string(),
        })
    }
}

/// Text in, structured record out
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Extraction, RecapError>;
}

/// Extractor that always returns the same outcome
pub struct StaticExtractor {
    outcome: Result<Extraction, String>,
}

impl StaticExtractor {
    pub fn new(extraction: Extraction) -> Self {
        Self {
            outcome: Ok(extraction),
        }
    }

    /// Extractor that always fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
        }
    }
}

#[async_trait]
impl Extractor for StaticExtractor {
    async fn extract(&self, _text: &str) -> Result<Extraction, RecapError> {
        match &self.outcome {
            Ok(extraction) => Ok(extraction.clone()),
            Err(message) => Err(RecapError::api("static", message.clone())),
        }
    }
}
