// SPDX-License-Identifier: MIT

//! Offline extraction from marker phrases
//!
//! Sentences starting with a task marker ("todo", "action item", "we need
//! to", ...) become tasks. Sentences mentioning a follow-up ("follow up",
//! "next meeting", ...) become the follow-up. Everything else feeds the
//! summary.

use async_trait::async_trait;

use super::{Extraction, Extractor};
use crate::adk::error::RecapError;

const TASK_MARKERS: &[&str] = &[
    "action item",
    "todo",
    "to do",
    "to-do",
    "tasks",
    "task",
    "remind me to",
    "i need to",
    "we need to",
    "need to",
];

const FOLLOWUP_MARKERS: &[&str] = &[
    "follow up",
    "follow-up",
    "followup",
    "next meeting",
    "reconvene",
    "let's meet",
];

const SUMMARY_SENTENCES: usize = 2;
const SUMMARY_MAX_CHARS: usize = 280;

/// Heuristic extractor that needs no model
#[derive(Debug, Default, Clone)]
pub struct KeywordExtractor;

impl KeywordExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract_sync(&self, text: &str) -> Result<Extraction, RecapError> {
        let mut tasks = Vec::new();
        let mut followups = Vec::new();
        let mut narrative = Vec::new();

        for sentence in sentences(text) {
            let bare = sentence.trim_start_matches(['-', '*', '•', ' ']);

            if let Some(rest) = TASK_MARKERS
                .iter()
                .find_map(|m| strip_prefix_ignore_case(bare, m))
            {
                let task = rest.trim_start_matches([':', ' ', '-']).trim();
                if !task.is_empty() {
                    tasks.push(trim_terminator(task).to_string());
                }
            } else if FOLLOWUP_MARKERS
                .iter()
                .any(|m| bare.to_lowercase().contains(m))
            {
                followups.push(trim_terminator(bare).to_string());
            } else {
                narrative.push(sentence);
            }
        }

        let summary = if narrative.is_empty() {
            sentences(text).into_iter().next().unwrap_or_default()
        } else {
            narrative
                .into_iter()
                .take(SUMMARY_SENTENCES)
                .collect::<Vec<_>>()
                .join(" ")
        };

        Extraction {
            summary: summary.chars().take(SUMMARY_MAX_CHARS).collect(),
            tasks,
            followup: followups.join("; "),
        }
        .normalized()
    }
}

#[async_trait]
impl Extractor for KeywordExtractor {
    async fn extract(&self, text: &str) -> Result<Extraction, RecapError> {
        self.extract_sync(text)
    }
}

/// Split on newlines and on `.`, `!` or `?` followed by whitespace
fn sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            push_sentence(&mut out, &mut current);
            continue;
        }
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(true, |n| n.is_whitespace()) {
            push_sentence(&mut out, &mut current);
        }
    }
    push_sentence(&mut out, &mut current);
    out
}

fn push_sentence(out: &mut Vec<String>, current: &mut String) {
    let sentence = current.trim();
    if !sentence.is_empty() {
        out.push(sentence.to_string());
    }
    current.clear();
}

/// `s` without `prefix`, compared ASCII case-insensitively
fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        s.get(prefix.len()..)
    } else {
        None
    }
}

fn trim_terminator(s: &str) -> &str {
    s.trim_end_matches(['.', '!', '?'])
}
