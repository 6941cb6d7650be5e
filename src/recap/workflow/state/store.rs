// SPDX-License-Identifier: MIT

//! Runtime state for a single recap run

use serde::{Deserialize, Serialize};

use super::schema::{FieldPolicy, StateField, StateSchema};
use crate::adk::error::ConfigurationError;
use crate::recap::extract::Extraction;

/// State of one run. Never mutated in place: merging a partial yields a new
/// value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecapState {
    input_text: String,
    summary: String,
    extracted: Option<Extraction>,
    selected_actions: Vec<String>,
    results: Vec<String>,
}

impl RecapState {
    /// Fresh state with only `input_text` populated
    pub fn new(input_text: impl Into<String>) -> Self {
        Self {
            input_text: input_text.into(),
            summary: String::new(),
            extracted: None,
            selected_actions: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn extracted(&self) -> Option<&Extraction> {
        self.extracted.as_ref()
    }

    pub fn selected_actions(&self) -> &[String] {
        &self.selected_actions
    }

    pub fn results(&self) -> &[String] {
        &self.results
    }

    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.summary, self.results)
    }

    /// Merge one step's partial into a new state
    pub fn merge(&self, step: &str, partial: PartialState) -> Result<Self, ConfigurationError> {
        for field in partial.touched() {
            if field.policy() == FieldPolicy::Immutable {
                return Err(ConfigurationError::ImmutableField {
                    step: step.to_string(),
                    field: field.to_string(),
                });
            }
        }

        let PartialState {
            input_text: _,
            summary,
            extracted,
            selected_actions,
            results,
        } = partial;

        let mut next = self.clone();
        if let Some(summary) = summary {
            next.summary = summary;
        }
        if let Some(extracted) = extracted {
            next.extracted = Some(extracted);
        }
        merge_sequence(
            StateField::SelectedActions,
            &mut next.selected_actions,
            selected_actions,
        );
        merge_sequence(StateField::Results, &mut next.results, results);
        Ok(next)
    }

    /// Merge the partials of one frontier round, in the given order.
    ///
    /// Two partials writing the same `Replace` field is an error.
    pub fn merge_round(
        &self,
        partials: Vec<(String, PartialState)>,
    ) -> Result<Self, ConfigurationError> {
        for field in StateSchema::replaced_fields() {
            let writers: Vec<String> = partials
                .iter()
                .filter(|(_, p)| p.touches(field))
                .map(|(name, _)| name.clone())
                .collect();
            if writers.len() > 1 {
                return Err(ConfigurationError::ConflictingWrite {
                    field: field.to_string(),
                    steps: writers,
                });
            }
        }

        partials
            .into_iter()
            .try_fold(self.clone(), |state, (name, partial)| {
                state.merge(&name, partial)
            })
    }
}

fn merge_sequence(field: StateField, current: &mut Vec<String>, incoming: Vec<String>) {
    if incoming.is_empty() {
        return;
    }
    match field.policy() {
        FieldPolicy::Append => current.extend(incoming),
        FieldPolicy::Replace => *current = incoming,
        // rejected before merging
        FieldPolicy::Immutable => {}
    }
}

/// The fields a step changes. Unset fields are left alone by the merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialState {
    pub input_text: Option<String>,
    pub summary: Option<String>,
    pub extracted: Option<Extraction>,
    pub selected_actions: Vec<String>,
    pub results: Vec<String>,
}

impl PartialState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_extracted(mut self, extracted: Extraction) -> Self {
        self.extracted = Some(extracted);
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.selected_actions.push(action.into());
        self
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.results.push(result.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.touched().is_empty()
    }

    pub fn touches(&self, field: StateField) -> bool {
        match field {
            StateField::InputText => self.input_text.is_some(),
            StateField::Summary => self.summary.is_some(),
            StateField::Extracted => self.extracted.is_some(),
            StateField::SelectedActions => !self.selected_actions.is_empty(),
            StateField::Results => !self.results.is_empty(),
        }
    }

    /// Fields this partial writes, in schema order
    pub fn touched(&self) -> Vec<StateField> {
        StateSchema::FIELDS
            .iter()
            .map(|s| s.field)
            .filter(|f| self.touches(*f))
            .collect()
    }
}
