// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use super::{FOLLOWUP, SUMMARIZE, TODO};
use crate::adk::error::RecapError;
use crate::recap::extract::Extractor;
use crate::recap::workflow::graph::Step;
use crate::recap::workflow::state::{PartialState, RecapState, StateField};

const WRITES: &[StateField] = &[
    StateField::Summary,
    StateField::Extracted,
    StateField::SelectedActions,
];

/// Extracts the summary, tasks and follow-up and selects the actions to run
pub struct SummarizeStep {
    extractor: Arc<dyn Extractor>,
}

impl SummarizeStep {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl Step for SummarizeStep {
    fn name(&self) -> &str {
        SUMMARIZE
    }

    fn writes(&self) -> &[StateField] {
        WRITES
    }

    async fn run(&self, state: &RecapState) -> Result<PartialState, RecapError> {
        log::info!(
            "Summarizing {} chars of transcript",
            state.input_text().len()
        );
        let extraction = self.extractor.extract(state.input_text()).await?;
        let extraction = extraction.normalized()?;

        let mut partial = PartialState::new().with_summary(extraction.summary.clone());
        if extraction.has_tasks() {
            partial = partial.with_action(TODO);
        }
        if extraction.has_followup() {
            partial = partial.with_action(FOLLOWUP);
        }
        log::debug!(
            "Extracted {} tasks, followup: {}",
            extraction.tasks.len(),
            extraction.has_followup()
        );

        Ok(partial.with_extracted(extraction))
    }
}
