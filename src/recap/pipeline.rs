// SPDX-License-Identifier: MIT

//! The recap pipeline: summarize, then fan out to the action steps

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::adk::error::RecapError;
use crate::recap::actions::{AppendLog, DesktopNotifier, FileAppendLog, NoopNotifier, Notifier};
use crate::recap::config::RecapConfig;
use crate::recap::extract::Extractor;
use crate::recap::steps::{ActionRouter, FollowupStep, SummarizeStep, TodoStep, SUMMARIZE};
use crate::recap::workflow::graph::{GraphBuilder, GraphEngine, RunEvent};
use crate::recap::workflow::state::RecapState;

/// What a caller gets back from a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecapOutcome {
    pub summary: String,
    pub results: Vec<String>,
}

impl From<RecapState> for RecapOutcome {
    fn from(state: RecapState) -> Self {
        let (summary, results) = state.into_parts();
        Self { summary, results }
    }
}

/// External collaborators the steps use
pub struct Collaborators {
    pub extractor: Arc<dyn Extractor>,
    pub task_log: Arc<dyn AppendLog>,
    pub reminders: Arc<dyn AppendLog>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    /// File logs and notifier as configured, around `extractor`
    pub fn from_config(extractor: Arc<dyn Extractor>, config: &RecapConfig) -> Self {
        let notifier: Arc<dyn Notifier> = if config.notifications.enabled {
            Arc::new(DesktopNotifier::new())
        } else {
            Arc::new(NoopNotifier)
        };

        Self {
            extractor,
            task_log: Arc::new(FileAppendLog::new(&config.outputs.task_log)),
            reminders: Arc::new(FileAppendLog::new(&config.outputs.reminders)),
            notifier,
        }
    }
}

/// A built recap graph plus input limits. Cheap to share behind an `Arc`.
pub struct Recap {
    engine: GraphEngine,
    max_input_chars: usize,
}

impl Recap {
    pub fn new(collab: Collaborators, config: &RecapConfig) -> Result<Self, RecapError> {
        let mut builder = GraphBuilder::new().with_execution_mode(config.execution);
        builder
            .add_step(Arc::new(SummarizeStep::new(collab.extractor)))?
            .add_step_with_policy(
                Arc::new(TodoStep::new(collab.task_log)),
                config.failure.todo,
            )?
            .add_step_with_policy(
                Arc::new(FollowupStep::new(collab.notifier, collab.reminders)),
                config.failure.followup,
            )?
            .add_router(SUMMARIZE, Arc::new(ActionRouter::new()))?;

        Ok(Self {
            engine: builder.build()?,
            max_input_chars: config.max_input_chars,
        })
    }

    /// Wire the default file logs and notifier around `extractor`
    pub fn from_config(
        extractor: Arc<dyn Extractor>,
        config: &RecapConfig,
    ) -> Result<Self, RecapError> {
        Self::new(Collaborators::from_config(extractor, config), config)
    }

    pub fn engine(&self) -> &GraphEngine {
        &self.engine
    }

    /// Reject blank or oversized input before any state exists
    pub fn validate_input(&self, text: &str) -> Result<(), RecapError> {
        if text.trim().is_empty() {
            return Err(RecapError::validation("transcript is empty"));
        }
        let chars = text.chars().count();
        if chars > self.max_input_chars {
            return Err(RecapError::validation(format!(
                "transcript has {} characters, the limit is {}",
                chars, self.max_input_chars
            )));
        }
        Ok(())
    }

    /// Validate `text` and run the graph on its trimmed form
    pub async fn run(&self, text: &str) -> Result<RecapOutcome, RecapError> {
        self.validate_input(text)?;
        let state = self.engine.run(SUMMARIZE, text.trim()).await?;
        Ok(state.into())
    }

    /// Like [`run`](Self::run), also sending progress events on `tx`
    pub async fn run_stream(
        &self,
        text: &str,
        tx: mpsc::Sender<RunEvent>,
    ) -> Result<RecapOutcome, RecapError> {
        self.validate_input(text)?;
        let state = self.engine.run_stream(SUMMARIZE, text.trim(), tx).await?;
        Ok(state.into())
    }

    /// Run on a tokio task. The receiver yields exactly one result.
    pub fn spawn(
        self: &Arc<Self>,
        text: impl Into<String>,
    ) -> oneshot::Receiver<Result<RecapOutcome, RecapError>> {
        let (tx, rx) = oneshot::channel();
        let recap = Arc::clone(self);
        let text = text.into();

        tokio::spawn(async move {
            let outcome = recap.run(&text).await;
            if tx.send(outcome).is_err() {
                log::warn!("Recap result dropped: receiver went away");
            }
        });

        rx
    }
}
