// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;

use super::TODO;
use crate::adk::error::RecapError;
use crate::recap::actions::AppendLog;
use crate::recap::workflow::graph::Step;
use crate::recap::workflow::state::{PartialState, RecapState, StateField};

/// Appends the extracted tasks to the task log
pub struct TodoStep {
    log: Arc<dyn AppendLog>,
}

impl TodoStep {
    pub fn new(log: Arc<dyn AppendLog>) -> Self {
        Self { log }
    }
}

fn task_block(tasks: &[String], timestamp: &str) -> String {
    let mut block = format!("\n--- New Tasks ({}) ---\n", timestamp);
    for task in tasks {
        block.push_str(&format!("* {}\n", task));
    }
    block
}

#[async_trait]
impl Step for TodoStep {
    fn name(&self) -> &str {
        TODO
    }

    fn writes(&self) -> &[StateField] {
        &[StateField::Results]
    }

    async fn run(&self, state: &RecapState) -> Result<PartialState, RecapError> {
        let tasks = state
            .extracted()
            .map(|e| e.tasks.as_slice())
            .unwrap_or_default();
        if tasks.is_empty() {
            return Ok(PartialState::new());
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.log.append(&task_block(tasks, &timestamp)).await?;
        log::info!("Logged {} tasks to {}", tasks.len(), self.log.target());

        Ok(PartialState::new().with_result(format!("Logged {} tasks.", tasks.len())))
    }
}
