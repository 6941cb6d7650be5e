// SPDX-License-Identifier: MIT

//! Graph type definitions
//!
//! Routing outcomes, per-step failure policy, round execution mode and the
//! progress events emitted by a streaming run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::recap::workflow::state::StateField;

/// Reserved name for graph exit. No step can be registered under it.
pub const END: &str = "__end__";

/// One routing decision
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// Schedule the named step
    Step(String),
    /// No further work on this branch
    End,
}

impl Route {
    pub fn step(name: impl Into<String>) -> Self {
        Route::Step(name.into())
    }
}

/// What the engine does when a step fails
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the run with the step's error (default)
    #[default]
    #[serde(rename = "fail", alias = "fail_fast")]
    FailFast,
    /// Log the error and continue as if the step returned nothing.
    /// Only allowed on terminal steps.
    #[serde(rename = "degrade")]
    Degrade,
}

/// How the steps of one frontier round are executed
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Run all steps of a round at once (default)
    #[default]
    Concurrent,
    /// Run the steps of a round one after another, in registration order
    Sequential,
}

/// Progress events emitted by a streaming run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        run_id: Uuid,
        entry: String,
    },
    StepStarted {
        run_id: Uuid,
        step: String,
    },
    StepCompleted {
        run_id: Uuid,
        step: String,
        touched: Vec<StateField>,
    },
    StepDegraded {
        run_id: Uuid,
        step: String,
        error: String,
    },
    Routed {
        run_id: Uuid,
        from: String,
        to: Vec<String>,
    },
    Finished {
        run_id: Uuid,
        summary: String,
        results: Vec<String>,
    },
    Failed {
        run_id: Uuid,
        error: String,
    },
}
