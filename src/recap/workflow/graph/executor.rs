// SPDX-License-Identifier: MIT

//! Graph engine - runs a validated graph from an entry step to completion

use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::step::{Router, Step};
use super::types::{ExecutionMode, FailurePolicy, Route, RunEvent};
use crate::adk::error::{ConfigurationError, RecapError};
use crate::recap::workflow::state::{PartialState, RecapState};

/// A step plus its failure policy
pub(crate) struct RegisteredStep {
    pub step: Arc<dyn Step>,
    pub policy: FailurePolicy,
}

/// Executes a graph built by [`GraphBuilder`](super::GraphBuilder)
pub struct GraphEngine {
    steps: Vec<RegisteredStep>, // Registration order fixes merge order
    index: HashMap<String, usize>,
    routers: HashMap<usize, Arc<dyn Router>>,
    mode: ExecutionMode,
}

impl GraphEngine {
    pub(crate) fn new(
        steps: Vec<RegisteredStep>,
        index: HashMap<String, usize>,
        routers: HashMap<usize, Arc<dyn Router>>,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            steps,
            index,
            routers,
            mode,
        }
    }

    /// Step names in registration order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|r| r.step.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Run from `entry` with a fresh state holding `input_text`
    pub async fn run(&self, entry: &str, input_text: &str) -> Result<RecapState, RecapError> {
        self.execute(entry, input_text, None).await
    }

    /// Like [`run`](Self::run), also emitting progress events on `tx`
    pub async fn run_stream(
        &self,
        entry: &str,
        input_text: &str,
        tx: mpsc::Sender<RunEvent>,
    ) -> Result<RecapState, RecapError> {
        self.execute(entry, input_text, Some(&tx)).await
    }

    async fn execute(
        &self,
        entry: &str,
        input_text: &str,
        events: Option<&mpsc::Sender<RunEvent>>,
    ) -> Result<RecapState, RecapError> {
        let run_id = Uuid::new_v4();
        let outcome = self.execute_rounds(run_id, entry, input_text, events).await;

        match &outcome {
            Ok(state) => {
                log::info!(
                    "Run {} finished with {} results",
                    run_id,
                    state.results().len()
                );
                emit(
                    events,
                    RunEvent::Finished {
                        run_id,
                        summary: state.summary().to_string(),
                        results: state.results().to_vec(),
                    },
                )
                .await;
            }
            Err(e) => {
                log::error!("Run {} failed: {}", run_id, e);
                emit(
                    events,
                    RunEvent::Failed {
                        run_id,
                        error: e.to_string(),
                    },
                )
                .await;
            }
        }

        outcome
    }

    async fn execute_rounds(
        &self,
        run_id: Uuid,
        entry: &str,
        input_text: &str,
        events: Option<&mpsc::Sender<RunEvent>>,
    ) -> Result<RecapState, RecapError> {
        let entry_idx = *self
            .index
            .get(entry)
            .ok_or_else(|| ConfigurationError::UnknownEntry(entry.to_string()))?;

        emit(
            events,
            RunEvent::RunStarted {
                run_id,
                entry: entry.to_string(),
            },
        )
        .await;

        let mut state = RecapState::new(input_text);
        let mut frontier = vec![entry_idx];
        let mut round = 0;

        while !frontier.is_empty() {
            round += 1;
            // Acyclic wiring finishes within one round per step
            if round > self.steps.len() {
                return Err(ConfigurationError::Cycle(self.names(&frontier)).into());
            }

            log::info!(
                "Run {} round {}: executing {} steps: {:?}",
                run_id,
                round,
                frontier.len(),
                self.names(&frontier)
            );

            let outputs = self.run_round(run_id, &frontier, &state, events).await;

            let mut partials = Vec::with_capacity(outputs.len());
            for (&idx, output) in frontier.iter().zip(outputs) {
                partials.push((self.steps[idx].step.name().to_string(), output?));
            }
            state = state.merge_round(partials)?;

            frontier = self.next_frontier(run_id, &frontier, &state, events).await?;
        }

        Ok(state)
    }

    /// Execute one round. Outputs come back in frontier order whatever the
    /// completion order.
    async fn run_round(
        &self,
        run_id: Uuid,
        frontier: &[usize],
        state: &RecapState,
        events: Option<&mpsc::Sender<RunEvent>>,
    ) -> Vec<Result<PartialState, RecapError>> {
        match self.mode {
            ExecutionMode::Concurrent => {
                join_all(
                    frontier
                        .iter()
                        .map(|&idx| self.execute_step(run_id, idx, state, events)),
                )
                .await
            }
            ExecutionMode::Sequential => {
                // A fail-fast error stops the round before later steps run
                let mut outputs = Vec::with_capacity(frontier.len());
                for &idx in frontier {
                    let output = self.execute_step(run_id, idx, state, events).await;
                    let failed = output.is_err();
                    outputs.push(output);
                    if failed {
                        break;
                    }
                }
                outputs
            }
        }
    }

    async fn execute_step(
        &self,
        run_id: Uuid,
        idx: usize,
        state: &RecapState,
        events: Option<&mpsc::Sender<RunEvent>>,
    ) -> Result<PartialState, RecapError> {
        let reg = &self.steps[idx];
        let name = reg.step.name();

        log::info!("Executing step: {}", name);
        emit(
            events,
            RunEvent::StepStarted {
                run_id,
                step: name.to_string(),
            },
        )
        .await;

        match reg.step.run(state).await {
            Ok(partial) => {
                let touched = partial.touched();
                if let Some(field) = touched.iter().find(|f| !reg.step.writes().contains(*f)) {
                    return Err(ConfigurationError::UndeclaredWrite {
                        step: name.to_string(),
                        field: field.to_string(),
                    }
                    .into());
                }

                log::info!("Step {} completed, wrote {:?}", name, touched);
                emit(
                    events,
                    RunEvent::StepCompleted {
                        run_id,
                        step: name.to_string(),
                        touched,
                    },
                )
                .await;
                Ok(partial)
            }
            Err(e) => match reg.policy {
                FailurePolicy::FailFast => {
                    log::error!("Step {} failed: {}", name, e);
                    Err(RecapError::step(name, e))
                }
                FailurePolicy::Degrade => {
                    log::warn!("Step {} failed, continuing without it: {}", name, e);
                    emit(
                        events,
                        RunEvent::StepDegraded {
                            run_id,
                            step: name.to_string(),
                            error: e.to_string(),
                        },
                    )
                    .await;
                    Ok(PartialState::new())
                }
            },
        }
    }

    /// Ask the routers of the steps just executed for the next round
    async fn next_frontier(
        &self,
        run_id: Uuid,
        executed: &[usize],
        state: &RecapState,
        events: Option<&mpsc::Sender<RunEvent>>,
    ) -> Result<Vec<usize>, RecapError> {
        let mut next = BTreeSet::new();

        for &idx in executed {
            let Some(router) = self.routers.get(&idx) else {
                continue;
            };
            let from = self.steps[idx].step.name();

            let mut selected = Vec::new();
            for route in router.route(state) {
                let Route::Step(target) = route else {
                    continue;
                };
                let target_idx = self
                    .index
                    .get(&target)
                    .copied()
                    .filter(|_| router.targets().contains(&target))
                    .ok_or_else(|| ConfigurationError::UnknownRouteTarget {
                        router: from.to_string(),
                        target: target.clone(),
                    })?;
                if next.insert(target_idx) {
                    selected.push(target);
                }
            }

            log::info!("Routed from {} to {:?}", from, selected);
            emit(
                events,
                RunEvent::Routed {
                    run_id,
                    from: from.to_string(),
                    to: selected,
                },
            )
            .await;
        }

        Ok(next.into_iter().collect())
    }

    fn names(&self, indices: &[usize]) -> Vec<String> {
        indices
            .iter()
            .map(|&i| self.steps[i].step.name().to_string())
            .collect()
    }
}

async fn emit(events: Option<&mpsc::Sender<RunEvent>>, event: RunEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}
