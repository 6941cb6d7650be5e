// SPDX-License-Identifier: MIT

//! Graph builder - registers steps and routers and validates the wiring
//!
//! All wiring errors surface here, before any run: unknown router targets,
//! self-loops and longer cycles, routed steps marked `Degrade`, immutable
//! writes and scalar fields that two sibling steps could both write.

use std::collections::HashMap;
use std::sync::Arc;

use super::executor::{GraphEngine, RegisteredStep};
use super::step::{Router, Step};
use super::types::{ExecutionMode, FailurePolicy, END};
use crate::adk::error::ConfigurationError;
use crate::recap::workflow::state::{FieldPolicy, StateSchema};

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    New,
    Active,
    Done,
}

/// Builder for a [`GraphEngine`]
pub struct GraphBuilder {
    steps: Vec<RegisteredStep>,
    index: HashMap<String, usize>,
    routers: HashMap<usize, Arc<dyn Router>>,
    mode: ExecutionMode,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            index: HashMap::new(),
            routers: HashMap::new(),
            mode: ExecutionMode::default(),
        }
    }

    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Register a step that fails the run on error
    pub fn add_step(&mut self, step: Arc<dyn Step>) -> Result<&mut Self, ConfigurationError> {
        self.add_step_with_policy(step, FailurePolicy::FailFast)
    }

    /// Register a step. Registration order fixes merge order.
    pub fn add_step_with_policy(
        &mut self,
        step: Arc<dyn Step>,
        policy: FailurePolicy,
    ) -> Result<&mut Self, ConfigurationError> {
        let name = step.name().to_string();
        if name.is_empty() || name == END {
            return Err(ConfigurationError::ReservedName(name));
        }
        if self.index.contains_key(&name) {
            return Err(ConfigurationError::DuplicateStep(name));
        }

        log::debug!("Registered step {} ({:?})", name, policy);
        self.index.insert(name, self.steps.len());
        self.steps.push(RegisteredStep { step, policy });
        Ok(self)
    }

    /// Attach the router consulted after `from` completes
    pub fn add_router(
        &mut self,
        from: &str,
        router: Arc<dyn Router>,
    ) -> Result<&mut Self, ConfigurationError> {
        let idx = *self
            .index
            .get(from)
            .ok_or_else(|| ConfigurationError::UnknownStep(from.to_string()))?;

        if router.targets().iter().any(|t| t == from) {
            return Err(ConfigurationError::SelfLoop(from.to_string()));
        }
        if self.routers.contains_key(&idx) {
            return Err(ConfigurationError::DuplicateRouter(from.to_string()));
        }

        self.routers.insert(idx, router);
        Ok(self)
    }

    /// Validate the wiring and produce an engine
    pub fn build(self) -> Result<GraphEngine, ConfigurationError> {
        StateSchema::validate()?;

        for reg in &self.steps {
            for field in reg.step.writes() {
                if field.policy() == FieldPolicy::Immutable {
                    return Err(ConfigurationError::ImmutableField {
                        step: reg.step.name().to_string(),
                        field: field.to_string(),
                    });
                }
            }
        }

        let mut routed: Vec<usize> = self.routers.keys().copied().collect();
        routed.sort_unstable();

        for idx in routed {
            let from = self.steps[idx].step.name();
            let router = &self.routers[&idx];

            for target in router.targets() {
                if !self.index.contains_key(target) {
                    return Err(ConfigurationError::UnknownRouteTarget {
                        router: from.to_string(),
                        target: target.clone(),
                    });
                }
            }

            if self.steps[idx].policy == FailurePolicy::Degrade {
                return Err(ConfigurationError::DegradeOnRoutedStep(from.to_string()));
            }

            self.check_exclusive_writes(router.targets())?;
        }

        self.check_acyclic()?;

        log::info!(
            "Built graph with {} steps and {} routers",
            self.steps.len(),
            self.routers.len()
        );
        Ok(GraphEngine::new(self.steps, self.index, self.routers, self.mode))
    }

    /// Sibling targets of one router may share a round, so at most one of
    /// them can write each `Replace` field.
    fn check_exclusive_writes(&self, targets: &[String]) -> Result<(), ConfigurationError> {
        let mut siblings: Vec<usize> = targets.iter().map(|t| self.index[t]).collect();
        siblings.sort_unstable();
        siblings.dedup();

        for field in StateSchema::replaced_fields() {
            let writers: Vec<String> = siblings
                .iter()
                .map(|&i| &self.steps[i].step)
                .filter(|s| s.writes().contains(&field))
                .map(|s| s.name().to_string())
                .collect();
            if writers.len() > 1 {
                return Err(ConfigurationError::ConflictingWrite {
                    field: field.to_string(),
                    steps: writers,
                });
            }
        }
        Ok(())
    }

    fn successors(&self, idx: usize) -> Vec<usize> {
        self.routers
            .get(&idx)
            .map(|r| {
                r.targets()
                    .iter()
                    .filter_map(|t| self.index.get(t).copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn check_acyclic(&self) -> Result<(), ConfigurationError> {
        let mut marks = vec![Mark::New; self.steps.len()];
        let mut path = Vec::new();
        for start in 0..self.steps.len() {
            if marks[start] == Mark::New {
                self.visit(start, &mut marks, &mut path)?;
            }
        }
        Ok(())
    }

    fn visit(
        &self,
        idx: usize,
        marks: &mut [Mark],
        path: &mut Vec<usize>,
    ) -> Result<(), ConfigurationError> {
        marks[idx] = Mark::Active;
        path.push(idx);

        for next in self.successors(idx) {
            match marks[next] {
                Mark::Active => {
                    let pos = path.iter().position(|&p| p == next).unwrap_or(0);
                    let mut cycle: Vec<String> = path[pos..]
                        .iter()
                        .map(|&i| self.steps[i].step.name().to_string())
                        .collect();
                    cycle.push(self.steps[next].step.name().to_string());
                    return Err(ConfigurationError::Cycle(cycle));
                }
                Mark::New => self.visit(next, marks, path)?,
                Mark::Done => {}
            }
        }

        path.pop();
        marks[idx] = Mark::Done;
        Ok(())
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
