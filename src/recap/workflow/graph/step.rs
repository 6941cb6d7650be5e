// SPDX-License-Identifier: MIT

//! Step and router contracts

use async_trait::async_trait;

use super::types::Route;
use crate::adk::error::RecapError;
use crate::recap::workflow::state::{PartialState, RecapState, StateField};

/// One named unit of work: reads the state, returns the fields it changes.
///
/// A step may perform I/O but never mutates the state it is given.
#[async_trait]
pub trait Step: Send + Sync {
    /// Unique name within a graph
    fn name(&self) -> &str;

    /// Fields this step may write. Checked at build time against the state
    /// schema and at run time against the returned partial.
    fn writes(&self) -> &[StateField];

    async fn run(&self, state: &RecapState) -> Result<PartialState, RecapError>;
}

/// Decides which steps run after the step it is attached to.
///
/// Must be a pure function of the state.
pub trait Router: Send + Sync {
    /// Every step name `route` can ever return
    fn targets(&self) -> &[String];

    fn route(&self, state: &RecapState) -> Vec<Route>;
}

/// Router backed by a closure
pub struct FnRouter<F> {
    targets: Vec<String>,
    f: F,
}

impl<F> FnRouter<F>
where
    F: Fn(&RecapState) -> Vec<Route> + Send + Sync,
{
    pub fn new(targets: &[&str], f: F) -> Self {
        Self {
            targets: targets.iter().map(|s| s.to_string()).collect(),
            f,
        }
    }
}

impl<F> Router for FnRouter<F>
where
    F: Fn(&RecapState) -> Vec<Route> + Send + Sync,
{
    fn targets(&self) -> &[String] {
        &self.targets
    }

    fn route(&self, state: &RecapState) -> Vec<Route> {
        (self.f)(state)
    }
}
