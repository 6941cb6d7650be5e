// SPDX-License-Identifier: MIT

//! Graph-based workflow execution
//!
//! Steps are registered by name and wired with routers. After a step
//! completes, its router selects the set of steps for the next round; steps
//! without a router are terminal. A run ends when a round selects nothing.

mod builder;
pub mod executor;
pub mod step;
pub mod types;

pub use builder::GraphBuilder;
pub use executor::GraphEngine;
pub use step::{FnRouter, Router, Step};
pub use types::{ExecutionMode, FailurePolicy, Route, RunEvent, END};
