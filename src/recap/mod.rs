// SPDX-License-Identifier: MIT

//! Meeting recap pipeline
//!
//! Text arrives from a [`transcript::Transcriber`] or a caller, runs through
//! the summarize step and fans out to the action steps selected for it.

pub mod actions;
pub mod config;
pub mod extract;
pub mod pipeline;
pub mod server;
pub mod steps;
pub mod transcript;
pub mod workflow;

pub use config::{ConfigLoader, RecapConfig};
pub use pipeline::{Collaborators, Recap, RecapOutcome};
