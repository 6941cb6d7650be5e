// SPDX-License-Identifier: MIT

//! recap-rs: turn a meeting transcript into a summary plus follow-up actions
//!
//! - [`adk`] - errors and model providers
//! - [`recap`] - the workflow graph, steps, pipeline and front ends

pub mod adk;
pub mod recap;
