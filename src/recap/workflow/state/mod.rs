// SPDX-License-Identifier: MIT

//! State management for the recap graph
//!
//! This module provides:
//! - `StateSchema` - the declared fields and their merge policies
//! - `RecapState` - the per-run state, replaced on every merge
//! - `PartialState` - the fields one step contributes

mod schema;
mod store;

pub use schema::{FieldKind, FieldPolicy, FieldSpec, StateField, StateSchema};
pub use store::{PartialState, RecapState};
