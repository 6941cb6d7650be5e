// SPDX-License-Identifier: MIT

//! The built-in recap steps and the router that fans out after summarize

mod followup;
mod summarize;
mod todo;

pub use followup::FollowupStep;
pub use summarize::SummarizeStep;
pub use todo::TodoStep;

use crate::recap::workflow::graph::{Route, Router};
use crate::recap::workflow::state::RecapState;

pub const SUMMARIZE: &str = "summarize";
pub const TODO: &str = "todo";
pub const FOLLOWUP: &str = "followup";

/// Routes to every action summarize selected, or ends the run when there
/// are none
pub struct ActionRouter {
    targets: Vec<String>,
}

impl ActionRouter {
    pub fn new() -> Self {
        Self {
            targets: vec![TODO.to_string(), FOLLOWUP.to_string()],
        }
    }
}

impl Default for ActionRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl Router for ActionRouter {
    fn targets(&self) -> &[String] {
        &self.targets
    }

    fn route(&self, state: &RecapState) -> Vec<Route> {
        let actions = state.selected_actions();
        if actions.is_empty() {
            return vec![Route::End];
        }
        actions.iter().map(|a| Route::step(a.as_str())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recap::extract::Extraction;
    use crate::recap::workflow::state::PartialState;

    fn state_with_actions(actions: &[&str]) -> RecapState {
        let mut partial = PartialState::new()
            .with_summary("s")
            .with_extracted(Extraction {
                summary: "s".to_string(),
                ..Default::default()
            });
        for action in actions {
            partial = partial.with_action(*action);
        }
        RecapState::new("text").merge(SUMMARIZE, partial).unwrap()
    }

    #[test]
    fn test_no_actions_ends() {
        let router = ActionRouter::new();
        assert_eq!(router.route(&state_with_actions(&[])), vec![Route::End]);
    }

    #[test]
    fn test_routes_each_action() {
        let router = ActionRouter::new();
        let state = state_with_actions(&[TODO, FOLLOWUP]);

        let routes = router.route(&state);
        assert_eq!(routes, vec![Route::step(TODO), Route::step(FOLLOWUP)]);
        // Same state, same routes
        assert_eq!(router.route(&state), routes);
    }
}
