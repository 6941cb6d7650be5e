// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use super::FOLLOWUP;
use crate::adk::error::RecapError;
use crate::recap::actions::{AppendLog, Notifier};
use crate::recap::workflow::graph::Step;
use crate::recap::workflow::state::{PartialState, RecapState, StateField};

pub const NOTIFICATION_TITLE: &str = "Meeting Followup";

/// Records the follow-up in the reminder log and raises a desktop
/// notification for it. A failed notification does not fail the step.
pub struct FollowupStep {
    notifier: Arc<dyn Notifier>,
    reminders: Arc<dyn AppendLog>,
}

impl FollowupStep {
    pub fn new(notifier: Arc<dyn Notifier>, reminders: Arc<dyn AppendLog>) -> Self {
        Self {
            notifier,
            reminders,
        }
    }
}

#[async_trait]
impl Step for FollowupStep {
    fn name(&self) -> &str {
        FOLLOWUP
    }

    fn writes(&self) -> &[StateField] {
        &[StateField::Results]
    }

    async fn run(&self, state: &RecapState) -> Result<PartialState, RecapError> {
        let followup = state
            .extracted()
            .map(|e| e.followup.trim())
            .unwrap_or_default();
        if followup.is_empty() {
            return Ok(PartialState::new());
        }

        self.reminders
            .append(&format!("REMINDER: {}\n", followup))
            .await?;
        log::info!("Recorded followup reminder in {}", self.reminders.target());

        // Notifications are fire-and-forget
        if let Err(e) = self.notifier.notify(NOTIFICATION_TITLE, followup).await {
            log::warn!("Desktop notification failed: {}", e);
        }

        Ok(PartialState::new().with_result("Created desktop reminder."))
    }
}
