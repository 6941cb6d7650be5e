// SPDX-License-Identifier: MIT

//! Notification sinks

use async_trait::async_trait;
use tokio::process::Command;

use crate::adk::error::RecapError;

/// Message in, notification out
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<(), RecapError>;
}

/// Desktop notifications through the platform helper: `osascript` on macOS,
/// `notify-send` elsewhere. Arguments are passed directly, never through a
/// shell.
#[derive(Debug, Default, Clone)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    pub fn new() -> Self {
        Self
    }

    fn command(title: &str, message: &str) -> Command {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("osascript");
            cmd.arg("-e").arg(apple_script(title, message));
            cmd
        } else {
            let mut cmd = Command::new("notify-send");
            cmd.arg(title).arg(message);
            cmd
        }
    }
}

/// `display notification` statement with both strings escaped
fn apple_script(title: &str, message: &str) -> String {
    format!(
        "display notification \"{}\" with title \"{}\"",
        escape_apple_string(message),
        escape_apple_string(title)
    )
}

fn escape_apple_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<(), RecapError> {
        let output = Self::command(title, message).output().await?;
        if !output.status.success() {
            return Err(RecapError::api(
                "desktop notification",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        log::info!("Sent desktop notification: {}", title);
        Ok(())
    }
}

/// Drops every notification, for headless runs
#[derive(Debug, Default, Clone)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, title: &str, _message: &str) -> Result<(), RecapError> {
        log::debug!("Notifications disabled, skipping: {}", title);
        Ok(())
    }
}
