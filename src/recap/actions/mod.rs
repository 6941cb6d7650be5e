// SPDX-License-Identifier: MIT

//! Side-effect collaborators for the action steps

mod file_log;
mod notify;

pub use file_log::{AppendLog, FileAppendLog};
pub use notify::{DesktopNotifier, NoopNotifier, Notifier};
