// SPDX-License-Identifier: MIT

//! Append-only logs used by the action steps

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::adk::error::RecapError;

/// An append-only sink for text entries
#[async_trait]
pub trait AppendLog: Send + Sync {
    /// Where entries go, for log lines
    fn target(&self) -> String;

    async fn append(&self, entry: &str) -> Result<(), RecapError>;
}

/// Appends entries to a file, creating it on first write.
///
/// Each entry is a single `write_all` on a file opened in append mode, so
/// concurrent runs don't interleave within an entry.
pub struct FileAppendLog {
    path: PathBuf,
}

impl FileAppendLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AppendLog for FileAppendLog {
    fn target(&self) -> String {
        self.path.display().to_string()
    }

    async fn append(&self, entry: &str) -> Result<(), RecapError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
