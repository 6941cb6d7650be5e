// SPDX-License-Identifier: MIT

//! Utterance intake
//!
//! A [`Transcriber`] pushes recognised utterances into an [`UtteranceSink`].
//! The paired [`TranscriptBuffer`] gathers them into the text block handed
//! to the pipeline once listening stops.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::adk::error::RecapError;

/// Push side of an utterance channel. Cloneable, so several sources can feed
/// one buffer.
#[derive(Debug, Clone)]
pub struct UtteranceSink {
    tx: mpsc::UnboundedSender<String>,
}

impl UtteranceSink {
    /// Queue one utterance. Blank text and a closed buffer are ignored.
    pub fn on_utterance(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        log::debug!("Heard: {}", text);
        if self.tx.send(text.to_string()).is_err() {
            log::warn!("Transcript buffer closed, dropping utterance");
        }
    }
}

/// Receiving side of an utterance channel
pub struct TranscriptBuffer {
    rx: mpsc::UnboundedReceiver<String>,
}

impl TranscriptBuffer {
    pub fn channel() -> (UtteranceSink, TranscriptBuffer) {
        let (tx, rx) = mpsc::unbounded_channel();
        (UtteranceSink { tx }, TranscriptBuffer { rx })
    }

    /// Wait until every sink is dropped, then return the utterances joined
    /// with a trailing newline each
    pub async fn collect(mut self) -> String {
        let mut text = String::new();
        while let Some(utterance) = self.rx.recv().await {
            text.push_str(&utterance);
            text.push('\n');
        }
        text
    }
}

/// Source of utterances
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Push utterances into `sink` until the source is exhausted
    async fn listen(&self, sink: UtteranceSink) -> Result<(), RecapError>;
}

/// Treats each non-empty line of stdin as one utterance
#[derive(Debug, Default, Clone)]
pub struct StdinTranscriber;

impl StdinTranscriber {
    pub fn new() -> Self {
        Self
    }
}

/// Feed every line of `reader` to `sink`
pub async fn read_lines<R>(reader: R, sink: &UtteranceSink) -> Result<usize, RecapError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut count = 0;
    while let Some(line) = lines.next_line().await? {
        if !line.trim().is_empty() {
            sink.on_utterance(&line);
            count += 1;
        }
    }
    Ok(count)
}

#[async_trait]
impl Transcriber for StdinTranscriber {
    async fn listen(&self, sink: UtteranceSink) -> Result<(), RecapError> {
        log::info!("Listening on stdin, end input with Ctrl-D");
        let count = read_lines(BufReader::new(tokio::io::stdin()), &sink).await?;
        log::info!("Captured {} utterances", count);
        Ok(())
    }
}
