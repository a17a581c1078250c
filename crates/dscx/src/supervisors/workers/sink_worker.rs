//! 🎬 *[a channel fills with documents. somewhere, a sink waits.]*
//! *[the clock on the wall reads 2:47am.]*
//!
//! 🗑️ The SinkWorker: patient, tireless, and deeply unbothered by the chaos
//! happening upstream. It receives documents. It sinks documents. It asks no questions.
//!
//! 🦆 (the duck has no comment at this time)

use anyhow::{Context, Result};
use async_channel::Receiver;
use tokio::task::JoinHandle;
use tracing::debug;

use super::Worker;
use crate::backends::{Sink, SinkBackend};
use crate::documents::IndexDocument;

/// 🗑️ Takes documents from a channel, throws them into a backend.
#[derive(Debug)]
pub(crate) struct SinkWorker {
    rx: Receiver<IndexDocument>,
    sink: SinkBackend,
}

impl SinkWorker {
    /// 🏗️ Hand it a receiver (the firehose) and a sink (the drain). It does not judge.
    pub(crate) fn new(rx: Receiver<IndexDocument>, sink: SinkBackend) -> Self {
        Self { rx, sink }
    }
}

impl Worker for SinkWorker {
    fn start(mut self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move {
            debug!("📥 SinkWorker started draining channel...");
            let mut received = 0usize;
            loop {
                match self.rx.recv().await {
                    Ok(document) => {
                        received += 1;
                        debug!("🪣 SinkWorker received document with {} fields", document.len());
                        self.sink
                            .receive(document)
                            .await
                            .context("💀 SinkWorker failed to hand a document to the sink")?;
                    }
                    Err(_) => {
                        // Channel is empty and closed
                        debug!("🏁 SinkWorker: Channel closed after {received} documents. Shutting down.");
                        self.sink
                            .close()
                            .await
                            .context("💀 SinkWorker failed to close sink")?;
                        return Ok(());
                    }
                }
            }
        })
    }
}
