use anyhow::Result;
use async_trait::async_trait;

use crate::backends::{file, in_mem};
use crate::documents::IndexDocument;

/// 🕳️ A sink that accepts finished index documents. Pure I/O, zero mapping logic.
///
/// The drain at the bottom of the pipeline tub. Whatever owns the real index
/// (a search server, a bulk loader, a very patient intern) reads from here.
///
/// # Contract 📜
/// - `receive` takes ownership of one fully mapped document and writes/stashes it.
/// - `close` flushes, finalizes, and bids the data a fond farewell. MUST be called.
///   Skipping `close` is a bug. It is also considered rude.
///
/// # Knowledge Graph 🧠
/// - Pattern: trait → concrete impls (FileSink, InMemorySink) → SinkBackend enum
/// - SinkWorker drains the channel and calls `receive` per document, `close` at the end.
#[async_trait]
pub trait Sink: std::fmt::Debug + Send {
    /// 📥 Accept one document.
    async fn receive(&mut self, document: IndexDocument) -> Result<()>;
    /// 🗑️ Flush, finalize, and release. Call this. Always. No exceptions. Not even on Fridays.
    async fn close(&mut self) -> Result<()>;
}

/// 🎭 The many faces of a Sink: a polymorphic casting call for document destinations.
///
/// The enum dispatches `receive` and `close` to the inner concrete type,
/// keeping the supervisor blissfully ignorant of where documents actually land.
#[derive(Debug)]
pub enum SinkBackend {
    InMemory(in_mem::InMemorySink),
    File(file::FileSink),
}

#[async_trait]
impl Sink for SinkBackend {
    async fn receive(&mut self, document: IndexDocument) -> Result<()> {
        match self {
            SinkBackend::InMemory(sink) => sink.receive(document).await,
            SinkBackend::File(sink) => sink.receive(document).await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            SinkBackend::InMemory(sink) => sink.close().await,
            SinkBackend::File(sink) => sink.close().await,
        }
    }
}
