use anyhow::Result;
use async_trait::async_trait;

use crate::backends::Sink;
use crate::documents::IndexDocument;

/// 📦 A sink that never forgets.
///
/// `InMemorySink` hoards received documents in a shared Vec wrapped in a Mutex wrapped
/// in an Arc. It's structs all the way down.
///
/// Clone-able because tests need to peek inside after handing `self` off to the
/// pipeline. The `Arc` means everyone shares the same Vec.
#[derive(Debug, Default, Clone)]
pub struct InMemorySink {
    /// 🔒 The evidence locker. "I told you I received that document" proof.
    pub received: std::sync::Arc<tokio::sync::Mutex<Vec<IndexDocument>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 📋 Snapshot of everything received so far.
    pub async fn documents(&self) -> Vec<IndexDocument> {
        self.received.lock().await.clone()
    }
}

#[async_trait]
impl Sink for InMemorySink {
    async fn receive(&mut self, document: IndexDocument) -> Result<()> {
        // 🔒 The one place several async tasks might collide. The Mutex is load-bearing.
        self.received.lock().await.push(document);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        // 🗑️ Cleanup routine: [REDACTED, there is nothing here]
        Ok(())
    }
}
