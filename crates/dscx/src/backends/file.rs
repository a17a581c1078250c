//! 📂 File sink: one JSON object per line, one line per document.
//!
//! NDJSON, because a bulk loader on the other side can stream it without holding
//! the whole pass in memory, and because `wc -l` is the cheapest doc counter ever built.
//!
//! 🚰 SinkWorker → FileSink → BufWriter → disk
//! 💀 Disk full → your problem now
//! 🦆 (mandatory, no notes)

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::{
    fs::File,
    io::{self, AsyncWriteExt},
};
use tracing::trace;

use crate::backends::Sink;
use crate::documents::IndexDocument;

// -- 📂 FileSinkConfig lives next to the sink that uses it. One backend, one config, one file.
#[derive(Debug, Deserialize, Clone)]
pub struct FileSinkConfig {
    pub file_name: String,
}

/// 🚰 FileSink: a BufWriter around a tokio `File`. Simple. Honest. Does not complain.
///
/// ⚠️ `File::create` truncates if the file exists. No warning. No backup. Just gone.
/// Every pass produces a fresh output. He who points this at his only copy, re-indexes in shame.
#[derive(Debug)]
pub struct FileSink {
    file_buf: io::BufWriter<File>,
    documents_written: usize,
    sink_config: FileSinkConfig,
}

impl FileSink {
    /// 🚀 Creates (or obliterates and recreates) the output file.
    pub async fn new(sink_config: FileSinkConfig) -> Result<Self> {
        let file_handle = File::create(&sink_config.file_name).await.context(format!(
            "💀 The sink file '{}' could not be conjured into existence. \
             We stared at the path. The path stared back. \
             One of us was wrong about whether the parent directory existed.",
            &sink_config.file_name
        ))?;
        Ok(Self {
            file_buf: io::BufWriter::new(file_handle),
            documents_written: 0,
            sink_config,
        })
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn receive(&mut self, document: IndexDocument) -> Result<()> {
        let mut line = serde_json::to_string(&document.to_json())
            .context("💀 A document refused to become JSON. It had strings. Strings always serialize. And yet.")?;
        line.push('\n');
        trace!("📬 {} bytes walked into the file sink", line.len());
        self.file_buf.write_all(line.as_bytes()).await?;
        self.documents_written += 1;
        Ok(())
    }

    /// 🗑️ Flush the BufWriter. Without this your last documents sit in the buffer forever,
    /// warm and cozy, never making it to disk. Always flush.
    async fn close(&mut self) -> Result<()> {
        trace!(
            "🎬 final flush of '{}' after {} documents",
            self.sink_config.file_name, self.documents_written
        );
        self.file_buf.flush().await.context(
            "💀 Error flushing file: the buffer held its documents to the very end, \
             and the disk said no.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::DocumentSink;

    #[tokio::test]
    async fn the_one_where_each_document_gets_its_own_line() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.ndjson");
        let mut sink = FileSink::new(FileSinkConfig {
            file_name: path.to_string_lossy().into_owned(),
        })
        .await?;

        let mut first = IndexDocument::new();
        first.add("ID", "a");
        let mut second = IndexDocument::new();
        second.add("ID", "b");
        second.add("t1", "20200101");
        sink.receive(first).await?;
        sink.receive(second).await?;
        sink.close().await?;

        let written = tokio::fs::read_to_string(&path).await?;
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines, vec![r#"{"ID":"a"}"#, r#"{"ID":"b","t1":"20200101"}"#]);
        Ok(())
    }
}
