//! 🚰 The SourceWorker: walks the record set, maps every record, pushes documents downstream.
//!
//! 🧠 Knowledge graph:
//! - Loop: `has_next()` → `next()` → `map_record()` → `tx.send()`.
//! - `NoRow` from a mapper → warn, count as skipped, keep going.
//! - Anything else → `reset()` the producer (no connection left behind) and bail.

use anyhow::{Context, Result};
use async_channel::Sender;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::Worker;
use crate::documents::IndexDocument;
use crate::mappers::{MapperBackend, MappingContext, map_record};
use crate::producers::{DatabaseRecordSetProducer, RecordSetProducer};
use crate::progress::ProgressMetrics;

#[derive(Debug)]
pub(crate) struct SourceWorker {
    tx: Sender<IndexDocument>,
    producer: DatabaseRecordSetProducer,
    mappers: Vec<MapperBackend>,
    context: MappingContext,
    source_name: String,
    show_progress: bool,
}

impl SourceWorker {
    pub(crate) fn new(
        tx: Sender<IndexDocument>,
        producer: DatabaseRecordSetProducer,
        mappers: Vec<MapperBackend>,
        context: MappingContext,
    ) -> Self {
        Self {
            tx,
            producer,
            mappers,
            context,
            source_name: "records".to_string(),
            show_progress: false,
        }
    }

    pub(crate) fn with_progress(mut self, source_name: impl Into<String>, visible: bool) -> Self {
        self.source_name = source_name.into();
        self.show_progress = visible;
        self
    }

    async fn pump(&mut self) -> Result<()> {
        let mut more = self
            .producer
            .has_next()
            .await
            .context("💀 Could not list the records to index")?;

        let mut metrics = ProgressMetrics::new(
            self.source_name.clone(),
            self.producer.doc_count() as u64,
            self.show_progress,
        );

        while more {
            let record = self
                .producer
                .next()
                .await
                .context("💀 Could not fetch the next record")?;

            match map_record(&self.mappers, &record, &mut self.context).await {
                Ok(document) => {
                    self.tx.send(document).await.context(
                        "💀 The sink side hung up while documents were still coming",
                    )?;
                    metrics.record_indexed();
                }
                Err(e) if e.is_no_row() => {
                    warn!("🕳️ Skipping record '{}': {e}", record.id());
                    metrics.record_skipped();
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("💀 Mapping record '{}' failed", record.id())));
                }
            }

            more = self
                .producer
                .has_next()
                .await
                .context("💀 Could not check for more records")?;
        }

        metrics.finish();
        info!(
            "✅ Pass complete: {} documents indexed, {} records skipped, {} listed",
            metrics.indexed(),
            metrics.skipped(),
            self.producer.doc_count()
        );
        Ok(())
    }
}

impl Worker for SourceWorker {
    fn start(mut self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move {
            debug!("🚰 SourceWorker started");
            let result = self.pump().await;
            if let Err(e) = &result {
                error!("💀 Indexing pass aborted: {e:#}");
                self.producer.reset().await;
            }
            // 📪 success or not, the SinkWorker needs to hear that nothing else is coming
            self.tx.close();
            result
        })
    }
}
