//! 🎬 *[camera pans across a dimly lit server room]*
//! 🎬 "In a world where records wait patiently in tables..."
//! 🎬 "One supervisor dared to index them all."
//! 🎬 *[record scratch]* 🦆
//!
//! 📦 The Supervisor: part middle manager, part helicopter parent. It wires the
//! producer, the mappers and the sink together and then hovers.
//!
//! ⚠️ Workers stay private to this module. The world talks to the Supervisor.

mod workers;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::app_config::{AppConfig, DatabaseConfig, SinkConfig};
use crate::backends::{ConnectionSource, FileSink, InMemorySink, SinkBackend};
use crate::documents::IndexDocument;
use crate::mappers::{MapperBackend, MappingContext, map_record};
use crate::producers::{DatabaseRecordProducer, DatabaseRecordSetProducer, RecordSetProducer};
use workers::{SinkWorker, SourceWorker, Worker};

/// 🏗️ Build the sink the config asks for.
pub(crate) async fn sink_from_config(sink_config: &SinkConfig) -> Result<SinkBackend> {
    Ok(match sink_config {
        SinkConfig::File(file_config) => SinkBackend::File(
            FileSink::new(file_config.clone())
                .await
                .context("💀 Could not set up the file sink")?,
        ),
        SinkConfig::InMemory => SinkBackend::InMemory(InMemorySink::new()),
    })
}

/// 📦 The Supervisor: because even async tasks need someone hovering over them
/// asking "is it done yet?" every 5 milliseconds.
pub(crate) struct Supervisor {
    app_config: AppConfig,
}

impl Supervisor {
    pub(crate) fn new(app_config: AppConfig) -> Self {
        Self { app_config }
    }

    fn connection_source(&self) -> ConnectionSource {
        ConnectionSource::new(self.app_config.database.connector())
    }

    fn producer(&self) -> DatabaseRecordSetProducer {
        DatabaseRecordSetProducer::from_config(self.connection_source(), &self.app_config.producer)
    }

    fn mappers(&self) -> Vec<MapperBackend> {
        self.app_config
            .mappers
            .iter()
            .map(MapperBackend::from_config)
            .collect()
    }

    fn mapping_context(&self) -> MappingContext {
        MappingContext::new(self.app_config.producer.syslist_sql.clone())
    }

    fn source_name(&self) -> String {
        match &self.app_config.database {
            DatabaseConfig::Sqlite(sqlite) => sqlite.url.clone(),
            DatabaseConfig::InMemory(_) => "in-memory".to_string(),
        }
    }

    /// 🧵 One full indexing pass: SourceWorker → channel → SinkWorker, then wait for both.
    pub(crate) async fn start_workers(&self, sink: SinkBackend) -> Result<()> {
        let capacity = self.app_config.runtime.queue_capacity.max(1);
        let (tx, rx) = async_channel::bounded(capacity);
        info!(
            "🚀 Starting indexing pass over '{}' with {} mappers",
            self.source_name(),
            self.app_config.mappers.len()
        );

        let source_worker = SourceWorker::new(tx, self.producer(), self.mappers(), self.mapping_context())
            .with_progress(self.source_name(), self.app_config.runtime.show_progress)
            .start();
        let sink_worker = SinkWorker::new(rx, sink).start();

        let (source_result, sink_result) = tokio::join!(source_worker, sink_worker);
        // 🎯 the source's failure is usually the root cause, report it first
        source_result.context("💀 SourceWorker panicked")??;
        sink_result.context("💀 SinkWorker panicked")??;
        Ok(())
    }

    /// 🔎 Map exactly one record, found through the by-id query. `None` when it is absent.
    pub(crate) async fn index_record(&self, id: &str) -> Result<Option<IndexDocument>> {
        let mut producer = self.producer();
        let Some(record) = producer
            .record_by_id(id)
            .await
            .with_context(|| format!("💀 Could not look up record '{id}'"))?
        else {
            info!("🕳️ Record '{id}' does not exist or is not published");
            return Ok(None);
        };

        let mapped = map_record(&self.mappers(), &record, &mut self.mapping_context()).await;
        let record_id = record.id().to_string();
        if let Err(e) = record.close().await {
            debug!("⚠️ Closing the by-id connection failed: {e}");
        }
        let document =
            mapped.with_context(|| format!("💀 Mapping record '{record_id}' failed"))?;
        Ok(Some(document))
    }

    /// 🔙 Re-map documents that are already in the index, using their id field to find the row.
    pub(crate) async fn remap_documents(
        &self,
        documents: &[IndexDocument],
    ) -> Result<Vec<IndexDocument>> {
        let mut producer = DatabaseRecordProducer::new(
            self.connection_source(),
            self.app_config.producer.record_id_field.clone(),
        );
        let mappers = self.mappers();
        let mut context = self.mapping_context();

        let mut remapped = Vec::with_capacity(documents.len());
        let mut outcome = Ok(());
        for document in documents {
            let step = async {
                let record = producer.record_for_document(document).await?;
                map_record(&mappers, &record, &mut context).await
            };
            match step.await {
                Ok(fresh) => remapped.push(fresh),
                Err(e) => {
                    outcome = Err(anyhow::Error::new(e).context("💀 Re-mapping a document failed"));
                    break;
                }
            }
        }
        producer
            .close_datasource()
            .await
            .context("💀 Could not close the datasource after re-mapping")?;
        outcome.map(|()| remapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::DocumentSink;

    const FIXTURE: &str = r#"
        sink_config = "InMemory"

        [database.InMemory.queries."SELECT id FROM records"]
        columns = ["id"]
        rows = [["a"], ["b"], ["c"]]

        [database.InMemory.queries."SELECT id AS ID, title FROM records WHERE id = ?"]
        columns = ["ID", "title"]
        rows = [["a", "Alpha"], ["c", "Charlie"]]

        [database.InMemory.queries."SELECT id FROM records WHERE id = ? AND published = 1"]
        columns = ["id"]
        rows = [["a"], ["c"]]

        [producer]
        record_sql = "SELECT id FROM records"
        record_by_id_sql = "SELECT id FROM records WHERE id = ? AND published = 1"

        [[mappers]]
        kind = "column"
        sql = "SELECT id AS ID, title FROM records WHERE id = ?"

        [runtime]
        queue_capacity = 1
        show_progress = false
    "#;

    fn fixture_config() -> AppConfig {
        toml::from_str(FIXTURE).expect("💀 the fixture config should parse")
    }

    #[tokio::test]
    async fn the_one_where_the_record_without_a_row_is_skipped_not_fatal() {
        let sink = InMemorySink::new();
        Supervisor::new(fixture_config())
            .start_workers(SinkBackend::InMemory(sink.clone()))
            .await
            .unwrap();

        let documents = sink.documents().await;
        let ids: Vec<_> = documents.iter().filter_map(|d| d.get("ID")).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(documents[1].get("title"), Some("Charlie"));
    }

    #[tokio::test]
    async fn the_one_where_a_broken_mapper_stops_the_pass() {
        let mut config = fixture_config();
        config.mappers.push(crate::mappers::MapperConfig::Column {
            sql: "SELECT nothing FROM nowhere WHERE id = ?".into(),
        });

        let sink = InMemorySink::new();
        let err = Supervisor::new(config)
            .start_workers(SinkBackend::InMemory(sink.clone()))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("Mapping record 'a' failed"), "{err:#}");
        assert!(sink.documents().await.is_empty());
    }

    #[tokio::test]
    async fn the_one_where_one_record_is_indexed_on_demand() {
        let supervisor = Supervisor::new(fixture_config());

        let document = supervisor.index_record("c").await.unwrap().expect("c is published");
        assert_eq!(document.get("title"), Some("Charlie"));

        assert!(supervisor.index_record("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn the_one_where_indexed_documents_are_mapped_again() {
        let supervisor = Supervisor::new(fixture_config());
        let mut stale = IndexDocument::new();
        stale.add("ID", "a");
        stale.add("title", "Alpha (old)");

        let fresh = supervisor.remap_documents(&[stale]).await.unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].get_all("title"), vec!["Alpha"]);

        let nameless = IndexDocument::new();
        assert!(supervisor.remap_documents(&[nameless]).await.is_err());
    }

    #[tokio::test]
    async fn the_one_where_sqlite_meets_the_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sqlite = crate::backends::sqlite::tests::seeded_database(&dir);
        let out = dir.path().join("out.ndjson");
        let config: AppConfig = toml::from_str(&format!(
            r#"
            [database.Sqlite]
            url = "{url}"

            [producer]
            record_sql = "SELECT id FROM records ORDER BY id"

            [[mappers]]
            kind = "column"
            sql = "SELECT id AS ID, title FROM records WHERE id = ?"

            [[mappers]]
            kind = "time_fields"
            sql = "SELECT time_from, time_to, time_type FROM records WHERE id = ?"

            [sink_config.File]
            file_name = "{out}"

            [runtime]
            show_progress = false
            "#,
            url = sqlite.url,
            out = out.display(),
        ))
        .unwrap();

        crate::run(config).await.unwrap();

        let written = tokio::fs::read_to_string(&out).await.unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], r#"{"ID":"a","t1":"20200101","t2":"99999999","title":"Alpha"}"#);
        assert_eq!(lines[1], r#"{"ID":"b","t0":"20200615","title":"Bravo"}"#);
        assert_eq!(lines[2], r#"{"ID":"c","t1":"00000000","t2":"20201231","title":"Charlie"}"#);
    }
}
