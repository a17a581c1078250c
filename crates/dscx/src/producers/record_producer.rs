use std::sync::Arc;

use tracing::{debug, warn};

use crate::backends::{ConnectionSource, LIVENESS_PROBE_TIMEOUT, SharedConnection};
use crate::documents::IndexDocument;
use crate::error::{DscError, Result};
use crate::producers::SourceRecord;

/// 🔙 Turns an already indexed document back into a [`SourceRecord`].
///
/// Used when a document needs re-mapping (an update, a partial rebuild) and all we
/// have is what the index stored. The id field tells us which row it came from.
#[derive(Debug)]
pub struct DatabaseRecordProducer {
    source: ConnectionSource,
    id_field: String,
    connection: Option<SharedConnection>,
}

impl DatabaseRecordProducer {
    pub fn new(source: ConnectionSource, id_field: impl Into<String>) -> Self {
        Self {
            source,
            id_field: id_field.into(),
            connection: None,
        }
    }

    /// 🔌 Make sure a usable connection is held. Reopens a closed or dead one.
    pub async fn open_datasource(&mut self) -> Result<SharedConnection> {
        if let Some(current) = &self.connection {
            if self.source.is_valid(current, LIVENESS_PROBE_TIMEOUT).await {
                return Ok(Arc::clone(current));
            }
            warn!("🔌 Datasource connection is no longer usable, reopening");
            if let Err(e) = self.source.close(current).await {
                warn!("⚠️ Ignoring error while closing the stale connection: {e}");
            }
            self.connection = None;
        }
        let fresh = self.source.open().await?;
        self.connection = Some(Arc::clone(&fresh));
        Ok(fresh)
    }

    /// 🗑️ Let go of the held connection, if any.
    pub async fn close_datasource(&mut self) -> Result<()> {
        match self.connection.take() {
            Some(connection) => {
                debug!("🗑️ Closing datasource connection");
                self.source.close(&connection).await
            }
            None => Ok(()),
        }
    }

    /// 🔎 Which record did this document come from?
    pub async fn record_for_document(&mut self, document: &IndexDocument) -> Result<SourceRecord> {
        let id = document
            .get(&self.id_field)
            .map(str::to_string)
            .ok_or_else(|| {
                DscError::Precondition(format!(
                    "document has no '{}' field to find its record by",
                    self.id_field
                ))
            })?;
        let connection = self.open_datasource().await?;
        Ok(SourceRecord::shared(id, connection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{Connection, ConnectorBackend, InMemoryConfig, InMemoryConnector};
    use crate::documents::DocumentSink;

    fn producer(connector: &InMemoryConnector) -> DatabaseRecordProducer {
        DatabaseRecordProducer::new(
            ConnectionSource::new(ConnectorBackend::InMemory(connector.clone())),
            "ID",
        )
    }

    #[tokio::test]
    async fn the_one_where_an_indexed_document_finds_its_way_home() {
        let connector = InMemoryConnector::new(InMemoryConfig::default());
        let mut producer = producer(&connector);

        let mut first = IndexDocument::new();
        first.add("ID", "17");
        let mut second = IndexDocument::new();
        second.add("ID", "18");

        let a = producer.record_for_document(&first).await.unwrap();
        let b = producer.record_for_document(&second).await.unwrap();
        assert_eq!((a.id(), b.id()), ("17", "18"));
        assert!(!a.is_exclusive());
        assert_eq!(connector.opened(), 1);

        producer.close_datasource().await.unwrap();
        producer.close_datasource().await.unwrap();
        drop((a, b));
        assert_eq!(connector.open_connections(), 0);
    }

    #[tokio::test]
    async fn the_one_where_a_document_without_an_id_is_turned_away() {
        let connector = InMemoryConnector::new(InMemoryConfig::default());
        let mut producer = producer(&connector);

        let mut nameless = IndexDocument::new();
        nameless.add("title", "who am I");
        let err = producer.record_for_document(&nameless).await.unwrap_err();
        assert!(matches!(err, DscError::Precondition(_)), "{err:?}");
        assert_eq!(connector.opened(), 0);
    }

    #[tokio::test]
    async fn the_one_where_a_closed_datasource_is_reopened() {
        let connector = InMemoryConnector::new(InMemoryConfig::default());
        let mut producer = producer(&connector);

        let first = producer.open_datasource().await.unwrap();
        connector.close_all();
        assert!(first.is_closed());

        let second = producer.open_datasource().await.unwrap();
        assert!(!second.is_closed());
        assert_eq!(connector.opened(), 2);
    }
}
