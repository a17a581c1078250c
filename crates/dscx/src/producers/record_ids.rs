use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::backends::{Connection, ConnectionBackend};
use crate::error::Result;

/// 📋 Runs the identifier-listing query once and hands back everything it found.
///
/// First column of every row is the identifier, rows keep query order. No params.
#[derive(Debug, Clone)]
pub struct RecordIdProducer {
    record_sql: String,
}

impl RecordIdProducer {
    pub fn new(record_sql: impl Into<String>) -> Self {
        Self {
            record_sql: record_sql.into(),
        }
    }

    /// 🔄 Materialize the full identifier list. All or nothing: a failure halfway
    /// through the result set surfaces as an error, never as a shorter list.
    pub async fn produce(&self, connection: &ConnectionBackend) -> Result<RecordIdCursor> {
        let rows = connection.query(&self.record_sql, &[]).await?;
        let mut ids = VecDeque::with_capacity(rows.len());
        for (position, row) in rows.iter().enumerate() {
            match row.get(0).and_then(|cell| cell.as_string()) {
                Some(id) => ids.push_back(id),
                None => warn!("⚠️ Listing row #{position} has a NULL identifier, skipping it"),
            }
        }
        debug!("📋 Listing query produced {} identifiers", ids.len());
        Ok(RecordIdCursor::new(ids))
    }
}

/// ➡️ Forward-only walk over a materialized identifier list. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordIdCursor {
    total: usize,
    pending: VecDeque<String>,
}

impl RecordIdCursor {
    pub fn new(ids: impl Into<VecDeque<String>>) -> Self {
        let pending = ids.into();
        Self {
            total: pending.len(),
            pending,
        }
    }

    /// 🔢 How many identifiers the listing produced.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn has_remaining(&self) -> bool {
        !self.pending.is_empty()
    }

    /// ⏭️ Hand out the next identifier.
    pub fn advance(&mut self) -> Option<String> {
        self.pending.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{Connector, InMemoryConfig, InMemoryConnector, InMemoryTable};
    use crate::common::Value;

    const LISTING: &str = "SELECT id FROM records";

    #[tokio::test]
    async fn the_one_where_identifiers_keep_their_place_in_line() {
        let mut table = InMemoryTable::new(&["id"], &[&["c"], &["a"], &["b"]]);
        table.rows.insert(1, vec![Value::Null]);
        let connector = InMemoryConnector::new(InMemoryConfig::default().with_query(LISTING, table));
        let conn = connector.connect().await.unwrap();

        let mut cursor = RecordIdProducer::new(LISTING).produce(&conn).await.unwrap();
        assert_eq!(cursor.len(), 3);
        assert_eq!(cursor.advance().as_deref(), Some("c"));
        assert_eq!(cursor.advance().as_deref(), Some("a"));
        assert_eq!(cursor.remaining(), 1);
        assert_eq!(cursor.advance().as_deref(), Some("b"));
        assert!(!cursor.has_remaining());
        assert_eq!(cursor.advance(), None);
        assert_eq!(cursor.len(), 3);
    }

    #[tokio::test]
    async fn the_one_where_the_listing_fails_and_nothing_half_baked_escapes() {
        let connector = InMemoryConnector::new(InMemoryConfig::default());
        let conn = connector.connect().await.unwrap();
        let err = RecordIdProducer::new("SELECT nope FROM nowhere")
            .produce(&conn)
            .await
            .unwrap_err();
        assert!(!err.is_connection());
    }
}
