use tracing::debug;

use crate::backends::{Connection, SharedConnection};
use crate::common::{Row, Value};
use crate::error::Result;

/// 🔑 Who is allowed to close the connection a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// 🤝 The producer's pass connection. The record may query through it, never close it.
    Shared,
    /// 🔐 Opened just for this record (by-id lookup). The record closes it.
    Exclusive,
}

/// 📇 One record to index: its identifier plus a handle to query its columns with.
///
/// Mappers only ever see `query` and `query_first`. Closing is reserved for
/// exclusively owned handles, so a mapper cannot pull the pass connection out
/// from under the producer.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    id: String,
    connection: SharedConnection,
    ownership: Ownership,
}

impl SourceRecord {
    pub fn shared(id: impl Into<String>, connection: SharedConnection) -> Self {
        Self {
            id: id.into(),
            connection,
            ownership: Ownership::Shared,
        }
    }

    pub fn exclusive(id: impl Into<String>, connection: SharedConnection) -> Self {
        Self {
            id: id.into(),
            connection,
            ownership: Ownership::Exclusive,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_exclusive(&self) -> bool {
        self.ownership == Ownership::Exclusive
    }

    pub async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.connection
            .query(sql, params)
            .await
            .map_err(|e| e.for_identifier(&self.id))
    }

    /// 🥇 First row wins. Extra rows are ignored without complaint.
    pub async fn query_first(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        self.connection
            .query_first(sql, params)
            .await
            .map_err(|e| e.for_identifier(&self.id))
    }

    /// 🗑️ Release the record. Exclusive handles get closed, shared ones are left alone.
    pub async fn close(self) -> Result<()> {
        match self.ownership {
            Ownership::Exclusive => {
                debug!("🗑️ Closing the connection record '{}' owned", self.id);
                self.connection.close().await
            }
            Ownership::Shared => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::backends::{Connector, InMemoryConfig, InMemoryConnector};

    #[tokio::test]
    async fn the_one_where_shared_records_cannot_slam_the_door() {
        let connector = InMemoryConnector::new(InMemoryConfig::default());
        let conn: SharedConnection = Arc::new(connector.connect().await.unwrap());

        let record = SourceRecord::shared("7", Arc::clone(&conn));
        assert!(!record.is_exclusive());
        assert!(Arc::ptr_eq(&record.connection, &conn));
        record.close().await.unwrap();
        assert!(!conn.is_closed());

        let record = SourceRecord::exclusive("7", Arc::clone(&conn));
        record.close().await.unwrap();
        assert!(conn.is_closed());
    }

    #[tokio::test]
    async fn the_one_where_query_errors_remember_the_record() {
        let connector = InMemoryConnector::new(InMemoryConfig::default());
        let record = SourceRecord::shared("42", Arc::new(connector.connect().await.unwrap()));
        let err = record.query("SELECT * FROM nowhere WHERE id = ?", &[]).await.unwrap_err();
        assert!(err.to_string().contains("for identifier '42'"), "{err}");
    }
}
