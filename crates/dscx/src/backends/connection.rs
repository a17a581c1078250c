use std::sync::Arc;

use async_trait::async_trait;

use crate::backends::{in_mem, sqlite};
use crate::common::{Row, Value};
use crate::error::Result;

/// 🤝 What a driver can do beyond the basics, negotiated once per [`ConnectionSource`].
///
/// Typed on purpose: we ask the connection, it answers with a struct. No poking around
/// at runtime to see whether some optional method happens to exist.
///
/// [`ConnectionSource`]: crate::backends::ConnectionSource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// 💓 Driver can answer "are you still there?" within a timeout.
    pub liveness_probe: bool,
}

/// 🔌 Something that can dial the database and hand back a live connection.
///
/// # Contract 📜
/// - `connect` returns a usable connection or an error. Never a half-open zombie.
/// - Connectors are cheap to share: the producer keeps one for the whole process.
#[async_trait]
pub trait Connector: std::fmt::Debug + Send + Sync {
    /// 📞 Open a brand new session.
    async fn connect(&self) -> Result<ConnectionBackend>;
}

/// 🗄️ A live data-source session.
///
/// # Contract 📜
/// - `query` binds `params` positionally (`?` placeholders) and returns every row.
/// - `query_first` returns only the first row. Extra rows are ignored on purpose:
///   first row wins, for by-id lookups and column mapping alike.
/// - `is_closed` is a local check, no round trip.
/// - `probe` is a round trip and only gets called when `capabilities().liveness_probe` is set.
/// - `close` is idempotent. Closing a closed connection is a shrug, not an error.
///
/// 🧠 Knowledge graph: pattern is trait → concrete impls (SqliteConnection,
/// InMemoryConnection) → `ConnectionBackend` enum, same as the sinks.
#[async_trait]
pub trait Connection: std::fmt::Debug + Send + Sync {
    /// 📜 Run a statement and collect all rows.
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// 🥇 Run a statement and keep only the first row.
    async fn query_first(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self.query(sql, params).await?.into_iter().next())
    }

    /// 🔒 Has this session been closed (by us or by the driver)?
    fn is_closed(&self) -> bool;

    /// 💓 Round-trip liveness check. `false` means "reopen me".
    async fn probe(&self) -> bool;

    /// 🗑️ Release the session.
    async fn close(&self) -> Result<()>;

    /// 🤝 What this driver supports.
    fn capabilities(&self) -> Capabilities;
}

/// 🎭 The many faces of a connection: SQLite for real work, in-memory for tests and dry runs.
#[derive(Debug)]
pub enum ConnectionBackend {
    Sqlite(sqlite::SqliteConnection),
    InMemory(in_mem::InMemoryConnection),
}

/// 🔗 The handle records carry around. The producer owns the pass, records just borrow a clone.
pub type SharedConnection = Arc<ConnectionBackend>;

#[async_trait]
impl Connection for ConnectionBackend {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        match self {
            ConnectionBackend::Sqlite(c) => c.query(sql, params).await,
            ConnectionBackend::InMemory(c) => c.query(sql, params).await,
        }
    }

    async fn query_first(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        match self {
            ConnectionBackend::Sqlite(c) => c.query_first(sql, params).await,
            ConnectionBackend::InMemory(c) => c.query_first(sql, params).await,
        }
    }

    fn is_closed(&self) -> bool {
        match self {
            ConnectionBackend::Sqlite(c) => c.is_closed(),
            ConnectionBackend::InMemory(c) => c.is_closed(),
        }
    }

    async fn probe(&self) -> bool {
        match self {
            ConnectionBackend::Sqlite(c) => c.probe().await,
            ConnectionBackend::InMemory(c) => c.probe().await,
        }
    }

    async fn close(&self) -> Result<()> {
        match self {
            ConnectionBackend::Sqlite(c) => c.close().await,
            ConnectionBackend::InMemory(c) => c.close().await,
        }
    }

    fn capabilities(&self) -> Capabilities {
        match self {
            ConnectionBackend::Sqlite(c) => c.capabilities(),
            ConnectionBackend::InMemory(c) => c.capabilities(),
        }
    }
}

/// 🎭 The many faces of a connector. Mirrors `ConnectionBackend` one level up.
#[derive(Debug)]
pub enum ConnectorBackend {
    Sqlite(sqlite::SqliteConnector),
    InMemory(in_mem::InMemoryConnector),
}

#[async_trait]
impl Connector for ConnectorBackend {
    async fn connect(&self) -> Result<ConnectionBackend> {
        match self {
            ConnectorBackend::Sqlite(c) => c.connect().await,
            ConnectorBackend::InMemory(c) => c.connect().await,
        }
    }
}
