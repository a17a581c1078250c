//! 🗄️ SQLite backend: a whole database in one file, and a driver that never needs a DBA.
//!
//! rusqlite is synchronous. Statements and probes run on tokio's blocking pool so a
//! slow SQLite never stalls the runtime, and the probe timeout can actually fire. 🦆
//!
//! 🧠 Knowledge graph:
//! - `SqliteConnector` owns the config and opens sessions.
//! - `SqliteConnection` wraps `rusqlite::Connection` in an `Arc<Mutex<Option<..>>>`:
//!   the Arc lets a blocking task borrow the session, the Option is the open/closed state.
//! - Liveness probe: `SELECT 1`. Supported, so the producer will actually use it.

use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::OpenFlags;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use serde::Deserialize;
use tracing::{debug, info};

use crate::backends::{Capabilities, Connection, ConnectionBackend, Connector};
use crate::common::{Row, Value};
use crate::error::{DscError, Result};

/// 🔧 Where the database file lives and how politely we open it.
#[derive(Debug, Deserialize, Clone)]
pub struct SqliteConfig {
    /// 📂 File path, or a `file:` URI.
    pub url: String,
    /// 🔒 Open read-only. Indexers read, they do not write. Usually.
    #[serde(default)]
    pub read_only: bool,
    /// ⏱️ How long to wait on a locked database before giving up.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl SqliteConfig {
    /// 🏗️ Config for a plain file path with the default knobs.
    pub fn for_path(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            read_only: false,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// 📞 Opens SQLite sessions from a [`SqliteConfig`].
#[derive(Debug)]
pub struct SqliteConnector {
    config: SqliteConfig,
}

impl SqliteConnector {
    pub fn new(config: SqliteConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    async fn connect(&self) -> Result<ConnectionBackend> {
        info!("🔌 Opening sqlite connection to '{}'", self.config.url);
        let flags = if self.config.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::default()
        };
        let conn = rusqlite::Connection::open_with_flags(&self.config.url, flags).map_err(|e| {
            DscError::connection(
                format!("could not open sqlite database '{}'", self.config.url),
                Some(Box::new(e)),
            )
        })?;
        conn.busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))
            .map_err(|e| DscError::connection("could not set sqlite busy timeout", Some(Box::new(e))))?;
        Ok(ConnectionBackend::Sqlite(SqliteConnection::new(conn)))
    }
}

type Session = Arc<Mutex<Option<rusqlite::Connection>>>;

/// 🗄️ One SQLite session. `None` inside the mutex means closed.
#[derive(Debug)]
pub struct SqliteConnection {
    inner: Session,
}

// 🔒 A poisoned lock means a query panicked mid-flight. The session is still just data.
fn lock(session: &Session) -> MutexGuard<'_, Option<rusqlite::Connection>> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 🔄 Runs `sql` and collects at most `limit` rows (None = all of them). Blocking.
fn run_blocking(session: &Session, sql: &str, params: &[Value], limit: Option<usize>) -> Result<Vec<Row>> {
    let guard = lock(session);
    let conn = guard
        .as_ref()
        .ok_or_else(|| DscError::connection("sqlite connection is closed", None))?;

    debug!("🗄️ SQL: {sql}");
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| DscError::query(sql, "could not prepare statement", Some(Box::new(e))))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt
        .query(rusqlite::params_from_iter(params.iter()))
        .map_err(|e| DscError::query(sql, "could not execute statement", Some(Box::new(e))))?;

    let mut collected = Vec::new();
    while limit.is_none_or(|max| collected.len() < max) {
        let next = rows
            .next()
            .map_err(|e| DscError::query(sql, "could not fetch row", Some(Box::new(e))))?;
        let Some(row) = next else {
            break;
        };
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            let cell = row
                .get_ref(idx)
                .map_err(|e| DscError::query(sql, "could not read column", Some(Box::new(e))))?;
            values.push(Value::from(cell));
        }
        collected.push(Row::new(columns.clone(), values));
    }
    Ok(collected)
}

impl SqliteConnection {
    fn new(conn: rusqlite::Connection) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(conn))),
        }
    }

    /// 🧵 rusqlite blocks, so the statement runs on tokio's blocking pool.
    async fn run(&self, sql: &str, params: &[Value], limit: Option<usize>) -> Result<Vec<Row>> {
        let session = Arc::clone(&self.inner);
        let owned_sql = sql.to_string();
        let owned_params = params.to_vec();
        tokio::task::spawn_blocking(move || run_blocking(&session, &owned_sql, &owned_params, limit))
            .await
            .map_err(|e| DscError::query(sql, "sqlite worker did not finish", Some(Box::new(e))))?
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.run(sql, params, None).await
    }

    async fn query_first(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self.run(sql, params, Some(1)).await?.into_iter().next())
    }

    fn is_closed(&self) -> bool {
        // 🚧 a session busy with a statement is, by definition, still open
        match self.inner.try_lock() {
            Ok(guard) => guard.is_none(),
            Err(TryLockError::WouldBlock) => false,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().is_none(),
        }
    }

    async fn probe(&self) -> bool {
        let session = Arc::clone(&self.inner);
        let answered = tokio::task::spawn_blocking(move || match lock(&session).as_ref() {
            Some(conn) => conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).is_ok(),
            None => false,
        })
        .await;
        answered.unwrap_or(false)
    }

    async fn close(&self) -> Result<()> {
        let taken = lock(&self.inner).take();
        if let Some(conn) = taken {
            info!("🗑️ Closing sqlite connection.");
            conn.close()
                .map_err(|(_, e)| DscError::connection("error closing sqlite connection", Some(Box::new(e))))?;
        }
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities { liveness_probe: true }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let owned = match self {
            Value::Null => rusqlite::types::Value::Null,
            Value::Integer(i) => rusqlite::types::Value::Integer(*i),
            Value::Real(f) => rusqlite::types::Value::Real(*f),
            Value::Text(s) => rusqlite::types::Value::Text(s.clone()),
            Value::Blob(b) => rusqlite::types::Value::Blob(b.clone()),
        };
        Ok(ToSqlOutput::Owned(owned))
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(cell: ValueRef<'_>) -> Self {
        match cell {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}
