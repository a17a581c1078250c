//! 🔁 The record-set producer: one pass over every identifier the listing query returns.
//!
//! 🎬 *[INT. DATABASE. A connection has been open for six hours. It is tired.]*
//! *[somewhere a firewall quietly drops it. nobody tells the connection.]*
//! *[`next()` notices, sighs, and dials again. the pass continues. no row is lost.]*
//!
//! 🧠 Knowledge graph:
//! - State lives in [`IterationState`]: `Unopened` or `Iterating { connection, cursor }`.
//!   The connection and the cursor exist together or not at all.
//! - `has_next()` returning false closes the connection and parks in `Exhausted`.
//!   From there `has_next()` starts a fresh pass, `next()` is refused.
//! - `next()` opens lazily only from `Unopened`, never after an exhausted pass.
//! - Reconnect happens inside `next()` only, at most once per call. 🦆

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::app_config::ProducerConfig;
use crate::backends::{
    Connection, ConnectionBackend, ConnectionSource, LIVENESS_PROBE_TIMEOUT, SharedConnection,
};
use crate::common::Value;
use crate::error::{DscError, Result};
use crate::producers::{RecordIdCursor, RecordIdProducer, SourceRecord};

/// 📜 What the pipeline driver asks of a record source.
///
/// # Contract 📜
/// - `has_next` never moves the cursor. Call it as often as you like.
/// - `next` moves the cursor by exactly one, or fails without moving it.
/// - `next` on an exhausted cursor is a `Precondition` error.
/// - `doc_count` is the size of the latest successful listing, `0` before the first one.
/// - `record_by_id` distinguishes "absent" (`Ok(None)`) from "broken" (`Err`).
#[async_trait]
pub trait RecordSetProducer: Send {
    async fn has_next(&mut self) -> Result<bool>;
    async fn next(&mut self) -> Result<SourceRecord>;
    /// 🧹 Abandon the pass: close the connection, drop the cursor. Never fails.
    async fn reset(&mut self);
    fn doc_count(&self) -> usize;
    async fn record_by_id(&mut self, id: &str) -> Result<Option<SourceRecord>>;
}

/// 🚦 Where the pass is at.
#[derive(Debug, Default)]
enum IterationState {
    #[default]
    Unopened,
    Iterating {
        connection: SharedConnection,
        cursor: RecordIdCursor,
    },
    Exhausted,
}

/// 🗄️ [`RecordSetProducer`] over a relational database.
#[derive(Debug)]
pub struct DatabaseRecordSetProducer {
    source: ConnectionSource,
    ids: RecordIdProducer,
    record_by_id_sql: Option<String>,
    probe_timeout: Duration,
    state: IterationState,
    doc_count: usize,
}

impl DatabaseRecordSetProducer {
    pub fn new(source: ConnectionSource, record_sql: impl Into<String>) -> Self {
        Self {
            source,
            ids: RecordIdProducer::new(record_sql),
            record_by_id_sql: None,
            probe_timeout: LIVENESS_PROBE_TIMEOUT,
            state: IterationState::Unopened,
            doc_count: 0,
        }
    }

    /// 🏗️ Producer wired from the `[producer]` config section.
    pub fn from_config(source: ConnectionSource, config: &ProducerConfig) -> Self {
        Self::new(source, config.record_sql.clone())
            .with_record_by_id_sql(config.record_by_id_sql.clone())
    }

    /// 🔎 Configure the by-id lookup. Blank SQL counts as "not configured".
    pub fn with_record_by_id_sql(mut self, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        self.record_by_id_sql = (!sql.trim().is_empty()).then_some(sql);
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn connection_source(&self) -> &ConnectionSource {
        &self.source
    }

    /// 🏁 `Unopened | Exhausted → Iterating`: open, list, remember the count. No-op when already iterating.
    async fn materialize(&mut self) -> Result<()> {
        if matches!(self.state, IterationState::Iterating { .. }) {
            return Ok(());
        }
        let connection = self.source.open().await?;
        match self.ids.produce(&connection).await {
            Ok(cursor) => {
                info!("📋 Record listing found {} records", cursor.len());
                self.doc_count = cursor.len();
                self.state = IterationState::Iterating { connection, cursor };
                Ok(())
            }
            Err(e) => {
                self.close_quietly(&connection).await;
                Err(e)
            }
        }
    }

    /// 🏁 `Iterating → Exhausted`: the connection goes away with the cursor.
    async fn finish_pass(&mut self) {
        let finished = std::mem::replace(&mut self.state, IterationState::Exhausted);
        if let IterationState::Iterating { connection, .. } = finished {
            self.close_quietly(&connection).await;
        }
    }

    // 🗑️ Close without raising. Used on paths that are already reporting something else.
    async fn close_quietly(&self, connection: &ConnectionBackend) {
        if let Err(e) = self.source.close(connection).await {
            warn!("⚠️ Ignoring error while closing connection: {e}");
        }
    }
}

#[async_trait]
impl RecordSetProducer for DatabaseRecordSetProducer {
    async fn has_next(&mut self) -> Result<bool> {
        self.materialize().await?;
        let remaining = match &self.state {
            IterationState::Iterating { cursor, .. } => cursor.has_remaining(),
            IterationState::Unopened | IterationState::Exhausted => false,
        };
        if !remaining {
            debug!("🏁 Record set exhausted after {} records", self.doc_count);
            self.finish_pass().await;
        }
        Ok(remaining)
    }

    async fn next(&mut self) -> Result<SourceRecord> {
        match self.state {
            IterationState::Exhausted => {
                return Err(DscError::Precondition(
                    "next() called after has_next() reported the end of the record set".into(),
                ));
            }
            IterationState::Unopened => self.materialize().await?,
            IterationState::Iterating { .. } => {}
        }
        let IterationState::Iterating { cursor, .. } = &self.state else {
            return Err(DscError::Precondition("record set is not iterating".into()));
        };
        if !cursor.has_remaining() {
            self.finish_pass().await;
            return Err(DscError::Precondition(
                "next() called on an exhausted record set, check has_next() first".into(),
            ));
        }
        let IterationState::Iterating { connection, cursor } = &mut self.state else {
            return Err(DscError::Precondition("record set is not iterating".into()));
        };

        if !self.source.is_valid(&**connection, self.probe_timeout).await {
            warn!(
                "🔌 Connection went stale with {} records to go, reconnecting",
                cursor.remaining()
            );
            if let Err(e) = self.source.close(&**connection).await {
                warn!("⚠️ Ignoring error while closing the stale connection: {e}");
            }
            *connection = self.source.open().await?;
        }

        let id = cursor.advance().ok_or_else(|| {
            DscError::Precondition("record cursor ran dry between check and advance".into())
        })?;
        Ok(SourceRecord::shared(id, Arc::clone(connection)))
    }

    async fn reset(&mut self) {
        if let IterationState::Iterating { connection, .. } = std::mem::take(&mut self.state) {
            self.close_quietly(&connection).await;
        }
    }

    fn doc_count(&self) -> usize {
        self.doc_count
    }

    async fn record_by_id(&mut self, id: &str) -> Result<Option<SourceRecord>> {
        let sql = self.record_by_id_sql.as_deref().ok_or_else(|| {
            DscError::Configuration("record_by_id_sql is not configured".into())
        })?;

        let connection = self.source.open().await?;
        match connection.query_first(sql, &[Value::from(id)]).await {
            Ok(Some(row)) => match row.get(0).and_then(Value::as_string) {
                Some(canonical) => {
                    debug!("🔎 Record '{id}' resolved to '{canonical}'");
                    Ok(Some(SourceRecord::exclusive(canonical, connection)))
                }
                None => {
                    debug!("🕳️ Record '{id}' resolved to a NULL identifier, treating it as absent");
                    self.close_quietly(&connection).await;
                    Ok(None)
                }
            },
            Ok(None) => {
                debug!("🕳️ No record for '{id}', it does not exist or is not published");
                self.close_quietly(&connection).await;
                Ok(None)
            }
            Err(e) => {
                self.close_quietly(&connection).await;
                Err(e.for_identifier(id))
            }
        }
    }
}
