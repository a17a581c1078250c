use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::backends::{Capabilities, Connection, ConnectionBackend, Connector};
use crate::common::{Row, Value};
use crate::error::{DscError, Result};

/// 📋 One canned result set: column names plus rows of cells.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct InMemoryTable {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl InMemoryTable {
    /// 🏗️ Text-only fixture builder, because tests mostly deal in strings.
    pub fn new(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| Value::from(*cell)).collect())
                .collect(),
        }
    }
}

/// 🔧 The fake database: SQL text → canned result set.
///
/// Parameterised statements return only the rows whose leading cells equal the bound
/// parameters, in order. That is enough to fake "WHERE id = ?" and friends without
/// writing a SQL engine. (We thought about writing a SQL engine. We lay down until it passed.)
#[derive(Debug, Deserialize, Clone)]
pub struct InMemoryConfig {
    #[serde(default)]
    pub queries: HashMap<String, InMemoryTable>,
    /// 💓 Pretend the driver supports liveness probes. Flip it off to test the other path.
    #[serde(default = "default_liveness_probe")]
    pub liveness_probe: bool,
}

fn default_liveness_probe() -> bool {
    true
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            queries: HashMap::new(),
            liveness_probe: default_liveness_probe(),
        }
    }
}

impl InMemoryConfig {
    /// ➕ Register a canned result for `sql`.
    pub fn with_query(mut self, sql: &str, table: InMemoryTable) -> Self {
        self.queries.insert(sql.to_string(), table);
        self
    }

    pub fn with_liveness_probe(mut self, supported: bool) -> Self {
        self.liveness_probe = supported;
        self
    }
}

/// 📊 Shared bookkeeping between a connector and every connection it ever opened.
#[derive(Debug, Default)]
struct InMemoryState {
    opened: usize,
    closed: usize,
    failing_opens: usize,
    failing_queries: usize,
    live: Vec<Arc<ConnectionFlags>>,
}

#[derive(Debug, Default)]
struct ConnectionFlags {
    closed: AtomicBool,
    severed: AtomicBool,
}

fn lock(state: &Mutex<InMemoryState>) -> MutexGuard<'_, InMemoryState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 📞 Opens fake connections and keeps receipts.
///
/// Clone-able so tests can hold a handle to the same bookkeeping the producer uses,
/// then pull the rug out from under it. Arc all the way down. 🦆
#[derive(Debug, Clone)]
pub struct InMemoryConnector {
    queries: Arc<HashMap<String, InMemoryTable>>,
    liveness_probe: bool,
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryConnector {
    pub fn new(config: InMemoryConfig) -> Self {
        Self {
            queries: Arc::new(config.queries),
            liveness_probe: config.liveness_probe,
            state: Arc::new(Mutex::new(InMemoryState::default())),
        }
    }

    /// 🔢 How many connections were opened so far.
    pub fn opened(&self) -> usize {
        lock(&self.state).opened
    }

    /// 🔢 How many connections were closed so far (explicitly or by drop).
    pub fn closed(&self) -> usize {
        lock(&self.state).closed
    }

    /// 🔢 Opened minus closed. Zero means nobody leaked anything.
    pub fn open_connections(&self) -> usize {
        let state = lock(&self.state);
        state.opened.saturating_sub(state.closed)
    }

    /// ✂️ Break every live connection without telling it. `is_closed` stays false,
    /// probes fail, queries fail. The network cable, unplugged.
    pub fn sever_all(&self) {
        for flags in &lock(&self.state).live {
            flags.severed.store(true, Ordering::SeqCst);
        }
    }

    /// 🚪 Mark every live connection closed, as if the server hung up politely.
    pub fn close_all(&self) {
        for flags in &lock(&self.state).live {
            flags.closed.store(true, Ordering::SeqCst);
        }
    }

    /// 💀 The next `count` calls to `connect` fail.
    pub fn fail_next_opens(&self, count: usize) {
        lock(&self.state).failing_opens = count;
    }

    /// 💀 The next `count` queries (on any connection) fail.
    pub fn fail_next_queries(&self, count: usize) {
        lock(&self.state).failing_queries = count;
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    async fn connect(&self) -> Result<ConnectionBackend> {
        let mut state = lock(&self.state);
        if state.failing_opens > 0 {
            state.failing_opens -= 1;
            return Err(DscError::connection("in-memory database refused the connection", None));
        }
        state.opened += 1;
        let flags = Arc::new(ConnectionFlags::default());
        state.live.retain(|f| !f.closed.load(Ordering::SeqCst));
        state.live.push(Arc::clone(&flags));
        info!("🔌 Opening in-memory connection #{}", state.opened);
        Ok(ConnectionBackend::InMemory(InMemoryConnection {
            queries: Arc::clone(&self.queries),
            liveness_probe: self.liveness_probe,
            state: Arc::clone(&self.state),
            flags,
            counted_close: AtomicBool::new(false),
        }))
    }
}

/// 🗄️ A fake session over the canned result sets.
#[derive(Debug)]
pub struct InMemoryConnection {
    queries: Arc<HashMap<String, InMemoryTable>>,
    liveness_probe: bool,
    state: Arc<Mutex<InMemoryState>>,
    flags: Arc<ConnectionFlags>,
    counted_close: AtomicBool,
}

impl InMemoryConnection {
    fn mark_closed(&self) {
        self.flags.closed.store(true, Ordering::SeqCst);
        if !self.counted_close.swap(true, Ordering::SeqCst) {
            lock(&self.state).closed += 1;
        }
    }
}

#[async_trait]
impl Connection for InMemoryConnection {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        if self.flags.closed.load(Ordering::SeqCst) {
            return Err(DscError::connection("in-memory connection is closed", None));
        }
        if self.flags.severed.load(Ordering::SeqCst) {
            return Err(DscError::connection("in-memory connection was severed", None));
        }
        {
            let mut state = lock(&self.state);
            if state.failing_queries > 0 {
                state.failing_queries -= 1;
                return Err(DscError::query(sql, "injected query failure", None));
            }
        }

        debug!("🗄️ SQL: {sql}");
        let table = self
            .queries
            .get(sql)
            .ok_or_else(|| DscError::query(sql, "no such fixture query", None))?;
        Ok(table
            .rows
            .iter()
            .filter(|cells| {
                params.len() <= cells.len()
                    && params.iter().zip(cells.iter()).all(|(p, c)| cells_match(p, c))
            })
            .map(|cells| Row::new(table.columns.clone(), cells.clone()))
            .collect())
    }

    fn is_closed(&self) -> bool {
        self.flags.closed.load(Ordering::SeqCst)
    }

    async fn probe(&self) -> bool {
        !self.is_closed() && !self.flags.severed.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<()> {
        self.mark_closed();
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            liveness_probe: self.liveness_probe,
        }
    }
}

impl Drop for InMemoryConnection {
    fn drop(&mut self) {
        self.mark_closed();
    }
}

// 🔍 Parameters arrive as text, fixtures may be integers. Compare the way a database would.
fn cells_match(param: &Value, cell: &Value) -> bool {
    param == cell || (param.as_string().is_some() && param.as_string() == cell.as_string())
}
