use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::{debug, warn};

use crate::backends::{
    Capabilities, Connection, ConnectionBackend, Connector, ConnectorBackend, SharedConnection,
};
use crate::error::{DscError, Result};

/// ⏱️ Upper bound for a single liveness probe. Governs the probe only, never the queries after it.
pub const LIVENESS_PROBE_TIMEOUT: Duration = Duration::from_millis(1000);

/// 🔌 Opens, checks and closes connections for one producer.
///
/// The driver's [`Capabilities`] are asked for once, on the first successful open,
/// and cached here. Every later `is_valid` call reads the cache instead of asking again.
///
/// # Contract 📜
/// - `open` yields a live handle or `ConnectionUnavailable`. There is no third option,
///   and definitely no null handle that explodes three calls later.
/// - `is_valid` is cheap when the driver cannot probe: closed-check only.
/// - `close` reports errors; callers decide whether they care.
#[derive(Debug)]
pub struct ConnectionSource {
    connector: ConnectorBackend,
    capabilities: OnceLock<Capabilities>,
}

impl ConnectionSource {
    pub fn new(connector: ConnectorBackend) -> Self {
        Self {
            connector,
            capabilities: OnceLock::new(),
        }
    }

    /// 📞 Open a fresh connection.
    pub async fn open(&self) -> Result<SharedConnection> {
        let connection = self.connector.connect().await.map_err(|e| match e {
            DscError::ConnectionUnavailable { .. } => e,
            other => DscError::connection("could not open connection", Some(Box::new(other))),
        })?;
        let negotiated = *self.capabilities.get_or_init(|| {
            let caps = connection.capabilities();
            debug!("🤝 Driver capabilities negotiated: {caps:?}");
            caps
        });
        if !negotiated.liveness_probe {
            debug!("💤 Driver has no liveness probe, validity checks will only look for closed connections");
        }
        Ok(Arc::new(connection))
    }

    /// 🤝 Cached capabilities, `None` until the first successful open.
    pub fn capabilities(&self) -> Option<Capabilities> {
        self.capabilities.get().copied()
    }

    /// 💓 Is this handle still usable? Closed → no. Probe-capable driver → ask it, bounded by `timeout`.
    pub async fn is_valid(&self, connection: &ConnectionBackend, timeout: Duration) -> bool {
        if connection.is_closed() {
            return false;
        }
        let can_probe = self
            .capabilities
            .get()
            .map(|caps| caps.liveness_probe)
            .unwrap_or(false);
        if !can_probe {
            return true;
        }
        match tokio::time::timeout(timeout, connection.probe()).await {
            Ok(alive) => alive,
            Err(_) => {
                warn!("⏱️ Liveness probe did not answer within {timeout:?}");
                false
            }
        }
    }

    /// 🗑️ Close a handle.
    pub async fn close(&self, connection: &ConnectionBackend) -> Result<()> {
        connection.close().await
    }
}
