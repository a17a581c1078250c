//! 🔌 Backends: where the real I/O happens.
//!
//! 🚰 Connectors pour the rows in, Sinks slurp the documents out.
//! And in between, the producer and the mappers do their thing.
//!
//! 🎭 This module is the casting agency. Need a real database? SQLite, bundled,
//! no DBA required. Need a database that lies convincingly for a test? In-memory.
//! Need the documents on disk? File sink. We've got a backend for that.
//!
//! 🧠 Knowledge graph:
//! - `Connector` → `ConnectorBackend` opens sessions, `Connection` → `ConnectionBackend` runs SQL.
//! - `ConnectionSource` sits on top: open, is-valid (capability gated), close.
//! - `Sink` → `SinkBackend` receives finished `IndexDocument`s.
//!
//! 🦆 The duck is here because every file must have one. This is law.

mod connection;
mod connection_source;
mod sink;

pub mod file;
pub mod in_mem;
pub mod sqlite;

pub use connection::{
    Capabilities, Connection, ConnectionBackend, Connector, ConnectorBackend, SharedConnection,
};
pub use connection_source::{ConnectionSource, LIVENESS_PROBE_TIMEOUT};
pub use sink::{Sink, SinkBackend};

// 🎯 Re-export backend-specific configs so callers can do `backends::SqliteConfig`
// instead of spelunking into `backends::sqlite::SqliteConfig`.
pub use file::{FileSink, FileSinkConfig};
pub use in_mem::{InMemoryConfig, InMemoryConnector, InMemorySink, InMemoryTable};
pub use sqlite::{SqliteConfig, SqliteConnector};
