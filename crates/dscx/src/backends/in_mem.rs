//! # Previously, on dscx...
//!
//! 🎬 The database was down. Or missing. Or living on a laptop three time zones away.
//! Someone still had to test the reconnect logic. Someone had to pretend.
//!
//! `in_mem` provides an in-memory database connector and an in-memory [`Sink`] for
//! tests and local dry runs. The [`InMemoryConnector`] answers SQL text with canned
//! result sets and keeps receipts of every connection it opened, so tests can
//! sever them mid-pass and count what leaked. The [`InMemorySink`] collects
//! documents behind an `Arc<Mutex<...>>` so callers can inspect what arrived.
//!
//! 🦆
//!
//! ⚠️ This is NOT a SQL engine. It matches statements by exact text. If you're
//! deploying this to prod, please also deploy a therapist.
//!
//! [`Sink`]: crate::backends::Sink

mod in_mem_connection;
mod in_mem_sink;

pub use in_mem_connection::{InMemoryConfig, InMemoryConnection, InMemoryConnector, InMemoryTable};
pub use in_mem_sink::InMemorySink;
