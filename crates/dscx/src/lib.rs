//! 🗄️ dscx: the database source connector for building search indexes.
//!
//! 🎬 *[a relational database hums in the dark. a search index waits, empty.]*
//! *[between them: this crate, a stack of SQL strings, and a reconnect or two.]*
//!
//! 🧠 Knowledge graph:
//! - `producers`: list identifiers, hand out `SourceRecord`s, survive dropped connections.
//! - `mappers`: turn a record into `IndexDocument` fields, one query at a time.
//! - `transforms`: time bounds and syslist names, the helpers mappers lean on.
//! - `backends`: SQLite and in-memory databases, file and in-memory sinks.
//! - `supervisors`: the pipeline that glues all of it together (private).
//! 🦆

pub mod app_config;
pub mod backends;
pub mod common;
pub mod documents;
pub mod error;
pub mod mappers;
pub mod producers;
mod progress;
mod supervisors;
pub mod transforms;

use anyhow::{Context, Result};

use crate::app_config::AppConfig;
use crate::documents::IndexDocument;
use crate::supervisors::{Supervisor, sink_from_config};

pub use crate::error::{DscError, Result as DscResult};

/// 🚀 One full indexing pass, from the listing query to the configured sink.
pub async fn run(app_config: AppConfig) -> Result<()> {
    let sink = sink_from_config(&app_config.sink_config).await?;
    Supervisor::new(app_config)
        .start_workers(sink)
        .await
        .context("💀 The indexing pass did not finish")
}

/// 🔎 Map the single record `id` resolves to. `Ok(None)` when it does not exist or is not published.
pub async fn index_record(app_config: AppConfig, id: &str) -> Result<Option<IndexDocument>> {
    Supervisor::new(app_config).index_record(id).await
}

/// 🔙 Map already indexed documents again, finding each row through the configured id field.
pub async fn remap_documents(
    app_config: AppConfig,
    documents: &[IndexDocument],
) -> Result<Vec<IndexDocument>> {
    Supervisor::new(app_config).remap_documents(documents).await
}
