//! 🗺️ Mappers: a `SourceRecord` goes in, fields come out.
//!
//! 🎬 *[a record arrives with nothing but an id and a phone number for the database.]*
//! *[each mapper calls, asks one question, and writes down the answer.]*
//! *[by the end the record has a title, a time range, and a topic in two languages.]*
//!
//! 🧠 Knowledge graph:
//! - Pattern: `RecordMapper` trait → concrete mappers → `MapperBackend` enum, built from `MapperConfig`.
//! - `MappingContext` is created once per pipeline run and threaded through every `map` call.
//!   It owns the `TimeFieldNormalizer` scratch and the syslist lookup. No globals. 🦆
//! - Mappers only query through the record. They never open or close connections.

use async_trait::async_trait;
use serde::Deserialize;

use crate::documents::{DocumentSink, IndexDocument};
use crate::error::Result;
use crate::producers::SourceRecord;
use crate::transforms::{SyslistLookup, TimeFieldNormalizer, syslist::DEFAULT_SYSLIST_SQL};

pub mod column;
pub mod syslist;
pub mod time_fields;

pub use column::ColumnMapper;
pub use syslist::SyslistMapper;
pub use time_fields::{TimeColumns, TimeFieldMapper};

/// 🧰 Per-run helpers shared by every mapper of a pipeline invocation.
#[derive(Debug)]
pub struct MappingContext {
    pub time_fields: TimeFieldNormalizer,
    pub syslist: SyslistLookup,
}

impl MappingContext {
    pub fn new(syslist_sql: impl Into<String>) -> Self {
        Self {
            time_fields: TimeFieldNormalizer::new(),
            syslist: SyslistLookup::new(syslist_sql),
        }
    }
}

impl Default for MappingContext {
    fn default() -> Self {
        Self::new(DEFAULT_SYSLIST_SQL)
    }
}

/// 🗺️ Writes fields for one record into a document.
///
/// # Contract 📜
/// - Reads through `record`, writes through `document`, keeps per-run state in `context`.
/// - A mapping query with zero rows where one is required is `DscError::NoRow`.
#[async_trait]
pub trait RecordMapper: std::fmt::Debug + Send + Sync {
    async fn map(
        &self,
        record: &SourceRecord,
        document: &mut dyn DocumentSink,
        context: &mut MappingContext,
    ) -> Result<()>;
}

/// 🔧 One mapper, as written in the `[[mappers]]` config array.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapperConfig {
    /// 📋 Copy every column of the first row.
    Column { sql: String },
    /// ⏳ Feed the time triple of the first row to the normalizer.
    TimeFields {
        sql: String,
        #[serde(default)]
        columns: TimeColumns,
    },
    /// 📚 Resolve `(list_id, entry_id)` rows into names.
    Syslist {
        sql: String,
        fields: Vec<String>,
        #[serde(default)]
        language_field: Option<String>,
    },
}

/// 🎭 The many faces of a mapper.
#[derive(Debug, Clone)]
pub enum MapperBackend {
    Column(ColumnMapper),
    TimeFields(TimeFieldMapper),
    Syslist(SyslistMapper),
}

impl MapperBackend {
    pub fn from_config(config: &MapperConfig) -> Self {
        match config {
            MapperConfig::Column { sql } => MapperBackend::Column(ColumnMapper::new(sql.clone())),
            MapperConfig::TimeFields { sql, columns } => {
                MapperBackend::TimeFields(TimeFieldMapper::new(sql.clone(), columns.clone()))
            }
            MapperConfig::Syslist {
                sql,
                fields,
                language_field,
            } => MapperBackend::Syslist(SyslistMapper::new(
                sql.clone(),
                fields.clone(),
                language_field.clone(),
            )),
        }
    }
}

#[async_trait]
impl RecordMapper for MapperBackend {
    async fn map(
        &self,
        record: &SourceRecord,
        document: &mut dyn DocumentSink,
        context: &mut MappingContext,
    ) -> Result<()> {
        match self {
            MapperBackend::Column(m) => m.map(record, document, context).await,
            MapperBackend::TimeFields(m) => m.map(record, document, context).await,
            MapperBackend::Syslist(m) => m.map(record, document, context).await,
        }
    }
}

/// 📄 Run every mapper, in order, over one record. The first failure wins.
pub async fn map_record(
    mappers: &[MapperBackend],
    record: &SourceRecord,
    context: &mut MappingContext,
) -> Result<IndexDocument> {
    let mut document = IndexDocument::new();
    for mapper in mappers {
        mapper.map(record, &mut document, context).await?;
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backends::{Connector, SqliteConnector};

    #[test]
    fn the_one_where_mappers_are_read_from_toml() {
        #[derive(Deserialize)]
        struct Fragment {
            mappers: Vec<MapperConfig>,
        }
        let fragment: Fragment = toml::from_str(
            r#"
            [[mappers]]
            kind = "column"
            sql = "SELECT id AS ID, title FROM records WHERE id = ?"

            [[mappers]]
            kind = "time_fields"
            sql = "SELECT time_from, time_to, time_type FROM records WHERE id = ?"

            [[mappers]]
            kind = "syslist"
            sql = "SELECT 100, published FROM records WHERE id = ?"
            fields = ["topic"]
            "#,
        )
        .expect("💀 mapper TOML should parse");

        assert_eq!(fragment.mappers.len(), 3);
        assert_eq!(
            fragment.mappers[1],
            MapperConfig::TimeFields {
                sql: "SELECT time_from, time_to, time_type FROM records WHERE id = ?".into(),
                columns: TimeColumns::default(),
            }
        );
        assert!(matches!(
            &fragment.mappers[2],
            MapperConfig::Syslist { language_field: None, fields, .. } if fields == &["topic"]
        ));
    }

    #[tokio::test]
    async fn the_one_where_three_mappers_build_one_document() {
        let dir = tempfile::tempdir().unwrap();
        let config = crate::backends::sqlite::tests::seeded_database(&dir);
        let conn = SqliteConnector::new(config).connect().await.unwrap();
        let record = SourceRecord::shared("a", Arc::new(conn));

        let mappers: Vec<MapperBackend> = [
            MapperConfig::Column {
                sql: "SELECT id AS ID, title FROM records WHERE id = ?".into(),
            },
            MapperConfig::TimeFields {
                sql: "SELECT time_from, time_to, time_type FROM records WHERE id = ?".into(),
                columns: TimeColumns::default(),
            },
            MapperConfig::Syslist {
                sql: "SELECT 100, published FROM records WHERE id = ?".into(),
                fields: vec!["topic".into()],
                language_field: None,
            },
        ]
        .iter()
        .map(MapperBackend::from_config)
        .collect();

        let doc = map_record(&mappers, &record, &mut MappingContext::default())
            .await
            .unwrap();
        assert_eq!(doc.get("ID"), Some("a"));
        assert_eq!(doc.get("title"), Some("Alpha"));
        assert_eq!(doc.get("t1"), Some("20200101"));
        assert_eq!(doc.get("t2"), Some("99999999"));
        assert_eq!(doc.get_all("topic"), vec!["Wasser", "Water"]);
    }
}
