use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::common::{Row, Value};
use crate::documents::DocumentSink;
use crate::error::Result;
use crate::mappers::{MappingContext, RecordMapper};
use crate::producers::SourceRecord;

/// 🏷️ Which columns carry the time triple.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TimeColumns {
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default = "default_to")]
    pub to: String,
    #[serde(default = "default_type")]
    pub kind: String,
}

fn default_from() -> String {
    "time_from".into()
}

fn default_to() -> String {
    "time_to".into()
}

fn default_type() -> String {
    "time_type".into()
}

impl Default for TimeColumns {
    fn default() -> Self {
        Self {
            from: default_from(),
            to: default_to(),
            kind: default_type(),
        }
    }
}

/// ⏳ Reads the time triple of a record and lets the context's normalizer write t0/t1/t2.
#[derive(Debug, Clone)]
pub struct TimeFieldMapper {
    sql: String,
    columns: TimeColumns,
}

impl TimeFieldMapper {
    pub fn new(sql: impl Into<String>, columns: TimeColumns) -> Self {
        Self {
            sql: sql.into(),
            columns,
        }
    }
}

fn text(row: &Row, column: &str) -> Option<String> {
    row.get_by_name(column).and_then(Value::as_string)
}

#[async_trait]
impl RecordMapper for TimeFieldMapper {
    async fn map(
        &self,
        record: &SourceRecord,
        document: &mut dyn DocumentSink,
        context: &mut MappingContext,
    ) -> Result<()> {
        let Some(row) = record
            .query_first(&self.sql, &[Value::from(record.id())])
            .await?
        else {
            debug!("⏳ No time row for record '{}', no bounds written", record.id());
            return Ok(());
        };

        let from = text(&row, &self.columns.from);
        let to = text(&row, &self.columns.to);
        let kind = text(&row, &self.columns.kind);
        let bounds = context.time_fields.process_time_fields(
            document,
            from.as_deref(),
            to.as_deref(),
            kind.as_deref(),
        );
        debug!("⏳ Record '{}' got time bounds {bounds:?}", record.id());
        Ok(())
    }
}
