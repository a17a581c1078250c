use async_trait::async_trait;
use tracing::trace;

use crate::common::Value;
use crate::documents::DocumentSink;
use crate::error::{DscError, Result};
use crate::mappers::{MappingContext, RecordMapper};
use crate::producers::SourceRecord;

/// 📋 Copies every column of one row into a like-named stored + analyzed field.
///
/// The query takes one parameter, the record id. First row wins: extra rows are
/// ignored without a word, which is how it always worked and how callers expect it
/// to keep working. Zero rows is a [`DscError::NoRow`], never an empty document.
#[derive(Debug, Clone)]
pub struct ColumnMapper {
    sql: String,
}

impl ColumnMapper {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }
}

#[async_trait]
impl RecordMapper for ColumnMapper {
    async fn map(
        &self,
        record: &SourceRecord,
        document: &mut dyn DocumentSink,
        _context: &mut MappingContext,
    ) -> Result<()> {
        let row = record
            .query_first(&self.sql, &[Value::from(record.id())])
            .await?
            .ok_or_else(|| DscError::NoRow {
                identifier: record.id().to_string(),
                sql: self.sql.clone(),
            })?;

        for (column, value) in row.iter() {
            // 🕳️ NULL has no string form, so it has no field either
            if let Some(text) = value.as_string() {
                trace!("📋 {column} = {text}");
                document.add(column, &text);
            }
        }
        Ok(())
    }
}
