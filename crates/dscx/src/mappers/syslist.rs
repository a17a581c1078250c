use async_trait::async_trait;
use tracing::warn;

use crate::common::Value;
use crate::documents::DocumentSink;
use crate::error::Result;
use crate::mappers::{MappingContext, RecordMapper};
use crate::producers::SourceRecord;

/// 📚 Resolves a record's code-list references into entry names.
///
/// `sql` takes the record id and returns `(list_id, entry_id)` pairs in its first two
/// columns. Each pair goes through the context's syslist lookup.
#[derive(Debug, Clone)]
pub struct SyslistMapper {
    sql: String,
    fields: Vec<String>,
    language_field: Option<String>,
}

impl SyslistMapper {
    pub fn new(sql: impl Into<String>, fields: Vec<String>, language_field: Option<String>) -> Self {
        Self {
            sql: sql.into(),
            fields,
            language_field,
        }
    }
}

#[async_trait]
impl RecordMapper for SyslistMapper {
    async fn map(
        &self,
        record: &SourceRecord,
        document: &mut dyn DocumentSink,
        context: &mut MappingContext,
    ) -> Result<()> {
        let references = record.query(&self.sql, &[Value::from(record.id())]).await?;
        for reference in &references {
            let list_id = reference.get(0).and_then(Value::as_i64);
            let entry_id = reference.get(1).and_then(Value::as_i64);
            let (Some(list_id), Some(entry_id)) = (list_id, entry_id) else {
                warn!(
                    "📚 Record '{}' has a syslist reference without numeric ids, skipping it",
                    record.id()
                );
                continue;
            };
            context
                .syslist
                .add_entry_name_to_index(
                    record,
                    document,
                    list_id,
                    entry_id,
                    &self.fields,
                    self.language_field.as_deref(),
                )
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backends::{Connector, SqliteConnector};
    use crate::documents::IndexDocument;

    #[tokio::test]
    async fn the_one_where_a_record_speaks_every_language_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = crate::backends::sqlite::tests::seeded_database(&dir);
        let conn = SqliteConnector::new(config).connect().await.unwrap();
        let record = SourceRecord::shared("a", Arc::new(conn));

        let mapper = SyslistMapper::new(
            "SELECT 100 AS lst_id, published AS entry_id FROM records WHERE id = ?",
            vec!["topic".into()],
            Some("topic_lang".into()),
        );
        let mut doc = IndexDocument::new();
        mapper
            .map(&record, &mut doc, &mut MappingContext::default())
            .await
            .unwrap();

        assert_eq!(doc.get_all("topic"), vec!["Wasser", "Water"]);
        assert_eq!(doc.get_all("topic_lang"), vec!["de", "en"]);
    }
}
