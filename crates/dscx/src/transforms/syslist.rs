//! 📚 Syslist lookup: code list entries resolved to their names, in every language on file.
//!
//! A record stores `(list_id, entry_id)`. The index wants "Wasser" and "Water".
//! This is the one query that bridges the two.

use tracing::debug;

use crate::common::Value;
use crate::documents::DocumentSink;
use crate::error::Result;
use crate::producers::SourceRecord;

/// 📜 The stock lookup. Two positional params: list id, entry id.
pub const DEFAULT_SYSLIST_SQL: &str = "SELECT * FROM sys_list WHERE lst_id=? AND entry_id=?";
/// 🏷️ Column holding the entry name.
pub const NAME_COLUMN: &str = "name";
/// 🌍 Column holding the language of that name.
pub const LANGUAGE_COLUMN: &str = "lang_id";

#[derive(Debug, Clone)]
pub struct SyslistLookup {
    sql: String,
}

impl Default for SyslistLookup {
    fn default() -> Self {
        Self::new(DEFAULT_SYSLIST_SQL)
    }
}

impl SyslistLookup {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }

    /// 📚 Add the entry's name, one value per language row, to every field in `fields`.
    /// With a `language_field`, each row's language goes there too. Returns the row count.
    pub async fn add_entry_name_to_index(
        &self,
        record: &SourceRecord,
        document: &mut dyn DocumentSink,
        list_id: i64,
        entry_id: i64,
        fields: &[String],
        language_field: Option<&str>,
    ) -> Result<usize> {
        let rows = record
            .query(&self.sql, &[Value::Integer(list_id), Value::Integer(entry_id)])
            .await?;
        for row in &rows {
            if let Some(name) = row.get_by_name(NAME_COLUMN).and_then(Value::as_string) {
                for field in fields {
                    document.add(field, &name);
                }
            }
            let Some(language_field) = language_field else {
                continue;
            };
            if let Some(language) = row.get_by_name(LANGUAGE_COLUMN).and_then(Value::as_string) {
                document.add(language_field, &language);
            }
        }
        debug!(
            "📚 Syslist {list_id}/{entry_id} resolved to {} names for record '{}'",
            rows.len(),
            record.id()
        );
        Ok(rows.len())
    }
}
