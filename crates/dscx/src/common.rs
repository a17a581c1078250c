//! 📦 Common data structures: the cells and rows that ferry data out of the database.
//!
//! 🎬 COLD OPEN: INT. RESULT SET. 2:14 AM.
//! A cursor blinks. A row arrives. It has columns. Some of them are NULL.
//! Nobody knows why `time_to` is NULL. Nobody ever will. 🦆
//!
//! These types are driver agnostic on purpose: the SQLite backend and the in-memory
//! fixture backend both speak `Value` and `Row`, so producers and mappers never
//! learn which database they are talking to.

use serde::Deserialize;

/// 🧱 One SQL cell, or one bound parameter. Small enum, big responsibilities.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// 🔄 "getString" semantics: numbers become their decimal text (whole REALs keep
    /// their `.0`, so `1.0` stays `"1.0"`), blobs are decoded
    /// lossily as UTF-8, NULL stays `None`. Every index field is a string in the end.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(f) => Some(real_to_string(*f)),
            Value::Text(s) => Some(s.clone()),
            Value::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
        }
    }

    /// 🔢 Integer view, parsing text if the column came back stringly typed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

fn real_to_string(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// 📜 One result row: column names plus their values, same order, same length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// 🏗️ Zips names with values. Mismatched lengths are a driver bug, so we trim to the shorter.
    pub fn new(columns: Vec<String>, mut values: Vec<Value>) -> Self {
        let mut columns = columns;
        let width = columns.len().min(values.len());
        columns.truncate(width);
        values.truncate(width);
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// 📍 Zero-based positional access. (JDBC was one-based. We moved on.)
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// 🔎 Case-insensitive lookup by column name, because drivers disagree about shouting.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .and_then(|idx| self.values.get(idx))
    }

    /// 🔄 `(column, value)` pairs in result-set order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_every_value_learns_to_be_a_string() {
        assert_eq!(Value::Integer(42).as_string(), Some("42".to_string()));
        assert_eq!(Value::Text("von".into()).as_string(), Some("von".to_string()));
        assert_eq!(Value::Blob(b"bytes".to_vec()).as_string(), Some("bytes".to_string()));
        assert_eq!(Value::Null.as_string(), None);
        assert_eq!(Value::from(None::<&str>), Value::Null);
        // 🎯 REAL columns read like a REAL, not like an INTEGER in disguise
        assert_eq!(Value::Real(1.0).as_string(), Some("1.0".to_string()));
        assert_eq!(Value::Real(-3.0).as_string(), Some("-3.0".to_string()));
        assert_eq!(Value::Real(2.5).as_string(), Some("2.5".to_string()));
        assert_eq!(Value::Text(" 17 ".into()).as_i64(), Some(17));
    }

    #[test]
    fn the_one_where_columns_answer_to_any_capitalization() {
        let the_row = Row::new(
            vec!["ID".into(), "title".into()],
            vec![Value::Integer(1), Value::from("hello")],
        );
        assert_eq!(the_row.get_by_name("id"), Some(&Value::Integer(1)));
        assert_eq!(the_row.get_by_name("TITLE"), Some(&Value::from("hello")));
        assert_eq!(the_row.get_by_name("nope"), None);
        assert_eq!(the_row.iter().count(), 2);
    }

    #[test]
    fn the_one_where_mismatched_rows_get_trimmed_not_panicked() {
        let the_row = Row::new(vec!["a".into(), "b".into()], vec![Value::Null]);
        assert_eq!(the_row.len(), 1);
        assert_eq!(the_row.columns(), &["a".to_string()]);
    }
}
