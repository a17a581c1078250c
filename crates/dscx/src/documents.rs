//! 📄 Documents: where database columns go to become searchable.
//!
//! 🎬 *[a row walks into an index. the bartender asks "stored or analyzed?". the row says "yes".]*
//!
//! The search-index library itself is somebody else's problem. This module only
//! models the contract mappers write against: a [`DocumentSink`] that accepts
//! `(name, value, stored, analyzed)` and can forget every field with a given name.
//! [`IndexDocument`] is the one implementation, an ordered multi-map that
//! serializes to a JSON object for the sinks downstream. 🦆

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// 🕳️ Anything a mapper can write fields into.
pub trait DocumentSink: Send {
    /// ➕ Append a field. Names may repeat; repeated names become multi-valued fields.
    fn add_field(&mut self, name: &str, value: &str, stored: bool, analyzed: bool);

    /// 🗑️ Drop every field called `name`.
    fn remove_fields(&mut self, name: &str);

    /// ➕ The common case: stored AND analyzed.
    fn add(&mut self, name: &str, value: &str) {
        self.add_field(name, value, true, true);
    }
}

/// 🏷️ One field of an index document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexField {
    pub name: String,
    pub value: String,
    pub stored: bool,
    pub analyzed: bool,
}

/// 📄 An index document under construction. Field order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDocument {
    fields: Vec<IndexField>,
}

impl IndexDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &[IndexField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 🔍 First value for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// 🔍 Every value for `name`, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.name == name)
            .map(|f| f.value.as_str())
            .collect()
    }

    /// 📦 JSON object view: one value stays a string, repeated names become arrays.
    pub fn to_json(&self) -> JsonValue {
        let mut object = Map::new();
        for field in &self.fields {
            let incoming = JsonValue::String(field.value.clone());
            match object.get_mut(&field.name) {
                None => {
                    object.insert(field.name.clone(), incoming);
                }
                Some(JsonValue::Array(values)) => values.push(incoming),
                Some(existing) => {
                    let first = existing.take();
                    *existing = JsonValue::Array(vec![first, incoming]);
                }
            }
        }
        JsonValue::Object(object)
    }

    /// 📥 The way back from [`IndexDocument::to_json`]. Arrays fan out into repeated fields,
    /// other scalars keep their JSON text, nulls vanish. Anything but an object is `None`.
    pub fn from_json(json: &JsonValue) -> Option<Self> {
        let JsonValue::Object(object) = json else {
            return None;
        };
        let mut document = Self::new();
        for (name, value) in object {
            let values: Vec<&JsonValue> = match value {
                JsonValue::Array(values) => values.iter().collect(),
                single => vec![single],
            };
            for value in values {
                match value {
                    JsonValue::Null => {}
                    JsonValue::String(text) => document.add(name, text),
                    other => document.add(name, &other.to_string()),
                }
            }
        }
        Some(document)
    }
}

impl DocumentSink for IndexDocument {
    fn add_field(&mut self, name: &str, value: &str, stored: bool, analyzed: bool) {
        self.fields.push(IndexField {
            name: name.to_string(),
            value: value.to_string(),
            stored,
            analyzed,
        });
    }

    fn remove_fields(&mut self, name: &str) {
        self.fields.retain(|f| f.name != name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_repeated_names_become_arrays() {
        let mut the_doc = IndexDocument::new();
        the_doc.add("title", "Alpha");
        the_doc.add("lang", "de");
        the_doc.add("lang", "en");
        the_doc.add("lang", "fr");

        assert_eq!(the_doc.get("lang"), Some("de"));
        assert_eq!(the_doc.get_all("lang"), vec!["de", "en", "fr"]);
        assert_eq!(
            the_doc.to_json(),
            serde_json::json!({"title": "Alpha", "lang": ["de", "en", "fr"]})
        );
    }

    #[test]
    fn the_one_where_json_comes_back_as_fields() {
        let json = serde_json::json!({"ID": "a", "lang": ["de", "en"], "count": 3, "gone": null});
        let the_doc = IndexDocument::from_json(&json).expect("objects are documents");

        assert_eq!(the_doc.get("ID"), Some("a"));
        assert_eq!(the_doc.get_all("lang"), vec!["de", "en"]);
        assert_eq!(the_doc.get("count"), Some("3"));
        assert_eq!(the_doc.get("gone"), None);
        assert!(IndexDocument::from_json(&serde_json::json!(["not", "a", "doc"])).is_none());
    }

    #[test]
    fn the_one_where_remove_fields_forgets_every_namesake() {
        let mut the_doc = IndexDocument::new();
        the_doc.add("t2", "20201231");
        the_doc.add_field("t2", "19991231", false, false);
        the_doc.add("t1", "00000000");
        the_doc.remove_fields("t2");

        assert_eq!(the_doc.len(), 1);
        assert_eq!(the_doc.get("t2"), None);
        assert!(the_doc.fields()[0].stored && the_doc.fields()[0].analyzed);
    }
}
