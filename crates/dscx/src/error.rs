//! 💀 Errors: the four horsemen of the indexing pass, plus a config goblin.
//!
//! 🧠 Knowledge graph:
//! - `ConnectionUnavailable`: open/probe/close went sideways. Retried once inside `next()`.
//! - `Query`: the SQL ran and the database said no. Never retried.
//! - `NoRow`: the mapping query came back empty for an identifier. Not a crash, a fact.
//! - `Precondition`: the caller broke the contract (`next()` after exhaustion, missing id field).
//! - `Configuration`: something that should have been in the TOML was not.
//!
//! The by-id lookup does NOT use `NoRow`: an excluded id is `Ok(None)` there, because
//! publication conditions filtering out a row is Tuesday, not an incident. 🦆

use thiserror::Error;

/// 📦 Boxed source error. Drivers bring their own error types, we just carry them.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 🎯 Result alias for the core. The CLI and workers wrap this in anyhow.
pub type Result<T> = std::result::Result<T, DscError>;

/// 🚨 Everything that can go wrong between the database and the document.
#[derive(Error, Debug)]
pub enum DscError {
    /// 🔌 No usable connection. Covers open, reopen, probe and close failures.
    #[error("cannot obtain record: connection unavailable ({message})")]
    ConnectionUnavailable {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// 🗄️ Statement preparation or execution failed.
    #[error("query failed{}: {message} (sql: '{sql}')", identifier_suffix(.identifier))]
    Query {
        sql: String,
        identifier: Option<String>,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// 🕳️ The mapping query returned zero rows for this identifier.
    #[error("no row returned for identifier '{identifier}' (sql: '{sql}')")]
    NoRow { identifier: String, sql: String },

    /// ⚠️ Contract violation by the caller.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// 🔧 Required configuration missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),
}

fn identifier_suffix(identifier: &Option<String>) -> String {
    match identifier {
        Some(id) => format!(" for identifier '{id}'"),
        None => String::new(),
    }
}

impl DscError {
    /// 🔌 Shorthand for a connection failure with an optional driver cause.
    pub fn connection(message: impl Into<String>, source: Option<BoxError>) -> Self {
        Self::ConnectionUnavailable {
            message: message.into(),
            source,
        }
    }

    /// 🗄️ Shorthand for a query failure. Identifier gets attached later via [`DscError::for_identifier`].
    pub fn query(sql: impl Into<String>, message: impl Into<String>, source: Option<BoxError>) -> Self {
        Self::Query {
            sql: sql.into(),
            identifier: None,
            message: message.into(),
            source,
        }
    }

    /// 🏷️ Stamp the record identifier onto a query error so the logs say WHICH row hurt us.
    /// Other variants pass through untouched.
    pub fn for_identifier(self, id: &str) -> Self {
        match self {
            Self::Query {
                sql,
                message,
                source,
                ..
            } => Self::Query {
                sql,
                identifier: Some(id.to_string()),
                message,
                source,
            },
            other => other,
        }
    }

    /// 🔍 True for the connection family, the only one the producer retries.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionUnavailable { .. })
    }

    /// 🔍 True when a mapping query found nothing for the record.
    pub fn is_no_row(&self) -> bool {
        matches!(self, Self::NoRow { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_query_errors_learn_whose_row_it_was() {
        let the_error = DscError::query("SELECT * FROM t WHERE id = ?", "no such table: t", None)
            .for_identifier("42");
        let the_message = the_error.to_string();
        assert!(the_message.contains("for identifier '42'"), "{the_message}");
        assert!(the_message.contains("SELECT * FROM t WHERE id = ?"), "{the_message}");
        assert!(!the_error.is_connection());
    }

    #[test]
    fn the_one_where_no_row_is_not_a_connection_problem() {
        let the_error = DscError::NoRow {
            identifier: "7".into(),
            sql: "SELECT 1".into(),
        };
        assert!(the_error.is_no_row());
        assert!(!the_error.is_connection());
        assert_eq!(
            DscError::connection("gone", None).for_identifier("7").to_string(),
            "cannot obtain record: connection unavailable (gone)"
        );
    }
}
