//! 🔧 App Configuration: the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." (every developer at 3am) 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.
//!
//! ```toml
//! [database.Sqlite]
//! url = "records.db"
//! read_only = true
//!
//! [producer]
//! record_sql = "SELECT id FROM records WHERE published = 1"
//! record_by_id_sql = "SELECT id FROM records WHERE id = ? AND published = 1"
//!
//! [[mappers]]
//! kind = "column"
//! sql = "SELECT id AS ID, title FROM records WHERE id = ?"
//!
//! [sink_config.File]
//! file_name = "documents.ndjson"
//! ```

use std::path::Path;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::backends::{
    ConnectorBackend, FileSinkConfig, InMemoryConfig, InMemoryConnector, SqliteConfig,
    SqliteConnector,
};
use crate::mappers::MapperConfig;
use crate::transforms::syslist::DEFAULT_SYSLIST_SQL;

/// 📦 The AppConfig: one struct to rule them all, one struct to find them,
/// one struct to bring them all, and in the Figment bind them.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 🗄️ Where the rows live.
    pub database: DatabaseConfig,
    /// 📋 Which rows, and how to find one by id.
    pub producer: ProducerConfig,
    /// 🗺️ How a row becomes a document. Runs in order.
    #[serde(default)]
    pub mappers: Vec<MapperConfig>,
    /// 🕳️ Where documents go.
    pub sink_config: SinkConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// 🗄️ Database backends. One variant per connector.
#[derive(Debug, Deserialize, Clone)]
pub enum DatabaseConfig {
    Sqlite(SqliteConfig),
    InMemory(InMemoryConfig),
}

impl DatabaseConfig {
    /// 🔌 Build the connector this config describes.
    pub fn connector(&self) -> ConnectorBackend {
        match self {
            DatabaseConfig::Sqlite(config) => {
                ConnectorBackend::Sqlite(SqliteConnector::new(config.clone()))
            }
            DatabaseConfig::InMemory(config) => {
                ConnectorBackend::InMemory(InMemoryConnector::new(config.clone()))
            }
        }
    }
}

/// 📋 The queries that drive record production.
#[derive(Debug, Deserialize, Clone)]
pub struct ProducerConfig {
    /// 📜 Identifier listing. No params, first column is the id.
    pub record_sql: String,
    /// 🔎 Single-record lookup. One param, first column is the canonical id. Blank = disabled.
    #[serde(default)]
    pub record_by_id_sql: String,
    /// 🏷️ Document field holding the record id, for going from document back to record.
    #[serde(default = "default_record_id_field")]
    pub record_id_field: String,
    /// 📚 Syslist entry lookup used by syslist mappers.
    #[serde(default = "default_syslist_sql")]
    pub syslist_sql: String,
}

fn default_record_id_field() -> String {
    "ID".to_string()
}

fn default_syslist_sql() -> String {
    DEFAULT_SYSLIST_SQL.to_string()
}

/// 🕳️ Sink backends.
#[derive(Debug, Deserialize, Clone)]
pub enum SinkConfig {
    File(FileSinkConfig),
    /// 🧪 Keep documents in memory. Dry runs and tests.
    InMemory,
}

/// ⚙️ Knobs for the pipeline itself.
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// 📬 How many mapped documents may wait between source and sink.
    #[serde(default = "default_queue_capacity", alias = "channel_size")]
    pub queue_capacity: usize,
    /// 📊 Draw the progress bar.
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

fn default_queue_capacity() -> usize {
    10
}

fn default_show_progress() -> bool {
    true
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            show_progress: default_show_progress(),
        }
    }
}

/// 🚀 Load the config from a file, from env vars, or from the sheer power of hoping.
///
/// 🔧 Merges environment variables (DSCX_*) with an optional TOML file.
///   - `config_file_name` is None → env vars only. No file. No assumptions.
///   - `config_file_name` is Some → env vars + TOML file, merged. TOML wins on conflicts.
///
/// 💀 Returns an error if config is unparseable. The message says which source was read.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    // 🏗️ Env vars are the base layer. Nested keys use a double underscore: DSCX_PRODUCER__RECORD_SQL.
    let config = Figment::new().merge(Env::prefixed("DSCX_").split("__"));

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (DSCX_*). \
             The file exists in our hearts, but apparently not on disk.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (DSCX_*). \
                 No file was provided, this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_test_config(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("dscx.toml");
        // 🧪 We write a real file here because Figment wants TOML from disk, like it's method acting.
        fs::write(&path, contents)
            .expect("💀 Failed to write test config. The filesystem said 'new phone who dis'.");
        path
    }

    #[test]
    fn the_one_where_a_sqlite_pass_is_fully_described() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_test_config(
            &dir,
            r#"
            [database.Sqlite]
            url = "records.db"
            read_only = true

            [producer]
            record_sql = "SELECT id FROM records"
            record_by_id_sql = "SELECT id FROM records WHERE id = ?"

            [[mappers]]
            kind = "column"
            sql = "SELECT * FROM records WHERE id = ?"

            [sink_config.File]
            file_name = "out.ndjson"

            [runtime]
            queue_capacity = 8
            "#,
        );

        let app_config = load_config(Some(config_path.as_path()))
            .expect("💀 Config should parse. The schema drift goblin does not get this win.");

        match &app_config.database {
            DatabaseConfig::Sqlite(sqlite) => {
                assert_eq!(sqlite.url, "records.db");
                assert!(sqlite.read_only);
                assert_eq!(sqlite.busy_timeout_ms, 5000);
            }
            honestly_who_knows => panic!(
                "💀 Expected a Sqlite database config, serde took us to {honestly_who_knows:?}."
            ),
        }
        assert_eq!(app_config.producer.record_id_field, "ID");
        assert_eq!(app_config.producer.syslist_sql, DEFAULT_SYSLIST_SQL);
        assert_eq!(app_config.mappers.len(), 1);
        assert_eq!(app_config.runtime.queue_capacity, 8);
        assert!(app_config.runtime.show_progress);
        assert!(matches!(app_config.sink_config, SinkConfig::File(ref f) if f.file_name == "out.ndjson"));
        assert!(matches!(app_config.database.connector(), ConnectorBackend::Sqlite(_)));
    }

    #[test]
    fn the_one_where_runtime_defaults_show_up_uninvited_but_helpful() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_test_config(
            &dir,
            r#"
            sink_config = "InMemory"

            [database.InMemory]
            liveness_probe = false

            [database.InMemory.queries."SELECT id FROM records"]
            columns = ["id"]
            rows = [["a"], ["b"]]

            [producer]
            record_sql = "SELECT id FROM records"

            [runtime]
            channel_size = 3
            "#,
        );

        let app_config: AppConfig = Figment::new()
            .merge(Toml::file(config_path.as_path()))
            .extract()
            .expect("💀 Defaults should fill the gaps. Serde left us on read otherwise.");

        assert_eq!(app_config.runtime.queue_capacity, 3);
        assert!(app_config.mappers.is_empty());
        assert!(app_config.producer.record_by_id_sql.is_empty());
        assert!(matches!(app_config.sink_config, SinkConfig::InMemory));
        let DatabaseConfig::InMemory(in_mem) = &app_config.database else {
            panic!("💀 Expected the in-memory database");
        };
        assert!(!in_mem.liveness_probe);
        assert_eq!(in_mem.queries["SELECT id FROM records"].rows.len(), 2);
    }

    #[test]
    fn the_one_where_the_producer_section_went_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_test_config(
            &dir,
            r#"
            sink_config = "InMemory"

            [database.Sqlite]
            url = "records.db"
            "#,
        );

        let err = load_config(Some(config_path.as_path())).unwrap_err();
        assert!(format!("{err:#}").contains("producer"), "{err:#}");
    }
}
