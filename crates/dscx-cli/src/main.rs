//! 🚀 dscx-cli: the front door, the bouncer, the maitre d' of dscx.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! 📦 This binary crate is the thin CLI wrapper that loads config,
//! sets up logging, and then lets the real code do the heavy lifting.
//! Like a manager. 🦆

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dscx::documents::IndexDocument;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 🗄️ Turn database rows into search index documents.
#[derive(Debug, Parser)]
#[command(name = "dscx", version)]
struct Cli {
    /// TOML config file, merged over `DSCX_` environment variables.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a full indexing pass into the configured sink (the default).
    Run,
    /// Map the one record an identifier resolves to and print it as JSON.
    Record {
        /// Value bound to the by-id query.
        id: String,
    },
    /// Map already indexed documents (NDJSON, one per line) again and print them as NDJSON.
    Remap {
        #[arg(value_name = "FILE")]
        documents: PathBuf,
    },
}

/// 🚀 main(): where it all begins. The genesis. The big bang.
/// The "I pressed F5 and held my breath" moment.
#[tokio::main]
async fn main() -> Result<()> {
    // 📡 println! debugging is a lifestyle choice we're trying to move past,
    // like flip phones and cargo shorts
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(err) = dispatch(cli).await {
        error!("💀 error: {}", err);
        // -- 🧅 peel the onion of sadness, one tear-jerking layer at a time
        let mut the_vibes_are_giving_connection_issues = false;
        for cause in err.chain().skip(1) {
            error!("⚠️  cause: {}", cause);
            let cause_str = cause.to_string();
            if cause_str.contains("connection unavailable")
                || cause_str.contains("unable to open database")
                || cause_str.contains("database is locked")
            {
                the_vibes_are_giving_connection_issues = true;
            }
        }

        if the_vibes_are_giving_connection_issues {
            error!(
                "🔧 hint: looks like the database isn't reachable. \
                Double-check the `url` in the [database] section, that the file exists, \
                and that nobody else is holding a write lock on it. ☕"
            );
        }

        // 🗑️ Exit with prejudice. Process exitus maximus.
        std::process::exit(1);
    }

    // ✅ If we got here, everything worked. Pop the champagne. 🍾
    Ok(())
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config_file = match cli.config.as_deref() {
        Some(path) => Some(validated_config_path(path)?),
        None => None,
    };

    // 🔧 the moment where we find out if someone put a tab where a space should be
    let app_config = dscx::app_config::load_config(config_file)
        .context("💀 In dscx-cli we couldn't load the config. Check the file and the DSCX_ environment variables.")?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => dscx::run(app_config).await,
        Command::Record { id } => {
            match dscx::index_record(app_config, &id).await? {
                Some(document) => println!(
                    "{}",
                    serde_json::to_string_pretty(&document.to_json())
                        .context("💀 Could not render the document as JSON")?
                ),
                None => info!("🕳️ Nothing to index for '{id}'"),
            }
            Ok(())
        }
        Command::Remap { documents } => {
            let stale = read_documents(&documents).await?;
            info!("🔙 Re-mapping {} documents from '{}'", stale.len(), documents.display());
            for document in dscx::remap_documents(app_config, &stale).await? {
                println!("{}", document.to_json());
            }
            Ok(())
        }
    }
}

/// 🔒 Validate the config file exists before we get too emotionally attached.
fn validated_config_path(config_file: &Path) -> Result<&Path> {
    let exists = config_file.try_exists().with_context(|| {
        format!(
            "💀 Couldn't check whether the configuration file exists. If it's a pwd/cwd thing, use an absolute path. Was checking here: '{}'",
            config_file.display()
        )
    })?;
    if !exists {
        anyhow::bail!(
            "💀 Configuration file not found at '{}'. Double check the path, relative paths resolve against the current directory.",
            config_file.display()
        );
    }
    Ok(config_file)
}

async fn read_documents(path: &Path) -> Result<Vec<IndexDocument>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("💀 Could not read documents from '{}'", path.display()))?;

    let mut documents = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let json: serde_json::Value = serde_json::from_str(line)
            .with_context(|| format!("💀 Line {} of '{}' is not JSON", line_no + 1, path.display()))?;
        let document = IndexDocument::from_json(&json).with_context(|| {
            format!("💀 Line {} of '{}' is not a JSON object", line_no + 1, path.display())
        })?;
        documents.push(document);
    }
    Ok(documents)
}
