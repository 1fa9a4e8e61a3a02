//! The `tender` binary: command-line entry point of the consistency engine.
//!
//! Reads `tender.toml` (or the path given with `--config`), opens the SQLite
//! store, and either serves the JSON API or runs one operation against the
//! store and prints the result as JSON.
//!
//! ```text
//! tender intake tender.json
//! tender apply addendum-1.json
//! tender pending HDB-2025-0142
//! tender serve
//! ```

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tender_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::EngineConfig;

#[derive(Parser)]
#[command(author, version, about = "Addendum-driven tender consistency engine")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tender.toml", env = "TENDER_CONFIG")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API.
  Serve,
  /// Create a tender with its original criteria and required documents.
  Intake {
    /// JSON file (`-` for stdin).
    file: PathBuf,
  },
  /// Apply an addendum record.
  Apply {
    /// JSON file (`-` for stdin).
    file: PathBuf,
  },
  /// Register an addendum record without applying it.
  Register {
    /// JSON file (`-` for stdin).
    file: PathBuf,
  },
  /// Criteria awaiting re-evaluation, oldest first.
  Pending { reference: String },
  /// Record a matcher verdict for a queued criterion.
  Clear {
    criterion_id: Uuid,
    /// The criterion is met.
    #[arg(long)]
    met: bool,
    #[arg(long)]
    notes: Option<String>,
  },
  /// Mandatory documents not yet received, with counts.
  Missing { reference: String },
  /// Record an arrived document.
  Receive {
    reference: String,
    name: String,
    #[arg(long)]
    file: Option<PathBuf>,
  },
  /// Print the change ledger.
  Ledger {
    reference: String,
    #[arg(long)]
    addendum: Option<u32>,
  },
  /// Current versions, or one document's full history.
  Versions {
    reference: String,
    #[arg(long)]
    document: Option<String>,
  },
  /// Introduce a new version of a document outside any addendum.
  Version {
    reference: String,
    document: String,
    label: String,
    file: PathBuf,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so stdout stays valid JSON.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let config = EngineConfig::load(&cli.config)?;

  let store = SqliteStore::open(&config.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", config.store_path))?;

  match cli.command {
    Command::Serve => commands::serve(store, &config).await,
    Command::Intake { file } => commands::intake(&store, &file).await,
    Command::Apply { file } => commands::apply(&store, &file).await,
    Command::Register { file } => commands::register(&store, &file).await,
    Command::Pending { reference } => commands::pending(&store, &reference).await,
    Command::Clear { criterion_id, met, notes } => {
      commands::clear(&store, criterion_id, met, notes).await
    }
    Command::Missing { reference } => commands::missing(&store, &reference).await,
    Command::Receive { reference, name, file } => {
      commands::receive(&store, &reference, name, file).await
    }
    Command::Ledger { reference, addendum } => {
      commands::ledger(&store, &reference, addendum).await
    }
    Command::Versions { reference, document } => {
      commands::versions(&store, &reference, document).await
    }
    Command::Version { reference, document, label, file } => {
      commands::introduce_version(&store, &reference, document, label, file).await
    }
  }
}
