//! One function per subcommand. Each prints its result as pretty JSON.

use std::{
  io::Read as _,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::{Digest as _, Sha256};
use tender_core::{
  addendum::AddendumRecord,
  criterion::NewCriterion,
  document::{NewReceivedDocument, NewRequiredDocument},
  store::TenderStore,
  tender::{NewTender, Tender},
  version::NewDocumentVersion,
};
use tender_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::config::EngineConfig;

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

/// Read and parse a JSON file; `-` reads stdin.
fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
  let text = if path == Path::new("-") {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    buf
  } else {
    std::fs::read_to_string(path)
      .with_context(|| format!("failed to read {}", path.display()))?
  };
  serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

async fn tender_by_reference(store: &SqliteStore, reference: &str) -> anyhow::Result<Tender> {
  store
    .get_tender_by_reference(reference)
    .await?
    .with_context(|| format!("no tender with reference {reference:?}"))
}

// ─── serve ───────────────────────────────────────────────────────────────────

pub async fn serve(store: SqliteStore, config: &EngineConfig) -> anyhow::Result<()> {
  let app = axum::Router::new().nest("/api", tender_api::api_router(Arc::new(store)));
  let address = config.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

// ─── intake ──────────────────────────────────────────────────────────────────

/// A tender as parsed from its original documents.
#[derive(Debug, Deserialize)]
pub struct IntakeFile {
  pub tender:             NewTender,
  #[serde(default)]
  pub criteria:           Vec<NewCriterion>,
  #[serde(default)]
  pub required_documents: Vec<NewRequiredDocument>,
}

pub async fn intake(store: &SqliteStore, file: &Path) -> anyhow::Result<()> {
  let intake: IntakeFile = read_json(file)?;
  let tender = store
    .intake_tender(intake.tender, intake.criteria, intake.required_documents)
    .await?;
  print_json(&tender)
}

// ─── addenda ─────────────────────────────────────────────────────────────────

pub async fn apply(store: &SqliteStore, file: &Path) -> anyhow::Result<()> {
  let record: AddendumRecord = read_json(file)?;
  let outcome = store.apply_addendum(record).await?;
  print_json(&outcome)
}

pub async fn register(store: &SqliteStore, file: &Path) -> anyhow::Result<()> {
  let record: AddendumRecord = read_json(file)?;
  let addendum = store.register_addendum(record).await?;
  print_json(&addendum)
}

pub async fn ledger(
  store: &SqliteStore,
  reference: &str,
  addendum: Option<u32>,
) -> anyhow::Result<()> {
  let tender = tender_by_reference(store, reference).await?;
  let ledger = store.changes(tender.tender_id, addendum).await?;
  print_json(&ledger)
}

// ─── rechecks ────────────────────────────────────────────────────────────────

pub async fn pending(store: &SqliteStore, reference: &str) -> anyhow::Result<()> {
  let tender = tender_by_reference(store, reference).await?;
  let pending = store.pending_rechecks(tender.tender_id).await?;
  let criteria = store.list_criteria(tender.tender_id).await?;

  let queued: Vec<_> = pending
    .iter()
    .filter_map(|id| criteria.iter().find(|c| c.criterion_id == *id))
    .collect();
  print_json(&queued)
}

pub async fn clear(
  store: &SqliteStore,
  criterion_id: Uuid,
  met: bool,
  notes: Option<String>,
) -> anyhow::Result<()> {
  let cleared = store.clear(criterion_id, met, notes).await?;
  if !cleared {
    tracing::warn!(%criterion_id, "criterion was not pending; nothing changed");
  }
  print_json(&serde_json::json!({ "cleared": cleared }))
}

// ─── documents ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Completeness {
  stats:   tender_core::document::DocumentStats,
  missing: Vec<tender_core::document::RequiredDocument>,
}

pub async fn missing(store: &SqliteStore, reference: &str) -> anyhow::Result<()> {
  let tender = tender_by_reference(store, reference).await?;
  print_json(&Completeness {
    stats:   store.document_stats(tender.tender_id).await?,
    missing: store.missing_mandatory_documents(tender.tender_id).await?,
  })
}

pub async fn receive(
  store: &SqliteStore,
  reference: &str,
  name: String,
  file: Option<PathBuf>,
) -> anyhow::Result<()> {
  let tender = tender_by_reference(store, reference).await?;
  let mut input = NewReceivedDocument::named(name);
  if let Some(file) = file {
    let meta = std::fs::metadata(&file)
      .with_context(|| format!("failed to stat {}", file.display()))?;
    input.file_size_kb = Some(meta.len().div_ceil(1024));
    input.file_reference = Some(file.display().to_string());
  }
  let received = store.record_received_document(tender.tender_id, input).await?;
  print_json(&received)
}

// ─── versions ────────────────────────────────────────────────────────────────

pub async fn versions(
  store: &SqliteStore,
  reference: &str,
  document: Option<String>,
) -> anyhow::Result<()> {
  let tender = tender_by_reference(store, reference).await?;
  let versions = match document {
    Some(name) => store.version_history(tender.tender_id, &name).await?,
    None => store.current_versions(tender.tender_id).await?,
  };
  print_json(&versions)
}

/// Hex SHA-256 of a file's contents.
fn content_hash(path: &Path) -> anyhow::Result<String> {
  let bytes = std::fs::read(path)
    .with_context(|| format!("failed to read {}", path.display()))?;
  Ok(hex::encode(Sha256::digest(&bytes)))
}

pub async fn introduce_version(
  store: &SqliteStore,
  reference: &str,
  document: String,
  label: String,
  file: PathBuf,
) -> anyhow::Result<()> {
  let tender = tender_by_reference(store, reference).await?;
  let mut input = NewDocumentVersion::new(document, label, file.display().to_string());
  input.content_hash = Some(content_hash(&file)?);
  let version = store.introduce_version(tender.tender_id, input).await?;
  print_json(&version)
}
