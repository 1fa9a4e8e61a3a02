//! Error types for `tender-core`.

use thiserror::Error;
use uuid::Uuid;

/// Corruption of a document's supersession chain. Fatal for the tender until
/// the rows are reconciled by hand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainIntegrityError {
  #[error("document {document:?} has {count} current versions")]
  MultipleCurrent { document: String, count: usize },

  #[error("version {version_id} of {document:?} would close a supersession cycle")]
  Cycle { document: String, version_id: Uuid },

  #[error("version {0} is superseded by itself")]
  SelfReference(Uuid),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("addendum out of sequence: expected #{expected}, got #{got}")]
  Sequencing { expected: u32, got: u32 },

  #[error("addendum #{number} already exists for tender {tender_reference:?}")]
  DuplicateAddendum { tender_reference: String, number: u32 },

  #[error("tender not found: {0}")]
  UnknownTender(String),

  #[error("tender reference {0:?} is already registered")]
  DuplicateTender(String),

  #[error("criterion not found: {0}")]
  UnknownCriterion(Uuid),

  #[error("chain integrity error: {0}")]
  ChainIntegrity(#[from] ChainIntegrityError),

  #[error("invalid value {value:?} for field {field}")]
  InvalidFieldValue { field: String, value: String },

  #[error("ledger entry {sequence} does not match the replayed state of {field}")]
  LedgerMismatch { sequence: i64, field: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
