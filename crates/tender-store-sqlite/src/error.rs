//! Error type for `tender-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Sequencing, duplicate, unknown-entity and chain-integrity failures.
  #[error("{0}")]
  Core(#[from] tender_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value no domain type maps to.
  #[error("decode error: {0}")]
  Decode(String),
}

impl Error {
  /// The domain error behind this one, if any.
  pub fn as_core(&self) -> Option<&tender_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }
}

impl From<tender_core::ChainIntegrityError> for Error {
  fn from(e: tender_core::ChainIntegrityError) -> Self { Self::Core(e.into()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
