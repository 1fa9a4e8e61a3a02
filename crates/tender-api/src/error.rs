//! API error type and [`axum::response::IntoResponse`] implementation.

use std::error::Error as StdError;

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Sequencing violations and duplicates. The caller must reorder or drop
  /// the request; retrying it unchanged will fail the same way.
  #[error("conflict: {0}")]
  Conflict(String),

  /// Stored state breaks a structural invariant. Needs manual repair.
  #[error("integrity error: {0}")]
  Integrity(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn StdError + Send + Sync>),
}

impl ApiError {
  /// Map a backend error by the domain error somewhere in its source chain.
  pub fn store<E>(err: E) -> Self
  where
    E: StdError + Send + Sync + 'static,
  {
    let variant = std::iter::successors(
      Some(&err as &(dyn StdError + 'static)),
      |&e| e.source(),
    )
    .find_map(|e| e.downcast_ref::<tender_core::Error>())
    .and_then(variant_for);

    match variant {
      Some(variant) => variant(err.to_string()),
      None => Self::Store(Box::new(err)),
    }
  }
}

fn variant_for(err: &tender_core::Error) -> Option<fn(String) -> ApiError> {
  use tender_core::Error as E;
  let variant: fn(String) -> ApiError = match err {
    E::UnknownTender(_) | E::UnknownCriterion(_) => ApiError::NotFound,
    E::Sequencing { .. } | E::DuplicateAddendum { .. } | E::DuplicateTender(_) => {
      ApiError::Conflict
    }
    E::InvalidFieldValue { .. } => ApiError::BadRequest,
    E::ChainIntegrity(_) | E::LedgerMismatch { .. } => ApiError::Integrity,
    E::Serialization(_) => return None,
  };
  Some(variant)
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Integrity(m) => {
        tracing::error!(error = %m, "integrity violation");
        (StatusCode::INTERNAL_SERVER_ERROR, m.clone())
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn domain_error_behind_backend_error_maps_to_status() {
    let err = tender_store_sqlite::Error::from(tender_core::Error::Sequencing {
      expected: 2,
      got:      3,
    });
    assert!(matches!(ApiError::store(err), ApiError::Conflict(m) if m.contains("expected #2")));

    let err = tender_store_sqlite::Error::from(tender_core::Error::UnknownTender("T-9".into()));
    assert!(matches!(ApiError::store(err), ApiError::NotFound(_)));
  }

  #[test]
  fn backend_error_without_domain_cause_is_a_store_error() {
    let err = std::io::Error::other("disk full");
    assert!(matches!(ApiError::store(err), ApiError::Store(_)));
  }
}
