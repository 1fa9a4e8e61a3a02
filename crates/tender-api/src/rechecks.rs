//! Handlers for the recheck queue the matcher drains.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tenders/{id}/rechecks` | `{"has_pending":…,"pending":[…]}` |
//! | `POST` | `/criteria/{id}/clear` | Body: `{"is_met":true,"notes":"…"}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tender_core::store::TenderStore;
use uuid::Uuid;

use crate::{error::ApiError, tenders::require};

#[derive(Debug, Serialize, Deserialize)]
pub struct Pending {
  pub has_pending: bool,
  /// Criterion ids, oldest first.
  pub pending:     Vec<Uuid>,
}

/// `GET /tenders/{id}/rechecks`
pub async fn pending<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Pending>, ApiError> {
  require(store.as_ref(), id).await?;
  let pending = store.pending_rechecks(id).await.map_err(ApiError::store)?;
  Ok(Json(Pending {
    has_pending: !pending.is_empty(),
    pending,
  }))
}

#[derive(Debug, Deserialize)]
pub struct ClearBody {
  pub is_met: bool,
  #[serde(default)]
  pub notes:  Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Cleared {
  /// `false` if the criterion was not pending.
  pub cleared: bool,
}

/// `POST /criteria/{id}/clear`
pub async fn clear<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ClearBody>,
) -> Result<Json<Cleared>, ApiError> {
  let cleared = store
    .clear(id, body.is_met, body.notes)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(Cleared { cleared }))
}
