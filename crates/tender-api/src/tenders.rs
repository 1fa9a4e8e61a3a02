//! Handlers for `/tenders` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/tenders` | Optional `?reference=<reference number>` |
//! | `POST`   | `/tenders` | Body: [`NewTender`]; 409 on a taken reference |
//! | `GET`    | `/tenders/{id}` | 404 if not found |
//! | `DELETE` | `/tenders/{id}` | Cascades to everything the tender owns |
//! | `POST`   | `/tenders/{id}/status` | Body: `{"status":"completed"}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tender_core::{
  store::TenderStore,
  tender::{NewTender, ProcessingStatus, Tender},
};
use uuid::Uuid;

use crate::error::ApiError;

/// Fetch a tender or fail with 404. Used by every nested route.
pub(crate) async fn require<S: TenderStore>(store: &S, id: Uuid) -> Result<Tender, ApiError> {
  store
    .get_tender(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("tender {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub reference: Option<String>,
}

/// `GET /tenders[?reference=<reference>]`
pub async fn list<S: TenderStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Tender>>, ApiError> {
  let tenders = match params.reference {
    Some(reference) => store
      .get_tender_by_reference(&reference)
      .await
      .map_err(ApiError::store)?
      .into_iter()
      .collect(),
    None => store.list_tenders().await.map_err(ApiError::store)?,
  };
  Ok(Json(tenders))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /tenders`
pub async fn create<S: TenderStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewTender>,
) -> Result<impl IntoResponse, ApiError> {
  if body.reference_number.trim().is_empty() {
    return Err(ApiError::BadRequest("reference_number must not be empty".into()));
  }
  let tender = store.create_tender(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(tender)))
}

// ─── Get / delete ─────────────────────────────────────────────────────────────

/// `GET /tenders/{id}`
pub async fn get_one<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Tender>, ApiError> {
  Ok(Json(require(store.as_ref(), id).await?))
}

/// `DELETE /tenders/{id}`
pub async fn delete_one<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  if store.delete_tender(id).await.map_err(ApiError::store)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("tender {id} not found")))
  }
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: ProcessingStatus,
}

/// `POST /tenders/{id}/status`
pub async fn set_status<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Tender>, ApiError> {
  let tender = store
    .set_processing_status(id, body.status)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(tender))
}
