//! Handlers for the criteria and document lists hanging off a tender.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`/`POST` | `/tenders/{id}/criteria` | Body: [`NewCriterion`] |
//! | `GET`/`POST` | `/tenders/{id}/required-documents` | Body: [`NewRequiredDocument`] |
//! | `GET`/`POST` | `/tenders/{id}/received-documents` | Body: [`NewReceivedDocument`] |
//! | `GET` | `/tenders/{id}/missing-documents` | Mandatory, not received |
//! | `GET` | `/tenders/{id}/document-stats` | |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use tender_core::{
  criterion::{NewCriterion, QualificationCriterion},
  document::{
    DocumentStats, NewReceivedDocument, NewRequiredDocument, ReceivedDocument,
    RequiredDocument,
  },
  store::TenderStore,
};
use uuid::Uuid;

use crate::{error::ApiError, tenders::require};

// ─── Criteria ─────────────────────────────────────────────────────────────────

/// `GET /tenders/{id}/criteria`
pub async fn list_criteria<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<QualificationCriterion>>, ApiError> {
  require(store.as_ref(), id).await?;
  let criteria = store.list_criteria(id).await.map_err(ApiError::store)?;
  Ok(Json(criteria))
}

/// `POST /tenders/{id}/criteria`
pub async fn add_criterion<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewCriterion>,
) -> Result<impl IntoResponse, ApiError> {
  let criterion = store.add_criterion(id, body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(criterion)))
}

// ─── Required documents ───────────────────────────────────────────────────────

/// `GET /tenders/{id}/required-documents`
pub async fn list_required<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<RequiredDocument>>, ApiError> {
  require(store.as_ref(), id).await?;
  let documents = store
    .list_required_documents(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(documents))
}

/// `POST /tenders/{id}/required-documents`
pub async fn add_required<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewRequiredDocument>,
) -> Result<impl IntoResponse, ApiError> {
  let document = store
    .add_required_document(id, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(document)))
}

// ─── Received documents ───────────────────────────────────────────────────────

/// `GET /tenders/{id}/received-documents`
pub async fn list_received<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<ReceivedDocument>>, ApiError> {
  require(store.as_ref(), id).await?;
  let documents = store
    .list_received_documents(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(documents))
}

/// `POST /tenders/{id}/received-documents`
pub async fn add_received<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewReceivedDocument>,
) -> Result<impl IntoResponse, ApiError> {
  let document = store
    .record_received_document(id, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(document)))
}

// ─── Completeness ─────────────────────────────────────────────────────────────

/// `GET /tenders/{id}/missing-documents`
pub async fn missing<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<RequiredDocument>>, ApiError> {
  let missing = store
    .missing_mandatory_documents(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(missing))
}

/// `GET /tenders/{id}/document-stats`
pub async fn stats<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<DocumentStats>, ApiError> {
  let stats = store.document_stats(id).await.map_err(ApiError::store)?;
  Ok(Json(stats))
}
