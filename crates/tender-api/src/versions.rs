//! Handlers for document version chains.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tenders/{id}/versions` | Current version of every document |
//! | `POST` | `/tenders/{id}/versions` | Body: [`NewDocumentVersion`] |
//! | `GET`  | `/tenders/{id}/versions/current?document_name=` | 404 if never introduced |
//! | `GET`  | `/tenders/{id}/versions/history?document_name=` | Oldest first |

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
  version::{DocumentVersion, NewDocumentVersion},
};
use uuid::Uuid;

use crate::{error::ApiError, tenders::require};

#[derive(Debug, Deserialize)]
pub struct DocumentParams {
  pub document_name: String,
}

/// `GET /tenders/{id}/versions`
pub async fn current_all<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<DocumentVersion>>, ApiError> {
  require(store.as_ref(), id).await?;
  let versions = store.current_versions(id).await.map_err(ApiError::store)?;
  Ok(Json(versions))
}

/// `POST /tenders/{id}/versions`
pub async fn introduce<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewDocumentVersion>,
) -> Result<impl IntoResponse, ApiError> {
  if body.document_name.trim().is_empty() {
    return Err(ApiError::BadRequest("document_name must not be empty".into()));
  }
  let version = store.introduce_version(id, body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(version)))
}

/// `GET /tenders/{id}/versions/current?document_name=<name>`
pub async fn current_one<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<DocumentParams>,
) -> Result<Json<DocumentVersion>, ApiError> {
  let version = store
    .current_version(id, &params.document_name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("no current version of {:?}", params.document_name))
    })?;
  Ok(Json(version))
}

/// `GET /tenders/{id}/versions/history?document_name=<name>`
pub async fn history<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<DocumentParams>,
) -> Result<Json<Vec<DocumentVersion>>, ApiError> {
  require(store.as_ref(), id).await?;
  let versions = store
    .version_history(id, &params.document_name)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(versions))
}
