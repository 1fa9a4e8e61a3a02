//! Handlers for addendum intake and the change ledger.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/addenda` | Body: [`AddendumRecord`]; applies it |
//! | `POST` | `/addenda/register` | Body: [`AddendumRecord`]; stores without applying |
//! | `GET`  | `/tenders/{id}/addenda` | By number |
//! | `GET`  | `/tenders/{id}/addenda/{number}` | 404 if not found |
//! | `GET`  | `/tenders/{id}/changes` | Optional `?addendum=<number>` |
//!
//! Out-of-order and repeated addenda answer `409 Conflict`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tender_core::{
  addendum::{Addendum, AddendumRecord, ApplyOutcome},
  ledger::ChangeLedger,
  store::TenderStore,
};
use uuid::Uuid;

use crate::error::ApiError;

/// `POST /addenda`
pub async fn apply<S: TenderStore>(
  State(store): State<Arc<S>>,
  Json(record): Json<AddendumRecord>,
) -> Result<Json<ApplyOutcome>, ApiError> {
  if record.addendum_number == 0 {
    return Err(ApiError::BadRequest("addendum numbers start at 1".into()));
  }
  let outcome = store.apply_addendum(record).await.map_err(ApiError::store)?;
  Ok(Json(outcome))
}

/// `POST /addenda/register`
pub async fn register<S: TenderStore>(
  State(store): State<Arc<S>>,
  Json(record): Json<AddendumRecord>,
) -> Result<impl IntoResponse, ApiError> {
  if record.addendum_number == 0 {
    return Err(ApiError::BadRequest("addendum numbers start at 1".into()));
  }
  let addendum = store.register_addendum(record).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(addendum)))
}

/// `GET /tenders/{id}/addenda`
pub async fn list<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Addendum>>, ApiError> {
  let addenda = store.list_addenda(id).await.map_err(ApiError::store)?;
  Ok(Json(addenda))
}

/// `GET /tenders/{id}/addenda/{number}`
pub async fn get_one<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path((id, number)): Path<(Uuid, u32)>,
) -> Result<Json<Addendum>, ApiError> {
  let addendum = store
    .get_addendum(id, number)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("addendum #{number} of tender {id} not found")))?;
  Ok(Json(addendum))
}

#[derive(Debug, Deserialize)]
pub struct ChangesParams {
  pub addendum: Option<u32>,
}

/// `GET /tenders/{id}/changes[?addendum=<number>]`
pub async fn changes<S: TenderStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<ChangesParams>,
) -> Result<Json<ChangeLedger>, ApiError> {
  let ledger = store
    .changes(id, params.addendum)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(ledger))
}
