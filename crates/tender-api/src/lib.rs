//! JSON REST API for the tender consistency engine.
//!
//! Exposes an axum [`Router`] backed by any [`tender_core::store::TenderStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tender_api::api_router(store.clone()))
//! ```

pub mod addenda;
pub mod error;
pub mod intake;
pub mod rechecks;
pub mod tenders;
pub mod versions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use tender_core::store::TenderStore;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: TenderStore + Send + Sync + 'static,
{
  Router::new()
    // Tenders
    .route("/tenders", get(tenders::list::<S>).post(tenders::create::<S>))
    .route(
      "/tenders/{id}",
      get(tenders::get_one::<S>).delete(tenders::delete_one::<S>),
    )
    .route("/tenders/{id}/status", post(tenders::set_status::<S>))
    // Intake and completeness
    .route(
      "/tenders/{id}/criteria",
      get(intake::list_criteria::<S>).post(intake::add_criterion::<S>),
    )
    .route(
      "/tenders/{id}/required-documents",
      get(intake::list_required::<S>).post(intake::add_required::<S>),
    )
    .route(
      "/tenders/{id}/received-documents",
      get(intake::list_received::<S>).post(intake::add_received::<S>),
    )
    .route("/tenders/{id}/missing-documents", get(intake::missing::<S>))
    .route("/tenders/{id}/document-stats", get(intake::stats::<S>))
    // Addenda and ledger
    .route("/addenda", post(addenda::apply::<S>))
    .route("/addenda/register", post(addenda::register::<S>))
    .route("/tenders/{id}/addenda", get(addenda::list::<S>))
    .route("/tenders/{id}/addenda/{number}", get(addenda::get_one::<S>))
    .route("/tenders/{id}/changes", get(addenda::changes::<S>))
    // Document versions
    .route(
      "/tenders/{id}/versions",
      get(versions::current_all::<S>).post(versions::introduce::<S>),
    )
    .route("/tenders/{id}/versions/current", get(versions::current_one::<S>))
    .route("/tenders/{id}/versions/history", get(versions::history::<S>))
    // Recheck queue
    .route("/tenders/{id}/rechecks", get(rechecks::pending::<S>))
    .route("/criteria/{id}/clear", post(rechecks::clear::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use tender_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::api_router;

  const SAFETY: &str = "Contractor must submit an updated Safety Risk \
                        Assessment certified by a licensed engineer";

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    api_router(Arc::new(store))
  }

  async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    let response = app
      .clone()
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn create_tender(app: &Router) -> String {
    let (status, body) = call(
      app,
      "POST",
      "/tenders",
      Some(json!({ "reference_number": "HDB-2025-0142", "title": "Block 123 upgrading" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["tender_id"].as_str().unwrap().to_owned()
  }

  fn addendum(number: u32, sentences: &[&str]) -> Value {
    json!({
      "tender_reference": "HDB-2025-0142",
      "addendum_number": number,
      "received_at": "2025-11-03T09:00:00Z",
      "raw_requirement_sentences": sentences,
    })
  }

  // ── Tenders ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn tender_lifecycle() {
    let app = app().await;
    let id = create_tender(&app).await;

    let (status, body) = call(&app, "GET", &format!("/tenders/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");

    let (status, body) =
      call(&app, "GET", "/tenders?reference=HDB-2025-0142", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = call(
      &app,
      "POST",
      &format!("/tenders/{id}/status"),
      Some(json!({ "status": "processing" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "processing");

    let (status, _) = call(&app, "DELETE", &format!("/tenders/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "GET", &format!("/tenders/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn duplicate_reference_conflicts() {
    let app = app().await;
    create_tender(&app).await;
    let (status, body) = call(
      &app,
      "POST",
      "/tenders",
      Some(json!({ "reference_number": "HDB-2025-0142", "title": "Again" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("HDB-2025-0142"));
  }

  // ── Addenda ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn apply_schedules_recheck_and_rejects_replays() {
    let app = app().await;
    let id = create_tender(&app).await;

    let (status, outcome) = call(&app, "POST", "/addenda", Some(addendum(1, &[SAFETY]))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["has_pending_rechecks"], true);
    assert_eq!(outcome["inserted_documents"].as_array().unwrap().len(), 1);

    let (status, _) = call(&app, "POST", "/addenda", Some(addendum(1, &[SAFETY]))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call(&app, "POST", "/addenda", Some(addendum(3, &[]))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("expected #2"));

    let (_, rechecks) = call(&app, "GET", &format!("/tenders/{id}/rechecks"), None).await;
    assert_eq!(rechecks["has_pending"], true);
    assert_eq!(rechecks["pending"].as_array().unwrap().len(), 1);

    let (_, ledger) = call(&app, "GET", &format!("/tenders/{id}/changes?addendum=1"), None).await;
    assert_eq!(ledger.as_array().unwrap().len(), 2);

    let (status, addendum) = call(&app, "GET", &format!("/tenders/{id}/addenda/1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(addendum["processed"], true);
  }

  #[tokio::test]
  async fn unknown_tender_reference_is_not_found() {
    let app = app().await;
    let (status, _) = call(&app, "POST", "/addenda", Some(addendum(1, &[SAFETY]))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn invalid_field_edit_is_bad_request() {
    let app = app().await;
    create_tender(&app).await;
    let mut record = addendum(1, &[]);
    record["field_edits"] = json!([
      { "target": "tender", "field": "project_start_date", "value": "soon" }
    ]);
    let (status, _) = call(&app, "POST", "/addenda", Some(record)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Completeness ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn missing_documents_report() {
    let app = app().await;
    let id = create_tender(&app).await;

    for name in ["BOQ", "Site Plan"] {
      let (status, _) = call(
        &app,
        "POST",
        &format!("/tenders/{id}/required-documents"),
        Some(json!({ "name": name })),
      )
      .await;
      assert_eq!(status, StatusCode::CREATED);
    }
    call(
      &app,
      "POST",
      &format!("/tenders/{id}/received-documents"),
      Some(json!({ "name": "BOQ", "file_size_kb": 220 })),
    )
    .await;

    let (_, missing) = call(&app, "GET", &format!("/tenders/{id}/missing-documents"), None).await;
    let names: Vec<_> = missing
      .as_array()
      .unwrap()
      .iter()
      .map(|d| d["name"].as_str().unwrap())
      .collect();
    assert_eq!(names, ["Site Plan"]);

    let (_, stats) = call(&app, "GET", &format!("/tenders/{id}/document-stats"), None).await;
    assert_eq!(stats["mandatory_total"], 2);
    assert_eq!(stats["mandatory_received"], 1);
  }

  // ── Versions and rechecks ───────────────────────────────────────────────────

  #[tokio::test]
  async fn versions_and_clearing() {
    let app = app().await;
    let id = create_tender(&app).await;

    for label in ["v1", "v2"] {
      let (status, _) = call(
        &app,
        "POST",
        &format!("/tenders/{id}/versions"),
        Some(json!({
          "document_name": "BOQ",
          "version_label": label,
          "file_reference": format!("/docs/boq-{label}.xlsx"),
        })),
      )
      .await;
      assert_eq!(status, StatusCode::CREATED);
    }

    let (_, current) = call(
      &app,
      "GET",
      &format!("/tenders/{id}/versions/current?document_name=BOQ"),
      None,
    )
    .await;
    assert_eq!(current["version_label"], "v2");

    let (_, history) = call(
      &app,
      "GET",
      &format!("/tenders/{id}/versions/history?document_name=BOQ"),
      None,
    )
    .await;
    assert_eq!(history.as_array().unwrap().len(), 2);
    assert_eq!(history[0]["is_current"], false);

    let (status, _) = call(
      &app,
      "GET",
      &format!("/tenders/{id}/versions/current?document_name=Drawings"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, outcome) = call(&app, "POST", "/addenda", Some(addendum(1, &[SAFETY]))).await;
    let criterion = outcome["inserted_criteria"][0].as_str().unwrap().to_owned();

    let clear = json!({ "is_met": true, "notes": "PE endorsement on file" });
    let (_, first) = call(&app, "POST", &format!("/criteria/{criterion}/clear"), Some(clear.clone())).await;
    assert_eq!(first["cleared"], true);
    let (_, second) = call(&app, "POST", &format!("/criteria/{criterion}/clear"), Some(clear.clone())).await;
    assert_eq!(second["cleared"], false);

    let (status, _) = call(
      &app,
      "POST",
      "/criteria/00000000-0000-0000-0000-000000000000/clear",
      Some(clear),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
