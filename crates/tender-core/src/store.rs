//! The `TenderStore` trait.
//!
//! Implemented by storage backends (e.g. `tender-store-sqlite`). The HTTP
//! layer and the CLI depend on this abstraction, not on a concrete backend.
//!
//! All mutations for one tender are assumed to be serialised by the caller;
//! different tenders may be driven in parallel.

use std::future::Future;

use uuid::Uuid;

use crate::{
  addendum::{Addendum, AddendumRecord, ApplyOutcome},
  criterion::{NewCriterion, QualificationCriterion},
  document::{
    DocumentStats, NewReceivedDocument, NewRequiredDocument, ReceivedDocument,
    RequiredDocument,
  },
  ledger::ChangeLedger,
  tender::{NewTender, ProcessingStatus, Tender},
  version::{DocumentVersion, NewDocumentVersion},
};

/// Abstraction over a tender store backend.
///
/// Every method returns a `Send` future so the trait can be used behind a
/// multi-threaded runtime (e.g. tokio with `axum`).
pub trait TenderStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Tenders ───────────────────────────────────────────────────────────

  /// Create a tender in `pending` status. Fails if the reference number is
  /// already taken.
  fn create_tender(
    &self,
    input: NewTender,
  ) -> impl Future<Output = Result<Tender, Self::Error>> + Send + '_;

  fn get_tender(
    &self,
    tender_id: Uuid,
  ) -> impl Future<Output = Result<Option<Tender>, Self::Error>> + Send + '_;

  fn get_tender_by_reference<'a>(
    &'a self,
    reference: &'a str,
  ) -> impl Future<Output = Result<Option<Tender>, Self::Error>> + Send + 'a;

  fn list_tenders(
    &self,
  ) -> impl Future<Output = Result<Vec<Tender>, Self::Error>> + Send + '_;

  fn set_processing_status(
    &self,
    tender_id: Uuid,
    status: ProcessingStatus,
  ) -> impl Future<Output = Result<Tender, Self::Error>> + Send + '_;

  /// Delete a tender and, by cascade, everything it owns. Returns `false` if
  /// there was nothing to delete.
  fn delete_tender(
    &self,
    tender_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Intake ────────────────────────────────────────────────────────────

  /// Record a criterion parsed from the original tender documents.
  fn add_criterion(
    &self,
    tender_id: Uuid,
    input: NewCriterion,
  ) -> impl Future<Output = Result<QualificationCriterion, Self::Error>> + Send + '_;

  /// Record a document requirement parsed from the original tender documents.
  fn add_required_document(
    &self,
    tender_id: Uuid,
    input: NewRequiredDocument,
  ) -> impl Future<Output = Result<RequiredDocument, Self::Error>> + Send + '_;

  /// Create a tender together with its original criteria and required
  /// documents. Either all of it is stored or none of it is.
  fn intake_tender(
    &self,
    input: NewTender,
    criteria: Vec<NewCriterion>,
    documents: Vec<NewRequiredDocument>,
  ) -> impl Future<Output = Result<Tender, Self::Error>> + Send + '_;

  /// Record an arrived document. Requirements with exactly the same name are
  /// marked received.
  fn record_received_document(
    &self,
    tender_id: Uuid,
    input: NewReceivedDocument,
  ) -> impl Future<Output = Result<ReceivedDocument, Self::Error>> + Send + '_;

  // ── Addenda ───────────────────────────────────────────────────────────

  /// Store an addendum as received but not yet applied. Numbers must be
  /// registered gap-free.
  fn register_addendum(
    &self,
    record: AddendumRecord,
  ) -> impl Future<Output = Result<Addendum, Self::Error>> + Send + '_;

  /// Classify and apply every effect of `record` atomically, then mark the
  /// addendum processed. On error nothing is written and the addendum stays
  /// unprocessed, so the call can be retried.
  fn apply_addendum(
    &self,
    record: AddendumRecord,
  ) -> impl Future<Output = Result<ApplyOutcome, Self::Error>> + Send + '_;

  /// All addenda of a tender, by number.
  fn list_addenda(
    &self,
    tender_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Addendum>, Self::Error>> + Send + '_;

  fn get_addendum(
    &self,
    tender_id: Uuid,
    number: u32,
  ) -> impl Future<Output = Result<Option<Addendum>, Self::Error>> + Send + '_;

  /// The change ledger of a tender, optionally restricted to one addendum.
  fn changes(
    &self,
    tender_id: Uuid,
    addendum_number: Option<u32>,
  ) -> impl Future<Output = Result<ChangeLedger, Self::Error>> + Send + '_;

  // ── Document versions ─────────────────────────────────────────────────

  /// Make `input` the current version of its document, superseding the
  /// previous current version if there is one.
  fn introduce_version(
    &self,
    tender_id: Uuid,
    input: NewDocumentVersion,
  ) -> impl Future<Output = Result<DocumentVersion, Self::Error>> + Send + '_;

  fn current_version<'a>(
    &'a self,
    tender_id: Uuid,
    document_name: &'a str,
  ) -> impl Future<Output = Result<Option<DocumentVersion>, Self::Error>> + Send + 'a;

  /// Every version of one document, oldest first.
  fn version_history<'a>(
    &'a self,
    tender_id: Uuid,
    document_name: &'a str,
  ) -> impl Future<Output = Result<Vec<DocumentVersion>, Self::Error>> + Send + 'a;

  /// The current version of every document in the tender.
  fn current_versions(
    &self,
    tender_id: Uuid,
  ) -> impl Future<Output = Result<Vec<DocumentVersion>, Self::Error>> + Send + '_;

  // ── Recheck scheduling ────────────────────────────────────────────────

  /// Criteria awaiting re-evaluation, oldest criterion first.
  fn pending_rechecks(
    &self,
    tender_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  fn has_pending(
    &self,
    tender_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Record the matcher's verdict and take the criterion off the queue.
  /// Returns `false` (and changes nothing) if it was not pending.
  fn clear(
    &self,
    criterion_id: Uuid,
    is_met: bool,
    notes: Option<String>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Criteria with their provenance, in creation order.
  fn list_criteria(
    &self,
    tender_id: Uuid,
  ) -> impl Future<Output = Result<Vec<QualificationCriterion>, Self::Error>> + Send + '_;

  fn list_required_documents(
    &self,
    tender_id: Uuid,
  ) -> impl Future<Output = Result<Vec<RequiredDocument>, Self::Error>> + Send + '_;

  fn list_received_documents(
    &self,
    tender_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ReceivedDocument>, Self::Error>> + Send + '_;

  /// Mandatory requirements with no received document of the exact same name.
  fn missing_mandatory_documents(
    &self,
    tender_id: Uuid,
  ) -> impl Future<Output = Result<Vec<RequiredDocument>, Self::Error>> + Send + '_;

  fn document_stats(
    &self,
    tender_id: Uuid,
  ) -> impl Future<Output = Result<DocumentStats, Self::Error>> + Send + '_;
}
