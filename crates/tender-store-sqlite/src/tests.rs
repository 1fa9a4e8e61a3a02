//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{TimeZone, Utc};
use tender_core::{
  addendum::{AddendumKind, AddendumRecord, FieldEdit},
  classify::Effect,
  criterion::{CriterionField, CriterionType, NewCriterion, Source},
  document::{NewReceivedDocument, NewRequiredDocument},
  ledger::{ChangeKind, EntityKind, INSERT_FIELD},
  store::TenderStore,
  tender::{NewTender, ProcessingStatus, Tender, TenderField},
  version::NewDocumentVersion,
};
use uuid::Uuid;

use crate::SqliteStore;

const REF: &str = "HDB-2025-0142";

const SAFETY: &str = "Contractor must submit an updated Safety Risk \
                      Assessment certified by a licensed engineer";

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn store_with_tender() -> (SqliteStore, Tender) {
  let s = store().await;
  let tender = s
    .create_tender(NewTender::new(REF, "Upgrading works at Block 123"))
    .await
    .unwrap();
  (s, tender)
}

fn record(number: u32) -> AddendumRecord {
  AddendumRecord::new(
    REF,
    number,
    Utc.with_ymd_and_hms(2025, 11, number, 9, 0, 0).unwrap(),
  )
}

fn core_error(err: &crate::Error) -> &tender_core::Error {
  err.as_core().expect("domain error")
}

// ─── Tenders ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_fetch_tender() {
  let (s, tender) = store_with_tender().await;
  assert_eq!(tender.status, ProcessingStatus::Pending);

  let by_id = s.get_tender(tender.tender_id).await.unwrap().unwrap();
  assert_eq!(by_id, tender);

  let by_ref = s.get_tender_by_reference(REF).await.unwrap().unwrap();
  assert_eq!(by_ref.tender_id, tender.tender_id);

  assert!(s.get_tender(Uuid::new_v4()).await.unwrap().is_none());
  assert_eq!(s.list_tenders().await.unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_reference_is_rejected() {
  let (s, _) = store_with_tender().await;
  let err = s
    .create_tender(NewTender::new(REF, "Another title"))
    .await
    .unwrap_err();
  assert!(matches!(core_error(&err), tender_core::Error::DuplicateTender(r) if r == REF));
}

#[tokio::test]
async fn intake_is_all_or_nothing() {
  let s = store().await;
  let criteria = vec![NewCriterion::new(
    CriterionType::Experience,
    "Five years of HDB upgrading works",
  )];

  let err = s
    .intake_tender(
      NewTender::new(REF, "Upgrading works at Block 123"),
      criteria.clone(),
      vec![NewRequiredDocument::mandatory("BOQ"), NewRequiredDocument::mandatory("  ")],
    )
    .await
    .unwrap_err();
  assert!(matches!(
    core_error(&err),
    tender_core::Error::InvalidFieldValue { field, .. } if field == "name"
  ));
  assert!(s.get_tender_by_reference(REF).await.unwrap().is_none());

  let tender = s
    .intake_tender(
      NewTender::new(REF, "Upgrading works at Block 123"),
      criteria,
      vec![NewRequiredDocument::mandatory("BOQ")],
    )
    .await
    .unwrap();
  assert_eq!(s.list_criteria(tender.tender_id).await.unwrap().len(), 1);
  assert_eq!(s.list_required_documents(tender.tender_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn processing_status_updates() {
  let (s, tender) = store_with_tender().await;
  let updated = s
    .set_processing_status(tender.tender_id, ProcessingStatus::Completed)
    .await
    .unwrap();
  assert_eq!(updated.status, ProcessingStatus::Completed);

  let err = s
    .set_processing_status(Uuid::new_v4(), ProcessingStatus::Failed)
    .await
    .unwrap_err();
  assert!(matches!(core_error(&err), tender_core::Error::UnknownTender(_)));
}

#[tokio::test]
async fn delete_tender_cascades() {
  let (s, tender) = store_with_tender().await;
  s.add_required_document(tender.tender_id, NewRequiredDocument::mandatory("BOQ"))
    .await
    .unwrap();
  s.apply_addendum(record(1).with_sentence(SAFETY)).await.unwrap();

  assert!(s.delete_tender(tender.tender_id).await.unwrap());
  assert!(!s.delete_tender(tender.tender_id).await.unwrap());

  assert!(s.list_criteria(tender.tender_id).await.unwrap().is_empty());
  assert!(s.pending_rechecks(tender.tender_id).await.unwrap().is_empty());
  assert!(
    s.list_required_documents(tender.tender_id)
      .await
      .unwrap()
      .is_empty()
  );
}

// ─── Completeness ────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_mandatory_uses_exact_names() {
  let (s, tender) = store_with_tender().await;
  let id = tender.tender_id;
  for name in ["BOQ", "Site Plan", "Form of Tender"] {
    s.add_required_document(id, NewRequiredDocument::mandatory(name))
      .await
      .unwrap();
  }
  let mut optional = NewRequiredDocument::mandatory("Company Profile");
  optional.is_mandatory = false;
  s.add_required_document(id, optional).await.unwrap();

  s.record_received_document(id, NewReceivedDocument::named("Form of Tender"))
    .await
    .unwrap();
  s.record_received_document(id, NewReceivedDocument::named("site plan"))
    .await
    .unwrap();

  let missing: Vec<_> = s
    .missing_mandatory_documents(id)
    .await
    .unwrap()
    .into_iter()
    .map(|d| d.name)
    .collect();
  assert_eq!(missing, ["BOQ", "Site Plan"]);

  let stats = s.document_stats(id).await.unwrap();
  assert_eq!(stats.mandatory_total, 3);
  assert_eq!(stats.mandatory_received, 1);
  assert_eq!(stats.total_required, 4);
  assert_eq!(stats.total_received, 2);
}

#[tokio::test]
async fn receiving_a_document_marks_requirement() {
  let (s, tender) = store_with_tender().await;
  let id = tender.tender_id;
  s.add_required_document(id, NewRequiredDocument::mandatory("BOQ"))
    .await
    .unwrap();

  let mut received = NewReceivedDocument::named("BOQ");
  received.file_size_kb = Some(512);
  let doc = s.record_received_document(id, received).await.unwrap();
  assert_eq!(doc.file_size_kb, Some(512));

  let required = s.list_required_documents(id).await.unwrap();
  assert!(required[0].is_received);
  assert!(s.missing_mandatory_documents(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn completeness_of_unknown_tender_fails() {
  let s = store().await;
  let err = s.document_stats(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(core_error(&err), tender_core::Error::UnknownTender(_)));
}

// ─── Applying addenda ────────────────────────────────────────────────────────

#[tokio::test]
async fn dual_nature_sentence_adds_document_and_criterion() {
  let (s, tender) = store_with_tender().await;
  let id = tender.tender_id;

  let outcome = s.apply_addendum(record(1).with_sentence(SAFETY)).await.unwrap();
  assert_eq!(outcome.addendum_number, 1);
  assert_eq!(outcome.inserted_documents.len(), 1);
  assert_eq!(outcome.inserted_criteria.len(), 1);
  assert!(outcome.has_pending_rechecks);
  assert!(outcome.unresolved.is_empty());

  let docs = s.list_required_documents(id).await.unwrap();
  assert_eq!(docs.len(), 1);
  assert_eq!(docs[0].name, "Safety Risk Assessment");
  assert_eq!(docs[0].source, Source::Addendum);
  assert_eq!(docs[0].introduced_by, Some(1));
  assert!(docs[0].is_mandatory);

  let criteria = s.list_criteria(id).await.unwrap();
  assert_eq!(criteria.len(), 1);
  let criterion = &criteria[0];
  assert_eq!(criterion.description, SAFETY);
  assert_eq!(criterion.criterion_type, CriterionType::License);
  assert_eq!(criterion.source, Source::Addendum);
  assert_eq!(criterion.introduced_by, Some(1));
  assert!(criterion.requires_recheck);
  assert!(criterion.is_met.is_none());

  assert_eq!(
    s.pending_rechecks(id).await.unwrap(),
    vec![criterion.criterion_id]
  );

  let addendum = s.get_addendum(id, 1).await.unwrap().unwrap();
  assert!(addendum.processed);
  assert!(addendum.processed_at.is_some());
}

#[tokio::test]
async fn document_only_addendum_schedules_no_recheck() {
  let (s, tender) = store_with_tender().await;
  let outcome = s
    .apply_addendum(record(1).with_sentence("Tenderers shall enclose the signed Form of Tender."))
    .await
    .unwrap();

  assert_eq!(outcome.inserted_documents.len(), 1);
  assert!(outcome.inserted_criteria.is_empty());
  assert!(!outcome.has_pending_rechecks);
  assert!(!s.has_pending(tender.tender_id).await.unwrap());
  assert!(s.list_criteria(tender.tender_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn clarification_rows_carry_clarification_source() {
  let (s, tender) = store_with_tender().await;
  let mut rec = record(1).with_sentence("Tenderer must hold a valid BCA licence");
  rec.kind = AddendumKind::Clarification;
  s.apply_addendum(rec).await.unwrap();

  let criteria = s.list_criteria(tender.tender_id).await.unwrap();
  assert_eq!(criteria[0].source, Source::Clarification);
}

#[tokio::test]
async fn out_of_order_addendum_is_rejected_without_writes() {
  let (s, tender) = store_with_tender().await;
  let id = tender.tender_id;
  s.apply_addendum(record(1).with_sentence(SAFETY)).await.unwrap();

  let err = s
    .apply_addendum(record(3).with_sentence("Provide the signed Form of Tender"))
    .await
    .unwrap_err();
  assert!(matches!(
    core_error(&err),
    tender_core::Error::Sequencing { expected: 2, got: 3 }
  ));

  assert!(s.get_addendum(id, 3).await.unwrap().is_none());
  assert_eq!(s.list_required_documents(id).await.unwrap().len(), 1);
  assert_eq!(s.changes(id, None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn reapplying_a_processed_addendum_changes_nothing() {
  let (s, tender) = store_with_tender().await;
  let id = tender.tender_id;
  let rec = record(1).with_sentence(SAFETY);

  s.apply_addendum(rec.clone()).await.unwrap();
  let criteria_before = s.list_criteria(id).await.unwrap();
  let ledger_before = s.changes(id, None).await.unwrap();

  let err = s.apply_addendum(rec).await.unwrap_err();
  assert!(matches!(
    core_error(&err),
    tender_core::Error::DuplicateAddendum { number: 1, .. }
  ));

  assert_eq!(s.list_criteria(id).await.unwrap(), criteria_before);
  assert_eq!(s.changes(id, None).await.unwrap(), ledger_before);
}

#[tokio::test]
async fn repeated_sentence_within_one_addendum_is_applied_once() {
  let (s, tender) = store_with_tender().await;
  let outcome = s
    .apply_addendum(record(1).with_sentence(SAFETY).with_sentence(SAFETY))
    .await
    .unwrap();
  assert_eq!(outcome.inserted_documents.len(), 1);
  assert_eq!(outcome.inserted_criteria.len(), 1);
  assert_eq!(s.list_criteria(tender.tender_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_tender_reference_is_rejected() {
  let s = store().await;
  let err = s.apply_addendum(record(1)).await.unwrap_err();
  assert!(matches!(core_error(&err), tender_core::Error::UnknownTender(r) if r == REF));
}

#[tokio::test]
async fn registered_addendum_is_reused_on_apply() {
  let (s, tender) = store_with_tender().await;
  let id = tender.tender_id;

  let mut rec = record(1).with_sentence(SAFETY);
  rec.title = Some("Addendum No. 1".into());
  let registered = s.register_addendum(rec.clone()).await.unwrap();
  assert!(!registered.processed);

  let registered_2 = s.register_addendum(record(2)).await.unwrap();
  assert_eq!(registered_2.number, 2);

  let err = s.register_addendum(record(4)).await.unwrap_err();
  assert!(matches!(
    core_error(&err),
    tender_core::Error::Sequencing { expected: 3, got: 4 }
  ));

  let outcome = s.apply_addendum(rec).await.unwrap();
  assert_eq!(outcome.addendum_id, registered.addendum_id);

  let addenda = s.list_addenda(id).await.unwrap();
  assert_eq!(addenda.len(), 2);
  assert!(addenda[0].processed);
  assert!(!addenda[1].processed);
  assert_eq!(addenda[0].title.as_deref(), Some("Addendum No. 1"));
}

#[tokio::test]
async fn applying_a_registered_addendum_takes_the_applied_record() {
  let (s, tender) = store_with_tender().await;
  let id = tender.tender_id;

  let mut registered = record(1);
  registered.kind = AddendumKind::Clarification;
  registered.title = Some("Clarification 1".into());
  s.register_addendum(registered).await.unwrap();

  let mut applied = record(1).with_sentence("Tenderer must hold a valid BCA licence");
  applied.kind = AddendumKind::Corrigendum;
  applied.title = Some("Corrigendum 1".into());
  applied.summary = Some("Licensing requirement".into());
  applied.received_at = Utc.with_ymd_and_hms(2025, 11, 4, 14, 30, 0).unwrap();
  s.apply_addendum(applied.clone()).await.unwrap();

  let addendum = s.get_addendum(id, 1).await.unwrap().unwrap();
  assert_eq!(addendum.kind, AddendumKind::Corrigendum);
  assert_eq!(addendum.title.as_deref(), Some("Corrigendum 1"));
  assert_eq!(addendum.summary.as_deref(), Some("Licensing requirement"));
  assert_eq!(addendum.received_at, applied.received_at);

  let criteria = s.list_criteria(id).await.unwrap();
  assert_eq!(criteria[0].source, Source::Addendum);
  assert_eq!(addendum.kind.row_source(), criteria[0].source);
}

#[tokio::test]
async fn unresolved_effects_are_reported() {
  let (s, tender) = store_with_tender().await;
  let outcome = s
    .apply_addendum(
      record(1)
        .with_sentence("The closing date is extended to 15 December 2025")
        .with_sentence("Drawing A-101 has been revised"),
    )
    .await
    .unwrap();

  let effects: Vec<_> = outcome.unresolved.iter().map(|u| u.effect).collect();
  assert!(effects.contains(&Effect::FieldChange));
  assert!(effects.contains(&Effect::DocumentVersionUpdate));

  // Nothing on the tender changed.
  let after = s.get_tender(tender.tender_id).await.unwrap().unwrap();
  assert_eq!(after.submission_deadline, tender.submission_deadline);
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn each_changed_field_is_logged_once_and_replays() {
  let (s, original) = store_with_tender().await;
  let id = original.tender_id;

  let deadline = "2025-12-15T04:00:00+00:00";
  s.apply_addendum(
    record(1)
      .with_sentence("The submission deadline is extended")
      .with_edit(FieldEdit::Tender {
        field: TenderField::SubmissionDeadline,
        value: Some(deadline.into()),
      })
      .with_edit(FieldEdit::Tender {
        field: TenderField::SiteLocation,
        value: Some("Ang Mo Kio Ave 3".into()),
      })
      // Same value again: not a change.
      .with_edit(FieldEdit::Tender {
        field: TenderField::Title,
        value: Some(original.title.clone()),
      }),
  )
  .await
  .unwrap();

  s.apply_addendum(record(2).with_edit(FieldEdit::Tender {
    field: TenderField::SubmissionDeadline,
    value: Some("2025-12-22T04:00:00+00:00".into()),
  }))
  .await
  .unwrap();

  let ledger = s.changes(id, None).await.unwrap();
  let updates = ledger.updates();
  assert_eq!(updates.len(), 3);

  let first = &updates.entries()[0];
  assert_eq!(first.entity, EntityKind::Tender);
  assert_eq!(first.field_name, "submission_deadline");
  assert_eq!(first.old_value, None);
  assert_eq!(first.new_value.as_deref(), Some(deadline));
  assert_eq!(first.addendum_number, 1);

  let sequences: Vec<_> = ledger.iter().map(|e| e.sequence).collect();
  assert!(sequences.windows(2).all(|w| w[0] < w[1]));

  let replayed = ledger.replay_tender(&original).unwrap();
  let stored = s.get_tender(id).await.unwrap().unwrap();
  for field in TenderField::ALL {
    assert_eq!(replayed.field_value(field), stored.field_value(field), "{field}");
  }

  assert_eq!(s.changes(id, Some(2)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn inserts_are_logged() {
  let (s, tender) = store_with_tender().await;
  s.apply_addendum(record(1).with_sentence(SAFETY)).await.unwrap();

  let ledger = s.changes(tender.tender_id, Some(1)).await.unwrap();
  assert_eq!(ledger.len(), 2);
  assert!(ledger.iter().all(|e| e.kind == ChangeKind::Insert));
  assert!(ledger.iter().all(|e| e.field_name == INSERT_FIELD));
  let entities: Vec<_> = ledger.iter().map(|e| e.entity).collect();
  assert!(entities.contains(&EntityKind::RequiredDocument));
  assert!(entities.contains(&EntityKind::QualificationCriterion));
}

#[tokio::test]
async fn ledger_rows_cannot_be_updated() {
  let (s, _) = store_with_tender().await;
  s.apply_addendum(record(1).with_sentence(SAFETY)).await.unwrap();

  let result = s
    .execute_raw("UPDATE addendum_changes SET new_value = 'tampered'")
    .await;
  assert!(result.is_err());
}

#[tokio::test]
async fn invalid_field_value_rolls_back_everything() {
  let (s, tender) = store_with_tender().await;
  let id = tender.tender_id;

  let err = s
    .apply_addendum(record(1).with_sentence(SAFETY).with_edit(
      FieldEdit::Tender {
        field: TenderField::ProjectStartDate,
        value: Some("next spring".into()),
      },
    ))
    .await
    .unwrap_err();
  assert!(matches!(
    core_error(&err),
    tender_core::Error::InvalidFieldValue { .. }
  ));

  assert!(s.list_criteria(id).await.unwrap().is_empty());
  assert!(s.get_addendum(id, 1).await.unwrap().is_none());
  assert!(!s.has_pending(id).await.unwrap());

  // The same number can be retried.
  s.apply_addendum(record(1).with_sentence(SAFETY)).await.unwrap();
}

// ─── Document versions ───────────────────────────────────────────────────────

#[tokio::test]
async fn revised_document_supersedes_previous_version() {
  let (s, tender) = store_with_tender().await;
  let id = tender.tender_id;

  let v1 = s
    .introduce_version(id, NewDocumentVersion::new("BOQ", "v1", "/docs/boq-v1.xlsx"))
    .await
    .unwrap();
  assert!(v1.is_current);
  assert_eq!(v1.introduced_by, None);

  let outcome = s
    .apply_addendum(
      record(1)
        .with_sentence("The BOQ has been revised")
        .with_revision(NewDocumentVersion::new("BOQ", "v2", "/docs/boq-v2.xlsx")),
    )
    .await
    .unwrap();
  assert!(outcome.unresolved.is_empty());
  assert_eq!(outcome.introduced_versions.len(), 1);
  let v2_id = outcome.introduced_versions[0];

  let current = s.current_version(id, "BOQ").await.unwrap().unwrap();
  assert_eq!(current.version_id, v2_id);
  assert_eq!(current.version_label, "v2");
  assert_eq!(current.introduced_by, Some(1));

  let history = s.version_history(id, "BOQ").await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0].version_id, v1.version_id);
  assert!(!history[0].is_current);
  assert_eq!(history[0].superseded_by, Some(v2_id));
  assert_eq!(history.iter().filter(|v| v.is_current).count(), 1);

  let ledger = s.changes(id, Some(1)).await.unwrap().for_entity(v1.version_id);
  let fields: Vec<_> = ledger.iter().map(|e| e.field_name.as_str()).collect();
  assert_eq!(fields, ["is_current", "superseded_by"]);
}

#[tokio::test]
async fn blank_revised_document_name_is_rejected() {
  let (s, tender) = store_with_tender().await;
  let id = tender.tender_id;

  let err = s
    .apply_addendum(
      record(1)
        .with_sentence("Drawing A-101 has been revised")
        .with_revision(NewDocumentVersion::new("", "rev B", "/docs/a-101-b.pdf")),
    )
    .await
    .unwrap_err();
  assert!(matches!(
    core_error(&err),
    tender_core::Error::InvalidFieldValue { field, .. } if field == "document_name"
  ));
  assert!(s.get_addendum(id, 1).await.unwrap().is_none());
  assert!(s.current_versions(id).await.unwrap().is_empty());

  let err = s
    .introduce_version(id, NewDocumentVersion::new(" ", "v1", "/docs/x"))
    .await
    .unwrap_err();
  assert!(matches!(core_error(&err), tender_core::Error::InvalidFieldValue { .. }));
}

#[tokio::test]
async fn one_current_version_per_document() {
  let (s, tender) = store_with_tender().await;
  let id = tender.tender_id;
  for label in ["v1", "v2", "v3"] {
    s.introduce_version(id, NewDocumentVersion::new("BOQ", label, format!("/boq-{label}")))
      .await
      .unwrap();
  }
  s.introduce_version(id, NewDocumentVersion::new("Site Plan", "rev A", "/site-a"))
    .await
    .unwrap();

  let current = s.current_versions(id).await.unwrap();
  let names: Vec<_> = current
    .iter()
    .map(|v| (v.document_name.as_str(), v.version_label.as_str()))
    .collect();
  assert_eq!(names, [("BOQ", "v3"), ("Site Plan", "rev A")]);

  assert!(s.current_version(id, "Drawing").await.unwrap().is_none());
}

#[tokio::test]
async fn two_current_rows_are_refused_by_the_schema() {
  let (s, tender) = store_with_tender().await;
  s.introduce_version(tender.tender_id, NewDocumentVersion::new("BOQ", "v1", "/v1"))
    .await
    .unwrap();
  s.introduce_version(tender.tender_id, NewDocumentVersion::new("BOQ", "v2", "/v2"))
    .await
    .unwrap();

  let result = s
    .execute_raw("UPDATE document_versions SET is_current = 1")
    .await;
  assert!(result.is_err());
}

// ─── Recheck scheduling ──────────────────────────────────────────────────────

#[tokio::test]
async fn pending_is_oldest_first_and_clear_is_idempotent() {
  let (s, tender) = store_with_tender().await;
  let id = tender.tender_id;

  let first = s
    .apply_addendum(record(1).with_sentence("Tenderer must hold a valid BCA licence"))
    .await
    .unwrap()
    .inserted_criteria[0];
  let second = s
    .apply_addendum(
      record(2).with_sentence("At least 5 years of experience in HDB upgrading"),
    )
    .await
    .unwrap()
    .inserted_criteria[0];

  assert_eq!(s.pending_rechecks(id).await.unwrap(), vec![first, second]);

  assert!(s.clear(first, true, Some("BCA licence on file".into())).await.unwrap());
  assert!(!s.clear(first, false, None).await.unwrap());
  assert_eq!(s.pending_rechecks(id).await.unwrap(), vec![second]);

  let criteria = s.list_criteria(id).await.unwrap();
  let cleared = criteria.iter().find(|c| c.criterion_id == first).unwrap();
  assert_eq!(cleared.is_met, Some(true));
  assert_eq!(cleared.notes.as_deref(), Some("BCA licence on file"));
  assert!(cleared.checked_at.is_some());
  assert!(!cleared.requires_recheck);

  assert!(s.clear(second, false, None).await.unwrap());
  assert!(!s.has_pending(id).await.unwrap());
}

#[tokio::test]
async fn clearing_unknown_criterion_fails() {
  let s = store().await;
  let missing = Uuid::new_v4();
  let err = s.clear(missing, true, None).await.unwrap_err();
  assert!(matches!(
    core_error(&err),
    tender_core::Error::UnknownCriterion(id) if *id == missing
  ));
}

#[tokio::test]
async fn editing_a_criterion_reschedules_it() {
  let (s, tender) = store_with_tender().await;
  let id = tender.tender_id;

  let mut input = NewCriterion::new(CriterionType::Financial, "Minimum annual turnover");
  input.value = Some("$5M".into());
  input.is_met = Some(true);
  let criterion = s.add_criterion(id, input).await.unwrap();
  assert!(!criterion.requires_recheck);
  assert!(!s.has_pending(id).await.unwrap());

  let outcome = s
    .apply_addendum(record(1).with_edit(FieldEdit::Criterion {
      criterion_id: criterion.criterion_id,
      field:        CriterionField::Value,
      value:        Some("$8M".into()),
    }))
    .await
    .unwrap();
  assert_eq!(outcome.rescheduled_criteria, vec![criterion.criterion_id]);
  assert!(outcome.has_pending_rechecks);

  let stored = s.list_criteria(id).await.unwrap().remove(0);
  assert_eq!(stored.value.as_deref(), Some("$8M"));
  assert!(stored.requires_recheck);
  assert_eq!(stored.source, Source::Original);

  let ledger = s.changes(id, Some(1)).await.unwrap();
  let fields: Vec<_> = ledger.iter().map(|e| e.field_name.as_str()).collect();
  assert_eq!(fields, ["value", "requires_recheck"]);
}

#[tokio::test]
async fn editing_a_foreign_criterion_fails() {
  let (s, _) = store_with_tender().await;
  let other = s
    .create_tender(NewTender::new("HDB-2025-0999", "Other works"))
    .await
    .unwrap();
  let foreign = s
    .add_criterion(
      other.tender_id,
      NewCriterion::new(CriterionType::Experience, "Three similar projects"),
    )
    .await
    .unwrap();

  let err = s
    .apply_addendum(record(1).with_edit(FieldEdit::Criterion {
      criterion_id: foreign.criterion_id,
      field:        CriterionField::Description,
      value:        Some("Two similar projects".into()),
    }))
    .await
    .unwrap_err();
  assert!(matches!(
    core_error(&err),
    tender_core::Error::UnknownCriterion(_)
  ));
}
