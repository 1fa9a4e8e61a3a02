//! Applying one addendum record to the stored state of its tender.
//!
//! Everything here runs inside the single transaction opened by
//! [`crate::SqliteStore::apply_addendum`]: any error rolls back every row
//! written so far, including the addendum row itself.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, Transaction, params};
use tender_core::{
  addendum::{AddendumRecord, ApplyOutcome, FieldEdit, UnresolvedEffect},
  classify::{Effect, classify, criterion_type_hint, document_name_hint},
  criterion::{CriterionField, Source},
  ledger::{EntityKind, NewChange},
  tender::{Tender, TenderField},
  version::NewDocumentVersion,
};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{encode_dt, encode_uuid},
  queries, versions,
};

/// Check `record.addendum_number` against the tender's processed addenda.
///
/// Returns the id of an already registered, still unprocessed row for the
/// same number, which the application then reuses.
pub fn check_sequence(
  tx: &Transaction<'_>,
  tender: &Tender,
  number: u32,
) -> Result<Option<Uuid>> {
  let existing = queries::addendum(tx, tender.tender_id, number)?;
  if existing.as_ref().is_some_and(|a| a.processed) {
    return Err(
      tender_core::Error::DuplicateAddendum {
        tender_reference: tender.reference_number.clone(),
        number,
      }
      .into(),
    );
  }

  let expected = queries::last_addendum_number(tx, tender.tender_id, true)? + 1;
  if number != expected {
    return Err(tender_core::Error::Sequencing { expected, got: number }.into());
  }

  Ok(existing.map(|a| a.addendum_id))
}

/// Insert an unprocessed addendum row.
pub fn insert_addendum(
  tx: &Transaction<'_>,
  tender_id: Uuid,
  record: &AddendumRecord,
) -> Result<Uuid> {
  let addendum_id = Uuid::new_v4();
  tx.execute(
    "INSERT INTO addenda (
       addendum_id, tender_id, number, kind, title, summary, source,
       received_at, processed, processed_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, NULL)",
    params![
      encode_uuid(addendum_id),
      encode_uuid(tender_id),
      record.addendum_number,
      record.kind.as_ref(),
      record.title,
      record.summary,
      record.source,
      encode_dt(record.received_at),
    ],
  )?;
  Ok(addendum_id)
}

/// Overwrite a registered row's descriptive columns with those of the
/// record being applied, so the row agrees with the provenance of what the
/// record introduces.
fn refresh_addendum(
  tx: &Transaction<'_>,
  addendum_id: Uuid,
  record: &AddendumRecord,
) -> Result<()> {
  tx.execute(
    "UPDATE addenda
        SET kind = ?1, title = ?2, summary = ?3, source = ?4, received_at = ?5
      WHERE addendum_id = ?6",
    params![
      record.kind.as_ref(),
      record.title,
      record.summary,
      record.source,
      encode_dt(record.received_at),
      encode_uuid(addendum_id),
    ],
  )?;
  Ok(())
}

/// Apply `record` and mark its addendum processed.
pub fn apply(
  tx: &Transaction<'_>,
  record: &AddendumRecord,
  now: DateTime<Utc>,
) -> Result<ApplyOutcome> {
  let tender = queries::tender_by_reference(tx, &record.tender_reference)?
    .ok_or_else(|| tender_core::Error::UnknownTender(record.tender_reference.clone()))?;

  let addendum_id = match check_sequence(tx, &tender, record.addendum_number)? {
    Some(id) => {
      refresh_addendum(tx, id, record)?;
      id
    }
    None => insert_addendum(tx, tender.tender_id, record)?,
  };

  let mut m = Mutation {
    tx,
    tender,
    addendum_id,
    number: record.addendum_number,
    source: record.kind.row_source(),
    now,
    outcome: ApplyOutcome {
      addendum_id,
      addendum_number: record.addendum_number,
      has_pending_rechecks: false,
      inserted_documents: Vec::new(),
      inserted_criteria: Vec::new(),
      introduced_versions: Vec::new(),
      rescheduled_criteria: Vec::new(),
      changes_recorded: 0,
      unresolved: Vec::new(),
    },
  };

  for sentence in &record.raw_requirement_sentences {
    let sentence = sentence.trim();
    if sentence.is_empty() {
      continue;
    }
    for effect in classify(sentence).iter() {
      match effect {
        Effect::RequiredDocument => m.require_document(sentence)?,
        Effect::QualificationCriterion => m.add_criterion(sentence)?,
        Effect::DocumentVersionUpdate => {
          if !names_any_revision(sentence, &record.revised_documents) {
            m.unresolved(sentence, effect);
          }
        }
        Effect::FieldChange => {
          if record.field_edits.is_empty() {
            m.unresolved(sentence, effect);
          }
        }
      }
    }
  }

  for revision in &record.revised_documents {
    m.revise(revision.clone())?;
  }
  for edit in &record.field_edits {
    m.edit(edit)?;
  }

  tx.execute(
    "UPDATE addenda SET processed = 1, processed_at = ?1 WHERE addendum_id = ?2",
    params![encode_dt(now), encode_uuid(addendum_id)],
  )?;

  let mut outcome = m.outcome;
  outcome.has_pending_rechecks = queries::has_pending(tx, m.tender.tender_id)?;
  Ok(outcome)
}

fn names_any_revision(sentence: &str, revisions: &[NewDocumentVersion]) -> bool {
  let text = sentence.to_lowercase();
  revisions
    .iter()
    .map(|r| r.document_name.trim())
    .filter(|name| !name.is_empty())
    .any(|name| text.contains(&name.to_lowercase()))
}

// ─── Mutation context ────────────────────────────────────────────────────────

struct Mutation<'t, 'c> {
  tx:          &'t Transaction<'c>,
  /// Kept in sync with every tender field edit applied so far.
  tender:      Tender,
  addendum_id: Uuid,
  number:      u32,
  source:      Source,
  now:         DateTime<Utc>,
  outcome:     ApplyOutcome,
}

impl Mutation<'_, '_> {
  fn log(&mut self, change: NewChange) -> Result<()> {
    queries::record_change(
      self.tx,
      self.tender.tender_id,
      self.addendum_id,
      &change,
      self.now,
    )?;
    self.outcome.changes_recorded += 1;
    Ok(())
  }

  fn unresolved(&mut self, sentence: &str, effect: Effect) {
    tracing::warn!(
      tender = %self.tender.reference_number,
      addendum = self.number,
      %effect,
      sentence,
      "addendum record carries no structured data for classified effect"
    );
    self.outcome.unresolved.push(UnresolvedEffect {
      sentence: sentence.to_owned(),
      effect,
    });
  }

  fn require_document(&mut self, sentence: &str) -> Result<()> {
    let tender_id = self.tender.tender_id;
    let name = document_name_hint(sentence);

    let exists = self
      .tx
      .query_row(
        "SELECT 1 FROM required_documents
          WHERE tender_id = ?1 AND introduced_by_addendum_id = ?2 AND name = ?3",
        params![encode_uuid(tender_id), encode_uuid(self.addendum_id), name],
        |_| Ok(()),
      )
      .optional()?
      .is_some();
    if exists {
      return Ok(());
    }

    let requirement_id = Uuid::new_v4();
    let received = queries::is_received(self.tx, tender_id, &name)?;
    self.tx.execute(
      "INSERT INTO required_documents (
         requirement_id, tender_id, name, category, description, is_mandatory,
         is_received, source, introduced_by_addendum_id, added_at
       ) VALUES (?1, ?2, ?3, NULL, ?4, 1, ?5, ?6, ?7, ?8)",
      params![
        encode_uuid(requirement_id),
        encode_uuid(tender_id),
        name,
        sentence,
        received,
        self.source.as_ref(),
        encode_uuid(self.addendum_id),
        encode_dt(self.now),
      ],
    )?;

    self.log(NewChange::insert(EntityKind::RequiredDocument, requirement_id, name))?;
    self.outcome.inserted_documents.push(requirement_id);
    Ok(())
  }

  fn add_criterion(&mut self, sentence: &str) -> Result<()> {
    let tender_id = self.tender.tender_id;

    let exists = self
      .tx
      .query_row(
        "SELECT 1 FROM qualification_criteria
          WHERE tender_id = ?1 AND introduced_by_addendum_id = ?2 AND description = ?3",
        params![encode_uuid(tender_id), encode_uuid(self.addendum_id), sentence],
        |_| Ok(()),
      )
      .optional()?
      .is_some();
    if exists {
      return Ok(());
    }

    let criterion_id = Uuid::new_v4();
    let criterion_type = criterion_type_hint(sentence);
    self.tx.execute(
      "INSERT INTO qualification_criteria (
         criterion_id, tender_id, criterion_type, description, value, is_met,
         notes, checked_at, source, introduced_by_addendum_id,
         requires_recheck, added_at
       ) VALUES (?1, ?2, ?3, ?4, NULL, NULL, NULL, NULL, ?5, ?6, 1, ?7)",
      params![
        encode_uuid(criterion_id),
        encode_uuid(tender_id),
        criterion_type.as_ref(),
        sentence,
        self.source.as_ref(),
        encode_uuid(self.addendum_id),
        encode_dt(self.now),
      ],
    )?;
    queries::enqueue(self.tx, criterion_id, tender_id, Some(self.addendum_id), self.now)?;

    self.log(NewChange::insert(
      EntityKind::QualificationCriterion,
      criterion_id,
      sentence,
    ))?;
    self.outcome.inserted_criteria.push(criterion_id);
    Ok(())
  }

  fn revise(&mut self, revision: NewDocumentVersion) -> Result<()> {
    let transition = versions::introduce(
      self.tx,
      self.tender.tender_id,
      revision,
      Some((self.addendum_id, self.number)),
      self.now,
    )?;
    let new = &transition.introduced;

    self.log(NewChange::insert(
      EntityKind::DocumentVersion,
      new.version_id,
      format!("{} {}", new.document_name, new.version_label),
    ))?;
    if let Some(old) = &transition.superseded {
      self.log(NewChange::update(
        EntityKind::DocumentVersion,
        old.version_id,
        "is_current",
        Some("true".into()),
        Some("false".into()),
      ))?;
      self.log(NewChange::update(
        EntityKind::DocumentVersion,
        old.version_id,
        "superseded_by",
        None,
        Some(new.version_id.to_string()),
      ))?;
    }

    self.outcome.introduced_versions.push(new.version_id);
    Ok(())
  }

  fn edit(&mut self, edit: &FieldEdit) -> Result<()> {
    match edit {
      FieldEdit::Tender { field, value } => self.edit_tender(*field, value.as_deref()),
      FieldEdit::Criterion { criterion_id, field, value } => {
        self.edit_criterion(*criterion_id, *field, value.as_deref())
      }
    }
  }

  fn edit_tender(&mut self, field: TenderField, value: Option<&str>) -> Result<()> {
    let old = self.tender.field_value(field);
    self.tender.set_field(field, value)?;
    let new = self.tender.field_value(field);
    if old == new {
      return Ok(());
    }

    // `field` renders as its own column name.
    self.tx.execute(
      &format!("UPDATE tenders SET {field} = ?1, updated_at = ?2 WHERE tender_id = ?3"),
      params![new, encode_dt(self.now), encode_uuid(self.tender.tender_id)],
    )?;
    self.tender.updated_at = self.now;

    self.log(NewChange::update(
      EntityKind::Tender,
      self.tender.tender_id,
      field.as_ref(),
      old,
      new,
    ))
  }

  fn edit_criterion(
    &mut self,
    criterion_id: Uuid,
    field: CriterionField,
    value: Option<&str>,
  ) -> Result<()> {
    let criterion = queries::criterion(self.tx, criterion_id)?
      .filter(|c| c.tender_id == self.tender.tender_id)
      .ok_or(tender_core::Error::UnknownCriterion(criterion_id))?;

    if field == CriterionField::Description && value.is_none_or(|v| v.trim().is_empty()) {
      return Err(Error::from(tender_core::Error::InvalidFieldValue {
        field: field.to_string(),
        value: value.unwrap_or_default().to_owned(),
      }));
    }

    let old = criterion.field_value(field);
    let new = value.map(str::to_owned);
    if old == new {
      return Ok(());
    }

    self.tx.execute(
      &format!("UPDATE qualification_criteria SET {field} = ?1 WHERE criterion_id = ?2"),
      params![new, encode_uuid(criterion_id)],
    )?;
    self.log(NewChange::update(
      EntityKind::QualificationCriterion,
      criterion_id,
      field.as_ref(),
      old,
      new,
    ))?;

    if !criterion.requires_recheck {
      self.tx.execute(
        "UPDATE qualification_criteria SET requires_recheck = 1 WHERE criterion_id = ?1",
        params![encode_uuid(criterion_id)],
      )?;
      self.log(NewChange::update(
        EntityKind::QualificationCriterion,
        criterion_id,
        "requires_recheck",
        Some("false".into()),
        Some("true".into()),
      ))?;
    }
    queries::enqueue(
      self.tx,
      criterion_id,
      self.tender.tender_id,
      Some(self.addendum_id),
      self.now,
    )?;

    if !self.outcome.rescheduled_criteria.contains(&criterion_id) {
      self.outcome.rescheduled_criteria.push(criterion_id);
    }
    Ok(())
  }
}
