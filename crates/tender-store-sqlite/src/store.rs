//! [`SqliteStore`], the SQLite implementation of [`TenderStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Transaction, params};
use uuid::Uuid;

use tender_core::{
  addendum::{Addendum, AddendumRecord, ApplyOutcome},
  criterion::{NewCriterion, QualificationCriterion, Source},
  document::{
    self, DocumentStats, NewReceivedDocument, NewRequiredDocument,
    ReceivedDocument, RequiredDocument,
  },
  ledger::ChangeLedger,
  store::TenderStore,
  tender::{NewTender, ProcessingStatus, Tender},
  version::{DocumentVersion, NewDocumentVersion},
};

use crate::{
  Result,
  encode::{encode_dt, encode_uuid},
  mutator, queries,
  schema::SCHEMA,
  versions,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A tender store backed by a single SQLite file.
///
/// Clones share one connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a throwaway in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the connection thread.
  async fn run<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut rusqlite::Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run `f` inside a transaction, committing only if it succeeds.
  async fn transact<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self
      .run(move |conn| {
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
      })
      .await
  }

  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<usize> {
    self.run(move |conn| Ok(conn.execute(sql, [])?)).await
  }
}

// ─── Row writers ─────────────────────────────────────────────────────────────

fn new_tender(input: NewTender, now: DateTime<Utc>) -> Tender {
  Tender {
    tender_id:                  Uuid::new_v4(),
    reference_number:           input.reference_number,
    title:                      input.title,
    issuing_authority:          input.issuing_authority,
    submission_deadline:        input.submission_deadline,
    clarification_closing_date: input.clarification_closing_date,
    project_start_date:         input.project_start_date,
    project_completion_date:    input.project_completion_date,
    site_location:              input.site_location,
    contract_type:              input.contract_type,
    status:                     ProcessingStatus::Pending,
    created_at:                 now,
    updated_at:                 now,
  }
}

fn reject_blank(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(
      tender_core::Error::InvalidFieldValue {
        field: field.to_owned(),
        value: value.to_owned(),
      }
      .into(),
    );
  }
  Ok(())
}

fn insert_tender(tx: &Transaction<'_>, row: &Tender) -> Result<()> {
  if queries::tender_by_reference(tx, &row.reference_number)?.is_some() {
    return Err(tender_core::Error::DuplicateTender(row.reference_number.clone()).into());
  }
  tx.execute(
    "INSERT INTO tenders (
       tender_id, reference_number, title, issuing_authority,
       submission_deadline, clarification_closing_date,
       project_start_date, project_completion_date, site_location,
       contract_type, status, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    params![
      encode_uuid(row.tender_id),
      row.reference_number,
      row.title,
      row.issuing_authority,
      row.submission_deadline.map(encode_dt),
      row.clarification_closing_date.map(encode_dt),
      row.project_start_date.map(|d| d.to_string()),
      row.project_completion_date.map(|d| d.to_string()),
      row.site_location,
      row.contract_type,
      row.status.as_ref(),
      encode_dt(row.created_at),
      encode_dt(row.updated_at),
    ],
  )?;
  Ok(())
}

fn insert_criterion(
  tx: &Transaction<'_>,
  tender_id: Uuid,
  input: NewCriterion,
  now: DateTime<Utc>,
) -> Result<QualificationCriterion> {
  reject_blank("description", &input.description)?;
  let row = QualificationCriterion {
    criterion_id:     Uuid::new_v4(),
    tender_id,
    criterion_type:   input.criterion_type,
    description:      input.description,
    value:            input.value,
    is_met:           input.is_met,
    notes:            input.notes,
    checked_at:       input.is_met.map(|_| now),
    source:           Source::Original,
    introduced_by:    None,
    requires_recheck: false,
    added_at:         now,
  };
  tx.execute(
    "INSERT INTO qualification_criteria (
       criterion_id, tender_id, criterion_type, description, value,
       is_met, notes, checked_at, source, introduced_by_addendum_id,
       requires_recheck, added_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, 0, ?10)",
    params![
      encode_uuid(row.criterion_id),
      encode_uuid(row.tender_id),
      row.criterion_type.as_ref(),
      row.description,
      row.value,
      row.is_met,
      row.notes,
      row.checked_at.map(encode_dt),
      row.source.as_ref(),
      encode_dt(row.added_at),
    ],
  )?;
  Ok(row)
}

fn insert_required_document(
  tx: &Transaction<'_>,
  tender_id: Uuid,
  input: NewRequiredDocument,
  now: DateTime<Utc>,
) -> Result<RequiredDocument> {
  reject_blank("name", &input.name)?;
  let document = RequiredDocument {
    requirement_id: Uuid::new_v4(),
    tender_id,
    is_received: queries::is_received(tx, tender_id, &input.name)?,
    name: input.name,
    category: input.category,
    description: input.description,
    is_mandatory: input.is_mandatory,
    source: Source::Original,
    introduced_by: None,
    added_at: now,
  };
  tx.execute(
    "INSERT INTO required_documents (
       requirement_id, tender_id, name, category, description,
       is_mandatory, is_received, source, introduced_by_addendum_id,
       added_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9)",
    params![
      encode_uuid(document.requirement_id),
      encode_uuid(tender_id),
      document.name,
      document.category,
      document.description,
      document.is_mandatory,
      document.is_received,
      document.source.as_ref(),
      encode_dt(now),
    ],
  )?;
  Ok(document)
}

// ─── TenderStore impl ────────────────────────────────────────────────────────

impl TenderStore for SqliteStore {
  type Error = crate::Error;

  // ── Tenders ───────────────────────────────────────────────────────────────

  async fn create_tender(&self, input: NewTender) -> Result<Tender> {
    let tender = new_tender(input, Utc::now());
    let row = tender.clone();
    self.transact(move |tx| insert_tender(tx, &row)).await?;

    tracing::info!(reference = %tender.reference_number, "created tender");
    Ok(tender)
  }

  async fn get_tender(&self, tender_id: Uuid) -> Result<Option<Tender>> {
    self.run(move |conn| queries::tender(conn, tender_id)).await
  }

  async fn get_tender_by_reference<'a>(&'a self, reference: &'a str) -> Result<Option<Tender>> {
    let reference = reference.to_owned();
    self
      .run(move |conn| queries::tender_by_reference(conn, &reference))
      .await
  }

  async fn list_tenders(&self) -> Result<Vec<Tender>> {
    self.run(|conn| queries::tenders(conn)).await
  }

  async fn set_processing_status(
    &self,
    tender_id: Uuid,
    status: ProcessingStatus,
  ) -> Result<Tender> {
    let now = Utc::now();
    self
      .transact(move |tx| {
        queries::require_tender(tx, tender_id)?;
        tx.execute(
          "UPDATE tenders SET status = ?1, updated_at = ?2 WHERE tender_id = ?3",
          params![status.as_ref(), encode_dt(now), encode_uuid(tender_id)],
        )?;
        queries::require_tender(tx, tender_id)
      })
      .await
  }

  async fn delete_tender(&self, tender_id: Uuid) -> Result<bool> {
    let deleted = self
      .run(move |conn| {
        Ok(conn.execute(
          "DELETE FROM tenders WHERE tender_id = ?1",
          params![encode_uuid(tender_id)],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  // ── Intake ────────────────────────────────────────────────────────────────

  async fn add_criterion(
    &self,
    tender_id: Uuid,
    input: NewCriterion,
  ) -> Result<QualificationCriterion> {
    let now = Utc::now();
    self
      .transact(move |tx| {
        queries::require_tender(tx, tender_id)?;
        insert_criterion(tx, tender_id, input, now)
      })
      .await
  }

  async fn add_required_document(
    &self,
    tender_id: Uuid,
    input: NewRequiredDocument,
  ) -> Result<RequiredDocument> {
    let now = Utc::now();
    self
      .transact(move |tx| {
        queries::require_tender(tx, tender_id)?;
        insert_required_document(tx, tender_id, input, now)
      })
      .await
  }

  async fn intake_tender(
    &self,
    input: NewTender,
    criteria: Vec<NewCriterion>,
    documents: Vec<NewRequiredDocument>,
  ) -> Result<Tender> {
    let now = Utc::now();
    let tender = new_tender(input, now);
    let (n_criteria, n_documents) = (criteria.len(), documents.len());

    let row = tender.clone();
    self
      .transact(move |tx| {
        insert_tender(tx, &row)?;
        for criterion in criteria {
          insert_criterion(tx, row.tender_id, criterion, now)?;
        }
        for document in documents {
          insert_required_document(tx, row.tender_id, document, now)?;
        }
        Ok(())
      })
      .await?;

    tracing::info!(
      reference = %tender.reference_number,
      criteria = n_criteria,
      documents = n_documents,
      "tender intake complete"
    );
    Ok(tender)
  }

  async fn record_received_document(
    &self,
    tender_id: Uuid,
    input: NewReceivedDocument,
  ) -> Result<ReceivedDocument> {
    let document = ReceivedDocument {
      received_id:    Uuid::new_v4(),
      tender_id,
      name:           input.name,
      file_reference: input.file_reference,
      file_size_kb:   input.file_size_kb,
      uploaded_by:    input.uploaded_by,
      received_at:    input.received_at.unwrap_or_else(Utc::now),
    };

    let row = document.clone();
    self
      .transact(move |tx| {
        queries::require_tender(tx, tender_id)?;
        let size = row
          .file_size_kb
          .map(i64::try_from)
          .transpose()
          .map_err(|e| crate::Error::Decode(e.to_string()))?;
        tx.execute(
          "INSERT INTO received_documents (
             received_id, tender_id, name, file_reference, file_size_kb,
             uploaded_by, received_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          params![
            encode_uuid(row.received_id),
            encode_uuid(tender_id),
            row.name,
            row.file_reference,
            size,
            row.uploaded_by,
            encode_dt(row.received_at),
          ],
        )?;
        tx.execute(
          "UPDATE required_documents SET is_received = 1
            WHERE tender_id = ?1 AND name = ?2",
          params![encode_uuid(tender_id), row.name],
        )?;
        Ok(())
      })
      .await?;

    Ok(document)
  }

  // ── Addenda ───────────────────────────────────────────────────────────────

  async fn register_addendum(&self, record: AddendumRecord) -> Result<Addendum> {
    self
      .transact(move |tx| {
        let tender = queries::tender_by_reference(tx, &record.tender_reference)?
          .ok_or_else(|| {
            tender_core::Error::UnknownTender(record.tender_reference.clone())
          })?;

        if queries::addendum(tx, tender.tender_id, record.addendum_number)?.is_some() {
          return Err(
            tender_core::Error::DuplicateAddendum {
              tender_reference: tender.reference_number,
              number:           record.addendum_number,
            }
            .into(),
          );
        }
        let expected = queries::last_addendum_number(tx, tender.tender_id, false)? + 1;
        if record.addendum_number != expected {
          return Err(
            tender_core::Error::Sequencing {
              expected,
              got: record.addendum_number,
            }
            .into(),
          );
        }

        mutator::insert_addendum(tx, tender.tender_id, &record)?;
        queries::addendum(tx, tender.tender_id, record.addendum_number)?.ok_or_else(
          || crate::Error::Decode("registered addendum row vanished".into()),
        )
      })
      .await
  }

  async fn apply_addendum(&self, record: AddendumRecord) -> Result<ApplyOutcome> {
    let reference = record.tender_reference.clone();
    let number = record.addendum_number;

    let result = self
      .transact(move |tx| mutator::apply(tx, &record, Utc::now()))
      .await;

    match &result {
      Ok(outcome) => tracing::info!(
        tender = %reference,
        addendum = number,
        documents = outcome.inserted_documents.len(),
        criteria = outcome.inserted_criteria.len(),
        versions = outcome.introduced_versions.len(),
        changes = outcome.changes_recorded,
        pending = outcome.has_pending_rechecks,
        "applied addendum"
      ),
      Err(e) => tracing::warn!(
        tender = %reference,
        addendum = number,
        error = %e,
        "addendum rejected; nothing written"
      ),
    }
    result
  }

  async fn list_addenda(&self, tender_id: Uuid) -> Result<Vec<Addendum>> {
    self
      .run(move |conn| {
        queries::require_tender(conn, tender_id)?;
        queries::addenda(conn, tender_id)
      })
      .await
  }

  async fn get_addendum(&self, tender_id: Uuid, number: u32) -> Result<Option<Addendum>> {
    self
      .run(move |conn| queries::addendum(conn, tender_id, number))
      .await
  }

  async fn changes(
    &self,
    tender_id: Uuid,
    addendum_number: Option<u32>,
  ) -> Result<ChangeLedger> {
    let entries = self
      .run(move |conn| {
        queries::require_tender(conn, tender_id)?;
        queries::changes(conn, tender_id, addendum_number)
      })
      .await?;
    Ok(ChangeLedger::from_entries(entries))
  }

  // ── Document versions ─────────────────────────────────────────────────────

  async fn introduce_version(
    &self,
    tender_id: Uuid,
    input: NewDocumentVersion,
  ) -> Result<DocumentVersion> {
    let transition = self
      .transact(move |tx| {
        queries::require_tender(tx, tender_id)?;
        versions::introduce(tx, tender_id, input, None, Utc::now())
      })
      .await?;
    Ok(transition.introduced)
  }

  async fn current_version<'a>(
    &'a self,
    tender_id: Uuid,
    document_name: &'a str,
  ) -> Result<Option<DocumentVersion>> {
    let name = document_name.to_owned();
    let rows = self
      .run(move |conn| queries::versions(conn, tender_id, &name))
      .await?;
    let chain = tender_core::version::VersionChain::new(document_name, rows);
    Ok(chain.current()?.cloned())
  }

  async fn version_history<'a>(
    &'a self,
    tender_id: Uuid,
    document_name: &'a str,
  ) -> Result<Vec<DocumentVersion>> {
    let name = document_name.to_owned();
    self
      .run(move |conn| queries::versions(conn, tender_id, &name))
      .await
  }

  async fn current_versions(&self, tender_id: Uuid) -> Result<Vec<DocumentVersion>> {
    self
      .run(move |conn| queries::current_versions(conn, tender_id))
      .await
  }

  // ── Recheck scheduling ────────────────────────────────────────────────────

  async fn pending_rechecks(&self, tender_id: Uuid) -> Result<Vec<Uuid>> {
    self.run(move |conn| queries::pending(conn, tender_id)).await
  }

  async fn has_pending(&self, tender_id: Uuid) -> Result<bool> {
    self.run(move |conn| queries::has_pending(conn, tender_id)).await
  }

  async fn clear(
    &self,
    criterion_id: Uuid,
    is_met: bool,
    notes: Option<String>,
  ) -> Result<bool> {
    let now = Utc::now();
    let cleared = self
      .transact(move |tx| {
        let criterion = queries::criterion(tx, criterion_id)?
          .ok_or(tender_core::Error::UnknownCriterion(criterion_id))?;

        let dequeued = tx.execute(
          "DELETE FROM recheck_queue WHERE criterion_id = ?1",
          params![encode_uuid(criterion_id)],
        )?;
        if dequeued == 0 && !criterion.requires_recheck {
          return Ok(false);
        }

        tx.execute(
          "UPDATE qualification_criteria
              SET is_met = ?1, notes = ?2, checked_at = ?3, requires_recheck = 0
            WHERE criterion_id = ?4",
          params![is_met, notes, encode_dt(now), encode_uuid(criterion_id)],
        )?;
        Ok(true)
      })
      .await?;

    if cleared {
      tracing::debug!(%criterion_id, is_met, "cleared recheck");
    }
    Ok(cleared)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_criteria(&self, tender_id: Uuid) -> Result<Vec<QualificationCriterion>> {
    self.run(move |conn| queries::criteria(conn, tender_id)).await
  }

  async fn list_required_documents(&self, tender_id: Uuid) -> Result<Vec<RequiredDocument>> {
    self
      .run(move |conn| queries::required_documents(conn, tender_id))
      .await
  }

  async fn list_received_documents(&self, tender_id: Uuid) -> Result<Vec<ReceivedDocument>> {
    self
      .run(move |conn| queries::received_documents(conn, tender_id))
      .await
  }

  async fn missing_mandatory_documents(
    &self,
    tender_id: Uuid,
  ) -> Result<Vec<RequiredDocument>> {
    let (required, received) = self.documents(tender_id).await?;
    Ok(document::missing_mandatory(&required, &received))
  }

  async fn document_stats(&self, tender_id: Uuid) -> Result<DocumentStats> {
    let (required, received) = self.documents(tender_id).await?;
    Ok(DocumentStats::compute(&required, &received))
  }
}

impl SqliteStore {
  async fn documents(
    &self,
    tender_id: Uuid,
  ) -> Result<(Vec<RequiredDocument>, Vec<ReceivedDocument>)> {
    self
      .run(move |conn| {
        queries::require_tender(conn, tender_id)?;
        Ok((
          queries::required_documents(conn, tender_id)?,
          queries::received_documents(conn, tender_id)?,
        ))
      })
      .await
  }
}
