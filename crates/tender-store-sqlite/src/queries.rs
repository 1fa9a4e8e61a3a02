//! Synchronous row-level queries shared by the store and the mutator.
//!
//! Every function takes a plain `&Connection` so it can run either directly
//! inside a `tokio_rusqlite` call or inside an open transaction.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, Params, Row, params};
use tender_core::{
  addendum::Addendum,
  criterion::QualificationCriterion,
  document::{ReceivedDocument, RequiredDocument},
  ledger::{AddendumChange, NewChange},
  tender::Tender,
  version::DocumentVersion,
};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    ADDENDUM_COLUMNS, CHANGE_COLUMNS, CRITERION_COLUMNS, RECEIVED_COLUMNS,
    REQUIRED_COLUMNS, RawAddendum, RawChange, RawCriterion, RawReceived,
    RawRequired, RawTender, RawVersion, TENDER_COLUMNS, VERSION_COLUMNS,
    decode_uuid, encode_dt, encode_uuid,
  },
};

fn query_all<R, T>(
  conn: &Connection,
  sql: &str,
  params: impl Params,
  read: fn(&Row<'_>) -> rusqlite::Result<R>,
  decode: fn(R) -> Result<T>,
) -> Result<Vec<T>> {
  let mut stmt = conn.prepare(sql)?;
  let raws = stmt
    .query_map(params, read)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(decode).collect()
}

fn query_opt<R, T>(
  conn: &Connection,
  sql: &str,
  params: impl Params,
  read: fn(&Row<'_>) -> rusqlite::Result<R>,
  decode: fn(R) -> Result<T>,
) -> Result<Option<T>> {
  conn
    .query_row(sql, params, read)
    .optional()?
    .map(decode)
    .transpose()
}

// ─── Tenders ─────────────────────────────────────────────────────────────────

pub fn tender(conn: &Connection, tender_id: Uuid) -> Result<Option<Tender>> {
  query_opt(
    conn,
    &format!("SELECT {TENDER_COLUMNS} FROM tenders WHERE tender_id = ?1"),
    params![encode_uuid(tender_id)],
    RawTender::from_row,
    RawTender::into_tender,
  )
}

pub fn tender_by_reference(conn: &Connection, reference: &str) -> Result<Option<Tender>> {
  query_opt(
    conn,
    &format!("SELECT {TENDER_COLUMNS} FROM tenders WHERE reference_number = ?1"),
    params![reference],
    RawTender::from_row,
    RawTender::into_tender,
  )
}

pub fn tenders(conn: &Connection) -> Result<Vec<Tender>> {
  query_all(
    conn,
    &format!("SELECT {TENDER_COLUMNS} FROM tenders ORDER BY created_at, rowid"),
    [],
    RawTender::from_row,
    RawTender::into_tender,
  )
}

/// Like [`tender`], but a missing tender is an error.
pub fn require_tender(conn: &Connection, tender_id: Uuid) -> Result<Tender> {
  tender(conn, tender_id)?.ok_or_else(|| {
    tender_core::Error::UnknownTender(tender_id.to_string()).into()
  })
}

// ─── Criteria ────────────────────────────────────────────────────────────────

pub fn criteria(conn: &Connection, tender_id: Uuid) -> Result<Vec<QualificationCriterion>> {
  query_all(
    conn,
    &format!(
      "SELECT {CRITERION_COLUMNS}
         FROM qualification_criteria c
         LEFT JOIN addenda a ON a.addendum_id = c.introduced_by_addendum_id
        WHERE c.tender_id = ?1
        ORDER BY c.added_at, c.rowid"
    ),
    params![encode_uuid(tender_id)],
    RawCriterion::from_row,
    RawCriterion::into_criterion,
  )
}

pub fn criterion(
  conn: &Connection,
  criterion_id: Uuid,
) -> Result<Option<QualificationCriterion>> {
  query_opt(
    conn,
    &format!(
      "SELECT {CRITERION_COLUMNS}
         FROM qualification_criteria c
         LEFT JOIN addenda a ON a.addendum_id = c.introduced_by_addendum_id
        WHERE c.criterion_id = ?1"
    ),
    params![encode_uuid(criterion_id)],
    RawCriterion::from_row,
    RawCriterion::into_criterion,
  )
}

// ─── Documents ───────────────────────────────────────────────────────────────

pub fn required_documents(
  conn: &Connection,
  tender_id: Uuid,
) -> Result<Vec<RequiredDocument>> {
  query_all(
    conn,
    &format!(
      "SELECT {REQUIRED_COLUMNS}
         FROM required_documents d
         LEFT JOIN addenda a ON a.addendum_id = d.introduced_by_addendum_id
        WHERE d.tender_id = ?1
        ORDER BY d.added_at, d.rowid"
    ),
    params![encode_uuid(tender_id)],
    RawRequired::from_row,
    RawRequired::into_required,
  )
}

pub fn received_documents(
  conn: &Connection,
  tender_id: Uuid,
) -> Result<Vec<ReceivedDocument>> {
  query_all(
    conn,
    &format!(
      "SELECT {RECEIVED_COLUMNS} FROM received_documents
        WHERE tender_id = ?1
        ORDER BY received_at, rowid"
    ),
    params![encode_uuid(tender_id)],
    RawReceived::from_row,
    RawReceived::into_received,
  )
}

/// Whether a document of exactly this name has been received.
pub fn is_received(conn: &Connection, tender_id: Uuid, name: &str) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM received_documents WHERE tender_id = ?1 AND name = ?2 LIMIT 1",
        params![encode_uuid(tender_id), name],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

// ─── Addenda ─────────────────────────────────────────────────────────────────

pub fn addenda(conn: &Connection, tender_id: Uuid) -> Result<Vec<Addendum>> {
  query_all(
    conn,
    &format!(
      "SELECT {ADDENDUM_COLUMNS} FROM addenda WHERE tender_id = ?1 ORDER BY number"
    ),
    params![encode_uuid(tender_id)],
    RawAddendum::from_row,
    RawAddendum::into_addendum,
  )
}

pub fn addendum(conn: &Connection, tender_id: Uuid, number: u32) -> Result<Option<Addendum>> {
  query_opt(
    conn,
    &format!(
      "SELECT {ADDENDUM_COLUMNS} FROM addenda WHERE tender_id = ?1 AND number = ?2"
    ),
    params![encode_uuid(tender_id), number],
    RawAddendum::from_row,
    RawAddendum::into_addendum,
  )
}

/// Highest addendum number, counting only processed addenda if
/// `processed_only`. Zero when there are none.
pub fn last_addendum_number(
  conn: &Connection,
  tender_id: Uuid,
  processed_only: bool,
) -> Result<u32> {
  Ok(conn.query_row(
    "SELECT COALESCE(MAX(number), 0) FROM addenda
      WHERE tender_id = ?1 AND (processed = 1 OR ?2 = 0)",
    params![encode_uuid(tender_id), processed_only],
    |row| row.get(0),
  )?)
}

// ─── Versions ────────────────────────────────────────────────────────────────

/// Every version of one document, oldest upload first.
pub fn versions(
  conn: &Connection,
  tender_id: Uuid,
  document_name: &str,
) -> Result<Vec<DocumentVersion>> {
  query_all(
    conn,
    &format!(
      "SELECT {VERSION_COLUMNS}
         FROM document_versions v
         LEFT JOIN addenda a ON a.addendum_id = v.introduced_by_addendum_id
        WHERE v.tender_id = ?1 AND v.document_name = ?2
        ORDER BY v.uploaded_at, v.rowid"
    ),
    params![encode_uuid(tender_id), document_name],
    RawVersion::from_row,
    RawVersion::into_version,
  )
}

pub fn current_versions(conn: &Connection, tender_id: Uuid) -> Result<Vec<DocumentVersion>> {
  query_all(
    conn,
    &format!(
      "SELECT {VERSION_COLUMNS}
         FROM document_versions v
         LEFT JOIN addenda a ON a.addendum_id = v.introduced_by_addendum_id
        WHERE v.tender_id = ?1 AND v.is_current = 1
        ORDER BY v.document_name"
    ),
    params![encode_uuid(tender_id)],
    RawVersion::from_row,
    RawVersion::into_version,
  )
}

// ─── Recheck queue ───────────────────────────────────────────────────────────

/// Queued criterion ids, oldest criterion first.
pub fn pending(conn: &Connection, tender_id: Uuid) -> Result<Vec<Uuid>> {
  let mut stmt = conn.prepare(
    "SELECT q.criterion_id
       FROM recheck_queue q
       JOIN qualification_criteria c ON c.criterion_id = q.criterion_id
      WHERE q.tender_id = ?1
      ORDER BY c.added_at, c.rowid",
  )?;
  let ids = stmt
    .query_map(params![encode_uuid(tender_id)], |row| row.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  ids.iter().map(|s| decode_uuid(s)).collect()
}

pub fn has_pending(conn: &Connection, tender_id: Uuid) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM recheck_queue WHERE tender_id = ?1 LIMIT 1",
        params![encode_uuid(tender_id)],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

/// Put a criterion on the queue. No-op if it is already there.
pub fn enqueue(
  conn: &Connection,
  criterion_id: Uuid,
  tender_id: Uuid,
  addendum_id: Option<Uuid>,
  now: DateTime<Utc>,
) -> Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO recheck_queue (criterion_id, tender_id, addendum_id, enqueued_at)
     VALUES (?1, ?2, ?3, ?4)",
    params![
      encode_uuid(criterion_id),
      encode_uuid(tender_id),
      addendum_id.map(encode_uuid),
      encode_dt(now),
    ],
  )?;
  Ok(())
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

pub fn changes(
  conn: &Connection,
  tender_id: Uuid,
  addendum_number: Option<u32>,
) -> Result<Vec<AddendumChange>> {
  query_all(
    conn,
    &format!(
      "SELECT {CHANGE_COLUMNS}
         FROM addendum_changes ch
         JOIN addenda a ON a.addendum_id = ch.addendum_id
        WHERE ch.tender_id = ?1 AND (?2 IS NULL OR a.number = ?2)
        ORDER BY ch.sequence"
    ),
    params![encode_uuid(tender_id), addendum_number],
    RawChange::from_row,
    RawChange::into_change,
  )
}

/// Append one ledger entry.
pub fn record_change(
  conn: &Connection,
  tender_id: Uuid,
  addendum_id: Uuid,
  change: &NewChange,
  now: DateTime<Utc>,
) -> Result<()> {
  conn.execute(
    "INSERT INTO addendum_changes (
       change_id, tender_id, addendum_id, entity_kind, entity_id,
       field_name, old_value, new_value, change_kind, recorded_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    params![
      encode_uuid(Uuid::new_v4()),
      encode_uuid(tender_id),
      encode_uuid(addendum_id),
      change.entity.as_ref(),
      encode_uuid(change.entity_id),
      change.field_name,
      change.old_value,
      change.new_value,
      change.kind.as_ref(),
      encode_dt(now),
    ],
  )?;
  Ok(())
}
