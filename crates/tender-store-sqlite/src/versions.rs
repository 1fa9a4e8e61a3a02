//! Writing a new document version into its supersession chain.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tender_core::version::{ChainTransition, NewDocumentVersion, VersionChain};
use uuid::Uuid;

use crate::{
  Result,
  encode::{encode_dt, encode_uuid},
  queries,
};

/// The addendum a version arrived with: its row id and its number.
pub type Introducer = (Uuid, u32);

/// Load the chain of `input.document_name`, validate the transition against
/// it, then write it. The previous current row is demoted before the new one
/// is inserted so the one-current-per-document index never sees two.
///
/// Must run inside a transaction.
pub fn introduce(
  conn: &Connection,
  tender_id: Uuid,
  input: NewDocumentVersion,
  introduced_by: Option<Introducer>,
  now: DateTime<Utc>,
) -> Result<ChainTransition> {
  if input.document_name.trim().is_empty() {
    return Err(
      tender_core::Error::InvalidFieldValue {
        field: "document_name".into(),
        value: input.document_name,
      }
      .into(),
    );
  }

  let rows = queries::versions(conn, tender_id, &input.document_name)?;
  let mut chain = VersionChain::new(input.document_name.clone(), rows);

  let version = input.into_version(
    Uuid::new_v4(),
    tender_id,
    introduced_by.map(|(_, number)| number),
    now,
  );
  let transition = chain.introduce(version)?;
  let new = &transition.introduced;

  if let Some(old) = &transition.superseded {
    conn.execute(
      "UPDATE document_versions SET is_current = 0 WHERE version_id = ?1",
      params![encode_uuid(old.version_id)],
    )?;
  }

  conn.execute(
    "INSERT INTO document_versions (
       version_id, tender_id, document_name, version_label, file_reference,
       content_hash, is_current, superseded_by, introduced_by_addendum_id,
       uploaded_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, NULL, ?7, ?8)",
    params![
      encode_uuid(new.version_id),
      encode_uuid(tender_id),
      new.document_name,
      new.version_label,
      new.file_reference,
      new.content_hash,
      introduced_by.map(|(id, _)| encode_uuid(id)),
      encode_dt(new.uploaded_at),
    ],
  )?;

  // The link can only be written once the row it points at exists.
  if let Some(old) = &transition.superseded {
    conn.execute(
      "UPDATE document_versions SET superseded_by = ?1 WHERE version_id = ?2",
      params![encode_uuid(new.version_id), encode_uuid(old.version_id)],
    )?;
  }

  tracing::debug!(
    document = %new.document_name,
    label = %new.version_label,
    superseded = ?transition.superseded.as_ref().map(|v| v.version_id),
    "introduced document version"
  );

  Ok(transition)
}
