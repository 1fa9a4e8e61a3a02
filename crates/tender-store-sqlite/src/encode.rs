//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD`, UUIDs are
//! hyphenated lowercase strings, and enums use their snake_case names.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use tender_core::{
  addendum::Addendum,
  criterion::QualificationCriterion,
  document::{ReceivedDocument, RequiredDocument},
  ledger::AddendumChange,
  tender::Tender,
  version::DocumentVersion,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  s.parse::<NaiveDate>()
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// Decode a snake_case enum column via its `FromStr` impl.
pub fn decode_enum<T: FromStr>(column: &str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {column}: {s:?}")))
}

fn decode_opt<T>(
  s: Option<String>,
  f: impl FnOnce(&str) -> Result<T>,
) -> Result<Option<T>> {
  s.as_deref().map(f).transpose()
}

// ─── Tender ──────────────────────────────────────────────────────────────────

pub const TENDER_COLUMNS: &str = "tender_id, reference_number, title,
  issuing_authority, submission_deadline, clarification_closing_date,
  project_start_date, project_completion_date, site_location, contract_type,
  status, created_at, updated_at";

/// Raw strings read from a `tenders` row.
pub struct RawTender {
  pub tender_id:                  String,
  pub reference_number:           String,
  pub title:                      String,
  pub issuing_authority:          Option<String>,
  pub submission_deadline:        Option<String>,
  pub clarification_closing_date: Option<String>,
  pub project_start_date:         Option<String>,
  pub project_completion_date:    Option<String>,
  pub site_location:              Option<String>,
  pub contract_type:              Option<String>,
  pub status:                     String,
  pub created_at:                 String,
  pub updated_at:                 String,
}

impl RawTender {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tender_id:                  row.get(0)?,
      reference_number:           row.get(1)?,
      title:                      row.get(2)?,
      issuing_authority:          row.get(3)?,
      submission_deadline:        row.get(4)?,
      clarification_closing_date: row.get(5)?,
      project_start_date:         row.get(6)?,
      project_completion_date:    row.get(7)?,
      site_location:              row.get(8)?,
      contract_type:              row.get(9)?,
      status:                     row.get(10)?,
      created_at:                 row.get(11)?,
      updated_at:                 row.get(12)?,
    })
  }

  pub fn into_tender(self) -> Result<Tender> {
    Ok(Tender {
      tender_id:                  decode_uuid(&self.tender_id)?,
      reference_number:           self.reference_number,
      title:                      self.title,
      issuing_authority:          self.issuing_authority,
      submission_deadline:        decode_opt(self.submission_deadline, decode_dt)?,
      clarification_closing_date: decode_opt(
        self.clarification_closing_date,
        decode_dt,
      )?,
      project_start_date:         decode_opt(self.project_start_date, decode_date)?,
      project_completion_date:    decode_opt(
        self.project_completion_date,
        decode_date,
      )?,
      site_location:              self.site_location,
      contract_type:              self.contract_type,
      status:                     decode_enum("processing status", &self.status)?,
      created_at:                 decode_dt(&self.created_at)?,
      updated_at:                 decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Criterion ───────────────────────────────────────────────────────────────

/// Selected from `qualification_criteria c LEFT JOIN addenda a`.
pub const CRITERION_COLUMNS: &str = "c.criterion_id, c.tender_id,
  c.criterion_type, c.description, c.value, c.is_met, c.notes, c.checked_at,
  c.source, a.number, c.requires_recheck, c.added_at";

pub struct RawCriterion {
  pub criterion_id:     String,
  pub tender_id:        String,
  pub criterion_type:   String,
  pub description:      String,
  pub value:            Option<String>,
  pub is_met:           Option<bool>,
  pub notes:            Option<String>,
  pub checked_at:       Option<String>,
  pub source:           String,
  pub introduced_by:    Option<u32>,
  pub requires_recheck: bool,
  pub added_at:         String,
}

impl RawCriterion {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      criterion_id:     row.get(0)?,
      tender_id:        row.get(1)?,
      criterion_type:   row.get(2)?,
      description:      row.get(3)?,
      value:            row.get(4)?,
      is_met:           row.get(5)?,
      notes:            row.get(6)?,
      checked_at:       row.get(7)?,
      source:           row.get(8)?,
      introduced_by:    row.get(9)?,
      requires_recheck: row.get(10)?,
      added_at:         row.get(11)?,
    })
  }

  pub fn into_criterion(self) -> Result<QualificationCriterion> {
    Ok(QualificationCriterion {
      criterion_id:     decode_uuid(&self.criterion_id)?,
      tender_id:        decode_uuid(&self.tender_id)?,
      criterion_type:   decode_enum("criterion type", &self.criterion_type)?,
      description:      self.description,
      value:            self.value,
      is_met:           self.is_met,
      notes:            self.notes,
      checked_at:       decode_opt(self.checked_at, decode_dt)?,
      source:           decode_enum("source", &self.source)?,
      introduced_by:    self.introduced_by,
      requires_recheck: self.requires_recheck,
      added_at:         decode_dt(&self.added_at)?,
    })
  }
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// Selected from `required_documents d LEFT JOIN addenda a`.
pub const REQUIRED_COLUMNS: &str = "d.requirement_id, d.tender_id, d.name,
  d.category, d.description, d.is_mandatory, d.is_received, d.source,
  a.number, d.added_at";

pub struct RawRequired {
  pub requirement_id: String,
  pub tender_id:      String,
  pub name:           String,
  pub category:       Option<String>,
  pub description:    Option<String>,
  pub is_mandatory:   bool,
  pub is_received:    bool,
  pub source:         String,
  pub introduced_by:  Option<u32>,
  pub added_at:       String,
}

impl RawRequired {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      requirement_id: row.get(0)?,
      tender_id:      row.get(1)?,
      name:           row.get(2)?,
      category:       row.get(3)?,
      description:    row.get(4)?,
      is_mandatory:   row.get(5)?,
      is_received:    row.get(6)?,
      source:         row.get(7)?,
      introduced_by:  row.get(8)?,
      added_at:       row.get(9)?,
    })
  }

  pub fn into_required(self) -> Result<RequiredDocument> {
    Ok(RequiredDocument {
      requirement_id: decode_uuid(&self.requirement_id)?,
      tender_id:      decode_uuid(&self.tender_id)?,
      name:           self.name,
      category:       self.category,
      description:    self.description,
      is_mandatory:   self.is_mandatory,
      is_received:    self.is_received,
      source:         decode_enum("source", &self.source)?,
      introduced_by:  self.introduced_by,
      added_at:       decode_dt(&self.added_at)?,
    })
  }
}

pub const RECEIVED_COLUMNS: &str = "received_id, tender_id, name,
  file_reference, file_size_kb, uploaded_by, received_at";

pub struct RawReceived {
  pub received_id:    String,
  pub tender_id:      String,
  pub name:           String,
  pub file_reference: Option<String>,
  pub file_size_kb:   Option<i64>,
  pub uploaded_by:    Option<String>,
  pub received_at:    String,
}

impl RawReceived {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      received_id:    row.get(0)?,
      tender_id:      row.get(1)?,
      name:           row.get(2)?,
      file_reference: row.get(3)?,
      file_size_kb:   row.get(4)?,
      uploaded_by:    row.get(5)?,
      received_at:    row.get(6)?,
    })
  }

  pub fn into_received(self) -> Result<ReceivedDocument> {
    Ok(ReceivedDocument {
      received_id:    decode_uuid(&self.received_id)?,
      tender_id:      decode_uuid(&self.tender_id)?,
      name:           self.name,
      file_reference: self.file_reference,
      file_size_kb:   self.file_size_kb.and_then(|v| u64::try_from(v).ok()),
      uploaded_by:    self.uploaded_by,
      received_at:    decode_dt(&self.received_at)?,
    })
  }
}

// ─── Addendum ────────────────────────────────────────────────────────────────

pub const ADDENDUM_COLUMNS: &str = "addendum_id, tender_id, number, kind,
  title, summary, source, received_at, processed, processed_at";

pub struct RawAddendum {
  pub addendum_id:  String,
  pub tender_id:    String,
  pub number:       u32,
  pub kind:         String,
  pub title:        Option<String>,
  pub summary:      Option<String>,
  pub source:       Option<String>,
  pub received_at:  String,
  pub processed:    bool,
  pub processed_at: Option<String>,
}

impl RawAddendum {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      addendum_id:  row.get(0)?,
      tender_id:    row.get(1)?,
      number:       row.get(2)?,
      kind:         row.get(3)?,
      title:        row.get(4)?,
      summary:      row.get(5)?,
      source:       row.get(6)?,
      received_at:  row.get(7)?,
      processed:    row.get(8)?,
      processed_at: row.get(9)?,
    })
  }

  pub fn into_addendum(self) -> Result<Addendum> {
    Ok(Addendum {
      addendum_id:  decode_uuid(&self.addendum_id)?,
      tender_id:    decode_uuid(&self.tender_id)?,
      number:       self.number,
      kind:         decode_enum("addendum kind", &self.kind)?,
      title:        self.title,
      summary:      self.summary,
      source:       self.source,
      received_at:  decode_dt(&self.received_at)?,
      processed:    self.processed,
      processed_at: decode_opt(self.processed_at, decode_dt)?,
    })
  }
}

// ─── Document version ────────────────────────────────────────────────────────

/// Selected from `document_versions v LEFT JOIN addenda a`.
pub const VERSION_COLUMNS: &str = "v.version_id, v.tender_id,
  v.document_name, v.version_label, v.file_reference, v.content_hash,
  v.is_current, v.superseded_by, a.number, v.uploaded_at";

pub struct RawVersion {
  pub version_id:     String,
  pub tender_id:      String,
  pub document_name:  String,
  pub version_label:  String,
  pub file_reference: String,
  pub content_hash:   Option<String>,
  pub is_current:     bool,
  pub superseded_by:  Option<String>,
  pub introduced_by:  Option<u32>,
  pub uploaded_at:    String,
}

impl RawVersion {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      version_id:     row.get(0)?,
      tender_id:      row.get(1)?,
      document_name:  row.get(2)?,
      version_label:  row.get(3)?,
      file_reference: row.get(4)?,
      content_hash:   row.get(5)?,
      is_current:     row.get(6)?,
      superseded_by:  row.get(7)?,
      introduced_by:  row.get(8)?,
      uploaded_at:    row.get(9)?,
    })
  }

  pub fn into_version(self) -> Result<DocumentVersion> {
    Ok(DocumentVersion {
      version_id:     decode_uuid(&self.version_id)?,
      tender_id:      decode_uuid(&self.tender_id)?,
      document_name:  self.document_name,
      version_label:  self.version_label,
      file_reference: self.file_reference,
      content_hash:   self.content_hash,
      is_current:     self.is_current,
      superseded_by:  decode_opt(self.superseded_by, decode_uuid)?,
      introduced_by:  self.introduced_by,
      uploaded_at:    decode_dt(&self.uploaded_at)?,
    })
  }
}

// ─── Ledger entry ────────────────────────────────────────────────────────────

/// Selected from `addendum_changes ch JOIN addenda a`.
pub const CHANGE_COLUMNS: &str = "ch.change_id, ch.sequence, ch.addendum_id,
  a.number, ch.entity_kind, ch.entity_id, ch.field_name, ch.old_value,
  ch.new_value, ch.change_kind, ch.recorded_at";

pub struct RawChange {
  pub change_id:       String,
  pub sequence:        i64,
  pub addendum_id:     String,
  pub addendum_number: u32,
  pub entity_kind:     String,
  pub entity_id:       String,
  pub field_name:      String,
  pub old_value:       Option<String>,
  pub new_value:       Option<String>,
  pub change_kind:     String,
  pub recorded_at:     String,
}

impl RawChange {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      change_id:       row.get(0)?,
      sequence:        row.get(1)?,
      addendum_id:     row.get(2)?,
      addendum_number: row.get(3)?,
      entity_kind:     row.get(4)?,
      entity_id:       row.get(5)?,
      field_name:      row.get(6)?,
      old_value:       row.get(7)?,
      new_value:       row.get(8)?,
      change_kind:     row.get(9)?,
      recorded_at:     row.get(10)?,
    })
  }

  pub fn into_change(self) -> Result<AddendumChange> {
    Ok(AddendumChange {
      change_id:       decode_uuid(&self.change_id)?,
      sequence:        self.sequence,
      addendum_id:     decode_uuid(&self.addendum_id)?,
      addendum_number: self.addendum_number,
      entity:          decode_enum("entity kind", &self.entity_kind)?,
      entity_id:       decode_uuid(&self.entity_id)?,
      field_name:      self.field_name,
      old_value:       self.old_value,
      new_value:       self.new_value,
      kind:            decode_enum("change kind", &self.change_kind)?,
      recorded_at:     decode_dt(&self.recorded_at)?,
    })
  }
}
