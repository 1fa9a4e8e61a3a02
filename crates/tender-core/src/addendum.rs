//! Addenda: the amendment events that drive every state change after intake.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  classify::Effect,
  criterion::{CriterionField, Source},
  tender::TenderField,
  version::NewDocumentVersion,
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AddendumKind {
  #[default]
  Addendum,
  Clarification,
  Corrigendum,
}

impl AddendumKind {
  /// Provenance stamped on rows this kind of addendum introduces.
  pub fn row_source(self) -> Source {
    match self {
      Self::Clarification => Source::Clarification,
      Self::Addendum | Self::Corrigendum => Source::Addendum,
    }
  }
}

/// A stored addendum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addendum {
  pub addendum_id:  Uuid,
  pub tender_id:    Uuid,
  /// 1-based, gap-free per tender.
  pub number:       u32,
  pub kind:         AddendumKind,
  pub title:        Option<String>,
  pub summary:      Option<String>,
  /// Where the addendum came from, e.g. the originating email id.
  pub source:       Option<String>,
  pub received_at:  DateTime<Utc>,
  pub processed:    bool,
  pub processed_at: Option<DateTime<Utc>>,
}

// ─── Parser input ────────────────────────────────────────────────────────────

/// A direct overwrite of one field, as extracted by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum FieldEdit {
  Tender {
    field: TenderField,
    value: Option<String>,
  },
  Criterion {
    criterion_id: Uuid,
    field:        CriterionField,
    value:        Option<String>,
  },
}

/// The structured amendment record handed over by the document parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddendumRecord {
  pub tender_reference:          String,
  pub addendum_number:           u32,
  #[serde(default)]
  pub kind:                      AddendumKind,
  #[serde(default)]
  pub title:                     Option<String>,
  #[serde(default)]
  pub summary:                   Option<String>,
  #[serde(default)]
  pub source:                    Option<String>,
  #[serde(default)]
  pub raw_requirement_sentences: Vec<String>,
  pub received_at:               DateTime<Utc>,
  #[serde(default)]
  pub field_edits:               Vec<FieldEdit>,
  /// Revised versions of tender-issued documents attached to the addendum.
  #[serde(default)]
  pub revised_documents:         Vec<NewDocumentVersion>,
}

impl AddendumRecord {
  pub fn new(
    tender_reference: impl Into<String>,
    addendum_number: u32,
    received_at: DateTime<Utc>,
  ) -> Self {
    Self {
      tender_reference: tender_reference.into(),
      addendum_number,
      kind: AddendumKind::default(),
      title: None,
      summary: None,
      source: None,
      raw_requirement_sentences: Vec::new(),
      received_at,
      field_edits: Vec::new(),
      revised_documents: Vec::new(),
    }
  }

  pub fn with_sentence(mut self, sentence: impl Into<String>) -> Self {
    self.raw_requirement_sentences.push(sentence.into());
    self
  }

  pub fn with_edit(mut self, edit: FieldEdit) -> Self {
    self.field_edits.push(edit);
    self
  }

  pub fn with_revision(mut self, version: NewDocumentVersion) -> Self {
    self.revised_documents.push(version);
    self
  }
}

// ─── Result ──────────────────────────────────────────────────────────────────

/// A classified effect the record did not carry enough structure to apply.
/// Returned to the caller instead of being dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedEffect {
  pub sentence: String,
  pub effect:   Effect,
}

/// Result of [`crate::store::TenderStore::apply_addendum`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
  pub addendum_id:          Uuid,
  pub addendum_number:      u32,
  /// Whether the matcher needs to run for this tender.
  pub has_pending_rechecks: bool,
  pub inserted_documents:   Vec<Uuid>,
  pub inserted_criteria:    Vec<Uuid>,
  pub introduced_versions:  Vec<Uuid>,
  /// Criteria whose fields were edited and were scheduled for recheck.
  pub rescheduled_criteria: Vec<Uuid>,
  pub changes_recorded:     usize,
  pub unresolved:           Vec<UnresolvedEffect>,
}
