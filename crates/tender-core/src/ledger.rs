//! The addendum change ledger.
//!
//! Every field an addendum overwrites, and every row it inserts, leaves one
//! [`AddendumChange`]. Entries are never updated or deleted; a
//! [`ChangeLedger`] is a read-only, sequence-ordered view over them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  tender::{Tender, TenderField},
};

/// The table an entry refers to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
  Tender,
  QualificationCriterion,
  RequiredDocument,
  DocumentVersion,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChangeKind {
  /// A row was created. `field_name` is [`INSERT_FIELD`].
  Insert,
  /// An existing field was overwritten.
  Update,
}

/// `field_name` recorded for row insertions.
pub const INSERT_FIELD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddendumChange {
  pub change_id:       Uuid,
  /// Position in the tender-wide ledger; strictly increasing.
  pub sequence:        i64,
  pub addendum_id:     Uuid,
  pub addendum_number: u32,
  pub entity:          EntityKind,
  pub entity_id:       Uuid,
  pub field_name:      String,
  pub old_value:       Option<String>,
  pub new_value:       Option<String>,
  pub kind:            ChangeKind,
  pub recorded_at:     DateTime<Utc>,
}

/// A change about to be written; the store assigns id, sequence and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChange {
  pub entity:    EntityKind,
  pub entity_id: Uuid,
  pub field_name: String,
  pub old_value: Option<String>,
  pub new_value: Option<String>,
  pub kind:      ChangeKind,
}

impl NewChange {
  pub fn update(
    entity: EntityKind,
    entity_id: Uuid,
    field_name: impl Into<String>,
    old_value: Option<String>,
    new_value: Option<String>,
  ) -> Self {
    Self {
      entity,
      entity_id,
      field_name: field_name.into(),
      old_value,
      new_value,
      kind: ChangeKind::Update,
    }
  }

  pub fn insert(entity: EntityKind, entity_id: Uuid, summary: impl Into<String>) -> Self {
    Self {
      entity,
      entity_id,
      field_name: INSERT_FIELD.to_owned(),
      old_value: None,
      new_value: Some(summary.into()),
      kind: ChangeKind::Insert,
    }
  }
}

// ─── Ledger view ─────────────────────────────────────────────────────────────

/// An immutable, sequence-ordered slice of the ledger. Filtering produces a
/// new ledger; nothing is ever modified in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeLedger {
  entries: Arc<[AddendumChange]>,
}

impl ChangeLedger {
  pub fn from_entries(mut entries: Vec<AddendumChange>) -> Self {
    entries.sort_by_key(|e| e.sequence);
    Self { entries: entries.into() }
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = &AddendumChange> + '_ {
    self.entries.iter()
  }

  pub fn entries(&self) -> &[AddendumChange] { &self.entries }

  /// Entries written while applying addendum `number`.
  pub fn for_addendum(&self, number: u32) -> Self {
    self.filtered(|e| e.addendum_number == number)
  }

  /// Field overwrites only, without row insertions.
  pub fn updates(&self) -> Self { self.filtered(|e| e.kind == ChangeKind::Update) }

  /// Entries touching one record.
  pub fn for_entity(&self, entity_id: Uuid) -> Self {
    self.filtered(|e| e.entity_id == entity_id)
  }

  fn filtered(&self, keep: impl Fn(&AddendumChange) -> bool) -> Self {
    Self {
      entries: self.entries.iter().filter(|e| keep(e)).cloned().collect(),
    }
  }

  /// Reconstruct the tender's addendum-editable fields by replaying every
  /// tender update in order on top of `initial`.
  ///
  /// Each entry's `old_value` must equal the replayed value at that point;
  /// a mismatch means the ledger skipped or reordered a change.
  pub fn replay_tender(&self, initial: &Tender) -> Result<Tender> {
    let mut tender = initial.clone();
    for entry in self.entries.iter().filter(|e| {
      e.entity == EntityKind::Tender
        && e.entity_id == initial.tender_id
        && e.kind == ChangeKind::Update
    }) {
      let field: TenderField =
        entry.field_name.parse().map_err(|_| Error::InvalidFieldValue {
          field: entry.field_name.clone(),
          value: entry.new_value.clone().unwrap_or_default(),
        })?;

      if tender.field_value(field) != entry.old_value {
        return Err(Error::LedgerMismatch {
          sequence: entry.sequence,
          field:    entry.field_name.clone(),
        });
      }
      tender.set_field(field, entry.new_value.as_deref())?;
    }
    Ok(tender)
  }
}
