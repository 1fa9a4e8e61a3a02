//! Document versions and their supersession chains.
//!
//! All versions of one logical document within one tender form a chain. The
//! chain is held as an arena keyed by version id; `superseded_by` is an index
//! into that arena rather than an embedded pointer, so the chain stays
//! serialisable and cycle detection is a plain reachability walk.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ChainIntegrityError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVersion {
  pub version_id:     Uuid,
  pub tender_id:      Uuid,
  pub document_name:  String,
  pub version_label:  String,
  pub file_reference: String,
  /// SHA-256 hex digest of the file contents, when known.
  pub content_hash:   Option<String>,
  pub is_current:     bool,
  pub superseded_by:  Option<Uuid>,
  pub introduced_by:  Option<u32>,
  pub uploaded_at:    DateTime<Utc>,
}

/// Input to [`crate::store::TenderStore::introduce_version`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocumentVersion {
  pub document_name:  String,
  pub version_label:  String,
  pub file_reference: String,
  #[serde(default)]
  pub content_hash:   Option<String>,
}

impl NewDocumentVersion {
  pub fn new(
    document_name: impl Into<String>,
    version_label: impl Into<String>,
    file_reference: impl Into<String>,
  ) -> Self {
    Self {
      document_name:  document_name.into(),
      version_label:  version_label.into(),
      file_reference: file_reference.into(),
      content_hash:   None,
    }
  }

  /// Build the stored row. The caller decides the id so that a store can
  /// validate it against the chain before writing anything.
  pub fn into_version(
    self,
    version_id: Uuid,
    tender_id: Uuid,
    introduced_by: Option<u32>,
    uploaded_at: DateTime<Utc>,
  ) -> DocumentVersion {
    DocumentVersion {
      version_id,
      tender_id,
      document_name: self.document_name,
      version_label: self.version_label,
      file_reference: self.file_reference,
      content_hash: self.content_hash,
      is_current: true,
      superseded_by: None,
      introduced_by,
      uploaded_at,
    }
  }
}

/// What [`VersionChain::introduce`] changed: the previously current row in
/// its new state (if there was one) and the inserted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTransition {
  pub superseded: Option<DocumentVersion>,
  pub introduced: DocumentVersion,
}

// ─── Chain ───────────────────────────────────────────────────────────────────

/// The supersession chain of one document.
#[derive(Debug, Clone, Default)]
pub struct VersionChain {
  document_name: String,
  arena:         HashMap<Uuid, DocumentVersion>,
  /// Ids in upload order.
  order:         Vec<Uuid>,
}

impl VersionChain {
  /// Build a chain from stored rows, given in upload order.
  pub fn new(
    document_name: impl Into<String>,
    rows: impl IntoIterator<Item = DocumentVersion>,
  ) -> Self {
    let mut chain = Self {
      document_name: document_name.into(),
      ..Default::default()
    };
    for row in rows {
      chain.order.push(row.version_id);
      chain.arena.insert(row.version_id, row);
    }
    chain
  }

  pub fn document_name(&self) -> &str { &self.document_name }

  pub fn len(&self) -> usize { self.order.len() }

  pub fn is_empty(&self) -> bool { self.order.is_empty() }

  pub fn get(&self, id: Uuid) -> Option<&DocumentVersion> { self.arena.get(&id) }

  /// All versions, oldest upload first.
  pub fn history(&self) -> impl Iterator<Item = &DocumentVersion> + '_ {
    self.order.iter().filter_map(|id| self.arena.get(id))
  }

  /// The unique current version, or `None` if the document was never
  /// introduced.
  pub fn current(&self) -> Result<Option<&DocumentVersion>, ChainIntegrityError> {
    let mut current = self.history().filter(|v| v.is_current);
    let first = current.next();
    let extra = current.count();
    if extra > 0 {
      return Err(ChainIntegrityError::MultipleCurrent {
        document: self.document_name.clone(),
        count:    extra + 1,
      });
    }
    Ok(first)
  }

  /// Check every structural invariant: at most one current row, no row
  /// superseded by itself, and no cycle in the `superseded_by` links.
  pub fn verify(&self) -> Result<(), ChainIntegrityError> {
    self.current()?;

    for id in &self.order {
      let mut steps = 0;
      let mut cursor = *id;
      while let Some(next) = self.arena.get(&cursor).and_then(|v| v.superseded_by) {
        if next == cursor {
          return Err(ChainIntegrityError::SelfReference(cursor));
        }
        steps += 1;
        if steps > self.order.len() {
          return Err(ChainIntegrityError::Cycle {
            document:   self.document_name.clone(),
            version_id: *id,
          });
        }
        cursor = next;
      }
    }
    Ok(())
  }

  /// Make `new` the current version. The previously current row (if any)
  /// loses its current flag and points at `new`.
  pub fn introduce(
    &mut self,
    mut new: DocumentVersion,
  ) -> Result<ChainTransition, ChainIntegrityError> {
    self.verify()?;

    // An id already in the arena is reachable from the chain; linking to it
    // again would close a loop.
    if self.arena.contains_key(&new.version_id) {
      return Err(ChainIntegrityError::Cycle {
        document:   self.document_name.clone(),
        version_id: new.version_id,
      });
    }

    let previous = self.current()?.map(|v| v.version_id);
    let superseded = match previous {
      Some(prev_id) => {
        let prev = self
          .arena
          .get_mut(&prev_id)
          .ok_or(ChainIntegrityError::SelfReference(prev_id))?;
        prev.is_current = false;
        prev.superseded_by = Some(new.version_id);
        Some(prev.clone())
      }
      None => None,
    };

    new.is_current = true;
    new.superseded_by = None;
    self.order.push(new.version_id);
    self.arena.insert(new.version_id, new.clone());

    Ok(ChainTransition { superseded, introduced: new })
  }
}
