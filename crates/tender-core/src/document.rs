//! Required and received documents, and the completeness summary built from
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::criterion::Source;

/// A document the bidder must (or may) submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredDocument {
  pub requirement_id: Uuid,
  pub tender_id:      Uuid,
  pub name:           String,
  pub category:       Option<String>,
  pub description:    Option<String>,
  pub is_mandatory:   bool,
  pub is_received:    bool,
  pub source:         Source,
  pub introduced_by:  Option<u32>,
  pub added_at:       DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRequiredDocument {
  pub name:         String,
  #[serde(default)]
  pub category:     Option<String>,
  #[serde(default)]
  pub description:  Option<String>,
  #[serde(default = "default_mandatory")]
  pub is_mandatory: bool,
}

fn default_mandatory() -> bool { true }

impl NewRequiredDocument {
  pub fn mandatory(name: impl Into<String>) -> Self {
    Self {
      name:         name.into(),
      category:     None,
      description:  None,
      is_mandatory: true,
    }
  }
}

/// A document that has actually arrived. Always current fact; never tied to
/// an addendum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedDocument {
  pub received_id:    Uuid,
  pub tender_id:      Uuid,
  pub name:           String,
  pub file_reference: Option<String>,
  pub file_size_kb:   Option<u64>,
  pub uploaded_by:    Option<String>,
  pub received_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReceivedDocument {
  pub name:           String,
  #[serde(default)]
  pub file_reference: Option<String>,
  #[serde(default)]
  pub file_size_kb:   Option<u64>,
  #[serde(default)]
  pub uploaded_by:    Option<String>,
  /// Defaults to the time of recording.
  #[serde(default)]
  pub received_at:    Option<DateTime<Utc>>,
}

impl NewReceivedDocument {
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name:           name.into(),
      file_reference: None,
      file_size_kb:   None,
      uploaded_by:    None,
      received_at:    None,
    }
  }
}

/// Counts shown in the report header ("mandatory met 3/5").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentStats {
  pub mandatory_total:    usize,
  pub mandatory_received: usize,
  pub total_required:     usize,
  pub total_received:     usize,
}

impl DocumentStats {
  /// Compute stats by exact name matching, the same rule the completeness
  /// check uses.
  pub fn compute(
    required: &[RequiredDocument],
    received: &[ReceivedDocument],
  ) -> Self {
    let is_in = |name: &str| received.iter().any(|r| r.name == name);
    let mandatory: Vec<_> = required.iter().filter(|d| d.is_mandatory).collect();
    Self {
      mandatory_total:    mandatory.len(),
      mandatory_received: mandatory.iter().filter(|d| is_in(&d.name)).count(),
      total_required:     required.len(),
      total_received:     received.len(),
    }
  }
}

/// Mandatory requirements with no received document of exactly the same name.
/// Matching is case-sensitive; "Site plan" does not satisfy "Site Plan".
pub fn missing_mandatory(
  required: &[RequiredDocument],
  received: &[ReceivedDocument],
) -> Vec<RequiredDocument> {
  required
    .iter()
    .filter(|d| d.is_mandatory)
    .filter(|d| !received.iter().any(|r| r.name == d.name))
    .cloned()
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn required(name: &str, mandatory: bool) -> RequiredDocument {
    RequiredDocument {
      requirement_id: Uuid::new_v4(),
      tender_id:      Uuid::nil(),
      name:           name.into(),
      category:       None,
      description:    None,
      is_mandatory:   mandatory,
      is_received:    false,
      source:         Source::Original,
      introduced_by:  None,
      added_at:       Utc::now(),
    }
  }

  fn received(name: &str) -> ReceivedDocument {
    ReceivedDocument {
      received_id:    Uuid::new_v4(),
      tender_id:      Uuid::nil(),
      name:           name.into(),
      file_reference: None,
      file_size_kb:   None,
      uploaded_by:    None,
      received_at:    Utc::now(),
    }
  }

  #[test]
  fn missing_is_exact_and_case_sensitive() {
    let req = vec![
      required("BOQ", true),
      required("Site Plan", true),
      required("Company Profile", false),
    ];
    let rec = vec![received("BOQ"), received("site plan")];

    let missing = missing_mandatory(&req, &rec);
    let names: Vec<_> = missing.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["Site Plan"]);
  }

  #[test]
  fn stats_count_mandatory_separately() {
    let req = vec![
      required("BOQ", true),
      required("Site Plan", true),
      required("Company Profile", false),
    ];
    let rec = vec![received("BOQ"), received("Company Profile")];

    let stats = DocumentStats::compute(&req, &rec);
    assert_eq!(stats, DocumentStats {
      mandatory_total:    2,
      mandatory_received: 1,
      total_required:     3,
      total_received:     2,
    });
  }
}
