//! Qualification criteria: the eligibility gates of a tender.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// What kind of evidence a criterion is matched against.
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
pub enum CriterionType {
  License,
  Experience,
  Financial,
  Certification,
  Compliance,
}

/// Where a criterion or required document came from.
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
pub enum Source {
  #[default]
  Original,
  Addendum,
  Clarification,
}

/// A criterion field that an addendum may overwrite. The string form is the
/// column name and ledger `field_name`.
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
pub enum CriterionField {
  Description,
  Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationCriterion {
  pub criterion_id:         Uuid,
  pub tender_id:            Uuid,
  pub criterion_type:       CriterionType,
  pub description:          String,
  pub value:                Option<String>,
  /// `None` until the matcher has evaluated the criterion.
  pub is_met:               Option<bool>,
  pub notes:                Option<String>,
  pub checked_at:           Option<DateTime<Utc>>,
  pub source:               Source,
  /// Number of the addendum that introduced this criterion, if any.
  pub introduced_by:        Option<u32>,
  pub requires_recheck:     bool,
  pub added_at:             DateTime<Utc>,
}

impl QualificationCriterion {
  pub fn field_value(&self, field: CriterionField) -> Option<String> {
    match field {
      CriterionField::Description => Some(self.description.clone()),
      CriterionField::Value => self.value.clone(),
    }
  }
}

/// Input to [`crate::store::TenderStore::add_criterion`] for criteria parsed
/// from the original tender documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCriterion {
  pub criterion_type: CriterionType,
  pub description:    String,
  #[serde(default)]
  pub value:          Option<String>,
  #[serde(default)]
  pub is_met:         Option<bool>,
  #[serde(default)]
  pub notes:          Option<String>,
}

impl NewCriterion {
  pub fn new(criterion_type: CriterionType, description: impl Into<String>) -> Self {
    Self {
      criterion_type,
      description: description.into(),
      value: None,
      is_met: None,
      notes: None,
    }
  }
}
