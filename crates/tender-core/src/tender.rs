//! The tender, root entity every other record hangs off.
//!
//! The reference number is the golden thread: addendum records arriving from
//! the parser name their tender by reference, never by id.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Where a tender is in the intake pipeline.
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
pub enum ProcessingStatus {
  #[default]
  Pending,
  Processing,
  Completed,
  Failed,
}

/// A tender field that an addendum may overwrite. The string form is also the
/// column name in the `tenders` table and the `field_name` in the ledger.
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
pub enum TenderField {
  Title,
  IssuingAuthority,
  SubmissionDeadline,
  ClarificationClosingDate,
  ProjectStartDate,
  ProjectCompletionDate,
  SiteLocation,
  ContractType,
}

impl TenderField {
  pub const ALL: [TenderField; 8] = [
    Self::Title,
    Self::IssuingAuthority,
    Self::SubmissionDeadline,
    Self::ClarificationClosingDate,
    Self::ProjectStartDate,
    Self::ProjectCompletionDate,
    Self::SiteLocation,
    Self::ContractType,
  ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tender {
  pub tender_id:                  Uuid,
  pub reference_number:           String,
  pub title:                      String,
  pub issuing_authority:          Option<String>,
  pub submission_deadline:        Option<DateTime<Utc>>,
  pub clarification_closing_date: Option<DateTime<Utc>>,
  pub project_start_date:         Option<NaiveDate>,
  pub project_completion_date:    Option<NaiveDate>,
  pub site_location:              Option<String>,
  pub contract_type:              Option<String>,
  pub status:                     ProcessingStatus,
  pub created_at:                 DateTime<Utc>,
  pub updated_at:                 DateTime<Utc>,
}

impl Tender {
  /// Canonical text form of `field`, as stored in the ledger.
  pub fn field_value(&self, field: TenderField) -> Option<String> {
    match field {
      TenderField::Title => Some(self.title.clone()),
      TenderField::IssuingAuthority => self.issuing_authority.clone(),
      TenderField::SubmissionDeadline => {
        self.submission_deadline.map(|d| d.to_rfc3339())
      }
      TenderField::ClarificationClosingDate => {
        self.clarification_closing_date.map(|d| d.to_rfc3339())
      }
      TenderField::ProjectStartDate => {
        self.project_start_date.map(|d| d.to_string())
      }
      TenderField::ProjectCompletionDate => {
        self.project_completion_date.map(|d| d.to_string())
      }
      TenderField::SiteLocation => self.site_location.clone(),
      TenderField::ContractType => self.contract_type.clone(),
    }
  }

  /// Overwrite `field` from its text form. Timestamps are RFC 3339, dates are
  /// `YYYY-MM-DD`. `None` clears the field; the title cannot be cleared.
  pub fn set_field(
    &mut self,
    field: TenderField,
    value: Option<&str>,
  ) -> Result<()> {
    let invalid = |v: &str| Error::InvalidFieldValue {
      field: field.to_string(),
      value: v.to_owned(),
    };

    match field {
      TenderField::Title => match value {
        Some(v) if !v.trim().is_empty() => self.title = v.to_owned(),
        other => return Err(invalid(other.unwrap_or_default())),
      },
      TenderField::IssuingAuthority => {
        self.issuing_authority = value.map(str::to_owned)
      }
      TenderField::SubmissionDeadline => {
        self.submission_deadline = value
          .map(|v| parse_instant(v).ok_or_else(|| invalid(v)))
          .transpose()?
      }
      TenderField::ClarificationClosingDate => {
        self.clarification_closing_date = value
          .map(|v| parse_instant(v).ok_or_else(|| invalid(v)))
          .transpose()?
      }
      TenderField::ProjectStartDate => {
        self.project_start_date = value
          .map(|v| v.parse::<NaiveDate>().map_err(|_| invalid(v)))
          .transpose()?
      }
      TenderField::ProjectCompletionDate => {
        self.project_completion_date = value
          .map(|v| v.parse::<NaiveDate>().map_err(|_| invalid(v)))
          .transpose()?
      }
      TenderField::SiteLocation => self.site_location = value.map(str::to_owned),
      TenderField::ContractType => self.contract_type = value.map(str::to_owned),
    }
    Ok(())
  }
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .ok()
    .map(|dt| dt.with_timezone(&Utc))
}

/// Input to [`crate::store::TenderStore::create_tender`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTender {
  pub reference_number:           String,
  pub title:                      String,
  #[serde(default)]
  pub issuing_authority:          Option<String>,
  #[serde(default)]
  pub submission_deadline:        Option<DateTime<Utc>>,
  #[serde(default)]
  pub clarification_closing_date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub project_start_date:         Option<NaiveDate>,
  #[serde(default)]
  pub project_completion_date:    Option<NaiveDate>,
  #[serde(default)]
  pub site_location:              Option<String>,
  #[serde(default)]
  pub contract_type:              Option<String>,
}

impl NewTender {
  pub fn new(reference_number: impl Into<String>, title: impl Into<String>) -> Self {
    Self {
      reference_number: reference_number.into(),
      title: title.into(),
      ..Default::default()
    }
  }
}
