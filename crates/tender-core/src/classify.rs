//! Keyword classification of amendment requirement sentences.
//!
//! Everything here is a pure function of its input text. Storage never enters
//! the picture, so the rules can be exercised directly in unit tests.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::criterion::CriterionType;

// ─── Effects ─────────────────────────────────────────────────────────────────

/// One structural consequence a requirement sentence can have.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Effect {
  RequiredDocument,
  QualificationCriterion,
  DocumentVersionUpdate,
  FieldChange,
}

/// The set of effects for one sentence. Never empty: text that matches no
/// rule falls back to [`Effect::QualificationCriterion`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectSet(BTreeSet<Effect>);

impl EffectSet {
  pub fn contains(&self, effect: Effect) -> bool { self.0.contains(&effect) }

  pub fn iter(&self) -> impl Iterator<Item = Effect> + '_ {
    self.0.iter().copied()
  }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// Both a submission obligation and an eligibility gate.
  pub fn is_dual_nature(&self) -> bool {
    self.contains(Effect::RequiredDocument)
      && self.contains(Effect::QualificationCriterion)
  }
}

impl<const N: usize> From<[Effect; N]> for EffectSet {
  fn from(effects: [Effect; N]) -> Self { Self(effects.into_iter().collect()) }
}

// ─── Keyword tables ──────────────────────────────────────────────────────────

const DOCUMENT_ACTION: &[&str] =
  &["submit", "provide", "attach", "enclose", "upload", "deliver"];

const CAPABILITY: &[&str] = &[
  "must have",
  "must possess",
  "minimum",
  "certified",
  "licensed",
  "experience in",
];

const REVISION: &[&str] = &["updated", "revised"];

const FIELD_EDIT: &[&str] = &[
  "extended",
  "postponed",
  "brought forward",
  "changed to",
  "amended to",
];

/// Words dropped from the front of a document name hint.
const LEADING_FILLER: &[&str] = &[
  "a", "an", "the", "updated", "revised", "new", "copy of", "copies of",
  "their", "its", "your",
];

/// Words or punctuation at which a document name hint is cut.
const NAME_STOPS: &[&str] = &[
  " certified", " signed", " by ", " for ", " within", " to ", " from ",
  " prior", " before", " no later", " endorsed", " duly", " which", " that ",
  ",", ";", ".",
];

// ─── Classification ──────────────────────────────────────────────────────────

fn mentions(text: &str, words: &[&str]) -> bool {
  words.iter().any(|w| text.contains(w))
}

/// Classify a normalized requirement sentence.
///
/// Rules, applied to the lowercased sentence:
///
/// - a document-action keyword yields [`Effect::RequiredDocument`];
/// - a capability keyword yields [`Effect::QualificationCriterion`];
/// - a revision keyword yields [`Effect::DocumentVersionUpdate`], unless the
///   sentence demands a submission ("submit an updated X" asks the bidder for
///   a document rather than revising one the tender issued);
/// - a field-edit keyword yields [`Effect::FieldChange`];
/// - nothing matched yields [`Effect::QualificationCriterion`].
pub fn classify(sentence: &str) -> EffectSet {
  let text = sentence.to_lowercase();
  let mut effects = BTreeSet::new();

  let demands_document = mentions(&text, DOCUMENT_ACTION);
  if demands_document {
    effects.insert(Effect::RequiredDocument);
  }
  if mentions(&text, CAPABILITY) {
    effects.insert(Effect::QualificationCriterion);
  }
  if !demands_document && mentions(&text, REVISION) {
    effects.insert(Effect::DocumentVersionUpdate);
  }
  if mentions(&text, FIELD_EDIT) {
    effects.insert(Effect::FieldChange);
  }

  if effects.is_empty() {
    effects.insert(Effect::QualificationCriterion);
  }
  EffectSet(effects)
}

// ─── Hints ───────────────────────────────────────────────────────────────────

/// Best-effort document name for a sentence classified as
/// [`Effect::RequiredDocument`]: the phrase after the first document-action
/// keyword, minus leading articles, cut at the first qualifier. Falls back to
/// the whole trimmed sentence.
pub fn document_name_hint(sentence: &str) -> String {
  // ASCII lowercasing keeps byte offsets aligned with `sentence`.
  let lower = sentence.to_ascii_lowercase();

  let Some((pos, verb)) = DOCUMENT_ACTION
    .iter()
    .filter_map(|v| lower.find(v).map(|p| (p, *v)))
    .min_by_key(|(p, _)| *p)
  else {
    return sentence.trim().to_owned();
  };

  // Skip the rest of the verb ("submits", "provided") up to the next space.
  let after_verb = pos + verb.len();
  let start = lower[after_verb..]
    .find(' ')
    .map(|i| after_verb + i + 1)
    .unwrap_or(lower.len());

  let mut phrase = &sentence[start..];
  let mut phrase_lower = &lower[start..];

  loop {
    let trimmed = phrase_lower.trim_start();
    let skipped = phrase_lower.len() - trimmed.len();
    phrase = &phrase[skipped..];
    phrase_lower = trimmed;

    let Some(filler) = LEADING_FILLER
      .iter()
      .find(|f| phrase_lower.starts_with(**f) && phrase_lower[f.len()..].starts_with(' '))
    else {
      break;
    };
    phrase = &phrase[filler.len()..];
    phrase_lower = &phrase_lower[filler.len()..];
  }

  let end = NAME_STOPS
    .iter()
    .filter_map(|s| phrase_lower.find(s))
    .min()
    .unwrap_or(phrase.len());

  let name = phrase[..end].trim();
  if name.is_empty() {
    sentence.trim().to_owned()
  } else {
    name.to_owned()
  }
}

/// Best-effort criterion type for a sentence classified as
/// [`Effect::QualificationCriterion`].
pub fn criterion_type_hint(sentence: &str) -> CriterionType {
  let text = sentence.to_lowercase();
  if text.contains("licen") {
    CriterionType::License
  } else if text.contains("certif") || text.contains("iso ") {
    CriterionType::Certification
  } else if text.contains("experience") || text.contains("project") {
    CriterionType::Experience
  } else if mentions(&text, &["turnover", "capital", "net worth", "financial", "$"])
  {
    CriterionType::Financial
  } else {
    CriterionType::Compliance
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAFETY: &str = "Contractor must submit an updated Safety Risk \
                        Assessment certified by a licensed engineer";

  #[test]
  fn dual_nature_sentence() {
    let effects = classify(SAFETY);
    assert_eq!(
      effects,
      EffectSet::from([Effect::RequiredDocument, Effect::QualificationCriterion])
    );
    assert!(effects.is_dual_nature());
  }

  #[test]
  fn document_only() {
    let effects = classify("Tenderers shall enclose the signed Form of Tender.");
    assert_eq!(effects, EffectSet::from([Effect::RequiredDocument]));
  }

  #[test]
  fn capability_only() {
    let effects =
      classify("Tenderer must possess a valid BCA L6 registration.");
    assert_eq!(effects, EffectSet::from([Effect::QualificationCriterion]));
  }

  #[test]
  fn revision_of_issued_document() {
    let effects = classify("The BOQ template has been revised to v2.0.");
    assert_eq!(effects, EffectSet::from([Effect::DocumentVersionUpdate]));
  }

  #[test]
  fn field_edit() {
    let effects =
      classify("The submission deadline is extended to 22 December 2025.");
    assert_eq!(effects, EffectSet::from([Effect::FieldChange]));
  }

  #[test]
  fn unmatched_text_defaults_to_criterion() {
    let effects = classify("Valid MOM work permits for all foreign workers.");
    assert_eq!(effects, EffectSet::from([Effect::QualificationCriterion]));
    assert!(!classify("").is_empty());
  }

  #[test]
  fn keywords_are_case_insensitive() {
    let effects = classify("PROVIDE MINIMUM THREE REFERENCES");
    assert!(effects.is_dual_nature());
  }

  #[test]
  fn document_name_from_dual_sentence() {
    assert_eq!(document_name_hint(SAFETY), "Safety Risk Assessment");
  }

  #[test]
  fn document_name_strips_articles_and_stops_at_punctuation() {
    assert_eq!(
      document_name_hint("Bidders shall provide the Site Plan, drawn to scale."),
      "Site Plan"
    );
    assert_eq!(
      document_name_hint("Please attach a copy of the Method Statement"),
      "Method Statement"
    );
  }

  #[test]
  fn document_name_falls_back_to_sentence() {
    assert_eq!(
      document_name_hint("  Performance bond required  "),
      "Performance bond required"
    );
  }

  #[test]
  fn criterion_types() {
    assert_eq!(criterion_type_hint(SAFETY), CriterionType::License);
    assert_eq!(
      criterion_type_hint("ISO 9001:2015 certified quality system"),
      CriterionType::Certification
    );
    assert_eq!(
      criterion_type_hint("Minimum 3 completed projects above $2M"),
      CriterionType::Experience
    );
    assert_eq!(
      criterion_type_hint("Minimum annual turnover of $5M"),
      CriterionType::Financial
    );
    assert_eq!(
      criterion_type_hint("Valid MOM work permits for all foreign workers"),
      CriterionType::Compliance
    );
  }
}
