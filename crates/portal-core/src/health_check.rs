//! Health checks: append-only symptom reports with optional analysis.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Identity;

// ─── Analysis ────────────────────────────────────────────────────────────────

/// One candidate condition from a symptom analysis.
///
/// Keys are camelCase on the wire; stored documents depend on that exact
/// spelling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisCondition {
  pub name:                       String,
  pub description:                String,
  pub matched_symptoms:           Vec<String>,
  pub match_score:                f64,
  pub recommended_actions:        Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub seek_medical_attention:     Option<String>,
  /// Visual features identified in symptom photos.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub visual_diagnostic_features: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub photo_analysis_method:      Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub medical_history_relevance:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub medication_considerations:  Option<String>,
}

// ─── Photos ──────────────────────────────────────────────────────────────────

/// A symptom photo: either a link to remote storage or an inline encoded
/// payload (typically a `data:` URL). Both serialise as a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PhotoRef {
  Url(String),
  Inline(String),
}

impl PhotoRef {
  /// Apply the storage policy to a raw photo value: URLs pass through,
  /// everything else is kept verbatim as an inline payload. Empty values are
  /// dropped.
  pub fn for_storage(raw: &str) -> Option<Self> {
    if raw.is_empty() { None } else { Some(Self::from(raw.to_owned())) }
  }

  pub fn as_str(&self) -> &str {
    match self {
      Self::Url(s) | Self::Inline(s) => s,
    }
  }

  pub fn is_url(&self) -> bool { matches!(self, Self::Url(_)) }
}

impl From<String> for PhotoRef {
  fn from(raw: String) -> Self {
    if raw.starts_with("http") { Self::Url(raw) } else { Self::Inline(raw) }
  }
}

impl From<PhotoRef> for String {
  fn from(photo: PhotoRef) -> Self {
    match photo {
      PhotoRef::Url(s) | PhotoRef::Inline(s) => s,
    }
  }
}

/// Symptom name → photo.
pub type SymptomPhotos = BTreeMap<String, PhotoRef>;

// ─── Records ─────────────────────────────────────────────────────────────────

/// A stored health check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCheck {
  pub id:                     Uuid,
  pub user_id:                Identity,
  pub symptoms:               Vec<String>,
  pub severity:               Option<String>,
  pub duration:               Option<String>,
  pub previous_conditions:    Vec<String>,
  pub medications:            Vec<String>,
  pub notes:                  Option<String>,
  pub created_at:             Option<DateTime<Utc>>,
  pub analysis_results:       Option<Vec<AnalysisCondition>>,
  pub symptom_photos:         Option<SymptomPhotos>,
  pub comprehensive_analysis: bool,
  pub urgency_level:          Option<String>,
  pub overall_assessment:     Option<String>,
}

/// Input for saving a health check.
///
/// Photos are given raw (URL or encoded payload) and pass through
/// [`PhotoRef::for_storage`] on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewHealthCheck {
  pub symptoms:               Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub severity:               Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub duration:               Option<String>,
  pub previous_conditions:    Vec<String>,
  pub medications:            Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:                  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub analysis_results:       Option<Vec<AnalysisCondition>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub symptom_photos:         Option<BTreeMap<String, String>>,
  pub comprehensive_analysis: bool,
  /// Written as null when absent.
  pub urgency_level:          Option<String>,
  /// Written as null when absent.
  pub overall_assessment:     Option<String>,
}

impl NewHealthCheck {
  /// The photo map after the storage policy, or `None` if no photos were
  /// supplied at all.
  pub fn stored_photos(&self) -> Option<SymptomPhotos> {
    self.symptom_photos.as_ref().map(|photos| {
      photos
        .iter()
        .filter_map(|(symptom, raw)| {
          PhotoRef::for_storage(raw).map(|p| (symptom.clone(), p))
        })
        .collect()
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn urls_pass_through_and_payloads_stay_inline() {
    let url = PhotoRef::from("https://cdn.example.com/rash.jpg".to_owned());
    assert!(url.is_url());
    let inline = PhotoRef::from("data:image/png;base64,iVBORw0KGgo=".to_owned());
    assert!(!inline.is_url());
    assert_eq!(inline.as_str(), "data:image/png;base64,iVBORw0KGgo=");
  }

  #[test]
  fn empty_photos_are_dropped_on_storage() {
    let input = NewHealthCheck {
      symptom_photos: Some(BTreeMap::from([
        ("rash".to_owned(), "http://x/rash.png".to_owned()),
        ("cough".to_owned(), String::new()),
      ])),
      ..NewHealthCheck::default()
    };
    let stored = input.stored_photos().unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored["rash"].is_url());
  }

  #[test]
  fn photo_serialises_as_bare_string() {
    let photo = PhotoRef::Inline("abc".into());
    assert_eq!(serde_json::to_value(&photo).unwrap(), serde_json::json!("abc"));
  }
}
