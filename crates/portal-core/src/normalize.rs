//! Normalizers: total decode functions from loosely-shaped remote rows into
//! typed records.
//!
//! Rows come back from the remote store with drifting shapes: statuses outside
//! the known set, structured columns delivered either as native JSON or as
//! JSON-encoded text, sub-fields missing from older documents. Field-level
//! damage is absorbed here and reported through [`Decoded::discarded`]; only a
//! row that lacks the structural fields of its record yields a [`ParseError`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use crate::{
  Identity, ParseError,
  appointment::{Appointment, AppointmentStatus},
  health_check::{AnalysisCondition, HealthCheck, PhotoRef, SymptomPhotos},
  profile::Profile,
  table::Row,
};

// ─── Decoded ─────────────────────────────────────────────────────────────────

/// A best-effort record plus the names of the fields that were dropped or
/// coerced on the way in.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
  pub value:     T,
  pub discarded: Vec<&'static str>,
}

impl<T> Decoded<T> {
  fn new(value: T, discarded: Vec<&'static str>) -> Self {
    Self { value, discarded }
  }

  /// `true` if nothing was dropped or coerced.
  pub fn is_lossless(&self) -> bool { self.discarded.is_empty() }

  pub fn into_inner(self) -> T { self.value }
}

fn shape<T: DeserializeOwned>(entity: &'static str, row: Row) -> Result<T, ParseError> {
  serde_json::from_value(Value::Object(row)).map_err(|e| ParseError::new(entity, e))
}

// ─── Field repair ────────────────────────────────────────────────────────────

/// Repairs the optional fields of a row in place so that only the structural
/// ones can still fail shaping. Every lossy change is recorded.
struct Repair {
  row:       Row,
  discarded: Vec<&'static str>,
}

impl Repair {
  fn new(row: Row) -> Self { Self { row, discarded: Vec::new() } }

  fn note(&mut self, field: &'static str) {
    if !self.discarded.contains(&field) {
      self.discarded.push(field);
    }
  }

  /// Present and not null.
  fn present(&self, field: &str) -> Option<&Value> {
    self.row.get(field).filter(|v| !v.is_null())
  }

  fn drop_field(&mut self, field: &'static str) {
    self.row.remove(field);
    self.note(field);
  }

  fn replace(&mut self, field: &'static str, value: Value) {
    self.row.insert(field.to_owned(), value);
    self.note(field);
  }

  /// Scalars are stringified; objects and arrays are dropped.
  fn text(&mut self, fields: &[&'static str]) {
    for &field in fields {
      match self.present(field) {
        None | Some(Value::String(_)) => {}
        Some(Value::Number(n)) => {
          let n = n.to_string();
          self.replace(field, Value::String(n));
        }
        Some(Value::Bool(b)) => {
          let b = b.to_string();
          self.replace(field, Value::String(b));
        }
        Some(_) => self.drop_field(field),
      }
    }
  }

  /// Timestamps are rewritten as RFC 3339. Offset-less ones are read as UTC
  /// and recorded; anything unparseable is dropped.
  fn timestamps(&mut self, fields: &[&'static str]) {
    for &field in fields {
      let Some(value) = self.present(field) else { continue };
      match value.as_str().and_then(parse_timestamp) {
        Some((at, exact)) => {
          self.row.insert(field.to_owned(), Value::String(at.to_rfc3339()));
          if !exact {
            self.note(field);
          }
        }
        None => self.drop_field(field),
      }
    }
  }

  /// Keep only the string entries of a list column.
  fn string_lists(&mut self, fields: &[&'static str]) {
    for &field in fields {
      let Some(value) = self.present(field) else { continue };
      let Some(items) = value.as_array() else {
        self.drop_field(field);
        continue;
      };
      if items.iter().all(Value::is_string) {
        continue;
      }
      let kept: Vec<Value> = items.iter().filter(|v| v.is_string()).cloned().collect();
      self.replace(field, Value::Array(kept));
    }
  }

  fn flag(&mut self, field: &'static str) {
    if self.present(field).is_some_and(|v| !v.is_boolean()) {
      self.drop_field(field);
    }
  }

  fn date(&mut self, field: &'static str) {
    let ok = match self.present(field) {
      None => true,
      Some(Value::String(s)) => s.parse::<NaiveDate>().is_ok(),
      Some(_) => false,
    };
    if !ok {
      self.drop_field(field);
    }
  }

  fn shape<T: DeserializeOwned>(
    self,
    entity: &'static str,
  ) -> Result<(T, Vec<&'static str>), ParseError> {
    Ok((shape(entity, self.row)?, self.discarded))
  }
}

/// Parse a stored timestamp. The flag is `false` when the value carried no
/// offset and was taken as UTC.
fn parse_timestamp(s: &str) -> Option<(DateTime<Utc>, bool)> {
  let with_offset = DateTime::parse_from_rfc3339(s)
    .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z"));
  if let Ok(at) = with_offset {
    return Some((at.with_timezone(&Utc), true));
  }
  ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .map(|naive| (naive.and_utc(), false))
}

const TIMESTAMPS: [&str; 2] = ["created_at", "updated_at"];

// ─── Profile ─────────────────────────────────────────────────────────────────

/// Decode a `profiles` row. Only a missing or unusable `id` fails it; damaged
/// optional fields are dropped or coerced.
pub fn decode_profile(row: Row) -> Result<Decoded<Profile>, ParseError> {
  let mut repair = Repair::new(row);
  repair.date("date_of_birth");
  repair.text(&[
    "first_name",
    "last_name",
    "gender",
    "phone",
    "address",
    "region",
    "medical_history",
    "allergies",
    "medications",
    "emergency_contact_name",
    "emergency_contact_relationship",
    "emergency_contact_phone",
  ]);
  repair.timestamps(&TIMESTAMPS);
  let (profile, discarded) = repair.shape("profile")?;
  Ok(Decoded::new(profile, discarded))
}

// ─── Appointment ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawAppointment {
  id:               Uuid,
  user_id:          Identity,
  doctor_name:      Option<String>,
  doctor_specialty: Option<String>,
  date:             NaiveDate,
  time:             Option<String>,
  reason:           Option<String>,
  status:           Option<Value>,
  notes:            Option<String>,
  created_at:       Option<DateTime<Utc>>,
  updated_at:       Option<DateTime<Utc>>,
}

/// Map a raw status value onto a valid status. Total; see
/// [`AppointmentStatus::normalize`].
pub fn normalize_status(raw: Option<&Value>) -> AppointmentStatus {
  AppointmentStatus::normalize(raw.and_then(Value::as_str))
}

/// Decode an `appointments` row, coercing the status.
pub fn decode_appointment(row: Row) -> Result<Decoded<Appointment>, ParseError> {
  let mut repair = Repair::new(row);
  repair.text(&["doctor_name", "doctor_specialty", "time", "reason", "notes"]);
  repair.timestamps(&TIMESTAMPS);
  let (raw, mut discarded): (RawAppointment, _) = repair.shape("appointment")?;

  let status = normalize_status(raw.status.as_ref());
  let status_was_valid = matches!(
    &raw.status,
    Some(Value::String(s)) if s.as_str() == status.as_str()
  );
  if !status_was_valid {
    discarded.push("status");
  }
  let missing = [("doctor_name", raw.doctor_name.is_none()), ("time", raw.time.is_none())];
  for (field, missing) in missing {
    if missing && !discarded.contains(&field) {
      discarded.push(field);
    }
  }

  let appointment = Appointment {
    id:               raw.id,
    user_id:          raw.user_id,
    doctor_name:      raw.doctor_name.unwrap_or_default(),
    doctor_specialty: raw.doctor_specialty,
    date:             raw.date,
    time:             raw.time.unwrap_or_default(),
    reason:           raw.reason,
    status,
    notes:            raw.notes,
    created_at:       raw.created_at,
    updated_at:       raw.updated_at,
  };
  Ok(Decoded::new(appointment, discarded))
}

// ─── Health check ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawHealthCheck {
  id:                     Uuid,
  user_id:                Identity,
  symptoms:               Option<Vec<String>>,
  severity:               Option<String>,
  duration:               Option<String>,
  previous_conditions:    Option<Vec<String>>,
  medications:            Option<Vec<String>>,
  notes:                  Option<String>,
  created_at:             Option<DateTime<Utc>>,
  #[serde(default)]
  analysis_results:       Value,
  #[serde(default)]
  symptom_photos:         Value,
  comprehensive_analysis: Option<bool>,
  urgency_level:          Option<String>,
  overall_assessment:     Option<String>,
}

/// Decode a `health_checks` row. `analysis_results` and `symptom_photos` are
/// accepted as native JSON or JSON-encoded text; if either cannot be decoded
/// it is left absent and reported as discarded.
pub fn decode_health_check(row: Row) -> Result<Decoded<HealthCheck>, ParseError> {
  let mut repair = Repair::new(row);
  repair.string_lists(&["symptoms", "previous_conditions", "medications"]);
  repair.text(&["severity", "duration", "notes", "urgency_level", "overall_assessment"]);
  repair.timestamps(&["created_at"]);
  repair.flag("comprehensive_analysis");
  let (raw, mut discarded): (RawHealthCheck, _) = repair.shape("health check")?;

  let analysis_results = parse_analysis_results(&raw.analysis_results);
  if analysis_results.is_none() && !raw.analysis_results.is_null() {
    discarded.push("analysis_results");
  }
  let symptom_photos = parse_symptom_photos(&raw.symptom_photos);
  if symptom_photos.is_none() && !raw.symptom_photos.is_null() {
    discarded.push("symptom_photos");
  }

  let check = HealthCheck {
    id: raw.id,
    user_id: raw.user_id,
    symptoms: raw.symptoms.unwrap_or_default(),
    severity: raw.severity,
    duration: raw.duration,
    previous_conditions: raw.previous_conditions.unwrap_or_default(),
    medications: raw.medications.unwrap_or_default(),
    notes: raw.notes,
    created_at: raw.created_at,
    analysis_results,
    symptom_photos,
    comprehensive_analysis: raw.comprehensive_analysis.unwrap_or(false),
    urgency_level: raw.urgency_level,
    overall_assessment: raw.overall_assessment,
  };
  Ok(Decoded::new(check, discarded))
}

/// Materialise `analysis_results` from either an array of loosely-typed
/// objects or a JSON-encoded string of one.
///
/// Returns `None` for null, for undecodable text and for anything that is not
/// a list. Individual entries never fail: missing sub-fields default to empty
/// strings, empty lists and a zero score.
pub fn parse_analysis_results(value: &Value) -> Option<Vec<AnalysisCondition>> {
  match value {
    Value::Array(items) => Some(items.iter().map(condition_from_value).collect()),
    Value::String(text) => match serde_json::from_str::<Value>(text) {
      Ok(Value::Array(items)) => {
        Some(items.iter().map(condition_from_value).collect())
      }
      Ok(_) => None,
      Err(e) => {
        tracing::warn!(error = %e, "failed to parse analysis_results");
        None
      }
    },
    _ => None,
  }
}

/// Materialise `symptom_photos` from either a JSON object or a JSON-encoded
/// string of one. Non-string entries are skipped.
pub fn parse_symptom_photos(value: &Value) -> Option<SymptomPhotos> {
  let decoded;
  let map = match value {
    Value::Object(map) => map,
    Value::String(text) => {
      decoded = match serde_json::from_str::<Value>(text) {
        Ok(v) => v,
        Err(e) => {
          tracing::warn!(error = %e, "failed to parse symptom_photos");
          return None;
        }
      };
      decoded.as_object()?
    }
    _ => return None,
  };

  Some(
    map
      .iter()
      .filter_map(|(symptom, photo)| {
        photo
          .as_str()
          .map(|p| (symptom.clone(), PhotoRef::from(p.to_owned())))
      })
      .collect(),
  )
}

fn condition_from_value(item: &Value) -> AnalysisCondition {
  let field = |key: &str| item.get(key);
  AnalysisCondition {
    name:                       text(field("name")),
    description:                text(field("description")),
    matched_symptoms:           text_list(field("matchedSymptoms")).unwrap_or_default(),
    match_score:                score(field("matchScore")),
    recommended_actions:        text_list(field("recommendedActions")).unwrap_or_default(),
    seek_medical_attention:     non_empty(field("seekMedicalAttention")),
    visual_diagnostic_features: text_list(field("visualDiagnosticFeatures")),
    photo_analysis_method:      non_empty(field("photoAnalysisMethod")),
    medical_history_relevance:  non_empty(field("medicalHistoryRelevance")),
    medication_considerations:  non_empty(field("medicationConsiderations")),
  }
}

/// Text form of a scalar; falsy values, objects and arrays become `""`.
fn text(value: Option<&Value>) -> String {
  match value {
    Some(Value::String(s)) => s.clone(),
    Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
    Some(Value::Bool(true)) => "true".to_owned(),
    _ => String::new(),
  }
}

fn non_empty(value: Option<&Value>) -> Option<String> {
  Some(text(value)).filter(|s| !s.is_empty())
}

/// A list of text values; scalars are stringified, other entries dropped.
/// `None` if the value is not a list.
fn text_list(value: Option<&Value>) -> Option<Vec<String>> {
  let items = value?.as_array()?;
  Some(
    items
      .iter()
      .filter_map(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
      })
      .collect(),
  )
}

fn score(value: Option<&Value>) -> f64 {
  let n = match value {
    Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
    Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
    Some(Value::Bool(true)) => 1.0,
    _ => 0.0,
  };
  if n.is_finite() { n } else { 0.0 }
}
