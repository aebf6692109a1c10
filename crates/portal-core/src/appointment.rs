//! Appointments, many per identity, keyed by a store-generated id.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Identity;

/// Lifecycle state of an appointment.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AppointmentStatus {
  #[default]
  Pending,
  Confirmed,
  Cancelled,
  Completed,
}

impl AppointmentStatus {
  pub const ALL: [Self; 4] =
    [Self::Pending, Self::Confirmed, Self::Cancelled, Self::Completed];

  /// Map any stored or user-supplied value onto a valid status.
  ///
  /// Total: unknown strings and `None` become [`Self::Pending`]. Matching is
  /// exact, so `"Confirmed"` is not `confirmed`.
  pub fn normalize(raw: Option<&str>) -> Self {
    raw.and_then(|s| s.parse().ok()).unwrap_or_default()
  }

  pub fn as_str(self) -> &'static str { self.into() }
}

/// A stored appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Appointment {
  pub id:               Uuid,
  pub user_id:          Identity,
  pub doctor_name:      String,
  pub doctor_specialty: Option<String>,
  pub date:             NaiveDate,
  /// Wall-clock time as entered, e.g. `"14:30"`.
  pub time:             String,
  pub reason:           Option<String>,
  pub status:           AppointmentStatus,
  pub notes:            Option<String>,
  pub created_at:       Option<DateTime<Utc>>,
  pub updated_at:       Option<DateTime<Utc>>,
}

/// Input for booking an appointment. The owner, timestamps and id are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAppointment {
  pub doctor_name:      String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub doctor_specialty: Option<String>,
  pub date:             NaiveDate,
  pub time:             String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason:           Option<String>,
  /// Defaults to pending when absent.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status:           Option<AppointmentStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:            Option<String>,
}

impl NewAppointment {
  /// Convenience constructor with all optional fields unset.
  pub fn new(doctor_name: impl Into<String>, date: NaiveDate, time: impl Into<String>) -> Self {
    Self {
      doctor_name: doctor_name.into(),
      doctor_specialty: None,
      date,
      time: time.into(),
      reason: None,
      status: None,
      notes: None,
    }
  }
}

/// A partial appointment write. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppointmentPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub doctor_name:      Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub doctor_specialty: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date:             Option<NaiveDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub time:             Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason:           Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status:           Option<AppointmentStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:            Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_is_total() {
    assert_eq!(AppointmentStatus::normalize(None), AppointmentStatus::Pending);
    assert_eq!(AppointmentStatus::normalize(Some("bogus")), AppointmentStatus::Pending);
    assert_eq!(AppointmentStatus::normalize(Some("")), AppointmentStatus::Pending);
    assert_eq!(
      AppointmentStatus::normalize(Some("confirmed")),
      AppointmentStatus::Confirmed
    );
    assert_eq!(
      AppointmentStatus::normalize(Some("Confirmed")),
      AppointmentStatus::Pending
    );
  }

  #[test]
  fn every_status_round_trips_through_its_name() {
    for status in AppointmentStatus::ALL {
      assert_eq!(AppointmentStatus::normalize(Some(status.as_str())), status);
      assert_eq!(
        serde_json::to_value(status).unwrap(),
        serde_json::Value::from(status.as_str())
      );
    }
  }
}
