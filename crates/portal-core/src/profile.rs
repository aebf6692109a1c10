//! Patient profile: one row per identity in `profiles`.
//!
//! The UI calls the patient's location "city"; the persisted schema calls it
//! `region`. The rename lives on the serde boundary of both [`Profile`] and
//! [`ProfileUpdate`], so every read and write translates it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::Identity;

/// A stored profile as returned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  /// The owning identity; also the primary key.
  pub id:                             Identity,
  pub first_name:                     Option<String>,
  pub last_name:                      Option<String>,
  pub date_of_birth:                  Option<NaiveDate>,
  /// Free-form; not a closed set at storage level.
  pub gender:                         Option<String>,
  pub phone:                          Option<String>,
  pub address:                        Option<String>,
  /// Persisted as `region`.
  #[serde(rename = "region")]
  pub city:                           Option<String>,
  pub medical_history:                Option<String>,
  pub allergies:                      Option<String>,
  pub medications:                    Option<String>,
  pub emergency_contact_name:         Option<String>,
  pub emergency_contact_relationship: Option<String>,
  pub emergency_contact_phone:        Option<String>,
  pub created_at:                     Option<DateTime<Utc>>,
  pub updated_at:                     Option<DateTime<Utc>>,
}

/// A partial profile write. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_name:                     Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_name:                      Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date_of_birth:                  Option<NaiveDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gender:                         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone:                          Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub address:                        Option<String>,
  #[serde(rename = "region", skip_serializing_if = "Option::is_none")]
  pub city:                           Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub medical_history:                Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub allergies:                      Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub medications:                    Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub emergency_contact_name:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub emergency_contact_relationship: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub emergency_contact_phone:        Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::table::to_row;

  #[test]
  fn city_is_written_as_region() {
    let update = ProfileUpdate {
      city: Some("Paris".into()),
      ..ProfileUpdate::default()
    };
    let row = to_row(&update).unwrap();
    assert_eq!(row.get("region").and_then(|v| v.as_str()), Some("Paris"));
    assert!(!row.contains_key("city"));
    assert_eq!(row.len(), 1);
  }

  #[test]
  fn region_is_read_as_city() {
    let profile: Profile = serde_json::from_value(serde_json::json!({
      "id": "user-1",
      "region": "Lyon",
    }))
    .unwrap();
    assert_eq!(profile.city.as_deref(), Some("Lyon"));
    assert_eq!(profile.first_name, None);
  }
}
