//! Editable profile form model.
//!
//! Every field is plain text so it can be bound straight to an input; blank
//! means "not filled in". The form converts to and from the stored profile,
//! mapping the displayed `city` onto the persisted `region`.

use chrono::NaiveDate;
use portal_core::{
  AuthProvider, TableStore,
  notify::{Notification, Variant},
  profile::{Profile, ProfileUpdate},
};
use thiserror::Error;

use crate::{error::Error, profile::ProfileStore};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
  #[error("date of birth {0:?} is not a YYYY-MM-DD date")]
  DateOfBirth(String),

  #[error(transparent)]
  Save(#[from] Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
  pub first_name:                     String,
  pub last_name:                      String,
  pub date_of_birth:                  String,
  pub gender:                         String,
  pub phone:                          String,
  pub address:                        String,
  pub city:                           String,
  pub medical_history:                String,
  pub allergies:                      String,
  pub medications:                    String,
  pub emergency_contact_name:         String,
  pub emergency_contact_relationship: String,
  pub emergency_contact_phone:        String,
}

impl ProfileForm {
  /// Fill the form from a stored profile; a missing profile gives a blank
  /// form.
  pub fn from_profile(profile: Option<&Profile>) -> Self {
    let Some(p) = profile else {
      return Self::default();
    };
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    Self {
      first_name:                     text(&p.first_name),
      last_name:                      text(&p.last_name),
      date_of_birth:                  p.date_of_birth.map(|d| d.to_string()).unwrap_or_default(),
      gender:                         text(&p.gender),
      phone:                          text(&p.phone),
      address:                        text(&p.address),
      city:                           text(&p.city),
      medical_history:                text(&p.medical_history),
      allergies:                      text(&p.allergies),
      medications:                    text(&p.medications),
      emergency_contact_name:         text(&p.emergency_contact_name),
      emergency_contact_relationship: text(&p.emergency_contact_relationship),
      emergency_contact_phone:        text(&p.emergency_contact_phone),
    }
  }

  /// The partial update this form saves.
  ///
  /// Text fields are written as entered, so clearing one clears it remotely.
  /// A blank date of birth is left untouched; a filled-in one must parse.
  pub fn to_update(&self) -> Result<ProfileUpdate, FormError> {
    let dob = self.date_of_birth.trim();
    let date_of_birth = if dob.is_empty() {
      None
    } else {
      let parsed = NaiveDate::parse_from_str(dob, "%Y-%m-%d")
        .map_err(|_| FormError::DateOfBirth(self.date_of_birth.clone()))?;
      Some(parsed)
    };

    Ok(ProfileUpdate {
      first_name: Some(self.first_name.clone()),
      last_name: Some(self.last_name.clone()),
      date_of_birth,
      gender: Some(self.gender.clone()),
      phone: Some(self.phone.clone()),
      address: Some(self.address.clone()),
      city: Some(self.city.clone()),
      medical_history: Some(self.medical_history.clone()),
      allergies: Some(self.allergies.clone()),
      medications: Some(self.medications.clone()),
      emergency_contact_name: Some(self.emergency_contact_name.clone()),
      emergency_contact_relationship: Some(self.emergency_contact_relationship.clone()),
      emergency_contact_phone: Some(self.emergency_contact_phone.clone()),
    })
  }
}

// ─── Password ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordChange {
  pub password: String,
  pub confirm:  String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordOutcome {
  /// No new password was entered.
  Unchanged,
  Mismatch,
  /// The passwords match, but changing them is not supported.
  Unsupported,
}

impl PasswordChange {
  pub fn check(&self) -> PasswordOutcome {
    if self.password.is_empty() {
      PasswordOutcome::Unchanged
    } else if self.password == self.confirm {
      PasswordOutcome::Unsupported
    } else {
      PasswordOutcome::Mismatch
    }
  }
}

impl PasswordOutcome {
  fn notification(self) -> Option<Notification> {
    match self {
      Self::Unchanged => None,
      Self::Mismatch => {
        Some(Notification::new("Password Mismatch", "Passwords do not match", Variant::Destructive))
      }
      Self::Unsupported => Some(Notification::new(
        "Password Change Not Implemented",
        "Password change functionality is not implemented",
        Variant::Default,
      )),
    }
  }
}

// ─── Submit ──────────────────────────────────────────────────────────────────

/// Save the form through `store`, then report on the password fields.
///
/// The password notification is only emitted once the profile save
/// succeeded.
pub async fn submit<T: TableStore, A: AuthProvider>(
  store: &mut ProfileStore<T, A>,
  form: &ProfileForm,
  password: &PasswordChange,
) -> Result<(Profile, PasswordOutcome), FormError> {
  let update = match form.to_update() {
    Ok(update) => update,
    Err(e) => {
      store.notify(Notification::error(e.to_string()));
      return Err(e);
    }
  };
  let profile = store.update(&update).await?;

  let outcome = password.check();
  if let Some(n) = outcome.notification() {
    store.notify(n);
  }
  Ok((profile, outcome))
}
