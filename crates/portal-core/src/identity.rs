//! The authenticated principal and the auth seam that yields it.

use std::{fmt, future::Future};

use serde::{Deserialize, Serialize};

use crate::AuthFailure;

/// Opaque key naming the authenticated principal.
///
/// Used as the primary key of `profiles` and the foreign key (`user_id`) of
/// every other table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Identity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&Identity> for serde_json::Value {
  fn from(id: &Identity) -> Self { serde_json::Value::String(id.0.clone()) }
}

impl From<Identity> for serde_json::Value {
  fn from(id: Identity) -> Self { serde_json::Value::String(id.0) }
}

/// Source of the current user's identity.
///
/// `Ok(None)` means "nobody is signed in" and is not an error; `Err` means the
/// session lookup itself failed.
pub trait AuthProvider: Send + Sync {
  fn current_user(
    &self,
  ) -> impl Future<Output = Result<Option<Identity>, AuthFailure>> + Send + '_;
}

/// A session fixed at construction time, e.g. from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
  user: Option<Identity>,
}

impl StaticSession {
  pub fn signed_in(user: Identity) -> Self { Self { user: Some(user) } }

  pub fn anonymous() -> Self { Self { user: None } }
}

impl AuthProvider for StaticSession {
  async fn current_user(&self) -> Result<Option<Identity>, AuthFailure> {
    Ok(self.user.clone())
  }
}
