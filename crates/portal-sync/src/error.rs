//! Error types for `portal-sync`.

use portal_core::{AuthFailure, ParseError, table::Diagnose};
use thiserror::Error;

/// The session lookup failed, or a mutation needed an identity and there was
/// none.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
  #[error("Auth error: {0}")]
  Lookup(String),

  #[error("User not authenticated")]
  Missing,
}

impl From<AuthFailure> for AuthError {
  fn from(failure: AuthFailure) -> Self { Self::Lookup(failure.0) }
}

/// A remote read or write failed.
///
/// Carries the `{message, details, hint, code}` diagnostics of the backend
/// error plus the operation that was being attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to {context}: {message}")]
pub struct PersistenceError {
  pub context: &'static str,
  pub message: String,
  pub details: Option<String>,
  pub hint:    Option<String>,
  pub code:    Option<String>,
}

impl PersistenceError {
  /// Capture and log a backend error.
  pub fn store<E: Diagnose>(context: &'static str, err: &E) -> Self {
    Self {
      context,
      message: err.to_string(),
      details: err.details(),
      hint: err.hint(),
      code: err.code(),
    }
    .logged()
  }

  /// The backend answered, but not with what the operation requires.
  pub fn unexpected(context: &'static str, message: impl Into<String>) -> Self {
    Self {
      context,
      message: message.into(),
      details: None,
      hint: None,
      code: None,
    }
    .logged()
  }

  /// A record could not be encoded as a row.
  pub(crate) fn encoding(context: &'static str, err: serde_json::Error) -> Self {
    Self::unexpected(context, format!("could not encode record: {err}"))
  }

  /// A row returned by a write could not be shaped into its record.
  pub fn malformed(context: &'static str, err: ParseError) -> Self {
    Self::unexpected(context, err.to_string())
  }

  fn logged(self) -> Self {
    tracing::error!(
      context = self.context,
      message = %self.message,
      details = ?self.details,
      hint = ?self.hint,
      code = ?self.code,
      "remote store error"
    );
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error(transparent)]
  Auth(#[from] AuthError),

  #[error(transparent)]
  Persistence(#[from] PersistenceError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
