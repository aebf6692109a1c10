//! Error types for `portal-core`.

use thiserror::Error;

/// A remote row could not be shaped into a record at all.
///
/// Field-level damage (an unknown status, a malformed `analysis_results`
/// document) never produces this error; it is absorbed by the normalizers and
/// reported through [`crate::Decoded::discarded`]. Only rows missing the
/// structural fields a record cannot exist without end up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {entity} row: {reason}")]
pub struct ParseError {
  pub entity: &'static str,
  pub reason: String,
}

impl ParseError {
  pub fn new(entity: &'static str, reason: impl ToString) -> Self {
    Self { entity, reason: reason.to_string() }
  }
}

/// The auth collaborator failed while looking up the current session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("auth error: {0}")]
pub struct AuthFailure(pub String);

pub type Result<T, E = ParseError> = std::result::Result<T, E>;
