//! Error type for `portal-postgrest`.

use portal_core::table::Diagnose;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The server answered with a non-success status.
  #[error("{message}")]
  Api {
    status:  u16,
    message: String,
    details: Option<String>,
    hint:    Option<String>,
    code:    Option<String>,
  },

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// A count request came back without a usable `Content-Range` total.
  #[error("missing or malformed Content-Range header: {0:?}")]
  ContentRange(Option<String>),
}

/// The `{message, details, hint, code}` body of a failed request.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
  #[serde(default, alias = "msg", alias = "error_description")]
  message: Option<String>,
  #[serde(default)]
  details: Option<String>,
  #[serde(default)]
  hint:    Option<String>,
  #[serde(default)]
  code:    Option<serde_json::Value>,
}

impl Error {
  /// Build an [`Error::Api`] from a failed response, falling back to the raw
  /// body (or the status text) when it is not the usual JSON shape.
  pub(crate) async fn from_response(resp: reqwest::Response) -> Self {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

    let message = body
      .message
      .filter(|m| !m.is_empty())
      .or_else(|| (!text.is_empty()).then(|| text.clone()))
      .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_owned());
    let code = body.code.map(|c| match c {
      serde_json::Value::String(s) => s,
      other => other.to_string(),
    });

    Error::Api { status: status.as_u16(), message, details: body.details, hint: body.hint, code }
  }
}

impl Diagnose for Error {
  fn details(&self) -> Option<String> {
    match self {
      Error::Api { details, .. } => details.clone(),
      Error::Http(e) => e.url().map(|u| format!("request to {u}")),
      Error::ContentRange(_) => None,
    }
  }

  fn hint(&self) -> Option<String> {
    match self {
      Error::Api { hint, .. } => hint.clone(),
      _ => None,
    }
  }

  fn code(&self) -> Option<String> {
    match self {
      Error::Api { code: Some(code), .. } => Some(code.clone()),
      Error::Api { status, .. } => Some(status.to_string()),
      Error::Http(e) => e.status().map(|s| s.as_u16().to_string()),
      Error::ContentRange(_) => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
