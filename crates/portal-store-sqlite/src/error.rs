//! Error type for `portal-store-sqlite`.

use portal_core::table::Diagnose;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A query or write named a column the table does not have.
  #[error("column {column:?} does not exist on table {table}")]
  UnknownColumn { table: &'static str, column: String },

  /// A value of the wrong JSON type was written to a column.
  #[error("column {table}.{column} cannot hold a {found} value")]
  ColumnType {
    table:  &'static str,
    column: &'static str,
    found:  &'static str,
  },

  /// A stored value does not match its column's declared kind.
  #[error("column {table}.{column} holds an unexpected {found} value")]
  Corrupt {
    table:  &'static str,
    column: &'static str,
    found:  &'static str,
  },
}

impl Error {
  fn sqlite_failure(&self) -> Option<(&rusqlite::ffi::Error, Option<&String>)> {
    match self {
      Error::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::SqliteFailure(e, msg),
      )) => Some((e, msg.as_ref())),
      _ => None,
    }
  }
}

impl Diagnose for Error {
  fn details(&self) -> Option<String> {
    self.sqlite_failure().and_then(|(_, msg)| msg.cloned())
  }

  fn hint(&self) -> Option<String> {
    match self {
      Error::UnknownColumn { table, .. } => {
        Some(format!("check the record against the {table} schema"))
      }
      _ => None,
    }
  }

  fn code(&self) -> Option<String> {
    self
      .sqlite_failure()
      .map(|(e, _)| format!("{:?}/{}", e.code, e.extended_code))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
