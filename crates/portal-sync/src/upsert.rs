//! Existence-checked upsert keyed by identity.
//!
//! The existence check and the write are two separate remote calls. Two
//! first-time saves racing for the same identity can both see "absent" and
//! both insert; where the backend offers a native conditional upsert, that
//! closes the gap.

use chrono::{DateTime, SecondsFormat, Utc};
use portal_core::{
  Identity, Row, Table, TableStore,
  table::{Filter, Query},
};
use serde_json::Value;

use crate::error::PersistenceError;

/// Render `now` the way the stores stamp `created_at` / `updated_at`.
pub(crate) fn timestamp(now: DateTime<Utc>) -> Value {
  Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Whether `table` has a row keyed by `identity`. More than one such row is
/// an error.
pub async fn exists<T: TableStore>(
  tables: &T,
  table: Table,
  identity: &Identity,
) -> Result<bool, PersistenceError> {
  const CONTEXT: &str = "check for an existing record";

  let key = table.identity_column();
  let query = Query::only([key]).filter(Filter::eq(key, identity)).limit(2);
  let rows = tables
    .select(table, &query)
    .await
    .map_err(|e| PersistenceError::store(CONTEXT, &e))?;

  match rows.len() {
    0 => Ok(false),
    1 => Ok(true),
    n => Err(PersistenceError::unexpected(
      CONTEXT,
      format!("{n} {table} rows share the key {identity}"),
    )),
  }
}

/// Insert `partial` keyed by `identity` if no such row exists, otherwise
/// update the existing row. Returns the row as stored.
pub async fn upsert<T: TableStore>(
  tables: &T,
  table: Table,
  identity: &Identity,
  partial: Row,
) -> Result<Row, PersistenceError> {
  upsert_at(tables, table, identity, partial, Utc::now()).await
}

pub(crate) async fn upsert_at<T: TableStore>(
  tables: &T,
  table: Table,
  identity: &Identity,
  mut partial: Row,
  now: DateTime<Utc>,
) -> Result<Row, PersistenceError> {
  let key = table.identity_column();
  let present = exists(tables, table, identity).await?;

  partial.insert(key.to_owned(), identity.into());
  partial.insert("updated_at".to_owned(), timestamp(now));

  if present {
    const CONTEXT: &str = "update record";
    partial.remove("created_at");
    tracing::debug!(%table, %identity, "updating existing row");
    let filters = [Filter::eq(key, identity)];
    let rows = tables
      .update(table, &filters, partial)
      .await
      .map_err(|e| PersistenceError::store(CONTEXT, &e))?;
    single_row(CONTEXT, rows)
  } else {
    const CONTEXT: &str = "create record";
    partial.insert("created_at".to_owned(), timestamp(now));
    tracing::debug!(%table, %identity, "inserting new row");
    let rows = tables
      .insert(table, vec![partial])
      .await
      .map_err(|e| PersistenceError::store(CONTEXT, &e))?;
    single_row(CONTEXT, rows)
  }
}

/// Exactly one row must come back from a single-record write.
pub(crate) fn single_row(
  context: &'static str,
  rows: Vec<Row>,
) -> Result<Row, PersistenceError> {
  let mut rows = rows.into_iter();
  match (rows.next(), rows.next()) {
    (Some(row), None) => Ok(row),
    (None, _) => Err(PersistenceError::unexpected(context, "no row was returned")),
    (Some(_), Some(_)) => Err(PersistenceError::unexpected(
      context,
      "more than one row was returned",
    )),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn single_row_rejects_zero_and_many() {
    let row = |v: Value| match v {
      Value::Object(m) => m,
      _ => unreachable!(),
    };

    assert!(single_row("t", vec![]).is_err());
    assert!(single_row("t", vec![row(json!({})), row(json!({}))]).is_err());
    let one = single_row("t", vec![row(json!({ "id": "a" }))]).unwrap();
    assert_eq!(one["id"], json!("a"));
  }

  #[test]
  fn timestamps_are_utc_millis() {
    let now = DateTime::parse_from_rfc3339("2024-05-01T10:20:30.123456Z")
      .unwrap()
      .with_timezone(&Utc);
    assert_eq!(timestamp(now), json!("2024-05-01T10:20:30.123Z"));
  }
}
