//! Encoding and decoding between JSON row values and the representations
//! stored in SQLite columns.
//!
//! Text columns hold strings as-is. JSON lists are stored compact and parsed
//! back into arrays. JSON documents are stored compact and handed back still
//! encoded, as a string; callers already holding encoded text may write it
//! directly.

use portal_core::Row;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use crate::{
  Error, Result,
  schema::{Column, ColumnKind, TableSchema},
};

fn json_type(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

fn sql_type(value: &SqlValue) -> &'static str {
  match value {
    SqlValue::Null => "null",
    SqlValue::Integer(_) => "integer",
    SqlValue::Real(_) => "real",
    SqlValue::Text(_) => "text",
    SqlValue::Blob(_) => "blob",
  }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Convert a JSON value into the SQLite value stored in `column`.
pub fn encode_value(
  schema: &TableSchema,
  column: &'static Column,
  value: &Value,
) -> Result<SqlValue> {
  let encoded = match (column.kind, value) {
    (_, Value::Null) => SqlValue::Null,
    (ColumnKind::Text, Value::String(s)) => SqlValue::Text(s.clone()),
    (ColumnKind::Text, Value::Number(n)) => SqlValue::Text(n.to_string()),
    (ColumnKind::Bool, Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
    (ColumnKind::JsonList, Value::Array(_)) => SqlValue::Text(value.to_string()),
    (ColumnKind::JsonText, Value::String(s)) => SqlValue::Text(s.clone()),
    (ColumnKind::JsonText, Value::Array(_) | Value::Object(_)) => {
      SqlValue::Text(serde_json::to_string(value)?)
    }
    (_, other) => {
      return Err(Error::ColumnType {
        table:  schema.table.name(),
        column: column.name,
        found:  json_type(other),
      });
    }
  };
  Ok(encoded)
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// Convert a stored SQLite value back into JSON.
pub fn decode_value(
  schema: &TableSchema,
  column: &'static Column,
  value: SqlValue,
) -> Result<Value> {
  let decoded = match (column.kind, value) {
    (_, SqlValue::Null) => Value::Null,
    (ColumnKind::Text | ColumnKind::JsonText, SqlValue::Text(s)) => Value::String(s),
    (ColumnKind::Bool, SqlValue::Integer(i)) => Value::Bool(i != 0),
    (ColumnKind::JsonList, SqlValue::Text(s)) => serde_json::from_str(&s)?,
    (_, other) => {
      return Err(Error::Corrupt {
        table:  schema.table.name(),
        column: column.name,
        found:  sql_type(&other),
      });
    }
  };
  Ok(decoded)
}

/// Assemble a [`Row`] from the values read for `columns`, in order.
pub fn decode_row(
  schema: &TableSchema,
  columns: &[&'static Column],
  values: Vec<SqlValue>,
) -> Result<Row> {
  columns
    .iter()
    .zip(values)
    .map(|(column, value)| {
      Ok((column.name.to_owned(), decode_value(schema, column, value)?))
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use portal_core::Table;
  use serde_json::json;

  use super::*;
  use crate::schema::table_schema;

  #[test]
  fn json_text_round_trips_as_encoded_string() {
    let schema = table_schema(Table::HealthChecks);
    let column = schema.column("analysis_results").unwrap();

    let stored = encode_value(schema, column, &json!([{ "name": "Flu" }])).unwrap();
    let back = decode_value(schema, column, stored).unwrap();
    assert_eq!(back, json!(r#"[{"name":"Flu"}]"#));

    // Already-encoded text is written verbatim.
    let stored = encode_value(schema, column, &json!("[]")).unwrap();
    assert_eq!(stored, SqlValue::Text("[]".into()));
  }

  #[test]
  fn json_lists_come_back_as_arrays() {
    let schema = table_schema(Table::HealthChecks);
    let column = schema.column("symptoms").unwrap();
    let stored = encode_value(schema, column, &json!(["cough", "fever"])).unwrap();
    assert_eq!(decode_value(schema, column, stored).unwrap(), json!(["cough", "fever"]));
  }

  #[test]
  fn bools_are_integers() {
    let schema = table_schema(Table::HealthChecks);
    let column = schema.column("comprehensive_analysis").unwrap();
    assert_eq!(encode_value(schema, column, &json!(true)).unwrap(), SqlValue::Integer(1));
    assert_eq!(
      decode_value(schema, column, SqlValue::Integer(0)).unwrap(),
      json!(false)
    );
  }

  #[test]
  fn wrong_json_type_is_rejected() {
    let schema = table_schema(Table::Profiles);
    let column = schema.column("first_name").unwrap();
    let err = encode_value(schema, column, &json!({ "given": "Ada" })).unwrap_err();
    assert!(matches!(err, Error::ColumnType { column: "first_name", found: "object", .. }));
  }
}
