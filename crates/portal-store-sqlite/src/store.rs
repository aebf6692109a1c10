//! [`SqliteStore`], the SQLite implementation of [`TableStore`].

use std::path::Path;

use portal_core::{
  Row, Table,
  table::{Direction, Filter, Op, Query, TableStore},
};
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use uuid::Uuid;

use crate::{
  Result,
  encode::{decode_row, encode_value},
  schema::{Column, SCHEMA, TableSchema, table_schema},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Portal tables backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SQL building ────────────────────────────────────────────────────────────
//
// Identifiers only ever come from the static column catalogue; values are
// always bound as parameters.

fn column_list(columns: &[&'static Column]) -> String {
  columns
    .iter()
    .map(|c| format!("\"{}\"", c.name))
    .collect::<Vec<_>>()
    .join(", ")
}

fn where_clause(
  schema: &TableSchema,
  filters: &[Filter],
  params: &mut Vec<SqlValue>,
) -> Result<String> {
  if filters.is_empty() {
    return Ok(String::new());
  }

  let mut conds = Vec::with_capacity(filters.len());
  for filter in filters {
    let column = schema.column(&filter.column)?;
    let op = match filter.op {
      Op::Eq => "=",
      Op::Neq => "!=",
      Op::Gte => ">=",
    };
    conds.push(format!("\"{}\" {op} ?", column.name));
    params.push(encode_value(schema, column, &filter.value)?);
  }
  Ok(format!(" WHERE {}", conds.join(" AND ")))
}

/// Read every column of the current result row, in order.
fn read_values(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Vec<SqlValue>> {
  (0..width).map(|i| row.get::<_, SqlValue>(i)).collect()
}

fn all_columns(schema: &TableSchema) -> Vec<&'static Column> {
  schema.columns.iter().collect()
}

/// A prepared single-row INSERT: SQL plus bound parameters.
fn insert_statement(
  schema: &TableSchema,
  mut row: Row,
  returning: &str,
) -> Result<(String, Vec<SqlValue>)> {
  if schema.generated_id && row.get("id").is_none_or(Value::is_null) {
    row.insert("id".to_owned(), Value::String(Uuid::new_v4().to_string()));
  }

  let table = schema.table.name();
  if row.is_empty() {
    return Ok((
      format!("INSERT INTO {table} DEFAULT VALUES RETURNING {returning}"),
      Vec::new(),
    ));
  }

  let mut columns = Vec::with_capacity(row.len());
  let mut params = Vec::with_capacity(row.len());
  for (name, value) in &row {
    let column = schema.column(name)?;
    columns.push(column);
    params.push(encode_value(schema, column, value)?);
  }
  let placeholders = vec!["?"; columns.len()].join(", ");
  let sql = format!(
    "INSERT INTO {table} ({}) VALUES ({placeholders}) RETURNING {returning}",
    column_list(&columns),
  );
  Ok((sql, params))
}

// ─── TableStore impl ─────────────────────────────────────────────────────────

impl TableStore for SqliteStore {
  type Error = crate::Error;

  async fn select(&self, table: Table, query: &Query) -> Result<Vec<Row>> {
    let schema = table_schema(table);
    let columns: Vec<&'static Column> = if query.columns.is_empty() {
      all_columns(schema)
    } else {
      query
        .columns
        .iter()
        .map(|c| schema.column(c))
        .collect::<Result<_>>()?
    };

    let mut params = Vec::new();
    let where_sql = where_clause(schema, &query.filters, &mut params)?;

    // rowid breaks ties so rows written within the same instant keep their
    // insertion order.
    let order_sql = match &query.order {
      Some(order) => {
        let column = schema.column(&order.column)?;
        let dir = match order.direction {
          Direction::Ascending => "ASC",
          Direction::Descending => "DESC",
        };
        format!(" ORDER BY \"{}\" {dir}, rowid {dir}", column.name)
      }
      None => " ORDER BY rowid".to_owned(),
    };
    let limit_sql = query.limit.map(|n| format!(" LIMIT {n}")).unwrap_or_default();

    let sql = format!(
      "SELECT {} FROM {}{where_sql}{order_sql}{limit_sql}",
      column_list(&columns),
      table.name(),
    );
    tracing::trace!(%sql, "select");

    let width = columns.len();
    let raws: Vec<Vec<SqlValue>> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            read_values(row, width)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|values| decode_row(schema, &columns, values))
      .collect()
  }

  async fn count(&self, table: Table, filters: &[Filter]) -> Result<u64> {
    let schema = table_schema(table);
    let mut params = Vec::new();
    let where_sql = where_clause(schema, filters, &mut params)?;
    let sql = format!("SELECT COUNT(*) FROM {}{where_sql}", table.name());
    tracing::trace!(%sql, "count");

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, rusqlite::params_from_iter(params.iter()), |r| {
          r.get(0)
        })?)
      })
      .await?;
    Ok(n.unsigned_abs())
  }

  async fn insert(&self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>> {
    let schema = table_schema(table);
    let columns = all_columns(schema);
    let returning = column_list(&columns);

    let statements = rows
      .into_iter()
      .map(|row| insert_statement(schema, row, &returning))
      .collect::<Result<Vec<_>>>()?;

    let width = columns.len();
    let raws: Vec<Vec<SqlValue>> = self
      .conn
      .call(move |conn| {
        // A batch is all-or-nothing.
        let tx = conn.transaction()?;
        let mut out = Vec::with_capacity(statements.len());
        for (sql, params) in &statements {
          out.push(tx.query_row(sql, rusqlite::params_from_iter(params.iter()), |row| {
            read_values(row, width)
          })?);
        }
        tx.commit()?;
        Ok(out)
      })
      .await?;

    raws
      .into_iter()
      .map(|values| decode_row(schema, &columns, values))
      .collect()
  }

  async fn update(&self, table: Table, filters: &[Filter], patch: Row) -> Result<Vec<Row>> {
    if patch.is_empty() {
      let query = Query { filters: filters.to_vec(), ..Query::all() };
      return self.select(table, &query).await;
    }

    let schema = table_schema(table);
    let columns = all_columns(schema);

    let mut params = Vec::with_capacity(patch.len() + filters.len());
    let mut assignments = Vec::with_capacity(patch.len());
    for (name, value) in &patch {
      let column = schema.column(name)?;
      assignments.push(format!("\"{}\" = ?", column.name));
      params.push(encode_value(schema, column, value)?);
    }
    let where_sql = where_clause(schema, filters, &mut params)?;

    let sql = format!(
      "UPDATE {} SET {}{where_sql} RETURNING {}",
      table.name(),
      assignments.join(", "),
      column_list(&columns),
    );
    tracing::trace!(%sql, "update");

    let width = columns.len();
    let raws: Vec<Vec<SqlValue>> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            read_values(row, width)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|values| decode_row(schema, &columns, values))
      .collect()
  }
}
