//! The `TableStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (`portal-store-sqlite`,
//! `portal-postgrest`). The synchronization layer depends on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use serde::Serialize;
use serde_json::Value;

/// A loosely-shaped remote row, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

// ─── Tables ──────────────────────────────────────────────────────────────────

/// The remote tables this layer reads and writes.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  strum::Display,
  strum::IntoStaticStr,
  strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum Table {
  Profiles,
  Appointments,
  HealthChecks,
}

impl Table {
  /// The table name on the wire and in the schema.
  pub fn name(self) -> &'static str { self.into() }

  /// The column holding the owning identity: the primary key for profiles,
  /// the `user_id` foreign key everywhere else.
  pub fn identity_column(self) -> &'static str {
    match self {
      Self::Profiles => "id",
      Self::Appointments | Self::HealthChecks => "user_id",
    }
  }
}

// ─── Query types ─────────────────────────────────────────────────────────────

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
  Eq,
  Neq,
  Gte,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
  pub column: String,
  pub op:     Op,
  pub value:  Value,
}

impl Filter {
  pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
    Self { column: column.into(), op: Op::Eq, value: value.into() }
  }

  pub fn neq(column: impl Into<String>, value: impl Into<Value>) -> Self {
    Self { column: column.into(), op: Op::Neq, value: value.into() }
  }

  pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
    Self { column: column.into(), op: Op::Gte, value: value.into() }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Ascending,
  Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
  pub column:    String,
  pub direction: Direction,
}

/// Parameters for [`TableStore::select`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
  /// Columns to return; empty means every column.
  pub columns: Vec<String>,
  /// All filters must match.
  pub filters: Vec<Filter>,
  pub order:   Option<Order>,
  pub limit:   Option<usize>,
}

impl Query {
  /// Select every column.
  pub fn all() -> Self { Self::default() }

  /// Select only the named columns.
  pub fn only<I, S>(columns: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      columns: columns.into_iter().map(Into::into).collect(),
      ..Self::default()
    }
  }

  pub fn filter(mut self, filter: Filter) -> Self {
    self.filters.push(filter);
    self
  }

  pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
    self.order = Some(Order { column: column.into(), direction });
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }
}

/// Serialise a record into a [`Row`]. Fails if the record is not a JSON
/// object.
pub fn to_row<T: Serialize>(record: &T) -> Result<Row, serde_json::Error> {
  match serde_json::to_value(record)? {
    Value::Object(map) => Ok(map),
    other => Err(serde::ser::Error::custom(format!(
      "expected a record to serialise to an object, got {other}"
    ))),
  }
}

// ─── Diagnostics ─────────────────────────────────────────────────────────────

/// Structured detail a backend error can carry alongside its message.
///
/// Mirrors the `{message, details, hint, code}` error body of the hosted
/// store, so the synchronization layer can log and surface it uniformly.
pub trait Diagnose: std::error::Error {
  fn details(&self) -> Option<String> { None }

  fn hint(&self) -> Option<String> { None }

  fn code(&self) -> Option<String> { None }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the remote relational store.
///
/// Each operation is assumed atomic for the rows it touches; nothing here
/// spans more than one statement.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait TableStore: Send + Sync {
  type Error: Diagnose + Send + Sync + 'static;

  /// Return the rows of `table` matching `query`.
  fn select<'a>(
    &'a self,
    table: Table,
    query: &'a Query,
  ) -> impl Future<Output = Result<Vec<Row>, Self::Error>> + Send + 'a;

  /// Count the rows of `table` matching every filter, without returning them.
  fn count<'a>(
    &'a self,
    table: Table,
    filters: &'a [Filter],
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Insert `rows` and return them as stored, with store-assigned defaults
  /// (ids, timestamps) filled in.
  fn insert(
    &self,
    table: Table,
    rows: Vec<Row>,
  ) -> impl Future<Output = Result<Vec<Row>, Self::Error>> + Send + '_;

  /// Apply `patch` to every row matching `filters` and return the updated
  /// rows.
  fn update<'a>(
    &'a self,
    table: Table,
    filters: &'a [Filter],
    patch: Row,
  ) -> impl Future<Output = Result<Vec<Row>, Self::Error>> + Send + 'a;
}
