//! SQL schema for the portal SQLite store, plus the column catalogue used to
//! validate every identifier before it reaches a SQL string.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

use portal_core::Table;

use crate::{Error, Result};

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per identity; `id` is the identity itself.
CREATE TABLE IF NOT EXISTS profiles (
    id                             TEXT PRIMARY KEY,
    first_name                     TEXT,
    last_name                      TEXT,
    date_of_birth                  TEXT,   -- YYYY-MM-DD
    gender                         TEXT,
    phone                          TEXT,
    address                        TEXT,
    region                         TEXT,   -- shown to patients as \"city\"
    medical_history                TEXT,
    allergies                      TEXT,
    medications                    TEXT,
    emergency_contact_name         TEXT,
    emergency_contact_relationship TEXT,
    emergency_contact_phone        TEXT,
    created_at                     TEXT,
    updated_at                     TEXT
);

CREATE TABLE IF NOT EXISTS appointments (
    id               TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL REFERENCES profiles(id),
    doctor_name      TEXT NOT NULL,
    doctor_specialty TEXT,
    date             TEXT NOT NULL,   -- YYYY-MM-DD
    time             TEXT NOT NULL,
    reason           TEXT,
    status           TEXT DEFAULT 'pending',
    notes            TEXT,
    created_at       TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at       TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

-- Append-only from the client's perspective.
CREATE TABLE IF NOT EXISTS health_checks (
    id                     TEXT PRIMARY KEY,
    user_id                TEXT NOT NULL,
    symptoms               TEXT NOT NULL DEFAULT '[]',   -- JSON list
    severity               TEXT,
    duration               TEXT,
    previous_conditions    TEXT,                         -- JSON list
    medications            TEXT,                         -- JSON list
    notes                  TEXT,
    created_at             TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    analysis_results       TEXT,                         -- JSON document, returned as text
    symptom_photos         TEXT,                         -- JSON document, returned as text
    comprehensive_analysis INTEGER NOT NULL DEFAULT 0,
    urgency_level          TEXT,
    overall_assessment     TEXT
);

CREATE INDEX IF NOT EXISTS appointments_user_idx  ON appointments(user_id, date);
CREATE INDEX IF NOT EXISTS health_checks_user_idx ON health_checks(user_id, created_at);

PRAGMA user_version = 1;
";

/// How a column's value is represented in SQLite and on the way back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
  /// Plain text.
  Text,
  /// `INTEGER` 0/1, surfaced as a JSON bool.
  Bool,
  /// JSON list stored as text and surfaced as a JSON array.
  JsonList,
  /// JSON document stored as text and surfaced as the encoded string, the way
  /// a `text` column holding JSON comes back from the hosted store.
  JsonText,
}

#[derive(Debug)]
pub struct Column {
  pub name: &'static str,
  pub kind: ColumnKind,
}

const fn text(name: &'static str) -> Column { Column { name, kind: ColumnKind::Text } }

#[derive(Debug)]
pub struct TableSchema {
  pub table:        Table,
  pub columns:      &'static [Column],
  /// Whether the store assigns a UUID `id` when an insert omits one.
  pub generated_id: bool,
}

impl TableSchema {
  pub fn column(&self, name: &str) -> Result<&'static Column> {
    self
      .columns
      .iter()
      .find(|c| c.name == name)
      .ok_or_else(|| Error::UnknownColumn {
        table:  self.table.name(),
        column: name.to_owned(),
      })
  }
}

static PROFILES: TableSchema = TableSchema {
  table:        Table::Profiles,
  generated_id: false,
  columns:      &[
    text("id"),
    text("first_name"),
    text("last_name"),
    text("date_of_birth"),
    text("gender"),
    text("phone"),
    text("address"),
    text("region"),
    text("medical_history"),
    text("allergies"),
    text("medications"),
    text("emergency_contact_name"),
    text("emergency_contact_relationship"),
    text("emergency_contact_phone"),
    text("created_at"),
    text("updated_at"),
  ],
};

static APPOINTMENTS: TableSchema = TableSchema {
  table:        Table::Appointments,
  generated_id: true,
  columns:      &[
    text("id"),
    text("user_id"),
    text("doctor_name"),
    text("doctor_specialty"),
    text("date"),
    text("time"),
    text("reason"),
    text("status"),
    text("notes"),
    text("created_at"),
    text("updated_at"),
  ],
};

static HEALTH_CHECKS: TableSchema = TableSchema {
  table:        Table::HealthChecks,
  generated_id: true,
  columns:      &[
    text("id"),
    text("user_id"),
    Column { name: "symptoms", kind: ColumnKind::JsonList },
    text("severity"),
    text("duration"),
    Column { name: "previous_conditions", kind: ColumnKind::JsonList },
    Column { name: "medications", kind: ColumnKind::JsonList },
    text("notes"),
    text("created_at"),
    Column { name: "analysis_results", kind: ColumnKind::JsonText },
    Column { name: "symptom_photos", kind: ColumnKind::JsonText },
    Column { name: "comprehensive_analysis", kind: ColumnKind::Bool },
    text("urgency_level"),
    text("overall_assessment"),
  ],
};

pub fn table_schema(table: Table) -> &'static TableSchema {
  match table {
    Table::Profiles => &PROFILES,
    Table::Appointments => &APPOINTMENTS,
    Table::HealthChecks => &HEALTH_CHECKS,
  }
}
