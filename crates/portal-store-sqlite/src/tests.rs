//! Integration tests for `SqliteStore` against an in-memory database.

use portal_core::{
  Row, Table,
  table::{Diagnose, Direction, Filter, Query, TableStore},
};
use serde_json::{Value, json};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn row(value: Value) -> Row {
  match value {
    Value::Object(map) => map,
    other => panic!("not an object: {other}"),
  }
}

async fn add_profile(s: &SqliteStore, id: &str) {
  s.insert(Table::Profiles, vec![row(json!({ "id": id }))])
    .await
    .unwrap();
}

async fn add_appointment(s: &SqliteStore, user: &str, date: &str, status: &str) -> Row {
  let inserted = s
    .insert(
      Table::Appointments,
      vec![row(json!({
        "user_id": user,
        "doctor_name": "Dr. Okafor",
        "date": date,
        "time": "09:30",
        "status": status,
      }))],
    )
    .await
    .unwrap();
  inserted.into_iter().next().unwrap()
}

// ─── Inserts ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_returns_every_column() {
  let s = store().await;
  let inserted = s
    .insert(
      Table::Profiles,
      vec![row(json!({ "id": "user-1", "first_name": "Ada", "region": "Paris" }))],
    )
    .await
    .unwrap();

  assert_eq!(inserted.len(), 1);
  let profile = &inserted[0];
  assert_eq!(profile["id"], json!("user-1"));
  assert_eq!(profile["region"], json!("Paris"));
  assert_eq!(profile["last_name"], Value::Null);
  assert!(profile.contains_key("emergency_contact_phone"));
}

#[tokio::test]
async fn generated_ids_and_default_timestamps() {
  let s = store().await;
  add_profile(&s, "user-1").await;
  let appt = add_appointment(&s, "user-1", "2030-01-01", "pending").await;

  let id = appt["id"].as_str().unwrap();
  assert!(uuid::Uuid::parse_str(id).is_ok());
  assert!(appt["created_at"].as_str().is_some_and(|t| t.ends_with('Z')));
  assert!(appt["updated_at"].is_string());
}

#[tokio::test]
async fn caller_supplied_id_is_kept() {
  let s = store().await;
  add_profile(&s, "user-1").await;
  let inserted = s
    .insert(
      Table::Appointments,
      vec![row(json!({
        "id": "fixed-id",
        "user_id": "user-1",
        "doctor_name": "Dr. Okafor",
        "date": "2030-01-01",
        "time": "09:30",
      }))],
    )
    .await
    .unwrap();
  assert_eq!(inserted[0]["id"], json!("fixed-id"));
  assert_eq!(inserted[0]["status"], json!("pending"));
}

#[tokio::test]
async fn appointment_without_profile_is_rejected() {
  let s = store().await;
  let err = s
    .insert(
      Table::Appointments,
      vec![row(json!({
        "user_id": "nobody",
        "doctor_name": "Dr. Okafor",
        "date": "2030-01-01",
        "time": "09:30",
      }))],
    )
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Database(_)));
  assert!(err.code().is_some());
  assert!(err.details().is_some_and(|d| d.contains("FOREIGN KEY")));
}

#[tokio::test]
async fn failed_batch_inserts_nothing() {
  let s = store().await;
  add_profile(&s, "user-1").await;
  let good = row(json!({
    "user_id": "user-1",
    "doctor_name": "Dr. Okafor",
    "date": "2030-01-01",
    "time": "09:30",
  }));
  let orphan = row(json!({
    "user_id": "nobody",
    "doctor_name": "Dr. Okafor",
    "date": "2030-01-02",
    "time": "09:30",
  }));

  assert!(s.insert(Table::Appointments, vec![good, orphan]).await.is_err());
  assert_eq!(s.count(Table::Appointments, &[]).await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_column_is_rejected_before_sql() {
  let s = store().await;
  let err = s
    .insert(Table::Profiles, vec![row(json!({ "id": "u", "city": "Paris" }))])
    .await
    .unwrap_err();

  assert!(matches!(&err, Error::UnknownColumn { table: "profiles", column } if column == "city"));
  assert!(err.hint().is_some());
}

// ─── Health check columns ────────────────────────────────────────────────────

#[tokio::test]
async fn health_check_json_columns() {
  let s = store().await;
  let inserted = s
    .insert(
      Table::HealthChecks,
      vec![row(json!({
        "user_id": "user-1",
        "symptoms": ["cough", "fever"],
        "analysis_results": [{ "name": "Flu" }],
        "symptom_photos": { "rash": "https://cdn.example/rash.png" },
      }))],
    )
    .await
    .unwrap();

  let check = &inserted[0];
  assert_eq!(check["symptoms"], json!(["cough", "fever"]));
  assert_eq!(check["analysis_results"], json!(r#"[{"name":"Flu"}]"#));
  assert_eq!(
    check["symptom_photos"],
    json!(r#"{"rash":"https://cdn.example/rash.png"}"#)
  );
  assert_eq!(check["comprehensive_analysis"], json!(false));
  assert_eq!(check["previous_conditions"], Value::Null);
  assert!(check["created_at"].is_string());
}

// ─── Selects ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn select_filters_orders_and_limits() {
  let s = store().await;
  add_profile(&s, "user-1").await;
  add_profile(&s, "user-2").await;
  add_appointment(&s, "user-1", "2030-03-01", "pending").await;
  add_appointment(&s, "user-1", "2030-01-01", "confirmed").await;
  add_appointment(&s, "user-2", "2030-02-01", "pending").await;
  add_appointment(&s, "user-1", "2030-02-01", "cancelled").await;

  let query = Query::all()
    .filter(Filter::eq("user_id", "user-1"))
    .order_by("date", Direction::Ascending);
  let rows = s.select(Table::Appointments, &query).await.unwrap();
  let dates: Vec<_> = rows.iter().map(|r| r["date"].as_str().unwrap()).collect();
  assert_eq!(dates, ["2030-01-01", "2030-02-01", "2030-03-01"]);

  let query = Query::only(["id"])
    .filter(Filter::eq("user_id", "user-1"))
    .order_by("date", Direction::Descending)
    .limit(1);
  let rows = s.select(Table::Appointments, &query).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].len(), 1);
  assert!(rows[0].contains_key("id"));
}

#[tokio::test]
async fn equal_sort_keys_keep_insertion_order() {
  let s = store().await;
  add_profile(&s, "user-1").await;
  let first = add_appointment(&s, "user-1", "2030-01-01", "pending").await;
  let second = add_appointment(&s, "user-1", "2030-01-01", "pending").await;

  let query = Query::all().order_by("date", Direction::Ascending);
  let rows = s.select(Table::Appointments, &query).await.unwrap();
  assert_eq!(rows[0]["id"], first["id"]);
  assert_eq!(rows[1]["id"], second["id"]);

  let query = Query::all().order_by("date", Direction::Descending);
  let rows = s.select(Table::Appointments, &query).await.unwrap();
  assert_eq!(rows[0]["id"], second["id"]);
}

#[tokio::test]
async fn select_missing_row_is_empty() {
  let s = store().await;
  let query = Query::only(["id"]).filter(Filter::eq("id", "ghost")).limit(1);
  assert!(s.select(Table::Profiles, &query).await.unwrap().is_empty());
}

// ─── Counts ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn count_applies_every_filter() {
  let s = store().await;
  add_profile(&s, "user-1").await;
  add_appointment(&s, "user-1", "2020-01-01", "completed").await;
  add_appointment(&s, "user-1", "2030-01-01", "pending").await;
  add_appointment(&s, "user-1", "2030-02-01", "cancelled").await;

  let all = [Filter::eq("user_id", "user-1")];
  assert_eq!(s.count(Table::Appointments, &all).await.unwrap(), 3);

  let upcoming = [
    Filter::eq("user_id", "user-1"),
    Filter::gte("date", "2025-06-01"),
    Filter::neq("status", "cancelled"),
  ];
  assert_eq!(s.count(Table::Appointments, &upcoming).await.unwrap(), 1);
}

// ─── Updates ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_returns_changed_rows() {
  let s = store().await;
  add_profile(&s, "user-1").await;
  let appt = add_appointment(&s, "user-1", "2030-01-01", "pending").await;

  let filters = [Filter::eq("id", appt["id"].clone())];
  let updated = s
    .update(Table::Appointments, &filters, row(json!({ "status": "confirmed" })))
    .await
    .unwrap();
  assert_eq!(updated.len(), 1);
  assert_eq!(updated[0]["status"], json!("confirmed"));
  assert_eq!(updated[0]["doctor_name"], json!("Dr. Okafor"));
}

#[tokio::test]
async fn update_matching_nothing_returns_empty() {
  let s = store().await;
  let filters = [Filter::eq("id", "ghost")];
  let updated = s
    .update(Table::Profiles, &filters, row(json!({ "first_name": "Ada" })))
    .await
    .unwrap();
  assert!(updated.is_empty());
}

#[tokio::test]
async fn empty_patch_reads_current_rows() {
  let s = store().await;
  add_profile(&s, "user-1").await;
  let filters = [Filter::eq("id", "user-1")];
  let rows = s.update(Table::Profiles, &filters, Row::new()).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0]["id"], json!("user-1"));
}

#[tokio::test]
async fn reopening_a_file_keeps_rows() {
  let dir = std::env::temp_dir().join(format!("portal-{}", uuid::Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("portal.db");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    add_profile(&s, "user-1").await;
  }
  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.count(Table::Profiles, &[]).await.unwrap(), 1);

  std::fs::remove_dir_all(&dir).ok();
}
