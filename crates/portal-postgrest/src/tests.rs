//! Client tests against an in-process mock of the hosted API.

use std::{
  collections::VecDeque,
  sync::{Arc, Mutex},
};

use axum::{
  Router,
  extract::{Query as QueryParams, State},
  http::{HeaderMap, HeaderValue, Method, StatusCode, Uri},
  response::{IntoResponse, Response},
};
use portal_core::{
  AuthProvider, Identity, Row, Table, TableStore,
  table::{Diagnose, Direction, Filter, Query},
};
use serde_json::{Value, json};

use crate::{Error, PostgrestClient, PostgrestConfig, SupabaseAuth};

// ─── Mock server ─────────────────────────────────────────────────────────────

struct Recorded {
  method:  Method,
  path:    String,
  params:  Vec<(String, String)>,
  headers: HeaderMap,
  body:    String,
}

impl Recorded {
  fn header(&self, name: &str) -> Option<&str> {
    self.headers.get(name).and_then(|v| v.to_str().ok())
  }

  fn param(&self, name: &str) -> Option<&str> {
    self.params.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
  }

  fn json(&self) -> Value { serde_json::from_str(&self.body).unwrap() }
}

struct Reply {
  status:  StatusCode,
  headers: Vec<(&'static str, &'static str)>,
  body:    String,
}

impl Reply {
  fn ok(body: Value) -> Self {
    Self { status: StatusCode::OK, headers: Vec::new(), body: body.to_string() }
  }
}

#[derive(Default)]
struct Mock {
  requests: Mutex<Vec<Recorded>>,
  replies:  Mutex<VecDeque<Reply>>,
}

impl Mock {
  fn reply(&self, reply: Reply) { self.replies.lock().unwrap().push_back(reply); }

  fn requests(&self) -> std::sync::MutexGuard<'_, Vec<Recorded>> { self.requests.lock().unwrap() }
}

async fn handle(
  State(mock): State<Arc<Mock>>,
  method: Method,
  uri: Uri,
  QueryParams(params): QueryParams<Vec<(String, String)>>,
  headers: HeaderMap,
  body: String,
) -> Response {
  mock.requests().push(Recorded {
    method,
    path: uri.path().to_owned(),
    params,
    headers,
    body,
  });
  let reply = mock
    .replies
    .lock()
    .unwrap()
    .pop_front()
    .unwrap_or_else(|| Reply::ok(json!([])));

  let mut resp = (reply.status, reply.body).into_response();
  for (name, value) in reply.headers {
    resp.headers_mut().insert(name, HeaderValue::from_static(value));
  }
  resp
}

async fn serve() -> (Arc<Mock>, String) {
  let mock = Arc::new(Mock::default());
  let app = Router::new().fallback(handle).with_state(mock.clone());
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
  (mock, format!("http://{addr}/"))
}

fn config(base_url: String, token: Option<&str>) -> PostgrestConfig {
  PostgrestConfig {
    base_url,
    anon_key: "anon-key".into(),
    access_token: token.map(str::to_owned),
  }
}

fn row(value: Value) -> Row {
  match value {
    Value::Object(map) => map,
    other => panic!("not an object: {other}"),
  }
}

// ─── Tables ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn select_sends_filters_and_credentials() {
  let (mock, base) = serve().await;
  mock.reply(Reply::ok(json!([{ "id": "user-1", "region": "Paris" }])));
  let client = PostgrestClient::new(config(base, Some("user-jwt"))).unwrap();

  let query = Query::only(["id", "region"])
    .filter(Filter::eq("id", "user-1"))
    .order_by("created_at", Direction::Descending)
    .limit(2);
  let rows = client.select(Table::Profiles, &query).await.unwrap();
  assert_eq!(rows, [row(json!({ "id": "user-1", "region": "Paris" }))]);

  let requests = mock.requests();
  let req = &requests[0];
  assert_eq!(req.method, Method::GET);
  assert_eq!(req.path, "/rest/v1/profiles");
  assert_eq!(req.header("apikey"), Some("anon-key"));
  assert_eq!(req.header("authorization"), Some("Bearer user-jwt"));
  assert_eq!(req.param("select"), Some("id,region"));
  assert_eq!(req.param("id"), Some("eq.user-1"));
  assert_eq!(req.param("order"), Some("created_at.desc"));
  assert_eq!(req.param("limit"), Some("2"));
}

#[tokio::test]
async fn anon_key_stands_in_for_a_missing_token() {
  let (mock, base) = serve().await;
  let client = PostgrestClient::new(config(base, None)).unwrap();
  client.select(Table::HealthChecks, &Query::all()).await.unwrap();

  let requests = mock.requests();
  assert_eq!(requests[0].header("authorization"), Some("Bearer anon-key"));
  assert_eq!(requests[0].param("select"), Some("*"));
}

#[tokio::test]
async fn count_reads_content_range() {
  let (mock, base) = serve().await;
  mock.reply(Reply {
    status:  StatusCode::OK,
    headers: vec![("content-range", "0-2/3")],
    body:    String::new(),
  });
  let client = PostgrestClient::new(config(base, Some("jwt"))).unwrap();

  let filters = [
    Filter::eq("user_id", "user-1"),
    Filter::gte("date", "2025-06-01"),
    Filter::neq("status", "cancelled"),
  ];
  assert_eq!(client.count(Table::Appointments, &filters).await.unwrap(), 3);

  let requests = mock.requests();
  let req = &requests[0];
  assert_eq!(req.method, Method::HEAD);
  assert_eq!(req.header("prefer"), Some("count=exact"));
  assert_eq!(req.param("date"), Some("gte.2025-06-01"));
  assert_eq!(req.param("status"), Some("not.eq.cancelled"));
}

#[tokio::test]
async fn count_without_a_total_fails() {
  let (_mock, base) = serve().await;
  let client = PostgrestClient::new(config(base, Some("jwt"))).unwrap();
  let err = client.count(Table::HealthChecks, &[]).await.unwrap_err();
  assert!(matches!(err, Error::ContentRange(None)));
}

#[tokio::test]
async fn insert_posts_rows_and_asks_for_representation() {
  let (mock, base) = serve().await;
  mock.reply(Reply {
    status:  StatusCode::CREATED,
    headers: Vec::new(),
    body:    json!([{ "id": "a1", "user_id": "user-1" }, { "id": "a2", "user_id": "user-1" }])
      .to_string(),
  });
  let client = PostgrestClient::new(config(base, Some("jwt"))).unwrap();

  let rows = vec![
    row(json!({ "user_id": "user-1", "symptoms": ["cough"] })),
    row(json!({ "user_id": "user-1", "notes": "after lunch" })),
  ];
  let stored = client.insert(Table::HealthChecks, rows.clone()).await.unwrap();
  assert_eq!(stored.len(), 2);
  assert_eq!(stored[1]["id"], json!("a2"));

  let requests = mock.requests();
  let req = &requests[0];
  assert_eq!(req.method, Method::POST);
  assert_eq!(req.path, "/rest/v1/health_checks");
  assert!(req.header("prefer").is_some_and(|p| p.contains("return=representation")));
  assert_eq!(req.param("columns"), Some("symptoms,user_id,notes"));
  assert_eq!(req.json(), json!(rows));
}

#[tokio::test]
async fn update_patches_matching_rows() {
  let (mock, base) = serve().await;
  mock.reply(Reply::ok(json!([{ "id": "a1", "status": "confirmed" }])));
  let client = PostgrestClient::new(config(base, Some("jwt"))).unwrap();

  let filters = [Filter::eq("id", "a1")];
  let patch = row(json!({ "status": "confirmed" }));
  let updated = client
    .update(Table::Appointments, &filters, patch.clone())
    .await
    .unwrap();
  assert_eq!(updated[0]["status"], json!("confirmed"));

  let requests = mock.requests();
  let req = &requests[0];
  assert_eq!(req.method, Method::PATCH);
  assert_eq!(req.param("id"), Some("eq.a1"));
  assert_eq!(req.header("prefer"), Some("return=representation"));
  assert_eq!(req.json(), Value::Object(patch));
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn api_errors_carry_diagnostics() {
  let (mock, base) = serve().await;
  mock.reply(Reply {
    status:  StatusCode::CONFLICT,
    headers: Vec::new(),
    body:    json!({
      "message": "duplicate key value violates unique constraint \"profiles_pkey\"",
      "details": "Key (id)=(user-1) already exists.",
      "hint": null,
      "code": "23505",
    })
    .to_string(),
  });
  let client = PostgrestClient::new(config(base, Some("jwt"))).unwrap();

  let err = client
    .insert(Table::Profiles, vec![row(json!({ "id": "user-1" }))])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Api { status: 409, .. }));
  assert!(err.to_string().starts_with("duplicate key value"));
  assert_eq!(err.details().as_deref(), Some("Key (id)=(user-1) already exists."));
  assert_eq!(err.hint(), None);
  assert_eq!(err.code().as_deref(), Some("23505"));
}

#[tokio::test]
async fn unstructured_error_bodies_fall_back_to_text() {
  let (mock, base) = serve().await;
  mock.reply(Reply {
    status:  StatusCode::BAD_GATEWAY,
    headers: Vec::new(),
    body:    "upstream unavailable".into(),
  });
  let client = PostgrestClient::new(config(base, Some("jwt"))).unwrap();

  let err = client.select(Table::Profiles, &Query::all()).await.unwrap_err();
  assert_eq!(err.to_string(), "upstream unavailable");
  assert_eq!(err.code().as_deref(), Some("502"));
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn no_token_means_nobody_signed_in() {
  let (mock, base) = serve().await;
  let auth = PostgrestClient::new(config(base, None)).unwrap().auth();
  assert_eq!(auth.current_user().await.unwrap(), None);
  assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn token_resolves_the_user() {
  let (mock, base) = serve().await;
  mock.reply(Reply::ok(json!({ "id": "user-1", "email": "ada@example.com" })));
  let auth = PostgrestClient::new(config(base, Some("user-jwt"))).unwrap().auth();

  assert_eq!(auth.current_user().await.unwrap(), Some(Identity::new("user-1")));
  let requests = mock.requests();
  assert_eq!(requests[0].path, "/auth/v1/user");
  assert_eq!(requests[0].header("authorization"), Some("Bearer user-jwt"));
}

#[tokio::test]
async fn auth_works_without_a_table_client() {
  let (mock, base) = serve().await;
  mock.reply(Reply::ok(json!({ "id": "user-2" })));
  let auth = SupabaseAuth::new(config(base, Some("user-jwt"))).unwrap();

  assert_eq!(auth.current_user().await.unwrap(), Some(Identity::new("user-2")));
  let requests = mock.requests();
  assert_eq!(requests.len(), 1);
  assert_eq!(requests[0].path, "/auth/v1/user");
  assert_eq!(requests[0].header("authorization"), Some("Bearer user-jwt"));
}

#[tokio::test]
async fn rejected_token_is_an_auth_failure() {
  let (mock, base) = serve().await;
  mock.reply(Reply {
    status:  StatusCode::UNAUTHORIZED,
    headers: Vec::new(),
    body:    json!({ "code": 401, "error_code": "bad_jwt", "msg": "invalid JWT" }).to_string(),
  });
  let auth = PostgrestClient::new(config(base, Some("expired"))).unwrap().auth();

  let failure = auth.current_user().await.unwrap_err();
  assert_eq!(failure.0, "invalid JWT");
}
