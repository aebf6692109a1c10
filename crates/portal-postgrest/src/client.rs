//! Async HTTP client speaking the PostgREST dialect of a hosted Supabase
//! project.

use std::time::Duration;

use portal_core::{
  Row, Table, TableStore,
  table::{Filter, Query},
};
use reqwest::{Client, Method, RequestBuilder, Response};

use crate::{
  Error, Result,
  auth::SupabaseAuth,
  query::{content_range_total, filter_params, insert_columns, select_params},
};

/// Connection settings for a hosted project.
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
  /// Project URL, e.g. `https://abc.supabase.co`.
  pub base_url:     String,
  /// The project's public (anon) API key.
  pub anon_key:     String,
  /// The signed-in user's JWT. Requests fall back to the anon key without
  /// one.
  pub access_token: Option<String>,
}

/// [`TableStore`] over `/rest/v1`.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct PostgrestClient {
  client: Client,
  config: PostgrestConfig,
}

impl PostgrestClient {
  pub fn new(config: PostgrestConfig) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  /// An auth seam for the same project, sharing this client's connection
  /// pool.
  pub fn auth(&self) -> SupabaseAuth {
    SupabaseAuth::with_client(self.client.clone(), self.config.clone())
  }

  fn url(&self, table: Table) -> String {
    format!("{}/rest/v1/{}", self.config.base_url.trim_end_matches('/'), table.name())
  }

  fn request(&self, method: Method, table: Table) -> RequestBuilder {
    let token = self.config.access_token.as_deref().unwrap_or(&self.config.anon_key);
    self
      .client
      .request(method, self.url(table))
      .header("apikey", &self.config.anon_key)
      .bearer_auth(token)
  }
}

/// Pass a successful response through; turn anything else into
/// [`Error::Api`].
async fn checked(resp: Response) -> Result<Response> {
  if resp.status().is_success() {
    Ok(resp)
  } else {
    Err(Error::from_response(resp).await)
  }
}

// ─── TableStore impl ─────────────────────────────────────────────────────────

impl TableStore for PostgrestClient {
  type Error = Error;

  /// `GET /rest/v1/{table}?select=…`
  async fn select(&self, table: Table, query: &Query) -> Result<Vec<Row>> {
    tracing::debug!(%table, ?query, "select");
    let resp = self
      .request(Method::GET, table)
      .query(&select_params(query))
      .send()
      .await?;
    Ok(checked(resp).await?.json().await?)
  }

  /// `HEAD /rest/v1/{table}` with `Prefer: count=exact`; the total is read
  /// from `Content-Range`.
  async fn count(&self, table: Table, filters: &[Filter]) -> Result<u64> {
    tracing::debug!(%table, ?filters, "count");
    let mut params = vec![("select".to_owned(), "*".to_owned())];
    params.extend(filter_params(filters));
    let resp = self
      .request(Method::HEAD, table)
      .header("Prefer", "count=exact")
      .query(&params)
      .send()
      .await?;
    let resp = checked(resp).await?;

    let header = resp
      .headers()
      .get(reqwest::header::CONTENT_RANGE)
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned);
    match header.as_deref().and_then(content_range_total) {
      Some(total) => Ok(total),
      None => Err(Error::ContentRange(header)),
    }
  }

  /// `POST /rest/v1/{table}` with `Prefer: return=representation`.
  async fn insert(&self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>> {
    tracing::debug!(%table, rows = rows.len(), "insert");
    let mut req = self
      .request(Method::POST, table)
      .header("Prefer", "return=representation,missing=default")
      .query(&[("select", "*")]);
    if let Some(columns) = insert_columns(&rows) {
      req = req.query(&[("columns", columns)]);
    }
    let resp = req.json(&rows).send().await?;
    Ok(checked(resp).await?.json().await?)
  }

  /// `PATCH /rest/v1/{table}?…filters` with `Prefer: return=representation`.
  async fn update(&self, table: Table, filters: &[Filter], patch: Row) -> Result<Vec<Row>> {
    tracing::debug!(%table, ?filters, fields = patch.len(), "update");
    let mut params = vec![("select".to_owned(), "*".to_owned())];
    params.extend(filter_params(filters));
    let resp = self
      .request(Method::PATCH, table)
      .header("Prefer", "return=representation")
      .query(&params)
      .json(&patch)
      .send()
      .await?;
    Ok(checked(resp).await?.json().await?)
  }
}
