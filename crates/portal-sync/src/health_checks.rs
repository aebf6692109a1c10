//! The health check store: append-only history, newest first.

use portal_core::{
  AuthProvider, Table, TableStore,
  health_check::{HealthCheck, NewHealthCheck},
  normalize::decode_health_check,
  notify::Notification,
  table::{Direction, Filter, Query, to_row},
};

use crate::{
  context::{PortalContext, StoreState, accept, decode_all},
  error::{PersistenceError, Result},
  resolver::{require, resolve},
  upsert::single_row,
};

const FETCH_FAILED: &str = "Failed to fetch your health check history";
const SAVED: &str = "Comprehensive health check saved successfully";
const SAVE_FAILED: &str = "Failed to save health check data";

pub struct HealthCheckStore<T, A> {
  ctx:   PortalContext<T, A>,
  state: StoreState<Vec<HealthCheck>>,
}

impl<T: TableStore, A: AuthProvider> HealthCheckStore<T, A> {
  pub fn new(ctx: PortalContext<T, A>) -> Self { Self { ctx, state: StoreState::default() } }

  pub fn state(&self) -> &StoreState<Vec<HealthCheck>> { &self.state }

  pub fn health_checks(&self) -> &[HealthCheck] { &self.state.data }

  pub async fn fetch(&mut self) -> Result<()> {
    self.state.loading = true;
    let outcome = self.load().await;
    if outcome.is_err() {
      self.ctx.notify(Notification::error(FETCH_FAILED));
    }
    self.state.settle(outcome)
  }

  async fn load(&self) -> Result<Vec<HealthCheck>> {
    const CONTEXT: &str = "fetch health checks";

    let Some(identity) = resolve(self.ctx.auth()).await? else {
      return Ok(Vec::new());
    };
    let query = Query::all()
      .filter(Filter::eq("user_id", &identity))
      .order_by("created_at", Direction::Descending);
    let rows = self
      .ctx
      .tables()
      .select(Table::HealthChecks, &query)
      .await
      .map_err(|e| PersistenceError::store(CONTEXT, &e))?;

    let checks = decode_all("health check", rows, decode_health_check);
    tracing::debug!(%identity, count = checks.len(), "health checks loaded");
    Ok(checks)
  }

  /// Save `new` for the current identity and put it at the head of the
  /// cache.
  pub async fn save(&mut self, new: &NewHealthCheck) -> Result<HealthCheck> {
    match self.insert(new).await {
      Ok(check) => {
        tracing::info!(
          id = %check.id,
          symptoms = check.symptoms.len(),
          comprehensive = check.comprehensive_analysis,
          "health check saved"
        );
        self.state.data.insert(0, check.clone());
        self.ctx.notify(Notification::success(SAVED));
        Ok(check)
      }
      Err(e) => {
        self.ctx.notify(Notification::error(SAVE_FAILED));
        Err(self.state.fail(e))
      }
    }
  }

  async fn insert(&self, new: &NewHealthCheck) -> Result<HealthCheck> {
    const CONTEXT: &str = "save health check";
    let encode = |e| PersistenceError::encoding(CONTEXT, e);

    let identity = require(self.ctx.auth()).await?;

    let mut row = to_row(new).map_err(encode)?;
    match new.stored_photos() {
      Some(photos) => {
        let inline = photos.values().filter(|p| !p.is_url()).count();
        tracing::debug!(photos = photos.len(), inline, "storing symptom photos");
        row.insert("symptom_photos".to_owned(), serde_json::to_value(photos).map_err(encode)?);
      }
      None => {
        row.remove("symptom_photos");
      }
    }
    row.insert("user_id".to_owned(), (&identity).into());

    let rows = self
      .ctx
      .tables()
      .insert(Table::HealthChecks, vec![row])
      .await
      .map_err(|e| PersistenceError::store(CONTEXT, &e))?;
    let decoded = decode_health_check(single_row(CONTEXT, rows)?)
      .map_err(|e| PersistenceError::malformed(CONTEXT, e))?;
    Ok(accept("health check", decoded))
  }
}
