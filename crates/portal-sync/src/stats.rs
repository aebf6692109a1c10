//! Usage counts derived from the other tables on every fetch.

use chrono::{NaiveDate, Utc};
use portal_core::{AuthProvider, Table, TableStore, table::Filter};

use crate::{
  context::{PortalContext, StoreState},
  error::{PersistenceError, Result},
  resolver::resolve,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
  pub appointments_count:      u64,
  pub health_checks_count:     u64,
  /// Appointments dated today or later that are not cancelled.
  pub upcoming_appointments:   u64,
  /// Currently the total health check count; there is no completion
  /// criterion to filter on.
  pub completed_health_checks: u64,
}

pub struct StatsStore<T, A> {
  ctx:   PortalContext<T, A>,
  state: StoreState<Stats>,
}

impl<T: TableStore, A: AuthProvider> StatsStore<T, A> {
  pub fn new(ctx: PortalContext<T, A>) -> Self { Self { ctx, state: StoreState::default() } }

  pub fn state(&self) -> &StoreState<Stats> { &self.state }

  pub fn stats(&self) -> Stats { self.state.data }

  /// Recount against today's date (UTC).
  pub async fn fetch(&mut self) -> Result<()> { self.fetch_on(Utc::now().date_naive()).await }

  /// Recount, treating `today` as the first upcoming day. Any failed count
  /// fails the whole fetch and keeps the previous stats.
  pub async fn fetch_on(&mut self, today: NaiveDate) -> Result<()> {
    self.state.loading = true;
    let outcome = self.count(today).await;
    if let Err(e) = &outcome {
      tracing::error!(error = %e, "failed to fetch user statistics");
    }
    self.state.settle(outcome)
  }

  async fn count(&self, today: NaiveDate) -> Result<Stats> {
    let Some(identity) = resolve(self.ctx.auth()).await? else {
      return Ok(Stats::default());
    };
    let tables = self.ctx.tables();
    let count = |table: Table, filters: Vec<Filter>, context: &'static str| async move {
      tables
        .count(table, &filters)
        .await
        .map_err(|e| PersistenceError::store(context, &e))
    };

    let owned = || Filter::eq("user_id", &identity);

    let appointments_count = count(Table::Appointments, vec![owned()], "count appointments").await?;
    let upcoming_appointments = count(
      Table::Appointments,
      vec![
        owned(),
        Filter::gte("date", today.to_string()),
        Filter::neq("status", "cancelled"),
      ],
      "count upcoming appointments",
    )
    .await?;
    let health_checks_count = count(Table::HealthChecks, vec![owned()], "count health checks").await?;

    Ok(Stats {
      appointments_count,
      health_checks_count,
      upcoming_appointments,
      completed_health_checks: health_checks_count,
    })
  }
}
