//! The appointment store: the current identity's bookings, earliest first.

use chrono::{DateTime, Utc};
use portal_core::{
  AuthProvider, Identity, Row, Table, TableStore,
  appointment::{Appointment, AppointmentPatch, NewAppointment},
  normalize::decode_appointment,
  notify::Notification,
  table::{Direction, Filter, Query, to_row},
};
use uuid::Uuid;

use crate::{
  context::{PortalContext, StoreState, accept, decode_all},
  error::{PersistenceError, Result},
  resolver::{require, resolve},
  upsert::{exists, single_row, timestamp},
};

const FETCH_FAILED: &str = "Failed to fetch your appointments. Please try again later.";
const BOOKED: &str = "Appointment booked successfully";
const BOOK_FAILED: &str = "Failed to book appointment. Please try again.";
const UPDATED: &str = "Appointment updated successfully";
const UPDATE_FAILED: &str = "Failed to update appointment";

pub struct AppointmentStore<T, A> {
  ctx:   PortalContext<T, A>,
  state: StoreState<Vec<Appointment>>,
}

impl<T: TableStore, A: AuthProvider> AppointmentStore<T, A> {
  pub fn new(ctx: PortalContext<T, A>) -> Self { Self { ctx, state: StoreState::default() } }

  pub fn state(&self) -> &StoreState<Vec<Appointment>> { &self.state }

  pub fn appointments(&self) -> &[Appointment] { &self.state.data }

  // ─── Fetch ─────────────────────────────────────────────────────────────────

  pub async fn fetch(&mut self) -> Result<()> {
    self.state.loading = true;
    let outcome = self.load().await;
    if outcome.is_err() {
      self.ctx.notify(Notification::error(FETCH_FAILED));
    }
    self.state.settle(outcome)
  }

  async fn load(&self) -> Result<Vec<Appointment>> {
    const CONTEXT: &str = "fetch appointments";

    let Some(identity) = resolve(self.ctx.auth()).await? else {
      return Ok(Vec::new());
    };
    let query = Query::all()
      .filter(Filter::eq("user_id", &identity))
      .order_by("date", Direction::Ascending);
    let rows = self
      .ctx
      .tables()
      .select(Table::Appointments, &query)
      .await
      .map_err(|e| PersistenceError::store(CONTEXT, &e))?;

    let appointments = decode_all("appointment", rows, decode_appointment);
    tracing::debug!(%identity, count = appointments.len(), "appointments loaded");
    Ok(appointments)
  }

  // ─── Add ───────────────────────────────────────────────────────────────────

  /// Book `new` for the current identity and append it to the cache. A bare
  /// profile is created first if the identity has none.
  pub async fn add(&mut self, new: &NewAppointment) -> Result<Appointment> {
    match self.book(new, Utc::now()).await {
      Ok(appointment) => {
        tracing::info!(id = %appointment.id, date = %appointment.date, "appointment booked");
        self.state.data.push(appointment.clone());
        self.ctx.notify(Notification::success(BOOKED));
        Ok(appointment)
      }
      Err(e) => {
        self.ctx.notify(Notification::error(BOOK_FAILED));
        Err(self.state.fail(e))
      }
    }
  }

  async fn book(&self, new: &NewAppointment, now: DateTime<Utc>) -> Result<Appointment> {
    const CONTEXT: &str = "book appointment";

    let identity = require(self.ctx.auth()).await?;
    ensure_profile(self.ctx.tables(), &identity, now).await?;

    let mut row = to_row(new).map_err(|e| PersistenceError::encoding(CONTEXT, e))?;
    let status = new.status.unwrap_or_default();
    row.insert("status".to_owned(), status.as_str().into());
    row.insert("user_id".to_owned(), (&identity).into());
    row.insert("created_at".to_owned(), timestamp(now));
    row.insert("updated_at".to_owned(), timestamp(now));

    let rows = self
      .ctx
      .tables()
      .insert(Table::Appointments, vec![row])
      .await
      .map_err(|e| PersistenceError::store(CONTEXT, &e))?;
    let decoded = decode_appointment(single_row(CONTEXT, rows)?)
      .map_err(|e| PersistenceError::malformed(CONTEXT, e))?;
    Ok(accept("appointment", decoded))
  }

  // ─── Update ────────────────────────────────────────────────────────────────

  /// Apply `patch` to the appointment `id` and replace the cached entry.
  ///
  /// The row is targeted by id alone; ownership is enforced by the backend's
  /// access policy, not here.
  pub async fn update(&mut self, id: Uuid, patch: &AppointmentPatch) -> Result<Appointment> {
    match self.patch(id, patch, Utc::now()).await {
      Ok(appointment) => {
        tracing::info!(%id, status = %appointment.status, "appointment updated");
        if let Some(cached) = self.state.data.iter_mut().find(|a| a.id == id) {
          *cached = appointment.clone();
        }
        self.ctx.notify(Notification::success(UPDATED));
        Ok(appointment)
      }
      Err(e) => {
        self.ctx.notify(Notification::error(UPDATE_FAILED));
        Err(self.state.fail(e))
      }
    }
  }

  async fn patch(
    &self,
    id: Uuid,
    patch: &AppointmentPatch,
    now: DateTime<Utc>,
  ) -> Result<Appointment> {
    const CONTEXT: &str = "update appointment";

    // `AppointmentStatus` only admits the four valid statuses, so a status in
    // the patch is already normalized.
    let mut row = to_row(patch).map_err(|e| PersistenceError::encoding(CONTEXT, e))?;
    row.insert("updated_at".to_owned(), timestamp(now));

    let filters = [Filter::eq("id", id.to_string())];
    let rows = self
      .ctx
      .tables()
      .update(Table::Appointments, &filters, row)
      .await
      .map_err(|e| PersistenceError::store(CONTEXT, &e))?;
    let decoded = decode_appointment(single_row(CONTEXT, rows)?)
      .map_err(|e| PersistenceError::malformed(CONTEXT, e))?;
    Ok(accept("appointment", decoded))
  }
}

/// Appointments reference their owner's profile, so one must exist before
/// the first booking.
async fn ensure_profile<T: TableStore>(
  tables: &T,
  identity: &Identity,
  now: DateTime<Utc>,
) -> Result<(), PersistenceError> {
  const CONTEXT: &str = "create profile";

  if exists(tables, Table::Profiles, identity).await? {
    return Ok(());
  }

  tracing::info!(%identity, "creating bare profile before first booking");
  let mut bare = Row::new();
  bare.insert("id".to_owned(), identity.into());
  bare.insert("created_at".to_owned(), timestamp(now));
  bare.insert("updated_at".to_owned(), timestamp(now));
  tables
    .insert(Table::Profiles, vec![bare])
    .await
    .map_err(|e| PersistenceError::store(CONTEXT, &e))?;
  Ok(())
}
