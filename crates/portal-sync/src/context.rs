//! Shared handles every entity store is built from.

use std::sync::Arc;

use portal_core::{
  AuthProvider, Decoded, ParseError, Row, TableStore,
  notify::{Notification, Notifier},
};

use crate::{
  appointments::AppointmentStore, error::Error, health_checks::HealthCheckStore,
  profile::ProfileStore, stats::StatsStore,
};

/// The backend, the auth seam and the notification sink, shared by the
/// entity stores of one session.
///
/// Cloning is cheap; all three handles are reference-counted.
pub struct PortalContext<T, A> {
  tables:   Arc<T>,
  auth:     Arc<A>,
  notifier: Arc<dyn Notifier>,
}

impl<T, A> Clone for PortalContext<T, A> {
  fn clone(&self) -> Self {
    Self {
      tables:   Arc::clone(&self.tables),
      auth:     Arc::clone(&self.auth),
      notifier: Arc::clone(&self.notifier),
    }
  }
}

impl<T: TableStore, A: AuthProvider> PortalContext<T, A> {
  pub fn new(tables: T, auth: A, notifier: impl Notifier + 'static) -> Self {
    Self::from_shared(Arc::new(tables), Arc::new(auth), Arc::new(notifier))
  }

  pub fn from_shared(tables: Arc<T>, auth: Arc<A>, notifier: Arc<dyn Notifier>) -> Self {
    Self { tables, auth, notifier }
  }

  pub fn profile_store(&self) -> ProfileStore<T, A> { ProfileStore::new(self.clone()) }

  pub fn appointment_store(&self) -> AppointmentStore<T, A> {
    AppointmentStore::new(self.clone())
  }

  pub fn health_check_store(&self) -> HealthCheckStore<T, A> {
    HealthCheckStore::new(self.clone())
  }

  pub fn stats_store(&self) -> StatsStore<T, A> { StatsStore::new(self.clone()) }

  pub fn tables(&self) -> &T { &self.tables }

  pub fn auth(&self) -> &A { &self.auth }

  pub(crate) fn notify(&self, notification: Notification) {
    self.notifier.notify(notification);
  }
}

// ─── Store state ─────────────────────────────────────────────────────────────

/// The observable state of one entity store.
///
/// A fresh store reports `loading` until its first fetch settles.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState<D> {
  pub data:    D,
  pub loading: bool,
  pub error:   Option<Error>,
}

impl<D: Default> Default for StoreState<D> {
  fn default() -> Self { Self { data: D::default(), loading: true, error: None } }
}

impl<D> StoreState<D> {
  /// Record the outcome of a fetch. A failed fetch keeps the previous data.
  pub(crate) fn settle(&mut self, outcome: Result<D, Error>) -> Result<(), Error> {
    self.loading = false;
    match outcome {
      Ok(data) => {
        self.data = data;
        self.error = None;
        Ok(())
      }
      Err(e) => {
        self.error = Some(e.clone());
        Err(e)
      }
    }
  }

  /// Record a failed mutation.
  pub(crate) fn fail(&mut self, e: Error) -> Error {
    self.error = Some(e.clone());
    e
  }
}

// ─── Row decoding ────────────────────────────────────────────────────────────

/// Unwrap a decoded record, logging whatever the normalizer had to drop.
pub(crate) fn accept<R>(entity: &'static str, decoded: Decoded<R>) -> R {
  if !decoded.is_lossless() {
    tracing::warn!(entity, fields = ?decoded.discarded, "row normalized with losses");
  }
  decoded.into_inner()
}

/// Decode a list of rows, skipping any that cannot be shaped at all.
pub(crate) fn decode_all<R>(
  entity: &'static str,
  rows: Vec<Row>,
  decode: impl Fn(Row) -> Result<Decoded<R>, ParseError>,
) -> Vec<R> {
  rows
    .into_iter()
    .filter_map(|row| match decode(row) {
      Ok(decoded) => Some(accept(entity, decoded)),
      Err(e) => {
        tracing::warn!(error = %e, "skipping malformed row");
        None
      }
    })
    .collect()
}
