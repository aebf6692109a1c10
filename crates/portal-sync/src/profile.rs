//! The profile store: zero-or-one profile per identity.

use portal_core::{
  AuthProvider, Identity, Table, TableStore,
  normalize::decode_profile,
  notify::Notification,
  profile::{Profile, ProfileUpdate},
  table::{Filter, Query, to_row},
};

use crate::{
  context::{PortalContext, StoreState, accept},
  error::{PersistenceError, Result},
  resolver::{require, resolve},
  upsert::upsert,
};

const FETCH_FAILED: &str = "Failed to fetch your profile data. Please try again later.";
const UPDATED: &str = "Profile updated successfully";

pub struct ProfileStore<T, A> {
  ctx:   PortalContext<T, A>,
  state: StoreState<Option<Profile>>,
}

impl<T: TableStore, A: AuthProvider> ProfileStore<T, A> {
  pub fn new(ctx: PortalContext<T, A>) -> Self { Self { ctx, state: StoreState::default() } }

  pub fn state(&self) -> &StoreState<Option<Profile>> { &self.state }

  pub fn profile(&self) -> Option<&Profile> { self.state.data.as_ref() }

  pub(crate) fn notify(&self, notification: Notification) { self.ctx.notify(notification); }

  /// Load the current identity's profile. Nobody signed in, or no profile
  /// yet, both leave the store empty without an error.
  pub async fn fetch(&mut self) -> Result<()> {
    self.state.loading = true;
    let outcome = self.load().await;
    if outcome.is_err() {
      self.ctx.notify(Notification::error(FETCH_FAILED));
    }
    self.state.settle(outcome)
  }

  async fn load(&self) -> Result<Option<Profile>> {
    let Some(identity) = resolve(self.ctx.auth()).await? else {
      tracing::debug!("no session; profile left empty");
      return Ok(None);
    };
    Ok(find(self.ctx.tables(), &identity).await?)
  }

  /// Write `update` for the current identity, creating the profile if there
  /// is none. The cached profile is replaced by the stored row.
  pub async fn update(&mut self, update: &ProfileUpdate) -> Result<Profile> {
    match self.write(update).await {
      Ok(profile) => {
        tracing::info!(id = %profile.id, "profile updated");
        self.state.data = Some(profile.clone());
        self.ctx.notify(Notification::success(UPDATED));
        Ok(profile)
      }
      Err(e) => {
        self.ctx.notify(Notification::error(e.to_string()));
        Err(self.state.fail(e))
      }
    }
  }

  async fn write(&self, update: &ProfileUpdate) -> Result<Profile> {
    const CONTEXT: &str = "update profile";

    let identity = require(self.ctx.auth()).await?;
    let partial = to_row(update).map_err(|e| PersistenceError::encoding(CONTEXT, e))?;
    tracing::debug!(%identity, fields = partial.len(), "writing profile");

    let row = upsert(self.ctx.tables(), Table::Profiles, &identity, partial)
      .await
      .map_err(|e| PersistenceError { context: CONTEXT, ..e })?;
    let decoded = decode_profile(row).map_err(|e| PersistenceError::malformed(CONTEXT, e))?;
    Ok(accept("profile", decoded))
  }
}

/// Zero-or-one lookup of the profile keyed by `identity`.
async fn find<T: TableStore>(
  tables: &T,
  identity: &Identity,
) -> Result<Option<Profile>, PersistenceError> {
  const CONTEXT: &str = "fetch profile";

  let query = Query::all().filter(Filter::eq("id", identity)).limit(2);
  let rows = tables
    .select(Table::Profiles, &query)
    .await
    .map_err(|e| PersistenceError::store(CONTEXT, &e))?;

  let mut rows = rows.into_iter();
  match (rows.next(), rows.next()) {
    (None, _) => Ok(None),
    (Some(row), None) => {
      let decoded = decode_profile(row).map_err(|e| PersistenceError::malformed(CONTEXT, e))?;
      Ok(Some(accept("profile", decoded)))
    }
    (Some(_), Some(_)) => Err(PersistenceError::unexpected(
      CONTEXT,
      format!("more than one profile for {identity}"),
    )),
  }
}
