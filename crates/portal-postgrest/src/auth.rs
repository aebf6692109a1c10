//! [`AuthProvider`] backed by the project's auth endpoint.

use std::time::Duration;

use portal_core::{AuthFailure, AuthProvider, Identity};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{Error, PostgrestConfig};

#[derive(Debug, Deserialize)]
struct UserBody {
  id: String,
}

/// Resolves the signed-in user with `GET /auth/v1/user`.
///
/// Without an access token nobody is signed in and no request is made.
#[derive(Clone)]
pub struct SupabaseAuth {
  client: Client,
  config: PostgrestConfig,
}

impl SupabaseAuth {
  pub fn new(config: PostgrestConfig) -> Result<Self, Error> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self::with_client(client, config))
  }

  pub(crate) fn with_client(client: Client, config: PostgrestConfig) -> Self {
    Self { client, config }
  }

  async fn lookup(&self, token: &str) -> Result<Identity, Error> {
    let url = format!("{}/auth/v1/user", self.config.base_url.trim_end_matches('/'));
    let resp = self
      .client
      .get(url)
      .header("apikey", &self.config.anon_key)
      .bearer_auth(token)
      .send()
      .await?;

    if resp.status() != StatusCode::OK {
      return Err(Error::from_response(resp).await);
    }
    let user: UserBody = resp.json().await?;
    Ok(Identity::new(user.id))
  }
}

impl AuthProvider for SupabaseAuth {
  async fn current_user(&self) -> Result<Option<Identity>, AuthFailure> {
    let Some(token) = self.config.access_token.as_deref() else {
      return Ok(None);
    };
    match self.lookup(token).await {
      Ok(identity) => Ok(Some(identity)),
      Err(e) => Err(AuthFailure(e.to_string())),
    }
  }
}
