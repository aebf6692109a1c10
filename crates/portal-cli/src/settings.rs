//! Layered configuration: an optional TOML file, then `PORTAL_*` environment
//! variables, then command-line overrides.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use portal_postgrest::PostgrestConfig;
use serde::Deserialize;

/// Which [`portal_core::TableStore`] the commands run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  /// A local SQLite file; the user is taken from `user_id`.
  #[default]
  Sqlite,
  /// A hosted project; the user is resolved from `access_token`.
  Postgrest,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PortalConfig {
  #[serde(default)]
  pub backend:           Backend,
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  #[serde(default)]
  pub user_id:           Option<String>,
  #[serde(default)]
  pub supabase_url:      Option<String>,
  #[serde(default)]
  pub supabase_anon_key: Option<String>,
  #[serde(default)]
  pub access_token:      Option<String>,
}

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/portal/portal.db") }

impl PortalConfig {
  /// Read `path` (if it exists) and the environment, with `user` taking
  /// precedence over both.
  pub fn load(path: &Path, user: Option<String>) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("PORTAL"))
      .set_override_option("user_id", user)?
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise PortalConfig")
  }

  /// Settings for the hosted backend; both the URL and the anon key are
  /// required.
  pub fn postgrest(&self) -> anyhow::Result<PostgrestConfig> {
    let base_url = self
      .supabase_url
      .clone()
      .context("supabase_url must be set for the postgrest backend")?;
    let anon_key = self
      .supabase_anon_key
      .clone()
      .context("supabase_anon_key must be set for the postgrest backend")?;
    Ok(PostgrestConfig { base_url, anon_key, access_token: self.access_token.clone() })
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
