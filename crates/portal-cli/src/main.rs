//! `portal`: command-line front end for the health portal data layer.
//!
//! Reads `portal.toml` (or the path given with `--config`), layers `PORTAL_*`
//! environment variables on top, and runs one command against either a local
//! SQLite file or a hosted PostgREST project.
//!
//! # Usage
//!
//! ```
//! portal --user alice appointments book --doctor "Dr. Grey" --date 2030-01-02 --time 10:00
//! PORTAL_BACKEND=postgrest PORTAL_ACCESS_TOKEN=… portal stats
//! ```

mod commands;
mod notify;
mod photo;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use commands::Command;
use notify::StderrNotifier;
use portal_core::{Identity, StaticSession};
use portal_postgrest::PostgrestClient;
use portal_store_sqlite::SqliteStore;
use portal_sync::PortalContext;
use settings::{Backend, PortalConfig, expand_tilde};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Health portal profile, appointments and health checks")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "portal.toml")]
  config: PathBuf,

  /// Act as this user on the sqlite backend (overrides `user_id`).
  #[arg(short, long)]
  user: Option<String>,

  /// Print records as JSON.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = PortalConfig::load(&cli.config, cli.user)?;

  match cfg.backend {
    Backend::Sqlite => {
      let store_path = expand_tilde(&cfg.store_path);
      if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
          .with_context(|| format!("failed to create {}", parent.display()))?;
      }
      let store = SqliteStore::open(&store_path)
        .await
        .with_context(|| format!("failed to open store at {store_path:?}"))?;

      let session = match cfg.user_id {
        Some(user) => StaticSession::signed_in(Identity::new(user)),
        None => StaticSession::anonymous(),
      };
      tracing::debug!(path = %store_path.display(), "using sqlite backend");
      commands::run(PortalContext::new(store, session, StderrNotifier), cli.command, cli.json)
        .await
    }

    Backend::Postgrest => {
      let remote = cfg.postgrest()?;
      tracing::debug!(url = %remote.base_url, "using postgrest backend");
      let client = PostgrestClient::new(remote).context("failed to build http client")?;
      let auth = client.auth();
      commands::run(PortalContext::new(client, auth, StderrNotifier), cli.command, cli.json)
        .await
    }
  }
}
