//! roster-server binary.
//!
//! Reads `roster.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, optionally seeds demo data, and serves the JSON
//! API under `/api`.

mod settings;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use roster_api::{ApiState, panic_response};
use roster_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Roster employee rights server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "roster.toml")]
  config: PathBuf,

  /// Seed demo data into an empty store, regardless of configuration.
  #[arg(long)]
  seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = settings::load(&cli.config)?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if cli.seed || server_cfg.seed {
    store.seed_demo_data().await.context("failed to seed demo data")?;
  }

  let user = server_cfg.demo_user.current_user();
  tracing::info!(role = %user.role_name, is_admin = user.is_admin, "demo user");

  let state = ApiState {
    store:  Arc::new(store),
    user,
    policy: Arc::new(server_cfg.demo_user.policy()),
  };

  let app = Router::new()
    .nest("/api", roster_api::api_router(state))
    .layer(CatchPanicLayer::custom(panic_response))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/roster.db")), PathBuf::from(home).join("roster.db"));
    assert_eq!(expand_tilde(Path::new("/var/roster.db")), PathBuf::from("/var/roster.db"));
  }
}
