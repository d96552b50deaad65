//! Street-sweeping reminder server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, starts the due-alert sweep in the background and serves the JSON
//! API over HTTP until interrupted.

mod config;
mod dry_run;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use sweep_core::{
  clock::SystemClock, gateway::NotificationGateway, service::SubscriptionService,
  sweep::DueAlertSweeper,
};
use sweep_store_sqlite::SqliteStore;
use sweep_twilio::TwilioGateway;
use tokio::{net::TcpListener, sync::watch};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{config::ServerConfig, dry_run::DryRunGateway};

#[derive(Parser)]
#[command(author, version, about = "Street-sweeping reminder server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Log reminders and accept every code instead of calling Twilio.
  #[arg(long)]
  dry_run: bool,
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

  let settings =
    ServerConfig::load(&cli.config).context("failed to read configuration")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&settings.store.path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if cli.dry_run {
    tracing::warn!("dry run: no messages will be sent and every code is accepted");
    run(settings, Arc::new(store), Arc::new(DryRunGateway), true).await
  } else {
    let gateway = TwilioGateway::new(settings.twilio.clone())
      .context("invalid twilio settings")?;
    run(settings, Arc::new(store), Arc::new(gateway), false).await
  }
}

/// Start the sweep and serve the API until ctrl-c, then stop the sweep.
async fn run<G>(
  settings: ServerConfig,
  store: Arc<SqliteStore>,
  gateway: Arc<G>,
  dry_run: bool,
) -> anyhow::Result<()>
where
  G: NotificationGateway + 'static,
{
  let clock = Arc::new(SystemClock);
  let calculator = settings.calculator()?;

  let sweeper = DueAlertSweeper::new(
    store.clone(),
    gateway.clone(),
    clock.clone(),
    calculator,
    settings.reminder_message(dry_run)?,
  )
  .with_interval(settings.sweep_interval()?);

  let (shutdown_tx, shutdown_rx) = watch::channel(false);
  let sweep_task = tokio::spawn(sweeper.run(shutdown_rx));

  let service = Arc::new(SubscriptionService::new(store, gateway, clock, calculator));
  let app = build_app(service, &expand_tilde(&settings.server.static_dir));

  let address = settings.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  // The sweeper may already be gone; nothing to signal then.
  shutdown_tx.send(true).ok();
  sweep_task.await.context("sweep task failed")?;

  Ok(())
}

/// The JSON API, with the sign-up front end in `static_dir` behind it.
fn build_app<G>(
  service: Arc<SubscriptionService<SqliteStore, G, SystemClock>>,
  static_dir: &Path,
) -> Router
where
  G: NotificationGateway + 'static,
{
  let router = sweep_api::api_router(service);
  let router = if static_dir.is_dir() {
    tracing::info!(dir = %static_dir.display(), "serving front end");
    router.fallback_service(ServeDir::new(static_dir))
  } else {
    tracing::warn!(dir = %static_dir.display(), "front end directory missing; serving the API only");
    router
  };
  router.layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
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
