//! weft-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), then serves
//! the collaboration-graph API over HTTP with one graph service per
//! session and an idle-session reaper.

mod routes;
mod sessions;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use weft_jira::JiraConfig;

use crate::{
  routes::AppState, sessions::SessionRegistry, settings::Settings,
};

#[derive(Parser)]
#[command(author, version, about = "Weft collaboration graph server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let jira = JiraConfig {
    base_url: settings.jira_base_url.clone(),
    username: settings.jira_username.clone(),
    password: settings.jira_password.clone(),
  };
  let sessions = Arc::new(SessionRegistry::new(jira.clone()));
  tokio::spawn(sessions::reap_idle_sessions(Arc::clone(&sessions)));

  let state = AppState {
    sessions,
    http: reqwest::Client::new(),
    jira,
  };
  let app = routes::router(state);

  let address = format!("{}:{}", settings.host, settings.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
