//! Server configuration, deserialised from `config.toml` plus `WEFT_*`
//! environment overrides.

use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  pub host:          String,
  pub port:          u16,
  pub jira_base_url: String,
  pub jira_username: String,
  pub jira_password: String,
}

impl Settings {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("WEFT"))
      .build()
      .context("failed to read config file")?;
    settings
      .try_deserialize()
      .context("failed to deserialise Settings")
  }
}
