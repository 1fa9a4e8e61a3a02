//! Engine configuration, read from `tender.toml` and `TENDER_*` variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Runtime configuration shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
}

fn default_store_path() -> PathBuf { PathBuf::from("tender.db") }

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

impl EngineConfig {
  /// Layer the (optional) file at `path` under `TENDER_*` environment
  /// variables, e.g. `TENDER_STORE_PATH=/var/lib/tender.db`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("TENDER"))
      .build()
      .context("failed to read config file")?;
    Self::from_settings(settings)
  }

  fn from_settings(settings: config::Config) -> anyhow::Result<Self> {
    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise EngineConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
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
