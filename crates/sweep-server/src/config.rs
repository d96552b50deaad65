//! Runtime configuration, layered from an optional TOML file and
//! `SWEEPER_*` environment variables.
//!
//! Environment keys use `__` between section and field, e.g.
//! `SWEEPER_TWILIO__AUTH_TOKEN` or `SWEEPER_SERVER__PORT`.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context as _, bail};
use config::{Config, ConfigError, Environment, File, Source};
use serde::Deserialize;
use sweep_core::{
  recurrence::{DEFAULT_REMINDER_HOUR, RecurrenceCalculator},
  sweep::{DEFAULT_REMINDER_BODY, DEFAULT_SWEEP_INTERVAL, ReminderMessage},
};
use sweep_twilio::TwilioConfig;

// ─── Sections ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSection {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  /// Sign-up front end, served for every path the API does not claim.
  #[serde(default = "default_static_dir")]
  pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
  #[serde(default = "default_store_path")]
  pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSection {
  #[serde(default = "default_interval_secs")]
  pub interval_secs: u64,
  #[serde(default = "default_reminder_hour")]
  pub reminder_hour: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReminderSection {
  /// Number the reminders are sent from.
  #[serde(default)]
  pub sender:  String,
  #[serde(default = "default_message")]
  pub message: String,
}

fn default_host() -> String { "0.0.0.0".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_static_dir() -> PathBuf { PathBuf::from("public") }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/sweeper/sweeper.db") }
fn default_interval_secs() -> u64 { DEFAULT_SWEEP_INTERVAL.as_secs() }
fn default_reminder_hour() -> u32 { DEFAULT_REMINDER_HOUR }
fn default_message() -> String { DEFAULT_REMINDER_BODY.to_owned() }

impl Default for HttpSection {
  fn default() -> Self {
    Self {
      host:       default_host(),
      port:       default_port(),
      static_dir: default_static_dir(),
    }
  }
}

impl Default for StoreSection {
  fn default() -> Self { Self { path: default_store_path() } }
}

impl Default for ScheduleSection {
  fn default() -> Self {
    Self {
      interval_secs: default_interval_secs(),
      reminder_hour: default_reminder_hour(),
    }
  }
}

impl Default for ReminderSection {
  fn default() -> Self { Self { sender: String::new(), message: default_message() } }
}

// ─── Top level ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
  #[serde(default)]
  pub server:   HttpSection,
  #[serde(default)]
  pub store:    StoreSection,
  #[serde(default)]
  pub schedule: ScheduleSection,
  #[serde(default)]
  pub reminder: ReminderSection,
  #[serde(default)]
  pub twilio:   TwilioConfig,
}

impl ServerConfig {
  /// Read `path` (if it exists) overlaid with the process environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::build(File::from(path).required(false), environment())
  }

  #[cfg(test)]
  pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
    Self::build(
      File::from_str(toml, config::FileFormat::Toml),
      environment().source(Some(Default::default())),
    )
  }

  fn build<F>(file: F, env: Environment) -> Result<Self, ConfigError>
  where
    F: Source + Send + Sync + 'static,
  {
    Config::builder()
      .add_source(file)
      .add_source(env)
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.server.host, self.server.port) }

  pub fn sweep_interval(&self) -> anyhow::Result<Duration> {
    if self.schedule.interval_secs == 0 {
      bail!("schedule.interval_secs must be at least 1");
    }
    Ok(Duration::from_secs(self.schedule.interval_secs))
  }

  pub fn calculator(&self) -> anyhow::Result<RecurrenceCalculator> {
    RecurrenceCalculator::new(self.schedule.reminder_hour)
      .context("invalid schedule.reminder_hour")
  }

  /// The reminder text. A sender is mandatory unless `dry_run` is set.
  pub fn reminder_message(&self, dry_run: bool) -> anyhow::Result<ReminderMessage> {
    let sender = match self.reminder.sender.trim() {
      "" if dry_run => "dry-run".to_owned(),
      "" => bail!("reminder.sender is not set"),
      sender => sender.to_owned(),
    };
    Ok(ReminderMessage { sender, body: self.reminder.message.clone() })
  }
}

fn environment() -> Environment {
  Environment::with_prefix("SWEEPER")
    .prefix_separator("_")
    .separator("__")
}
