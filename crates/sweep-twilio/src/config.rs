use std::fmt;

use serde::Deserialize;

use crate::{Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";
pub const DEFAULT_VERIFY_BASE: &str = "https://verify.twilio.com";

/// Account credentials and endpoints.
///
/// The base URLs only need overriding in tests.
#[derive(Clone, Deserialize)]
pub struct TwilioConfig {
  #[serde(default)]
  pub account_sid:        String,
  #[serde(default)]
  pub auth_token:         String,
  #[serde(default)]
  pub verify_service_sid: String,
  /// Prepended to numbers that do not start with `+`.
  #[serde(default = "default_country_code")]
  pub country_code:       String,
  #[serde(default = "default_api_base")]
  pub api_base:           String,
  #[serde(default = "default_verify_base")]
  pub verify_base:        String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:       u64,
}

fn default_country_code() -> String { "1".to_owned() }
fn default_api_base() -> String { DEFAULT_API_BASE.to_owned() }
fn default_verify_base() -> String { DEFAULT_VERIFY_BASE.to_owned() }
fn default_timeout_secs() -> u64 { 15 }

impl Default for TwilioConfig {
  fn default() -> Self {
    Self {
      account_sid:        String::new(),
      auth_token:         String::new(),
      verify_service_sid: String::new(),
      country_code:       default_country_code(),
      api_base:           default_api_base(),
      verify_base:        default_verify_base(),
      timeout_secs:       default_timeout_secs(),
    }
  }
}

impl TwilioConfig {
  /// Fail on the first credential left empty.
  pub fn validate(&self) -> Result<()> {
    if self.account_sid.is_empty() {
      return Err(Error::MissingSetting("account_sid"));
    }
    if self.auth_token.is_empty() {
      return Err(Error::MissingSetting("auth_token"));
    }
    if self.verify_service_sid.is_empty() {
      return Err(Error::MissingSetting("verify_service_sid"));
    }
    Ok(())
  }
}

impl fmt::Debug for TwilioConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TwilioConfig")
      .field("account_sid", &self.account_sid)
      .field("auth_token", &"<redacted>")
      .field("verify_service_sid", &self.verify_service_sid)
      .field("country_code", &self.country_code)
      .field("api_base", &self.api_base)
      .field("verify_base", &self.verify_base)
      .field("timeout_secs", &self.timeout_secs)
      .finish()
  }
}
