//! Error type for `sweep-twilio`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// Twilio answered with a status the adapter cannot turn into a yes/no.
  #[error("twilio returned {status}: {message} (code {code:?})")]
  Api {
    status:  u16,
    code:    Option<u32>,
    message: String,
  },

  #[error("missing twilio setting: {0}")]
  MissingSetting(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
