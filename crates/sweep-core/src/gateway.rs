//! The `NotificationGateway` trait, the seam to the SMS and phone
//! verification vendor.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::subscription::Destination;

/// How a verification code reaches the subscriber.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
  #[default]
  Sms,
  Call,
}

impl Channel {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Sms => "sms",
      Self::Call => "call",
    }
  }
}

/// Outbound text messages and identity verification.
///
/// `Ok(false)` from the verification methods means the provider answered
/// and said no; `Err` means the provider could not be asked.
pub trait NotificationGateway: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Ask the provider to send a one-time code to `destination`.
  fn request_code<'a>(
    &'a self,
    destination: &'a Destination,
    channel: Channel,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Check a code the subscriber typed in.
  fn verify_code<'a>(
    &'a self,
    destination: &'a Destination,
    code: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Send a text message.
  fn send<'a>(
    &'a self,
    from: &'a str,
    to: &'a Destination,
    body: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
