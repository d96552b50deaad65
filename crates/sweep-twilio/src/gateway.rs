//! [`TwilioGateway`]: Verify for codes, Messaging for reminders.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use sweep_core::{
  gateway::{Channel, NotificationGateway},
  subscription::Destination,
};

use crate::{Error, Result, TwilioConfig};

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct TwilioGateway {
  client: Client,
  config: TwilioConfig,
}

#[derive(Deserialize)]
struct VerificationCheck {
  status: String,
}

#[derive(Default, Deserialize)]
struct ErrorBody {
  code:    Option<u32>,
  message: Option<String>,
}

impl TwilioGateway {
  pub fn new(config: TwilioConfig) -> Result<Self> {
    config.validate()?;
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  /// `+<country><number>` unless the number already carries a country code.
  pub fn e164(&self, number: &str) -> String {
    if number.starts_with('+') || !number.bytes().all(|b| b.is_ascii_digit()) {
      number.to_owned()
    } else {
      format!("+{}{}", self.config.country_code, number)
    }
  }

  fn verify_url(&self, resource: &str) -> String {
    format!(
      "{}/v2/Services/{}/{}",
      self.config.verify_base.trim_end_matches('/'),
      self.config.verify_service_sid,
      resource
    )
  }

  fn messages_url(&self) -> String {
    format!(
      "{}/2010-04-01/Accounts/{}/Messages.json",
      self.config.api_base.trim_end_matches('/'),
      self.config.account_sid
    )
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    req.basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
  }
}

/// A 4xx the provider uses to say "no" rather than "broken". Credential
/// failures and rate limiting are provider-side conditions, not a refusal
/// of this number or code.
fn is_refusal(status: StatusCode) -> bool {
  status.is_client_error()
    && !matches!(
      status,
      StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    )
}

async fn api_error(resp: Response) -> Error {
  let status = resp.status();
  let body: ErrorBody = resp.json().await.unwrap_or_default();
  Error::Api {
    status:  status.as_u16(),
    code:    body.code,
    message: body
      .message
      .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_owned()),
  }
}

// ─── NotificationGateway impl ────────────────────────────────────────────────

impl NotificationGateway for TwilioGateway {
  type Error = Error;

  async fn request_code(
    &self,
    destination: &Destination,
    channel: Channel,
  ) -> Result<bool> {
    let to = self.e164(destination.as_str());
    let resp = self
      .auth(self.client.post(self.verify_url("Verifications")))
      .form(&[("To", to.as_str()), ("Channel", channel.as_str())])
      .send()
      .await?;

    let status = resp.status();
    debug!(destination = %destination.masked(), %status, "verification start");
    if status.is_success() {
      return Ok(true);
    }
    if is_refusal(status) {
      return Ok(false);
    }
    Err(api_error(resp).await)
  }

  async fn verify_code(&self, destination: &Destination, code: &str) -> Result<bool> {
    let to = self.e164(destination.as_str());
    let resp = self
      .auth(self.client.post(self.verify_url("VerificationCheck")))
      .form(&[("To", to.as_str()), ("Code", code)])
      .send()
      .await?;

    let status = resp.status();
    debug!(destination = %destination.masked(), %status, "verification check");
    if status.is_success() {
      let check: VerificationCheck = resp.json().await?;
      return Ok(check.status == "approved");
    }
    // 404 means the verification expired or was already used.
    if is_refusal(status) {
      return Ok(false);
    }
    Err(api_error(resp).await)
  }

  async fn send(&self, from: &str, to: &Destination, body: &str) -> Result<()> {
    let from = self.e164(from);
    let to_e164 = self.e164(to.as_str());
    let resp = self
      .auth(self.client.post(self.messages_url()))
      .form(&[("From", from.as_str()), ("To", to_e164.as_str()), ("Body", body)])
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(api_error(resp).await);
    }
    debug!(destination = %to.masked(), "message accepted");
    Ok(())
  }
}
