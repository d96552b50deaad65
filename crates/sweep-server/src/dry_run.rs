//! A gateway that talks to nobody, for running the server locally.

use std::convert::Infallible;

use sweep_core::{
  gateway::{Channel, NotificationGateway},
  subscription::Destination,
};
use tracing::info;

/// Logs every outbound message and approves every code.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunGateway;

impl NotificationGateway for DryRunGateway {
  type Error = Infallible;

  async fn request_code(
    &self,
    destination: &Destination,
    channel: Channel,
  ) -> Result<bool, Infallible> {
    info!(destination = %destination.masked(), channel = channel.as_str(), "[dry-run] code requested");
    Ok(true)
  }

  async fn verify_code(
    &self,
    destination: &Destination,
    _code: &str,
  ) -> Result<bool, Infallible> {
    info!(destination = %destination.masked(), "[dry-run] code accepted");
    Ok(true)
  }

  async fn send(
    &self,
    from: &str,
    to: &Destination,
    body: &str,
  ) -> Result<(), Infallible> {
    info!(from, to = %to.masked(), body, "[dry-run] reminder");
    Ok(())
  }
}
