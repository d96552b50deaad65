//! Twilio adapter for [`sweep_core::gateway::NotificationGateway`].
//!
//! One-time codes go through Twilio Verify; reminders are plain SMS sent via
//! the Programmable Messaging API.

mod config;
mod gateway;

pub mod error;

pub use config::TwilioConfig;
pub use error::{Error, Result};
pub use gateway::TwilioGateway;
