//! Core types and scheduling logic for street-sweeping reminders.
//!
//! This crate has no HTTP or database dependencies. The
//! storage backend and the SMS/verification vendor are reached only through
//! the [`store::AlertStore`] and [`gateway::NotificationGateway`] traits.

// Native `async fn` in traits; the store and gateway traits spell out their
// `Send` bounds explicitly.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod error;
pub mod gateway;
pub mod recurrence;
pub mod service;
pub mod store;
pub mod subscription;
pub mod sweep;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
