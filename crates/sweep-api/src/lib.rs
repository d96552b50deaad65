//! JSON API for the reminder service.
//!
//! Exposes an axum [`Router`] backed by a [`SubscriptionService`]. TLS,
//! request tracing and static assets are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = sweep_api::api_router(service.clone()).layer(TraceLayer::new_for_http());
//! ```

pub mod alerts;
pub mod error;
pub mod verification;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use sweep_core::{
  clock::Clock, gateway::NotificationGateway, service::SubscriptionService,
  store::AlertStore,
};

pub use error::ApiError;

/// Build the API router for `service`.
pub fn api_router<S, G, C>(service: Arc<SubscriptionService<S, G, C>>) -> Router<()>
where
  S: AlertStore + 'static,
  G: NotificationGateway + 'static,
  C: Clock + 'static,
{
  Router::new()
    .route("/health", get(health))
    .route("/verification/start", post(verification::start::<S, G, C>))
    .route("/verification/verify", post(verification::verify::<S, G, C>))
    .route("/alerts/stop", post(alerts::stop::<S, G, C>))
    .with_state(service)
}

/// `GET /health`
async fn health() -> &'static str { "ok" }
