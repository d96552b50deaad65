//! Handler for `POST /alerts/stop`, body: `{"destination":"…","code":"…"}`.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::Deserialize;
use serde_json::{Value, json};
use sweep_core::{
  clock::Clock,
  gateway::NotificationGateway,
  service::SubscriptionService,
  store::AlertStore,
  subscription::Destination,
};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct StopBody {
  pub destination: Destination,
  pub code:        String,
}

/// `POST /alerts/stop`: deletes every subscription for the destination.
pub async fn stop<S, G, C>(
  State(service): State<Arc<SubscriptionService<S, G, C>>>,
  body: Result<Json<StopBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: AlertStore + 'static,
  G: NotificationGateway + 'static,
  C: Clock + 'static,
{
  let Json(body) = body?;
  let removed = service
    .cancel_subscription(&body.destination, &body.code)
    .await?;
  Ok(Json(json!({ "removed": removed })))
}
