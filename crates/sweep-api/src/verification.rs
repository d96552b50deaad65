//! Handlers for `/verification` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/verification/start`  | Body: `{"destination":"…","via":"sms"}` |
//! | `POST` | `/verification/verify` | Body: `{"destination":"…","code":"…","timezone":"…","times":[…]}` |

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sweep_core::{
  clock::Clock,
  gateway::{Channel, NotificationGateway},
  service::SubscriptionService,
  store::AlertStore,
  subscription::{Destination, OccurrenceRule, Subscription},
};

use crate::error::ApiError;

// ─── Start ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartBody {
  pub destination: Destination,
  #[serde(default)]
  pub via:         Channel,
}

/// `POST /verification/start`
pub async fn start<S, G, C>(
  State(service): State<Arc<SubscriptionService<S, G, C>>>,
  body: Result<Json<StartBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: AlertStore + 'static,
  G: NotificationGateway + 'static,
  C: Clock + 'static,
{
  let Json(body) = body?;
  service.start_verification(&body.destination, body.via).await?;
  Ok(Json(json!({ "status": "pending" })))
}

// ─── Verify ──────────────────────────────────────────────────────────────────

/// One (weekday, nth_week) pair of a verify request.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct SweepTime {
  pub weekday:  u8,
  pub nth_week: u8,
}

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
  pub destination: Destination,
  pub code:        String,
  pub timezone:    String,
  pub times:       Vec<SweepTime>,
}

impl VerifyBody {
  /// Pair every time with the shared timezone. Validation happens in the
  /// service.
  fn rules(&self) -> Vec<OccurrenceRule> {
    self
      .times
      .iter()
      .map(|t| OccurrenceRule {
        weekday:  t.weekday,
        nth_week: t.nth_week,
        timezone: self.timezone.clone(),
      })
      .collect()
  }
}

/// `POST /verification/verify`: creates one subscription per entry in
/// `times` and returns them.
pub async fn verify<S, G, C>(
  State(service): State<Arc<SubscriptionService<S, G, C>>>,
  body: Result<Json<VerifyBody>, JsonRejection>,
) -> Result<Json<Vec<Subscription>>, ApiError>
where
  S: AlertStore + 'static,
  G: NotificationGateway + 'static,
  C: Clock + 'static,
{
  let Json(body) = body?;
  let rules = body.rules();
  let created = service
    .complete_subscription(&body.destination, &body.code, rules)
    .await?;
  Ok(Json(created))
}
