//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Response bodies carry a fixed message only; the underlying cause is
//! logged and never sent to the client.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use sweep_core::service::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The verification provider said no.
  #[error("unauthorized: {0}")]
  Unauthorized(&'static str),

  /// The request body could not be turned into a valid request.
  #[error("malformed request: {0}")]
  Malformed(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

const GENERIC_MESSAGE: &str = "oops! we made a mistake";

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, *m),
      ApiError::Malformed(detail) => {
        warn!(%detail, "rejecting malformed request");
        (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_MESSAGE)
      }
      ApiError::Internal(e) => {
        error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_MESSAGE)
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::Malformed(rejection.body_text())
  }
}

impl From<ServiceError> for ApiError {
  fn from(e: ServiceError) -> Self {
    match e {
      ServiceError::VerificationRejected => {
        ApiError::Unauthorized("verification failed")
      }
      ServiceError::NoRules | ServiceError::Rule(_) => {
        ApiError::Malformed(e.to_string())
      }
      ServiceError::Store(_) | ServiceError::Gateway(_) => {
        ApiError::Internal(Box::new(e))
      }
    }
  }
}
