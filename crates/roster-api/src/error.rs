//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body has the shape `{"success": false, "message": ...}`.
//! Failures without a domain cause are logged under a fresh request id, and
//! only that id reaches the client.

use std::any::Any;

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use roster_core::{Error as CoreError, StoreError, validate::ValidationErrors};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

const UNEXPECTED: &str = "An unexpected error occurred.";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("validation failed: {0}")]
  Validation(ValidationErrors),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("administrator access required")]
  Forbidden,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error by its domain cause, if it has one.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    let mapped = match e.as_core() {
      Some(CoreError::Validation(v)) => Some(Self::Validation(v.clone())),
      Some(c) if c.is_not_found() => Some(Self::NotFound(c.to_string())),
      Some(c @ CoreError::UnknownTargets { .. }) => Some(Self::BadRequest(c.to_string())),
      _ => None,
    };
    mapped.unwrap_or_else(|| Self::Store(Box::new(e)))
  }
}

fn internal_error(cause: &dyn std::fmt::Display) -> Response {
  let request_id = Uuid::new_v4().simple().to_string();
  tracing::error!(%request_id, error = %cause, "request failed");
  (
    StatusCode::INTERNAL_SERVER_ERROR,
    Json(json!({ "success": false, "message": UNEXPECTED, "request_id": request_id })),
  )
    .into_response()
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::Validation(v) => (
        StatusCode::BAD_REQUEST,
        json!({ "success": false, "message": v.to_string(), "errors": v.0 }),
      ),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "success": false, "message": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "success": false, "message": m })),
      ApiError::Forbidden => (
        StatusCode::FORBIDDEN,
        json!({ "success": false, "message": "Administrator access required." }),
      ),
      ApiError::Store(e) => return internal_error(e),
    };
    (status, Json(body)).into_response()
  }
}

/// Response for a handler that panicked; install with
/// `tower_http::catch_panic::CatchPanicLayer::custom(panic_response)`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
  let detail = if let Some(s) = panic.downcast_ref::<String>() {
    s.clone()
  } else if let Some(s) = panic.downcast_ref::<&str>() {
    (*s).to_owned()
  } else {
    "unknown panic payload".to_owned()
  };
  internal_error(&format_args!("handler panicked: {detail}"))
}
