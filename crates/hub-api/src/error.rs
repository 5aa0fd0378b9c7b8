//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use hub_core::{Error as CoreError, store::StoreError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error by the domain error it carries, if any.
  pub fn from_store<E: StoreError>(err: E) -> Self {
    let classified = err.as_core().and_then(Self::classify);
    classified.unwrap_or_else(|| Self::Store(Box::new(err)))
  }

  fn classify(err: &CoreError) -> Option<Self> {
    let message = err.to_string();
    if err.is_validation() {
      Some(Self::BadRequest(message))
    } else if err.is_not_found() {
      Some(Self::NotFound(message))
    } else if matches!(err, CoreError::PermissionDenied(_) | CoreError::NoVendor(_)) {
      Some(Self::Forbidden(message))
    } else {
      None
    }
  }
}

impl From<CoreError> for ApiError {
  fn from(err: CoreError) -> Self {
    Self::classify(&err).unwrap_or_else(|| Self::Store(Box::new(err)))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
