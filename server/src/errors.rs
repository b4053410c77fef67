// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use storefront_core::ShopError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Shop(#[from] ShopError),

  #[error("Configuration Error: {0}")]
  Config(String),

  /// Request-shape failures caught before the domain core runs (bad JSON, bad path segment).
  #[error("{0}")]
  Validation(String),

  /// Missing or malformed `Authorization` header.
  #[error("{0}")]
  Unauthorized(String),
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
      AppError::Shop(err) => match err {
        ShopError::Validation(_)
        | ShopError::StockInsufficient { .. }
        | ShopError::OrderException(_)
        | ShopError::Conflict(_) => StatusCode::BAD_REQUEST,
        ShopError::NotFound(_) => StatusCode::NOT_FOUND,
        ShopError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        ShopError::AuthToken(_) | ShopError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        ShopError::Database(_)
        | ShopError::Migration(_)
        | ShopError::HandlerMissing { .. }
        | ShopError::WorkflowNotRegistered { .. }
        | ShopError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    // Server-side failures are logged in full and reported generically.
    let detail = if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with server error");
      "A server error occurred.".to_string()
    } else {
      tracing::debug!(application_error = %self, status = status.as_u16(), "Responding with client error");
      self.to_string()
    };
    HttpResponse::build(status).json(json!({ "detail": detail }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
