// storefront-core/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Every failure the domain core can report.
///
/// Business-rule failures (`Validation`, `StockInsufficient`, `OrderException`, ...)
/// carry a client-facing message; the server maps each kind to an HTTP status.
#[derive(Debug, Error)]
pub enum ShopError {
  #[error("{0}")]
  Validation(String),

  #[error("Insufficient stock for #{product_id}-{product_name}")]
  StockInsufficient { product_id: i64, product_name: String },

  /// Raised when an order's items are frozen (shipped or delivered).
  #[error("{0}")]
  OrderException(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  PermissionDenied(String),

  /// Bearer or refresh token could not be decoded, is expired, or was revoked.
  #[error("{0}")]
  AuthToken(String),

  #[error("Invalid credentials")]
  InvalidCredentials,

  #[error("{0}")]
  Conflict(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("No workflow registered for context type {type_name}")]
  WorkflowNotRegistered { type_name: String },

  #[error("Internal error: {source}")]
  Internal {
    #[from]
    source: AnyhowError,
  },
}

impl ShopError {
  pub fn validation(message: impl Into<String>) -> Self {
    ShopError::Validation(message.into())
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    ShopError::NotFound(message.into())
  }

  pub fn internal(message: impl std::fmt::Display) -> Self {
    ShopError::Internal {
      source: anyhow::anyhow!("{}", message),
    }
  }

  /// True for failures caused by the request rather than by the service.
  pub fn is_client_error(&self) -> bool {
    !matches!(
      self,
      ShopError::Database(_)
        | ShopError::Migration(_)
        | ShopError::HandlerMissing { .. }
        | ShopError::WorkflowNotRegistered { .. }
        | ShopError::Internal { .. }
    )
  }
}

pub type ShopResult<T, E = ShopError> = std::result::Result<T, E>;
