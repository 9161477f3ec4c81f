// storefront/src/errors.rs

use std::collections::BTreeMap;

use actix_session::{SessionGetError, SessionInsertError};
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::json;
use storefront_flow::FlowError;
use thiserror::Error;
use validator::ValidationErrors;

/// Field-level validation messages plus the submitted input, so the caller
/// can re-render the form with what the user typed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationFailure {
  pub errors: BTreeMap<String, Vec<String>>,
  pub input: serde_json::Value,
}

impl ValidationFailure {
  pub fn new(input: serde_json::Value) -> Self {
    Self {
      errors: BTreeMap::new(),
      input,
    }
  }

  pub fn single(field: &str, message: impl Into<String>, input: serde_json::Value) -> Self {
    let mut failure = Self::new(input);
    failure.add(field, message);
    failure
  }

  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self.errors.entry(field.to_string()).or_default().push(message.into());
  }

  pub fn merge(&mut self, errs: &ValidationErrors) {
    for (field, list) in errs.field_errors() {
      for err in list.iter() {
        let message = err
          .message
          .as_ref()
          .map(|m| m.to_string())
          .unwrap_or_else(|| format!("Invalid value ({}).", err.code));
        self.add(field.as_ref(), message);
      }
    }
  }

  pub fn from_errors(errs: &ValidationErrors, input: serde_json::Value) -> Self {
    let mut failure = Self::new(input);
    failure.merge(errs);
    failure
  }

  pub fn is_empty(&self) -> bool {
    self.errors.is_empty()
  }
}

impl std::fmt::Display for ValidationFailure {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let fields: Vec<&str> = self.errors.keys().map(String::as_str).collect();
    write!(f, "invalid fields: {}", fields.join(", "))
  }
}

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(ValidationFailure),

  #[error("Authentication required")]
  Unauthenticated,

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Write Conflict: {0}")]
  WriteConflict(String),

  #[error("Payment Processing Error: {0}")]
  Payment(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Session Error: {0}")]
  Session(String),

  #[error("Upload Error: {0}")]
  Upload(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  pub fn not_found(what: &str) -> Self {
    AppError::NotFound(format!("{} not found.", what))
  }
}

impl From<ValidationFailure> for AppError {
  fn from(failure: ValidationFailure) -> Self {
    AppError::Validation(failure)
  }
}

impl From<SessionGetError> for AppError {
  fn from(err: SessionGetError) -> Self {
    AppError::Session(err.to_string())
  }
}

impl From<SessionInsertError> for AppError {
  fn from(err: SessionInsertError) -> Self {
    AppError::Session(err.to_string())
  }
}

impl From<std::io::Error> for AppError {
  fn from(err: std::io::Error) -> Self {
    AppError::Upload(err.to_string())
  }
}

impl From<reqwest::Error> for AppError {
  fn from(err: reqwest::Error) -> Self {
    AppError::Payment(format!("Payment provider request failed: {}", err))
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(db_err) => AppError::Sqlx(db_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::WriteConflict(_) => StatusCode::CONFLICT,
      AppError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Request rejected");
    }
    let mut builder = HttpResponse::build(status);
    match self {
      AppError::Validation(failure) => builder.json(json!({
        "error": "Validation failed",
        "fields": failure.errors,
        "input": failure.input,
      })),
      AppError::Unauthenticated => builder.json(json!({"error": "Authentication required"})),
      AppError::Forbidden(m) | AppError::NotFound(m) | AppError::WriteConflict(m) | AppError::Payment(m) => {
        builder.json(json!({"error": m}))
      }
      AppError::Config(_) => builder.json(json!({"error": "Configuration issue"})),
      AppError::Sqlx(_) => builder.json(json!({"error": "Database operation failed"})),
      AppError::Session(_) => builder.json(json!({"error": "Session could not be read or written"})),
      AppError::Upload(_) => builder.json(json!({"error": "Image upload failed"})),
      AppError::Workflow { source } => {
        tracing::error!(flow_error_source = ?source, "Workflow error details");
        builder.json(json!({"error": "Workflow processing error"}))
      }
      AppError::Internal(_) => builder.json(json!({"error": "An internal error occurred"})),
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
