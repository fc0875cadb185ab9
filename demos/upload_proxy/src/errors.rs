// demos/upload_proxy/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use openmarket::MarketError;
use serde_json::json;
use thiserror::Error;

/// Body sent to the client for any pinning failure. The cause is only logged.
pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload to IPFS";

/// Body sent when the request carries no usable `file` part.
pub const NO_FILE_MESSAGE: &str = "No file uploaded";

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Upload Error: {0}")]
  Upload(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<MarketError> for AppError {
  fn from(err: MarketError) -> Self {
    match err {
      MarketError::InvalidInput(m) => AppError::Validation(m),
      MarketError::UploadFailed => AppError::Upload(err.to_string()),
      MarketError::Config(m) => AppError::Config(m),
      other => AppError::Internal(other.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Validation(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      AppError::Upload(_) => HttpResponse::InternalServerError().json(json!({"error": UPLOAD_FAILED_MESSAGE})),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred", "detail": m}))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::http::StatusCode;

  #[test]
  fn market_errors_map_to_status_codes() {
    let cases = [
      (MarketError::InvalidInput(NO_FILE_MESSAGE.to_string()), StatusCode::BAD_REQUEST),
      (MarketError::UploadFailed, StatusCode::INTERNAL_SERVER_ERROR),
      (MarketError::Config("bad".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
      (MarketError::EmptyCart, StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (market_err, status) in cases {
      assert_eq!(AppError::from(market_err).error_response().status(), status);
    }
  }
}
