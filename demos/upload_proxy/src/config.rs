// demos/upload_proxy/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use openmarket::MarketConfig;
use std::env;

/// Largest request body accepted by `/api/upload`.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub max_upload_bytes: usize,

  /// Pinning credentials and gateway come from the shared `OPENMARKET_*` variables.
  pub market: MarketConfig,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let max_upload_bytes = match get_env("MAX_UPLOAD_BYTES") {
      Ok(raw) => raw
        .parse::<usize>()
        .map_err(|e| AppError::Config(format!("Invalid MAX_UPLOAD_BYTES: {}", e)))?,
      Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
    };

    let market = MarketConfig::from_env()?;
    if market.pinning.api_key.is_none() || market.pinning.secret_api_key.is_none() {
      tracing::warn!("Pinning API keys are not set; uploads will be rejected by the pinning service.");
    }

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      max_upload_bytes,
      market,
    })
  }
}
