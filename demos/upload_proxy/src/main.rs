// demos/upload_proxy/src/main.rs

mod config;
mod errors;
mod state;
mod web;

use crate::config::AppConfig;
use crate::state::AppState;

use actix_multipart::form::MultipartFormConfig;
use actix_web::{web as actix_data, App, HttpServer};
use openmarket::ImageUploadBridge;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting upload proxy server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::other(e.to_string()));
    }
  };

  let bridge = match ImageUploadBridge::from_config(&app_config.market) {
    Ok(bridge) => Arc::new(bridge),
    Err(e) => {
      tracing::error!(error = %e, "Failed to build the pinning client.");
      return Err(std::io::Error::other(e.to_string()));
    }
  };

  let app_state = AppState {
    bridge,
    config: app_config.clone(),
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .app_data(
        MultipartFormConfig::default()
          .total_limit(app_state.config.max_upload_bytes)
          .memory_limit(app_state.config.max_upload_bytes),
      )
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
