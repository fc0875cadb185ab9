// demos/upload_proxy/src/state.rs
use crate::config::AppConfig;
use openmarket::ImageUploadBridge;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub bridge: Arc<ImageUploadBridge>,
  pub config: Arc<AppConfig>,
}
