// openmarket/src/upload.rs

//! Product image uploads to an IPFS pinning service.

use crate::config::{MarketConfig, PinningConfig};
use crate::display;
use crate::error::{MarketError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

pub const DEFAULT_IMAGE_NAME: &str = "product-image";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
  pub name: String,
  pub content_type: Option<String>,
  pub bytes: Vec<u8>,
}

impl ImageFile {
  pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
    Self {
      name: name.into(),
      content_type: None,
      bytes,
    }
  }

  pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
    self.content_type = Some(content_type.into());
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
  pub cid: String,
  pub size: u64,
  pub name: String,
}

/// Success body of the pinning endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PinResponse {
  #[serde(rename = "IpfsHash")]
  pub ipfs_hash: String,
  #[serde(rename = "PinSize", default)]
  pub pin_size: Option<u64>,
  #[serde(rename = "Timestamp", default)]
  pub timestamp: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PinError {
  #[error("request to pinning service failed: {0}")]
  Transport(String),
  #[error("pinning service returned HTTP {status}: {body}")]
  Status { status: u16, body: String },
  #[error("unexpected pinning service response: {0}")]
  Malformed(String),
}

pub fn parse_pin_response(body: &str) -> std::result::Result<PinResponse, PinError> {
  let parsed: PinResponse = serde_json::from_str(body).map_err(|e| PinError::Malformed(e.to_string()))?;
  if parsed.ipfs_hash.trim().is_empty() {
    return Err(PinError::Malformed("empty IpfsHash".to_string()));
  }
  Ok(parsed)
}

#[async_trait]
pub trait PinningEndpoint: Send + Sync {
  async fn pin_file(&self, file: &ImageFile) -> std::result::Result<PinResponse, PinError>;
}

/// Pinata's `pinFileToIPFS` over HTTP.
#[derive(Debug, Clone)]
pub struct PinataEndpoint {
  client: reqwest::Client,
  config: PinningConfig,
}

impl PinataEndpoint {
  pub fn new(config: PinningConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(UPLOAD_TIMEOUT)
      .build()
      .map_err(|e| MarketError::Config(format!("Failed to build HTTP client: {}", e)))?;
    Ok(Self { client, config })
  }

  fn form(file: &ImageFile) -> std::result::Result<Form, PinError> {
    let mut part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
    if let Some(content_type) = &file.content_type {
      part = part
        .mime_str(content_type)
        .map_err(|e| PinError::Transport(format!("invalid content type '{}': {}", content_type, e)))?;
    }
    let metadata = serde_json::json!({ "name": file.name }).to_string();
    Ok(Form::new().part("file", part).text("pinataMetadata", metadata))
  }
}

#[async_trait]
impl PinningEndpoint for PinataEndpoint {
  async fn pin_file(&self, file: &ImageFile) -> std::result::Result<PinResponse, PinError> {
    let mut request = self.client.post(&self.config.endpoint).multipart(Self::form(file)?);
    if let Some(key) = &self.config.api_key {
      request = request.header("pinata_api_key", key);
    }
    if let Some(secret) = &self.config.secret_api_key {
      request = request.header("pinata_secret_api_key", secret);
    }

    let response = request.send().await.map_err(|e| PinError::Transport(e.to_string()))?;
    let status = response.status();
    let body = response.text().await.map_err(|e| PinError::Transport(e.to_string()))?;
    if !status.is_success() {
      return Err(PinError::Status {
        status: status.as_u16(),
        body,
      });
    }
    parse_pin_response(&body)
  }
}

/// Forwards image files to the pinning endpoint and returns their CID.
#[derive(Clone)]
pub struct ImageUploadBridge {
  endpoint: Arc<dyn PinningEndpoint>,
  gateway_url: String,
}

impl ImageUploadBridge {
  pub fn new(endpoint: Arc<dyn PinningEndpoint>, gateway_url: impl Into<String>) -> Self {
    Self {
      endpoint,
      gateway_url: gateway_url.into(),
    }
  }

  pub fn from_config(config: &MarketConfig) -> Result<Self> {
    let endpoint = PinataEndpoint::new(config.pinning.clone())?;
    Ok(Self::new(Arc::new(endpoint), config.gateway_url.clone()))
  }

  /// Uploads one file. Every failure past local validation is reported as
  /// `MarketError::UploadFailed`; the cause is only logged. Not retried.
  #[instrument(
    name = "ImageUploadBridge::upload",
    skip_all,
    fields(name = %file.name, bytes = file.bytes.len()),
    err(Display)
  )]
  pub async fn upload(&self, file: ImageFile) -> Result<UploadedImage> {
    if file.bytes.is_empty() {
      return Err(MarketError::InvalidInput("No file uploaded".to_string()));
    }
    let name = if file.name.trim().is_empty() {
      DEFAULT_IMAGE_NAME.to_string()
    } else {
      file.name.clone()
    };
    let file = ImageFile { name, ..file };

    match self.endpoint.pin_file(&file).await {
      Ok(pinned) => {
        info!("Pinned '{}' as {}.", file.name, pinned.ipfs_hash);
        Ok(UploadedImage {
          size: pinned.pin_size.unwrap_or(file.bytes.len() as u64),
          cid: pinned.ipfs_hash,
          name: file.name,
        })
      }
      Err(e) => {
        error!("Image upload failed: {}", e);
        Err(MarketError::UploadFailed)
      }
    }
  }

  pub fn image_url(&self, cid: &str) -> String {
    display::image_url(&self.gateway_url, cid)
  }
}
