// openmarket/src/checkout/pending.rs

//! Persistence of an in-flight checkout, so an interrupted payment can be
//! noticed on the next start.

use crate::error::{MarketError, Result};
use crate::model::Cart;
use anyhow::Context;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCheckout {
  pub cart: Cart,
  /// Total quoted by the order registry, in the smallest unit.
  pub total: u64,
  pub created_at: DateTime<Utc>,
}

pub trait PendingCheckoutStore: Send + Sync {
  fn save(&self, pending: &PendingCheckout) -> Result<()>;

  fn load(&self) -> Result<Option<PendingCheckout>>;

  /// Clearing an empty store is not an error.
  fn clear(&self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryPendingStore {
  slot: Mutex<Option<PendingCheckout>>,
}

impl MemoryPendingStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl PendingCheckoutStore for MemoryPendingStore {
  fn save(&self, pending: &PendingCheckout) -> Result<()> {
    *self.slot.lock() = Some(pending.clone());
    Ok(())
  }

  fn load(&self) -> Result<Option<PendingCheckout>> {
    Ok(self.slot.lock().clone())
  }

  fn clear(&self) -> Result<()> {
    self.slot.lock().take();
    Ok(())
  }
}

/// Stores the pending checkout as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFilePendingStore {
  path: PathBuf,
}

impl JsonFilePendingStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn try_save(&self, pending: &PendingCheckout) -> anyhow::Result<()> {
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_vec_pretty(pending).context("serializing pending checkout")?;
    std::fs::write(&self.path, json).with_context(|| format!("writing {}", self.path.display()))?;
    Ok(())
  }

  fn try_load(&self) -> anyhow::Result<Option<PendingCheckout>> {
    let bytes = match std::fs::read(&self.path) {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(e).with_context(|| format!("reading {}", self.path.display())),
    };
    let pending = serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", self.path.display()))?;
    Ok(Some(pending))
  }

  fn try_clear(&self) -> anyhow::Result<()> {
    match std::fs::remove_file(&self.path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e).with_context(|| format!("removing {}", self.path.display())),
    }
  }
}

fn storage_error(e: anyhow::Error) -> MarketError {
  MarketError::Storage(format!("{:#}", e))
}

impl PendingCheckoutStore for JsonFilePendingStore {
  fn save(&self, pending: &PendingCheckout) -> Result<()> {
    self.try_save(pending).map_err(storage_error)
  }

  fn load(&self) -> Result<Option<PendingCheckout>> {
    self.try_load().map_err(storage_error)
  }

  fn clear(&self) -> Result<()> {
    self.try_clear().map_err(storage_error)
  }
}
