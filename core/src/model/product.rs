// openmarket/src/model/product.rs

use crate::error::{MarketError, Result};
use crate::model::Category;
use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A listing as last read from the inventory registry. May be stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub id: u64,
  pub name: String,
  pub category: Category,
  /// Unit price in the chain's smallest unit.
  pub price: u64,
  pub available_units: u64,
  pub image_cid: String,
  pub owner: Address,
  pub enabled: bool,
  pub release_date: Option<DateTime<Utc>>,
}

impl Product {
  /// Whether this read allows buying `quantity` units.
  pub fn can_supply(&self, quantity: u64) -> bool {
    self.enabled && quantity <= self.available_units
  }
}

/// Seller input for a new listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
  pub name: String,
  pub category: Category,
  pub price: u64,
  pub available_units: u64,
  pub image_cid: String,
  pub enabled: bool,
}

impl ProductDraft {
  pub fn validate(&self) -> Result<()> {
    self.validate_details()?;
    require_image(&self.image_cid)
  }

  /// Everything except the image, which may still be uploading.
  pub fn validate_details(&self) -> Result<()> {
    validate_details(&self.name, self.price)
  }
}

/// Seller edit of an existing listing. Every field is written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
  pub id: u64,
  pub name: String,
  pub category: Category,
  pub price: u64,
  pub available_units: u64,
  pub image_cid: String,
  pub enabled: bool,
}

impl ProductUpdate {
  pub fn validate(&self) -> Result<()> {
    validate_details(&self.name, self.price)?;
    require_image(&self.image_cid)
  }
}

impl From<&Product> for ProductUpdate {
  fn from(p: &Product) -> Self {
    ProductUpdate {
      id: p.id,
      name: p.name.clone(),
      category: p.category,
      price: p.price,
      available_units: p.available_units,
      image_cid: p.image_cid.clone(),
      enabled: p.enabled,
    }
  }
}

fn validate_details(name: &str, price: u64) -> Result<()> {
  if name.trim().is_empty() {
    return Err(MarketError::MissingField { field: "name" });
  }
  if price == 0 {
    return Err(MarketError::InvalidInput("Price must be greater than zero.".to_string()));
  }
  Ok(())
}

fn require_image(image_cid: &str) -> Result<()> {
  if image_cid.trim().is_empty() {
    return Err(MarketError::MissingField { field: "image_cid" });
  }
  Ok(())
}
