// openmarket/src/model/seller.rs

use crate::error::{MarketError, Result};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Registration details submitted to the seller registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerProfile {
  pub business_name: String,
  pub owner_name: String,
  pub phone: String,
  pub email: String,
  pub city: String,
  pub location_address: String,
}

impl SellerProfile {
  /// Every field is required.
  pub fn validate(&self) -> Result<()> {
    let fields: [(&'static str, &str); 6] = [
      ("business_name", &self.business_name),
      ("owner_name", &self.owner_name),
      ("phone", &self.phone),
      ("email", &self.email),
      ("city", &self.city),
      ("location_address", &self.location_address),
    ];
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
      Some((field, _)) => Err(MarketError::MissingField { field: *field }),
      None => Ok(()),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seller {
  pub wallet: Address,
  pub profile: SellerProfile,
}
