// openmarket/src/model/cart.rs

use crate::error::{MarketError, Result};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
  pub product_id: u64,
  pub quantity: u64,
  /// Unit price when the item was last added. Display only; the order
  /// registry prices the cart at checkout.
  pub unit_price: u64,
}

/// A cart item re-read against the live inventory at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedCartItem {
  pub product_id: u64,
  pub name: String,
  pub quantity: u64,
  pub live_price: u64,
  pub live_available_units: u64,
  pub enabled: bool,
}

impl ValidatedCartItem {
  pub fn can_supply(&self) -> bool {
    self.enabled && self.quantity <= self.live_available_units
  }
}

/// Items from a single seller. The seller is locked by the first item and
/// released only when the cart becomes empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
  seller: Option<Address>,
  items: Vec<CartItem>,
}

impl Cart {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn locked_seller(&self) -> Option<Address> {
    self.seller
  }

  pub fn items(&self) -> &[CartItem] {
    &self.items
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn get(&self, product_id: u64) -> Option<&CartItem> {
    self.items.iter().find(|item| item.product_id == product_id)
  }

  /// Fails if the cart is locked to a seller other than `owner`.
  pub fn check_seller(&self, owner: Address, product_id: u64) -> Result<()> {
    match self.seller {
      Some(locked) if !self.items.is_empty() && locked != owner => Err(MarketError::SellerMismatch {
        locked,
        owner,
        product_id,
      }),
      _ => Ok(()),
    }
  }

  /// Replaces the line for `item.product_id` or appends a new one.
  ///
  /// Returns `true` if an existing line was replaced. The cart is untouched
  /// on error.
  pub fn upsert(&mut self, owner: Address, item: CartItem) -> Result<bool> {
    if item.quantity == 0 {
      return Err(MarketError::InvalidQuantity { quantity: 0 });
    }
    self.check_seller(owner, item.product_id)?;

    let replaced = match self.items.iter_mut().find(|line| line.product_id == item.product_id) {
      Some(line) => {
        line.quantity = item.quantity;
        line.unit_price = item.unit_price;
        true
      }
      None => {
        self.items.push(item);
        false
      }
    };
    self.seller = Some(owner);
    Ok(replaced)
  }

  pub fn remove(&mut self, product_id: u64) -> Option<CartItem> {
    let idx = self.items.iter().position(|item| item.product_id == product_id)?;
    let removed = self.items.remove(idx);
    if self.items.is_empty() {
      self.seller = None;
    }
    Some(removed)
  }

  pub fn clear(&mut self) {
    self.items.clear();
    self.seller = None;
  }

  pub fn product_ids(&self) -> Vec<u64> {
    self.items.iter().map(|item| item.product_id).collect()
  }

  pub fn quantities(&self) -> Vec<u64> {
    self.items.iter().map(|item| item.quantity).collect()
  }

  /// Client-side estimate from the price snapshots. Never used for payment.
  pub fn estimated_total(&self) -> u64 {
    self
      .items
      .iter()
      .fold(0u64, |acc, item| acc.saturating_add(item.quantity.saturating_mul(item.unit_price)))
  }
}
