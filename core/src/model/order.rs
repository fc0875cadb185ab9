// openmarket/src/model/order.rs

use crate::error::ContractError;
use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order lifecycle state, as encoded by the order registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum OrderState {
  Created = 0,
  Dispatched = 1,
  Delivered = 2,
  Completed = 3,
  ReturnRequested = 4,
  ReturnApproved = 5,
  ReturnRejected = 6,
  Cancelled = 7,
}

impl OrderState {
  pub const ALL: [OrderState; 8] = [
    OrderState::Created,
    OrderState::Dispatched,
    OrderState::Delivered,
    OrderState::Completed,
    OrderState::ReturnRequested,
    OrderState::ReturnApproved,
    OrderState::ReturnRejected,
    OrderState::Cancelled,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      OrderState::Created => "CREATED",
      OrderState::Dispatched => "DISPATCHED",
      OrderState::Delivered => "DELIVERED",
      OrderState::Completed => "COMPLETED",
      OrderState::ReturnRequested => "RETURN_REQUESTED",
      OrderState::ReturnApproved => "RETURN_APPROVED",
      OrderState::ReturnRejected => "RETURN_REJECTED",
      OrderState::Cancelled => "CANCELLED",
    }
  }

  /// No client action exists from a terminal state. `ReturnRejected` is not
  /// terminal: the seller can still claim funds.
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      OrderState::Completed | OrderState::ReturnApproved | OrderState::Cancelled
    )
  }
}

impl fmt::Display for OrderState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl TryFrom<u8> for OrderState {
  type Error = ContractError;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    OrderState::ALL
      .get(value as usize)
      .copied()
      .ok_or_else(|| ContractError::Decode {
        field: "state".to_string(),
        message: format!("unknown order state ordinal {value}"),
      })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub id: u64,
  pub buyer: Address,
  pub seller: Address,
  pub total_amount: u64,
  pub created_at: Option<DateTime<Utc>>,
  /// Set once the buyer confirms receipt.
  pub received_at: Option<DateTime<Utc>>,
  pub state: OrderState,
}

/// A line item as stored by the order registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
  pub product_id: u64,
  pub quantity: u64,
  pub unit_price: u64,
}

/// An `OrderItem` joined with the product name, for order detail views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
  pub product_id: u64,
  /// `None` when the product could not be read back.
  pub product_name: Option<String>,
  pub quantity: u64,
  pub unit_price: u64,
}

impl OrderLine {
  pub fn subtotal(&self) -> u64 {
    self.quantity.saturating_mul(self.unit_price)
  }
}
