// openmarket/src/orders/actions.rs

//! Which order transitions a user may attempt, per state, role and time.

use crate::model::{Order, OrderState};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
  Buyer,
  Seller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderAction {
  Cancel,
  MarkReceived,
  RequestReturn,
  Dispatch,
  ClaimFunds,
  ApproveReturn,
  RejectReturn,
}

impl OrderAction {
  pub fn label(self) -> &'static str {
    match self {
      OrderAction::Cancel => "Cancel Order",
      OrderAction::MarkReceived => "Mark as Received",
      OrderAction::RequestReturn => "Request Return",
      OrderAction::Dispatch => "Dispatch",
      OrderAction::ClaimFunds => "Claim Funds",
      OrderAction::ApproveReturn => "Approve Return",
      OrderAction::RejectReturn => "Reject Return",
    }
  }

  pub fn role(self) -> Role {
    match self {
      OrderAction::Cancel | OrderAction::MarkReceived | OrderAction::RequestReturn => Role::Buyer,
      OrderAction::Dispatch | OrderAction::ClaimFunds | OrderAction::ApproveReturn | OrderAction::RejectReturn => {
        Role::Seller
      }
    }
  }
}

impl fmt::Display for OrderAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Direction of the buyer's return gate relative to `received_at + return_window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnGate {
  /// Return may be requested once the window has elapsed.
  #[default]
  AfterWindow,
  /// Return may be requested only while the window is open.
  WithinWindow,
}

impl FromStr for ReturnGate {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "after_window" | "after" => Ok(ReturnGate::AfterWindow),
      "within_window" | "within" => Ok(ReturnGate::WithinWindow),
      other => Err(format!("unknown return gate '{other}' (expected 'after_window' or 'within_window')")),
    }
  }
}

/// Time gates for the return and claim actions.
///
/// These are advisory: they only decide whether a button is enabled. The
/// order registry re-checks every transition against block time and is the
/// authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityWindows {
  pub return_window: Duration,
  pub claim_delay: Duration,
  pub return_gate: ReturnGate,
}

impl Default for EligibilityWindows {
  fn default() -> Self {
    Self {
      return_window: Duration::seconds(60),
      claim_delay: Duration::seconds(60),
      return_gate: ReturnGate::AfterWindow,
    }
  }
}

impl EligibilityWindows {
  pub fn return_allowed(&self, received_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    let Some(received_at) = received_at else {
      return false;
    };
    match (self.return_gate, received_at.checked_add_signed(self.return_window)) {
      (ReturnGate::AfterWindow, Some(boundary)) => now >= boundary,
      (ReturnGate::AfterWindow, None) => false,
      (ReturnGate::WithinWindow, Some(boundary)) => now <= boundary,
      (ReturnGate::WithinWindow, None) => true,
    }
  }

  pub fn claim_allowed(&self, received_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    received_at
      .and_then(|r| r.checked_add_signed(self.claim_delay))
      .is_some_and(|boundary| now >= boundary)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAvailability {
  pub action: OrderAction,
  pub enabled: bool,
}

/// Actions offered to `role` for `order` at `now`. Actions of the state that
/// are time gated are still listed, with `enabled: false`.
pub fn available_actions(
  order: &Order,
  role: Role,
  now: DateTime<Utc>,
  windows: &EligibilityWindows,
) -> Vec<ActionAvailability> {
  let on = |action| ActionAvailability { action, enabled: true };
  let gated = |action, enabled| ActionAvailability { action, enabled };

  match (role, order.state) {
    (Role::Buyer, OrderState::Created) => vec![on(OrderAction::Cancel)],
    (Role::Buyer, OrderState::Dispatched) => vec![on(OrderAction::MarkReceived)],
    (Role::Buyer, OrderState::Delivered) => vec![gated(
      OrderAction::RequestReturn,
      windows.return_allowed(order.received_at, now),
    )],
    (Role::Seller, OrderState::Created) => vec![on(OrderAction::Dispatch)],
    (Role::Seller, OrderState::Delivered | OrderState::ReturnRejected) => vec![gated(
      OrderAction::ClaimFunds,
      windows.claim_allowed(order.received_at, now),
    )],
    (Role::Seller, OrderState::ReturnRequested) => {
      vec![on(OrderAction::ApproveReturn), on(OrderAction::RejectReturn)]
    }
    _ => Vec::new(),
  }
}

/// Whether `action` is offered and enabled.
pub fn is_available(order: &Order, action: OrderAction, now: DateTime<Utc>, windows: &EligibilityWindows) -> bool {
  available_actions(order, action.role(), now, windows)
    .iter()
    .any(|a| a.action == action && a.enabled)
}
