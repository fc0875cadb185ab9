// openmarket/src/orders/mod.rs

//! Order listing, per-state actions and lifecycle transitions.

pub mod actions;

pub use actions::{available_actions, is_available, ActionAvailability, EligibilityWindows, OrderAction, ReturnGate, Role};

use crate::contracts::{Contracts, TxHash, TxReceipt};
use crate::error::{ContractError, MarketError, Result};
use crate::model::{Order, OrderLine};
use crate::workflow::{FlowError, FlowOutcome, FlowState, Pipeline, StepControl};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Reads every order of the connected account for `role`. Fails on the
/// first failed read.
async fn load_orders(contracts: &Contracts, role: Role) -> Result<Vec<Order>> {
  let account = contracts.account();
  let ids = match role {
    Role::Buyer => contracts.orders.get_buyer_orders(account).await?,
    Role::Seller => contracts.orders.get_seller_orders(account).await?,
  };
  let mut orders = Vec::with_capacity(ids.len());
  for id in ids {
    orders.push(contracts.orders.get_order(id).await?);
  }
  Ok(orders)
}

async fn submit_transition(contracts: &Contracts, order_id: u64, action: OrderAction) -> Result<TxHash, ContractError> {
  let orders = &contracts.orders;
  match action {
    OrderAction::Cancel => orders.cancel_order(order_id).await,
    OrderAction::MarkReceived => orders.received_order(order_id).await,
    OrderAction::RequestReturn => orders.request_return(order_id).await,
    OrderAction::Dispatch => orders.dispatch_order(order_id).await,
    OrderAction::ClaimFunds => orders.claim_funds(order_id).await,
    OrderAction::ApproveReturn => orders.approve_return(order_id).await,
    OrderAction::RejectReturn => orders.reject_return(order_id).await,
  }
}

/// Pipeline data for one `perform` call.
pub struct PerformActionCtx {
  pub contracts: Contracts,
  pub role: Role,
  pub orders: FlowState<Vec<Order>>,
  pub order_id: u64,
  pub action: OrderAction,
  pub tx_hash: Option<TxHash>,
  pub receipt: Option<TxReceipt>,
}

pub fn build_perform_action_pipeline() -> Pipeline<PerformActionCtx, MarketError> {
  let mut p = Pipeline::<PerformActionCtx, MarketError>::new(
    "order_action",
    &[
      ("submit_transition", false, None),
      ("await_confirmation", false, None),
      ("refresh_orders", false, None),
    ],
  );

  p.on_root("submit_transition", |ctx_data: FlowState<PerformActionCtx>| {
    Box::pin(async move {
      let (contracts, order_id, action) = {
        let guard = ctx_data.read();
        (guard.contracts.clone(), guard.order_id, guard.action)
      };
      match submit_transition(&contracts, order_id, action).await {
        Ok(tx_hash) => {
          info!("Order Action Pipeline: {} submitted for order {} in tx {}.", action, order_id, tx_hash);
          ctx_data.write().tx_hash = Some(tx_hash);
          Ok::<_, MarketError>(StepControl::Continue)
        }
        Err(e) => {
          error!("Order Action Pipeline: {} failed for order {}: {}", action, order_id, e);
          Err(e.into())
        }
      }
    })
  });

  p.on_root("await_confirmation", |ctx_data: FlowState<PerformActionCtx>| {
    Box::pin(async move {
      let (contracts, tx_hash) = {
        let guard = ctx_data.read();
        (guard.contracts.clone(), guard.tx_hash)
      };
      let tx_hash = tx_hash.ok_or_else(|| FlowError::Internal("no transaction to confirm".to_string()))?;
      let receipt = contracts.confirm(tx_hash).await?;
      ctx_data.write().receipt = Some(receipt);
      Ok::<_, MarketError>(StepControl::Continue)
    })
  });

  // The cached list is only ever replaced by a full re-read.
  p.on_root("refresh_orders", |ctx_data: FlowState<PerformActionCtx>| {
    Box::pin(async move {
      let (contracts, role, orders, receipt) = {
        let guard = ctx_data.read();
        (guard.contracts.clone(), guard.role, guard.orders.clone(), guard.receipt)
      };
      let receipt = receipt.ok_or_else(|| FlowError::Internal("refresh reached without a receipt".to_string()))?;
      match load_orders(&contracts, role).await {
        Ok(fresh) => {
          orders.replace(fresh);
          Ok::<_, MarketError>(StepControl::Continue)
        }
        Err(e) => {
          warn!("Order Action Pipeline: tx {} confirmed but orders could not be re-read: {}", receipt.tx_hash, e);
          Err(MarketError::OrdersNotRefreshed {
            receipt,
            source: Box::new(e),
          })
        }
      }
    })
  });

  p
}

/// Lists the connected account's orders as buyer or seller and moves them
/// through their lifecycle.
#[derive(Clone)]
pub struct OrderTracker {
  contracts: Contracts,
  role: Role,
  windows: EligibilityWindows,
  orders: FlowState<Vec<Order>>,
  perform_pipeline: Arc<Pipeline<PerformActionCtx, MarketError>>,
}

impl OrderTracker {
  pub fn new(contracts: Contracts, role: Role, windows: EligibilityWindows) -> Self {
    Self {
      contracts,
      role,
      windows,
      orders: FlowState::new(Vec::new()),
      perform_pipeline: Arc::new(build_perform_action_pipeline()),
    }
  }

  pub fn role(&self) -> Role {
    self.role
  }

  /// Switches between the buyer and seller view. Drops the cached list.
  pub fn set_role(&mut self, role: Role) {
    if self.role != role {
      self.role = role;
      self.clear();
    }
  }

  pub fn windows(&self) -> &EligibilityWindows {
    &self.windows
  }

  /// Re-reads every order for the current role and replaces the cache.
  /// On failure the cache is left as it was.
  #[instrument(name = "OrderTracker::refresh", skip_all, fields(role = ?self.role), err(Display))]
  pub async fn refresh(&self) -> Result<Vec<Order>> {
    let fresh = load_orders(&self.contracts, self.role).await?;
    info!("Loaded {} orders.", fresh.len());
    self.orders.replace(fresh.clone());
    Ok(fresh)
  }

  /// The list as of the last refresh.
  pub fn orders(&self) -> Vec<Order> {
    self.orders.snapshot()
  }

  pub fn order(&self, order_id: u64) -> Option<Order> {
    self.orders.read().iter().find(|o| o.id == order_id).cloned()
  }

  pub fn clear(&self) {
    self.orders.write().clear();
  }

  /// Line items of an order joined with product names. A product that can no
  /// longer be read keeps its line with no name.
  #[instrument(name = "OrderTracker::order_lines", skip(self), err(Display))]
  pub async fn order_lines(&self, order_id: u64) -> Result<Vec<OrderLine>> {
    let registry = &self.contracts.orders;
    let len = registry.get_order_items_length(order_id).await?;

    let mut lines = Vec::new();
    for index in 0..len {
      let item = registry.get_order_item(order_id, index).await?;
      let product_name = match self.contracts.inventory.get_product(item.product_id).await {
        Ok(product) => Some(product.name),
        Err(e) => {
          warn!("Could not read product {} for order {}: {}", item.product_id, order_id, e);
          None
        }
      };
      lines.push(OrderLine {
        product_id: item.product_id,
        product_name,
        quantity: item.quantity,
        unit_price: item.unit_price,
      });
    }
    Ok(lines)
  }

  pub fn available_actions(&self, order: &Order, now: DateTime<Utc>) -> Vec<ActionAvailability> {
    available_actions(order, self.role, now, &self.windows)
  }

  /// Submits `action` for `order_id`, waits for confirmation, then re-reads
  /// the order list.
  ///
  /// There is no local state check: an invalid transition is refused by the
  /// order registry and that error is returned. The cached list changes only
  /// through the re-read after a confirmed transition. If that re-read fails
  /// the error is `MarketError::OrdersNotRefreshed`, which still carries the
  /// receipt of the committed transition.
  #[instrument(name = "OrderTracker::perform", skip(self), err(Display))]
  pub async fn perform(&self, order_id: u64, action: OrderAction) -> Result<TxReceipt> {
    let ctx_data = FlowState::new(PerformActionCtx {
      contracts: self.contracts.clone(),
      role: self.role,
      orders: self.orders.clone(),
      order_id,
      action,
      tx_hash: None,
      receipt: None,
    });

    let outcome = self.perform_pipeline.run(ctx_data.clone()).await?;
    let receipt = ctx_data.read().receipt;
    match (outcome, receipt) {
      (FlowOutcome::Completed, Some(receipt)) => Ok(receipt),
      _ => Err(MarketError::Workflow {
        source: FlowError::Internal(format!("{:?} on order {} finished without a receipt", action, order_id)),
      }),
    }
  }

  /// Like [`perform`](Self::perform), but first checks the action against
  /// the order's state and the eligibility windows. An unavailable action
  /// fails without any contract call.
  pub async fn perform_if_available(&self, order: &Order, action: OrderAction, now: DateTime<Utc>) -> Result<TxReceipt> {
    if !is_available(order, action, now, &self.windows) || action.role() != self.role {
      warn!("{} is not available for order {} in state {}.", action, order.id, order.state);
      return Err(MarketError::ActionUnavailable {
        order_id: order.id,
        action,
        state: order.state,
      });
    }
    self.perform(order.id, action).await
  }
}
