// openmarket/src/checkout/mod.rs

//! Checkout: the order registry prices the cart, the client pays exactly
//! that price.

pub mod pending;

pub use pending::{JsonFilePendingStore, MemoryPendingStore, PendingCheckout, PendingCheckoutStore};

use crate::cart::CartManager;
use crate::config::MarketConfig;
use crate::contracts::{amount_from_contract, Contracts, TxHash, TxReceipt, INVALID_CART_SENTINEL};
use crate::error::{ContractError, MarketError, Result};
use crate::model::{Cart, ValidatedCartItem};
use crate::workflow::{FlowError, FlowOutcome, FlowState, Pipeline, StepControl};
use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Result of asking the order registry to price a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quote {
  Priced { total: u64, items: Vec<ValidatedCartItem> },
  /// The registry returned the invalid-cart sentinel. `items` shows which
  /// lines no longer fit live stock, as far as the client can tell.
  Stale { items: Vec<ValidatedCartItem> },
}

impl Quote {
  pub fn total(&self) -> Option<u64> {
    match self {
      Quote::Priced { total, .. } => Some(*total),
      Quote::Stale { .. } => None,
    }
  }

  pub fn is_stale(&self) -> bool {
    matches!(self, Quote::Stale { .. })
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
  pub tx_hash: TxHash,
  /// Contract-computed total, smallest unit.
  pub total: u64,
  /// Value attached to the payment transaction.
  pub paid_value: U256,
  pub items: Vec<ValidatedCartItem>,
  pub confirmed_at: DateTime<Utc>,
}

/// `total * 10^scale_exponent`, failing on overflow.
pub fn payment_value(total: u64, scale_exponent: u8) -> Result<U256> {
  U256::from(10u64)
    .checked_pow(U256::from(scale_exponent))
    .and_then(|scale| U256::from(total).checked_mul(scale))
    .ok_or_else(|| {
      MarketError::Config(format!(
        "payment value overflows for total {} and scale exponent {}",
        total, scale_exponent
      ))
    })
}

/// Re-reads every cart line against the inventory registry. Fails on the
/// first read error.
async fn reread_live_products(contracts: &Contracts, cart: &Cart) -> Result<Vec<ValidatedCartItem>> {
  let mut items = Vec::with_capacity(cart.len());
  for line in cart.items() {
    let live = contracts.inventory.get_product(line.product_id).await?;
    items.push(ValidatedCartItem {
      product_id: line.product_id,
      name: live.name,
      quantity: line.quantity,
      live_price: live.price,
      live_available_units: live.available_units,
      enabled: live.enabled,
    });
  }
  Ok(items)
}

/// Asks the registry to price `cart`; `None` is the sentinel.
async fn price_on_contract(contracts: &Contracts, cart: &Cart) -> Result<Option<u64>> {
  let raw = contracts
    .orders
    .validate_cart(&cart.product_ids(), &cart.quantities())
    .await?;
  if raw == INVALID_CART_SENTINEL {
    return Ok(None);
  }
  Ok(Some(amount_from_contract(raw, "validateCart")?))
}

/// Pipeline data for one checkout run.
pub struct CheckoutCtx {
  pub contracts: Contracts,
  pub cart: FlowState<Cart>,
  pub store: Arc<dyn PendingCheckoutStore>,
  pub scale_exponent: u8,
  pub snapshot: Cart,
  pub items: Vec<ValidatedCartItem>,
  pub total: Option<u64>,
  pub stale: bool,
  pub paid_value: Option<U256>,
  pub tx_hash: Option<TxHash>,
  pub receipt: Option<TxReceipt>,
}

/// Drops the pending record after a failed payment. A storage failure here is
/// logged; the payment error is the one the caller needs.
fn abandon_pending(store: &dyn PendingCheckoutStore) {
  if let Err(e) = store.clear() {
    error!("Checkout Pipeline: Failed to clear abandoned pending checkout: {}", e);
  }
}

pub fn build_checkout_pipeline() -> Pipeline<CheckoutCtx, MarketError> {
  let mut p = Pipeline::<CheckoutCtx, MarketError>::new(
    "checkout",
    &[
      ("ensure_cart_not_empty", false, None),
      ("reread_live_products", false, None),
      ("quote_on_contract", false, None),
      ("persist_pending_checkout", false, None),
      ("submit_payment", false, None),
      ("await_confirmation", false, None),
      ("clear_cart", false, None),
    ],
  );

  p.on_root("ensure_cart_not_empty", |ctx_data: FlowState<CheckoutCtx>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let snapshot = guard.cart.snapshot();
      if snapshot.is_empty() {
        warn!("Checkout Pipeline: Cart is empty.");
        return Err(MarketError::EmptyCart);
      }
      guard.snapshot = snapshot;
      Ok(StepControl::Continue)
    })
  });

  p.on_root("reread_live_products", |ctx_data: FlowState<CheckoutCtx>| {
    Box::pin(async move {
      let (contracts, snapshot) = {
        let guard = ctx_data.read();
        (guard.contracts.clone(), guard.snapshot.clone())
      };
      let items = reread_live_products(&contracts, &snapshot).await?;
      ctx_data.write().items = items;
      Ok::<_, MarketError>(StepControl::Continue)
    })
  });

  p.on_root("quote_on_contract", |ctx_data: FlowState<CheckoutCtx>| {
    Box::pin(async move {
      let (contracts, snapshot) = {
        let guard = ctx_data.read();
        (guard.contracts.clone(), guard.snapshot.clone())
      };
      match price_on_contract(&contracts, &snapshot).await? {
        Some(total) => {
          info!("Checkout Pipeline: Order registry priced cart at {}.", total);
          ctx_data.write().total = Some(total);
          Ok::<_, MarketError>(StepControl::Continue)
        }
        None => {
          warn!("Checkout Pipeline: Order registry rejected the cart as stale. No payment submitted.");
          ctx_data.write().stale = true;
          Ok(StepControl::Stop)
        }
      }
    })
  });

  p.on_root("persist_pending_checkout", |ctx_data: FlowState<CheckoutCtx>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      let pending = PendingCheckout {
        cart: guard.snapshot.clone(),
        total: guard.total.unwrap_or_default(),
        created_at: Utc::now(),
      };
      guard.store.save(&pending)?;
      Ok::<_, MarketError>(StepControl::Continue)
    })
  });

  p.on_root("submit_payment", |ctx_data: FlowState<CheckoutCtx>| {
    Box::pin(async move {
      let (contracts, store, snapshot, total, scale_exponent) = {
        let guard = ctx_data.read();
        (
          guard.contracts.clone(),
          guard.store.clone(),
          guard.snapshot.clone(),
          guard.total,
          guard.scale_exponent,
        )
      };
      let total = total.ok_or_else(|| FlowError::Internal("checkout reached payment without a total".to_string()))?;
      let value = payment_value(total, scale_exponent)?;

      let submitted = contracts
        .orders
        .create_order(&snapshot.product_ids(), &snapshot.quantities(), value)
        .await;
      match submitted {
        Ok(tx_hash) => {
          info!("Checkout Pipeline: Payment submitted in tx {} (value {}).", tx_hash, value);
          let mut guard = ctx_data.write();
          guard.paid_value = Some(value);
          guard.tx_hash = Some(tx_hash);
          Ok(StepControl::Continue)
        }
        Err(e) => {
          match &e {
            ContractError::WalletRejected => warn!("Checkout Pipeline: Payment rejected in wallet."),
            other => error!("Checkout Pipeline: Payment failed: {}", other),
          }
          abandon_pending(store.as_ref());
          Err(MarketError::from(e))
        }
      }
    })
  });

  p.on_root("await_confirmation", |ctx_data: FlowState<CheckoutCtx>| {
    Box::pin(async move {
      let (contracts, store, tx_hash) = {
        let guard = ctx_data.read();
        (guard.contracts.clone(), guard.store.clone(), guard.tx_hash)
      };
      let tx_hash =
        tx_hash.ok_or_else(|| FlowError::Internal("checkout reached confirmation without a tx".to_string()))?;
      match contracts.confirm(tx_hash).await {
        Ok(receipt) => {
          ctx_data.write().receipt = Some(receipt);
          Ok(StepControl::Continue)
        }
        Err(e) => {
          error!("Checkout Pipeline: Payment tx {} failed to confirm: {}", tx_hash, e);
          abandon_pending(store.as_ref());
          Err(MarketError::from(e))
        }
      }
    })
  });

  // Runs after confirmation: storage failures are logged, never returned.
  p.on_root("clear_cart", |ctx_data: FlowState<CheckoutCtx>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      guard.cart.write().clear();
      if let Err(e) = guard.store.clear() {
        error!("Checkout Pipeline: Order confirmed but the pending checkout was not cleared: {}", e);
      }
      info!("Checkout Pipeline: Order confirmed, cart cleared.");
      Ok::<_, MarketError>(StepControl::Continue)
    })
  });

  p
}

/// Prices carts on the order registry and pays for them.
#[derive(Clone)]
pub struct Checkout {
  contracts: Contracts,
  store: Arc<dyn PendingCheckoutStore>,
  scale_exponent: u8,
  pipeline: Arc<Pipeline<CheckoutCtx, MarketError>>,
}

impl Checkout {
  pub fn new(contracts: Contracts, config: &MarketConfig, store: Arc<dyn PendingCheckoutStore>) -> Self {
    Self {
      contracts,
      store,
      scale_exponent: config.value_scale_exponent,
      pipeline: Arc::new(build_checkout_pipeline()),
    }
  }

  /// Re-reads every line and asks the order registry for the total.
  ///
  /// Makes no state-changing call, so repeating it against an unchanged
  /// chain gives the same answer.
  #[instrument(name = "Checkout::quote", skip_all, fields(lines = cart.len()), err(Display))]
  pub async fn quote(&self, cart: &Cart) -> Result<Quote> {
    if cart.is_empty() {
      return Err(MarketError::EmptyCart);
    }
    let items = reread_live_products(&self.contracts, cart).await?;
    match price_on_contract(&self.contracts, cart).await? {
      Some(total) => Ok(Quote::Priced { total, items }),
      None => {
        warn!("Cart quote returned the invalid-cart sentinel.");
        Ok(Quote::Stale { items })
      }
    }
  }

  /// Pays for the cart held by `cart`.
  ///
  /// The paid value is the registry's total scaled by `10^value_scale_exponent`.
  /// If the registry reports the cart stale, nothing is paid, the cart is
  /// kept and `MarketError::StaleCart` is returned. A failed payment also
  /// keeps the cart. The cart is cleared only after the payment confirms.
  #[instrument(name = "Checkout::checkout", skip_all, err(Display))]
  pub async fn checkout(&self, cart: &CartManager) -> Result<CheckoutReceipt> {
    let ctx_data = FlowState::new(CheckoutCtx {
      contracts: self.contracts.clone(),
      cart: cart.shared(),
      store: self.store.clone(),
      scale_exponent: self.scale_exponent,
      snapshot: Cart::new(),
      items: Vec::new(),
      total: None,
      stale: false,
      paid_value: None,
      tx_hash: None,
      receipt: None,
    });

    let outcome = self.pipeline.run(ctx_data.clone()).await?;

    let guard = ctx_data.read();
    if outcome == FlowOutcome::Stopped {
      if guard.stale {
        return Err(MarketError::StaleCart);
      }
      return Err(MarketError::Workflow {
        source: FlowError::Internal("checkout stopped unexpectedly".to_string()),
      });
    }

    match (guard.total, guard.paid_value, guard.receipt) {
      (Some(total), Some(paid_value), Some(receipt)) => Ok(CheckoutReceipt {
        tx_hash: receipt.tx_hash,
        total,
        paid_value,
        items: guard.items.clone(),
        confirmed_at: receipt.confirmed_at,
      }),
      _ => Err(MarketError::Workflow {
        source: FlowError::Internal("checkout completed without a receipt".to_string()),
      }),
    }
  }

  /// A checkout that was persisted but never confirmed or abandoned, e.g.
  /// because the process stopped while waiting for the wallet.
  pub fn pending(&self) -> Result<Option<PendingCheckout>> {
    self.store.load()
  }

  pub fn discard_pending(&self) -> Result<()> {
    self.store.clear()
  }
}
