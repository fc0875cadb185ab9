// openmarket/src/cart.rs

//! The cart manager and its add-to-cart pipeline.

use crate::contracts::Contracts;
use crate::error::{MarketError, Result};
use crate::model::{Cart, CartItem, Product};
use crate::workflow::{FlowError, FlowOutcome, FlowState, Pipeline, StepControl};
use alloy_primitives::Address;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Pipeline data for one `add_or_update` call.
pub struct AddToCartCtx {
  pub contracts: Contracts,
  pub cart: FlowState<Cart>,
  pub product_id: u64,
  pub quantity: u64,
  pub live_product: Option<Product>,
  pub updated_item: Option<CartItem>,
}

pub fn build_add_to_cart_pipeline() -> Pipeline<AddToCartCtx, MarketError> {
  let mut p = Pipeline::<AddToCartCtx, MarketError>::new(
    "add_to_cart",
    &[
      ("validate_quantity", false, None),
      ("refetch_product", false, None),
      ("check_live_stock", false, None),
      ("check_seller_lock", false, None),
      ("upsert_cart_item", false, None),
    ],
  );

  p.on_root("validate_quantity", |ctx_data: FlowState<AddToCartCtx>| {
    Box::pin(async move {
      let quantity = { ctx_data.read().quantity };
      if quantity < 1 {
        warn!("Add to Cart Pipeline: Invalid quantity ({}). Must be at least 1.", quantity);
        return Err(MarketError::InvalidQuantity { quantity });
      }
      Ok(StepControl::Continue)
    })
  });

  // The caller's product copy may be stale; only a fresh read gates the add.
  p.on_root("refetch_product", |ctx_data: FlowState<AddToCartCtx>| {
    Box::pin(async move {
      let (contracts, product_id) = {
        let guard = ctx_data.read();
        (guard.contracts.clone(), guard.product_id)
      };
      let live = contracts.inventory.get_product(product_id).await?;
      ctx_data.write().live_product = Some(live);
      Ok::<_, MarketError>(StepControl::Continue)
    })
  });

  p.on_root("check_live_stock", |ctx_data: FlowState<AddToCartCtx>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      let Some(live) = guard.live_product.as_ref() else {
        return Err(MarketError::ProductUnavailable {
          product_id: guard.product_id,
        });
      };
      if !live.enabled {
        warn!("Add to Cart Pipeline: Product {} is disabled.", live.id);
        return Err(MarketError::ProductUnavailable { product_id: live.id });
      }
      if guard.quantity > live.available_units {
        warn!(
          "Add to Cart Pipeline: Insufficient stock for product {}. Available: {}, Requested: {}.",
          live.id, live.available_units, guard.quantity
        );
        return Err(MarketError::OutOfStock {
          product_id: live.id,
          requested: guard.quantity,
          available: live.available_units,
        });
      }
      Ok(StepControl::Continue)
    })
  });

  p.on_root("check_seller_lock", |ctx_data: FlowState<AddToCartCtx>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      let owner = live_owner(&guard)?;
      guard.cart.read().check_seller(owner, guard.product_id)?;
      Ok::<_, MarketError>(StepControl::Continue)
    })
  });

  p.on_root("upsert_cart_item", |ctx_data: FlowState<AddToCartCtx>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let owner = live_owner(&guard)?;
      let item = CartItem {
        product_id: guard.product_id,
        quantity: guard.quantity,
        unit_price: guard.live_product.as_ref().map(|p| p.price).unwrap_or_default(),
      };
      // Re-checks the seller lock under the cart's write lock.
      let replaced = guard.cart.write().upsert(owner, item)?;
      info!(
        "Add to Cart Pipeline: {} product {} (qty {}).",
        if replaced { "Updated" } else { "Added" },
        item.product_id,
        item.quantity
      );
      guard.updated_item = Some(item);
      Ok::<_, MarketError>(StepControl::Continue)
    })
  });

  p
}

fn live_owner(ctx: &AddToCartCtx) -> Result<Address> {
  ctx
    .live_product
    .as_ref()
    .map(|p| p.owner)
    .ok_or(MarketError::ProductUnavailable {
      product_id: ctx.product_id,
    })
}

/// An in-memory cart holding items from exactly one seller.
#[derive(Clone)]
pub struct CartManager {
  contracts: Contracts,
  cart: FlowState<Cart>,
  add_pipeline: Arc<Pipeline<AddToCartCtx, MarketError>>,
}

impl CartManager {
  pub fn new(contracts: Contracts) -> Self {
    Self {
      contracts,
      cart: FlowState::new(Cart::new()),
      add_pipeline: Arc::new(build_add_to_cart_pipeline()),
    }
  }

  /// Adds `quantity` units of `product`, or replaces the quantity and price
  /// snapshot if it is already in the cart.
  ///
  /// The product is re-read from the inventory registry first. On any error
  /// the cart is left exactly as it was.
  #[instrument(
    name = "CartManager::add_or_update",
    skip_all,
    fields(product_id = product.id, quantity = quantity),
    err(Display)
  )]
  pub async fn add_or_update(&self, product: &Product, quantity: u64) -> Result<CartItem> {
    let ctx_data = FlowState::new(AddToCartCtx {
      contracts: self.contracts.clone(),
      cart: self.cart.clone(),
      product_id: product.id,
      quantity,
      live_product: None,
      updated_item: None,
    });

    match self.add_pipeline.run(ctx_data.clone()).await? {
      FlowOutcome::Completed => {}
      FlowOutcome::Stopped => {
        return Err(MarketError::Workflow {
          source: FlowError::Internal("add_to_cart stopped without a result".to_string()),
        })
      }
    }

    let guard = ctx_data.read();
    if let Some(live) = guard.live_product.as_ref() {
      if live.price != product.price {
        info!(
          "Price of product {} changed from {} to {} since it was listed.",
          live.id, product.price, live.price
        );
      }
    }
    guard.updated_item.ok_or_else(|| MarketError::Workflow {
      source: FlowError::Internal("add_to_cart completed without an item".to_string()),
    })
  }

  pub fn remove(&self, product_id: u64) -> Option<CartItem> {
    let removed = self.cart.write().remove(product_id);
    if removed.is_some() {
      info!("Removed product {} from cart.", product_id);
    }
    removed
  }

  pub fn clear(&self) {
    self.cart.write().clear();
  }

  pub fn snapshot(&self) -> Cart {
    self.cart.snapshot()
  }

  pub fn len(&self) -> usize {
    self.cart.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.cart.read().is_empty()
  }

  pub fn locked_seller(&self) -> Option<Address> {
    self.cart.read().locked_seller()
  }

  /// The shared cart state, for workflows that clear it on completion.
  pub fn shared(&self) -> FlowState<Cart> {
    self.cart.clone()
  }
}
