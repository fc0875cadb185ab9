// openmarket/src/session.rs

use crate::cart::CartManager;
use crate::catalog::{Catalog, CatalogQuery};
use crate::checkout::{Checkout, CheckoutReceipt, JsonFilePendingStore, MemoryPendingStore, PendingCheckoutStore};
use crate::config::MarketConfig;
use crate::contracts::Contracts;
use crate::error::{MarketError, Result};
use crate::model::{CartItem, Product};
use crate::orders::{OrderTracker, Role};
use crate::seller::SellerDesk;
use crate::workflow::FlowState;
use std::sync::Arc;
use tracing::info;

/// Everything one user session holds: the last product listing, the cart and
/// the cached orders. `reset` drops all three.
pub struct Session {
  config: MarketConfig,
  contracts: Contracts,
  catalog: Catalog,
  cart: CartManager,
  checkout: Checkout,
  orders: OrderTracker,
  sellers: SellerDesk,
  products: FlowState<Vec<Product>>,
}

impl Session {
  /// Uses a JSON file for the pending checkout when
  /// `pending_checkout_path` is configured, memory otherwise.
  pub fn new(contracts: Contracts, config: MarketConfig) -> Self {
    let store: Arc<dyn PendingCheckoutStore> = match &config.pending_checkout_path {
      Some(path) => Arc::new(JsonFilePendingStore::new(path.clone())),
      None => Arc::new(MemoryPendingStore::new()),
    };
    Self::with_pending_store(contracts, config, store)
  }

  pub fn with_pending_store(contracts: Contracts, config: MarketConfig, store: Arc<dyn PendingCheckoutStore>) -> Self {
    Self {
      catalog: Catalog::new(contracts.clone(), &config),
      cart: CartManager::new(contracts.clone()),
      checkout: Checkout::new(contracts.clone(), &config, store),
      orders: OrderTracker::new(contracts.clone(), Role::Buyer, config.windows),
      sellers: SellerDesk::new(contracts.clone()),
      products: FlowState::new(Vec::new()),
      contracts,
      config,
    }
  }

  pub fn config(&self) -> &MarketConfig {
    &self.config
  }

  pub fn contracts(&self) -> &Contracts {
    &self.contracts
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  pub fn cart(&self) -> &CartManager {
    &self.cart
  }

  pub fn checkout(&self) -> &Checkout {
    &self.checkout
  }

  pub fn orders(&self) -> &OrderTracker {
    &self.orders
  }

  pub fn orders_mut(&mut self) -> &mut OrderTracker {
    &mut self.orders
  }

  pub fn sellers(&self) -> &SellerDesk {
    &self.sellers
  }

  /// Fetches the catalog and keeps it as the current listing.
  pub async fn browse(&self, query: &CatalogQuery) -> Result<Vec<Product>> {
    let products = self.catalog.fetch(query).await?;
    self.products.replace(products.clone());
    Ok(products)
  }

  pub fn products(&self) -> Vec<Product> {
    self.products.snapshot()
  }

  /// Adds a product from the current listing to the cart.
  pub async fn add_to_cart(&self, product_id: u64, quantity: u64) -> Result<CartItem> {
    let product = self
      .products
      .read()
      .iter()
      .find(|p| p.id == product_id)
      .cloned()
      .ok_or(MarketError::ProductUnavailable { product_id })?;
    self.cart.add_or_update(&product, quantity).await
  }

  pub async fn place_order(&self) -> Result<CheckoutReceipt> {
    self.checkout.checkout(&self.cart).await
  }

  /// Drops the cart, the product listing and the cached orders. A persisted
  /// pending checkout is kept.
  pub fn reset(&self) {
    self.cart.clear();
    self.products.write().clear();
    self.orders.clear();
    info!("Session state reset.");
  }
}
