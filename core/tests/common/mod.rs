// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use openmarket::contracts::INVALID_CART_SENTINEL;
use openmarket::upload::{PinError, PinResponse, PinningEndpoint};
use openmarket::{
  Category, ContractError, Contracts, ImageFile, InventoryRegistry, MarketConfig, Order, OrderItem, OrderRegistry,
  OrderState, Product, ProductDraft, ProductUpdate, Seller, SellerProfile, SellerRegistry, TxHash, TxReceipt, Wallet,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::Level;

// --- Helper for Tracing Setup ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Fixtures ---
pub const GENESIS: i64 = 1_700_000_000;
pub const VALUE_SCALE: u64 = 10_000_000_000;

pub fn buyer() -> Address {
  Address::repeat_byte(0xb1)
}

pub fn seller_a() -> Address {
  Address::repeat_byte(0xa1)
}

pub fn seller_b() -> Address {
  Address::repeat_byte(0xa2)
}

pub fn at(secs_after_genesis: i64) -> DateTime<Utc> {
  DateTime::from_timestamp(GENESIS + secs_after_genesis, 0).unwrap()
}

pub fn product(id: u64, owner: Address, price: u64, available_units: u64) -> Product {
  Product {
    id,
    name: format!("Product {}", id),
    category: Category::Fashion,
    price,
    available_units,
    image_cid: format!("QmImage{}", id),
    owner,
    enabled: true,
    release_date: Some(at(0)),
  }
}

pub fn profile(business_name: &str, city: &str) -> SellerProfile {
  SellerProfile {
    business_name: business_name.to_string(),
    owner_name: "Owner".to_string(),
    phone: "555-0100".to_string(),
    email: "owner@shop.test".to_string(),
    city: city.to_string(),
    location_address: "1 Market Street".to_string(),
  }
}

pub fn draft(name: &str, price: u64, units: u64) -> ProductDraft {
  ProductDraft {
    name: name.to_string(),
    category: Category::Books,
    price,
    available_units: units,
    image_cid: "QmDraft".to_string(),
    enabled: true,
  }
}

/// A config with no pending-checkout file and default windows.
pub fn test_config() -> MarketConfig {
  MarketConfig::default()
}

fn reverted(reason: &str) -> ContractError {
  ContractError::reverted(reason)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
  pub from: Address,
  pub product_ids: Vec<u64>,
  pub quantities: Vec<u64>,
  pub value: U256,
}

#[derive(Default)]
struct ChainState {
  account: Address,
  now: DateTime<Utc>,
  products: BTreeMap<u64, Product>,
  sellers: Vec<Seller>,
  orders: BTreeMap<u64, Order>,
  order_items: BTreeMap<u64, Vec<OrderItem>>,
  next_tx: u64,
  submitted: HashSet<TxHash>,
  calls: Vec<String>,
  failing: HashSet<String>,
  rejecting: HashSet<String>,
  payments: Vec<Payment>,
}

/// In-memory stand-in for the three registries and the wallet.
///
/// Writes take effect immediately and are confirmed at the current fake time.
/// Every call is recorded by its contract method name.
pub struct FakeChain {
  state: Mutex<ChainState>,
}

impl FakeChain {
  pub fn new(account: Address) -> Arc<Self> {
    Arc::new(Self {
      state: Mutex::new(ChainState {
        account,
        now: at(0),
        next_tx: 1,
        ..ChainState::default()
      }),
    })
  }

  pub fn contracts(self: &Arc<Self>) -> Contracts {
    Contracts::from_single(self.clone())
  }

  pub fn set_account(&self, account: Address) {
    self.state.lock().account = account;
  }

  pub fn now(&self) -> DateTime<Utc> {
    self.state.lock().now
  }

  pub fn advance(&self, secs: i64) {
    let mut state = self.state.lock();
    state.now = state.now + Duration::seconds(secs);
  }

  pub fn seed_product(&self, product: Product) {
    self.state.lock().products.insert(product.id, product);
  }

  pub fn product(&self, id: u64) -> Option<Product> {
    self.state.lock().products.get(&id).cloned()
  }

  pub fn set_stock(&self, id: u64, available_units: u64) {
    if let Some(p) = self.state.lock().products.get_mut(&id) {
      p.available_units = available_units;
    }
  }

  pub fn set_price(&self, id: u64, price: u64) {
    if let Some(p) = self.state.lock().products.get_mut(&id) {
      p.price = price;
    }
  }

  pub fn set_enabled(&self, id: u64, enabled: bool) {
    if let Some(p) = self.state.lock().products.get_mut(&id) {
      p.enabled = enabled;
    }
  }

  pub fn seed_seller(&self, wallet: Address, city: &str) {
    self.state.lock().sellers.push(Seller {
      wallet,
      profile: profile(&format!("Shop {}", wallet), city),
    });
  }

  /// Inserts an order directly, bypassing checkout.
  pub fn seed_order(&self, order: Order, items: Vec<OrderItem>) {
    let mut state = self.state.lock();
    state.order_items.insert(order.id, items);
    state.orders.insert(order.id, order);
  }

  pub fn order(&self, id: u64) -> Option<Order> {
    self.state.lock().orders.get(&id).cloned()
  }

  /// Makes `call` fail with an RPC error until cleared.
  pub fn fail_on(&self, call: &str) {
    self.state.lock().failing.insert(call.to_string());
  }

  /// Makes `call` fail as if the user dismissed the wallet prompt.
  pub fn reject_on(&self, call: &str) {
    self.state.lock().rejecting.insert(call.to_string());
  }

  pub fn clear_failures(&self) {
    let mut state = self.state.lock();
    state.failing.clear();
    state.rejecting.clear();
  }

  pub fn calls(&self) -> Vec<String> {
    self.state.lock().calls.clone()
  }

  pub fn call_count(&self, call: &str) -> usize {
    self.state.lock().calls.iter().filter(|c| c.as_str() == call).count()
  }

  pub fn clear_calls(&self) {
    self.state.lock().calls.clear();
  }

  pub fn payments(&self) -> Vec<Payment> {
    self.state.lock().payments.clone()
  }

  /// Records the call and applies injected failures.
  fn enter(&self, call: &str) -> Result<parking_lot::MutexGuard<'_, ChainState>, ContractError> {
    let mut state = self.state.lock();
    state.calls.push(call.to_string());
    if state.rejecting.contains(call) {
      return Err(ContractError::WalletRejected);
    }
    if state.failing.contains(call) {
      return Err(ContractError::rpc(call, "injected failure"));
    }
    Ok(state)
  }
}

impl ChainState {
  fn next_tx_hash(&mut self) -> TxHash {
    let mut bytes = [0u8; 32];
    bytes[24..].copy_from_slice(&self.next_tx.to_be_bytes());
    self.next_tx += 1;
    let hash = B256::from(bytes);
    self.submitted.insert(hash);
    hash
  }

  fn is_registered(&self, account: Address) -> bool {
    self.sellers.iter().any(|s| s.wallet == account)
  }

  fn price_cart(&self, product_ids: &[u64], quantities: &[u64]) -> Option<(u64, Address)> {
    if product_ids.is_empty() || product_ids.len() != quantities.len() {
      return None;
    }
    let mut owner = None;
    let mut total = 0u64;
    for (id, qty) in product_ids.iter().zip(quantities) {
      let p = self.products.get(id)?;
      if !p.enabled || *qty == 0 || *qty > p.available_units {
        return None;
      }
      match owner {
        None => owner = Some(p.owner),
        Some(o) if o != p.owner => return None,
        _ => {}
      }
      total += qty * p.price;
    }
    owner.map(|o| (total, o))
  }

  fn transition(
    &mut self,
    order_id: u64,
    from: &[OrderState],
    to: OrderState,
    by_buyer: bool,
  ) -> Result<TxHash, ContractError> {
    let account = self.account;
    let now = self.now;
    let order = self.orders.get_mut(&order_id).ok_or_else(|| reverted("Order does not exist"))?;
    let caller = if by_buyer { order.buyer } else { order.seller };
    if caller != account {
      return Err(reverted("Not authorized"));
    }
    if !from.contains(&order.state) {
      return Err(reverted("Invalid order state"));
    }
    order.state = to;
    if to == OrderState::Delivered {
      order.received_at = Some(now);
    }
    Ok(self.next_tx_hash())
  }
}

#[async_trait]
impl SellerRegistry for FakeChain {
  async fn is_registered(&self, account: Address) -> Result<bool, ContractError> {
    let state = self.enter("isRegistered")?;
    Ok(state.is_registered(account))
  }

  async fn register_seller(&self, profile: &SellerProfile) -> Result<TxHash, ContractError> {
    let mut state = self.enter("registerSeller")?;
    let account = state.account;
    if state.is_registered(account) {
      return Err(reverted("Seller already registered"));
    }
    state.sellers.push(Seller {
      wallet: account,
      profile: profile.clone(),
    });
    Ok(state.next_tx_hash())
  }

  async fn get_sellers_by_city(&self, city: &str) -> Result<Vec<Seller>, ContractError> {
    let state = self.enter("getSellersByCity")?;
    Ok(state.sellers.iter().filter(|s| s.profile.city == city).cloned().collect())
  }
}

#[async_trait]
impl InventoryRegistry for FakeChain {
  async fn get_all_products(&self) -> Result<Vec<Product>, ContractError> {
    let state = self.enter("getAllProducts")?;
    Ok(state.products.values().cloned().collect())
  }

  async fn get_products_by_category(&self, category: Category) -> Result<Vec<Product>, ContractError> {
    let state = self.enter("getProductsByCategory")?;
    Ok(state.products.values().filter(|p| p.category == category).cloned().collect())
  }

  async fn get_products_by_seller(&self, seller: Address) -> Result<Vec<Product>, ContractError> {
    let state = self.enter("getProductsBySeller")?;
    Ok(state.products.values().filter(|p| p.owner == seller).cloned().collect())
  }

  async fn get_products_by_seller_of_category(
    &self,
    seller: Address,
    category: Category,
  ) -> Result<Vec<Product>, ContractError> {
    let state = self.enter("getProductsBySellerOfCategory")?;
    Ok(
      state
        .products
        .values()
        .filter(|p| p.owner == seller && p.category == category)
        .cloned()
        .collect(),
    )
  }

  async fn get_product(&self, product_id: u64) -> Result<Product, ContractError> {
    let state = self.enter("getProduct")?;
    state
      .products
      .get(&product_id)
      .cloned()
      .ok_or_else(|| reverted("Product does not exist"))
  }

  async fn add_product(&self, draft: &ProductDraft) -> Result<TxHash, ContractError> {
    let mut state = self.enter("addProduct")?;
    let account = state.account;
    if !state.is_registered(account) {
      return Err(reverted("Not a registered seller"));
    }
    let id = state.products.keys().next_back().copied().unwrap_or(0) + 1;
    let release_date = Some(state.now);
    state.products.insert(
      id,
      Product {
        id,
        name: draft.name.clone(),
        category: draft.category,
        price: draft.price,
        available_units: draft.available_units,
        image_cid: draft.image_cid.clone(),
        owner: account,
        enabled: draft.enabled,
        release_date,
      },
    );
    Ok(state.next_tx_hash())
  }

  async fn update_product(&self, update: &ProductUpdate) -> Result<TxHash, ContractError> {
    let mut state = self.enter("updateProduct")?;
    let account = state.account;
    let product = state
      .products
      .get_mut(&update.id)
      .ok_or_else(|| reverted("Product does not exist"))?;
    if product.owner != account {
      return Err(reverted("Not product owner"));
    }
    product.name = update.name.clone();
    product.category = update.category;
    product.price = update.price;
    product.available_units = update.available_units;
    product.image_cid = update.image_cid.clone();
    product.enabled = update.enabled;
    Ok(state.next_tx_hash())
  }
}

#[async_trait]
impl OrderRegistry for FakeChain {
  async fn validate_cart(&self, product_ids: &[u64], quantities: &[u64]) -> Result<i128, ContractError> {
    let state = self.enter("validateCart")?;
    Ok(match state.price_cart(product_ids, quantities) {
      Some((total, _)) => i128::from(total),
      None => INVALID_CART_SENTINEL,
    })
  }

  async fn create_order(&self, product_ids: &[u64], quantities: &[u64], value: U256) -> Result<TxHash, ContractError> {
    let mut state = self.enter("createOrder")?;
    let (total, seller) = state
      .price_cart(product_ids, quantities)
      .ok_or_else(|| reverted("Invalid cart"))?;
    if value != U256::from(total) * U256::from(VALUE_SCALE) {
      return Err(reverted("Incorrect payment amount"));
    }

    let account = state.account;
    let now = state.now;
    let mut items = Vec::new();
    for (id, qty) in product_ids.iter().zip(quantities) {
      if let Some(p) = state.products.get_mut(id) {
        p.available_units -= qty;
        items.push(OrderItem {
          product_id: *id,
          quantity: *qty,
          unit_price: p.price,
        });
      }
    }
    let order_id = state.orders.keys().next_back().copied().unwrap_or(0) + 1;
    state.orders.insert(
      order_id,
      Order {
        id: order_id,
        buyer: account,
        seller,
        total_amount: total,
        created_at: Some(now),
        received_at: None,
        state: OrderState::Created,
      },
    );
    state.order_items.insert(order_id, items);
    state.payments.push(Payment {
      from: account,
      product_ids: product_ids.to_vec(),
      quantities: quantities.to_vec(),
      value,
    });
    Ok(state.next_tx_hash())
  }

  async fn get_buyer_orders(&self, buyer: Address) -> Result<Vec<u64>, ContractError> {
    let state = self.enter("getBuyerOrders")?;
    Ok(state.orders.values().filter(|o| o.buyer == buyer).map(|o| o.id).collect())
  }

  async fn get_seller_orders(&self, seller: Address) -> Result<Vec<u64>, ContractError> {
    let state = self.enter("getSellerOrders")?;
    Ok(state.orders.values().filter(|o| o.seller == seller).map(|o| o.id).collect())
  }

  async fn get_order(&self, order_id: u64) -> Result<Order, ContractError> {
    let state = self.enter("getOrder")?;
    state
      .orders
      .get(&order_id)
      .cloned()
      .ok_or_else(|| reverted("Order does not exist"))
  }

  async fn get_order_items_length(&self, order_id: u64) -> Result<u64, ContractError> {
    let state = self.enter("getOrderItemsLength")?;
    Ok(state.order_items.get(&order_id).map(|i| i.len() as u64).unwrap_or(0))
  }

  async fn get_order_item(&self, order_id: u64, index: u64) -> Result<OrderItem, ContractError> {
    let state = self.enter("getOrderItem")?;
    state
      .order_items
      .get(&order_id)
      .and_then(|items| items.get(index as usize))
      .copied()
      .ok_or_else(|| reverted("Item index out of range"))
  }

  async fn cancel_order(&self, order_id: u64) -> Result<TxHash, ContractError> {
    let mut state = self.enter("cancelOrder")?;
    state.transition(order_id, &[OrderState::Created], OrderState::Cancelled, true)
  }

  async fn received_order(&self, order_id: u64) -> Result<TxHash, ContractError> {
    let mut state = self.enter("receivedOrder")?;
    state.transition(order_id, &[OrderState::Dispatched], OrderState::Delivered, true)
  }

  async fn request_return(&self, order_id: u64) -> Result<TxHash, ContractError> {
    let mut state = self.enter("requestReturn")?;
    state.transition(order_id, &[OrderState::Delivered], OrderState::ReturnRequested, true)
  }

  async fn dispatch_order(&self, order_id: u64) -> Result<TxHash, ContractError> {
    let mut state = self.enter("dispatchOrder")?;
    state.transition(order_id, &[OrderState::Created], OrderState::Dispatched, false)
  }

  async fn claim_funds(&self, order_id: u64) -> Result<TxHash, ContractError> {
    let mut state = self.enter("claimFunds")?;
    state.transition(
      order_id,
      &[OrderState::Delivered, OrderState::ReturnRejected],
      OrderState::Completed,
      false,
    )
  }

  async fn approve_return(&self, order_id: u64) -> Result<TxHash, ContractError> {
    let mut state = self.enter("approveReturn")?;
    state.transition(order_id, &[OrderState::ReturnRequested], OrderState::ReturnApproved, false)
  }

  async fn reject_return(&self, order_id: u64) -> Result<TxHash, ContractError> {
    let mut state = self.enter("rejectReturn")?;
    state.transition(order_id, &[OrderState::ReturnRequested], OrderState::ReturnRejected, false)
  }
}

#[async_trait]
impl Wallet for FakeChain {
  fn account(&self) -> Address {
    self.state.lock().account
  }

  async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ContractError> {
    let state = self.enter("waitForReceipt")?;
    if !state.submitted.contains(&tx_hash) {
      return Err(ContractError::rpc("waitForReceipt", "unknown transaction"));
    }
    Ok(TxReceipt {
      tx_hash,
      confirmed_at: state.now,
    })
  }
}

// --- Pinning endpoint double ---

pub enum PinOutcome {
  Pinned { cid: &'static str, size: Option<u64> },
  HttpStatus(u16),
  Malformed,
  Unreachable,
}

pub struct FakePinning {
  outcome: Mutex<PinOutcome>,
  received: Mutex<Vec<ImageFile>>,
}

impl FakePinning {
  pub fn new(outcome: PinOutcome) -> Arc<Self> {
    Arc::new(Self {
      outcome: Mutex::new(outcome),
      received: Mutex::new(Vec::new()),
    })
  }

  pub fn set_outcome(&self, outcome: PinOutcome) {
    *self.outcome.lock() = outcome;
  }

  pub fn received(&self) -> Vec<ImageFile> {
    self.received.lock().clone()
  }
}

#[async_trait]
impl PinningEndpoint for FakePinning {
  async fn pin_file(&self, file: &ImageFile) -> Result<PinResponse, PinError> {
    self.received.lock().push(file.clone());
    match &*self.outcome.lock() {
      PinOutcome::Pinned { cid, size } => Ok(PinResponse {
        ipfs_hash: cid.to_string(),
        pin_size: *size,
        timestamp: None,
      }),
      PinOutcome::HttpStatus(status) => Err(PinError::Status {
        status: *status,
        body: "error".to_string(),
      }),
      PinOutcome::Malformed => Err(PinError::Malformed("missing IpfsHash".to_string())),
      PinOutcome::Unreachable => Err(PinError::Transport("connection refused".to_string())),
    }
  }
}
