// openmarket/src/contracts.rs

//! The call surface of the marketplace contracts and the wallet.
//!
//! Implementations are typed RPC stubs bound to the connected signer. Reads
//! return decoded models; writes return the transaction hash and are
//! confirmed through [`Wallet::wait_for_receipt`].

use crate::error::ContractError;
use crate::model::{Category, Order, OrderItem, Product, ProductDraft, ProductUpdate, Seller, SellerProfile};
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{event, Level};

pub type TxHash = B256;

/// Returned by [`OrderRegistry::validate_cart`] when any item is unavailable.
pub const INVALID_CART_SENTINEL: i128 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
  pub tx_hash: TxHash,
  /// Block time of the confirming block.
  pub confirmed_at: DateTime<Utc>,
}

#[async_trait]
pub trait SellerRegistry: Send + Sync {
  async fn is_registered(&self, account: Address) -> Result<bool, ContractError>;

  async fn register_seller(&self, profile: &SellerProfile) -> Result<TxHash, ContractError>;

  async fn get_sellers_by_city(&self, city: &str) -> Result<Vec<Seller>, ContractError>;
}

#[async_trait]
pub trait InventoryRegistry: Send + Sync {
  async fn get_all_products(&self) -> Result<Vec<Product>, ContractError>;

  async fn get_products_by_category(&self, category: Category) -> Result<Vec<Product>, ContractError>;

  async fn get_products_by_seller(&self, seller: Address) -> Result<Vec<Product>, ContractError>;

  async fn get_products_by_seller_of_category(
    &self,
    seller: Address,
    category: Category,
  ) -> Result<Vec<Product>, ContractError>;

  async fn get_product(&self, product_id: u64) -> Result<Product, ContractError>;

  async fn add_product(&self, draft: &ProductDraft) -> Result<TxHash, ContractError>;

  async fn update_product(&self, update: &ProductUpdate) -> Result<TxHash, ContractError>;
}

#[async_trait]
pub trait OrderRegistry: Send + Sync {
  /// Prices the cart atomically against live inventory. Returns the total,
  /// or [`INVALID_CART_SENTINEL`].
  async fn validate_cart(&self, product_ids: &[u64], quantities: &[u64]) -> Result<i128, ContractError>;

  /// Payable. `value` is the amount attached to the transaction.
  async fn create_order(&self, product_ids: &[u64], quantities: &[u64], value: U256) -> Result<TxHash, ContractError>;

  async fn get_buyer_orders(&self, buyer: Address) -> Result<Vec<u64>, ContractError>;

  async fn get_seller_orders(&self, seller: Address) -> Result<Vec<u64>, ContractError>;

  async fn get_order(&self, order_id: u64) -> Result<Order, ContractError>;

  async fn get_order_items_length(&self, order_id: u64) -> Result<u64, ContractError>;

  async fn get_order_item(&self, order_id: u64, index: u64) -> Result<OrderItem, ContractError>;

  async fn cancel_order(&self, order_id: u64) -> Result<TxHash, ContractError>;

  async fn received_order(&self, order_id: u64) -> Result<TxHash, ContractError>;

  async fn request_return(&self, order_id: u64) -> Result<TxHash, ContractError>;

  async fn dispatch_order(&self, order_id: u64) -> Result<TxHash, ContractError>;

  async fn claim_funds(&self, order_id: u64) -> Result<TxHash, ContractError>;

  async fn approve_return(&self, order_id: u64) -> Result<TxHash, ContractError>;

  async fn reject_return(&self, order_id: u64) -> Result<TxHash, ContractError>;
}

#[async_trait]
pub trait Wallet: Send + Sync {
  /// The connected account.
  fn account(&self) -> Address;

  async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ContractError>;
}

/// The contract clients and wallet one session talks to.
#[derive(Clone)]
pub struct Contracts {
  pub sellers: Arc<dyn SellerRegistry>,
  pub inventory: Arc<dyn InventoryRegistry>,
  pub orders: Arc<dyn OrderRegistry>,
  pub wallet: Arc<dyn Wallet>,
}

impl Contracts {
  pub fn new(
    sellers: Arc<dyn SellerRegistry>,
    inventory: Arc<dyn InventoryRegistry>,
    orders: Arc<dyn OrderRegistry>,
    wallet: Arc<dyn Wallet>,
  ) -> Self {
    Self {
      sellers,
      inventory,
      orders,
      wallet,
    }
  }

  /// Uses one object for every client, e.g. a node connection that serves
  /// all three registries.
  pub fn from_single<C>(chain: Arc<C>) -> Self
  where
    C: SellerRegistry + InventoryRegistry + OrderRegistry + Wallet + 'static,
  {
    Self {
      sellers: chain.clone(),
      inventory: chain.clone(),
      orders: chain.clone(),
      wallet: chain,
    }
  }

  pub fn account(&self) -> Address {
    self.wallet.account()
  }

  /// Waits for `tx_hash` to be mined.
  pub async fn confirm(&self, tx_hash: TxHash) -> Result<TxReceipt, ContractError> {
    event!(Level::DEBUG, %tx_hash, "Waiting for transaction confirmation.");
    let receipt = self.wallet.wait_for_receipt(tx_hash).await?;
    event!(Level::INFO, %tx_hash, confirmed_at = %receipt.confirmed_at, "Transaction confirmed.");
    Ok(receipt)
  }
}

impl std::fmt::Debug for Contracts {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Contracts").field("account", &self.account()).finish_non_exhaustive()
  }
}

/// Converts a contract amount (always non-negative once the sentinel is
/// excluded) into `u64`.
pub fn amount_from_contract(value: i128, field: &str) -> Result<u64, ContractError> {
  u64::try_from(value).map_err(|_| ContractError::Decode {
    field: field.to_string(),
    message: format!("amount {value} out of range"),
  })
}
