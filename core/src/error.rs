// openmarket/src/error.rs
use crate::contracts::TxReceipt;
use crate::model::OrderState;
use crate::orders::OrderAction;
use crate::workflow::FlowError;
use alloy_primitives::Address;
use thiserror::Error;

/// Error code wallets use when the user dismisses a signing prompt.
pub const WALLET_REJECTION_CODE: i64 = 4001;

/// Failure reported by a contract client or the wallet adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
  #[error("RPC call '{call}' failed: {message}")]
  Rpc { call: String, message: String },

  #[error("Transaction reverted: {reason}")]
  Reverted { reason: String },

  #[error("Request rejected in wallet (code 4001)")]
  WalletRejected,

  #[error("Could not decode '{field}' from contract response: {message}")]
  Decode { field: String, message: String },
}

impl ContractError {
  pub fn rpc(call: impl Into<String>, message: impl Into<String>) -> Self {
    ContractError::Rpc {
      call: call.into(),
      message: message.into(),
    }
  }

  pub fn reverted(reason: impl Into<String>) -> Self {
    ContractError::Reverted { reason: reason.into() }
  }

  /// Maps a wallet/provider error code onto the taxonomy.
  pub fn from_provider_code(code: i64, call: impl Into<String>, message: impl Into<String>) -> Self {
    if code == WALLET_REJECTION_CODE {
      ContractError::WalletRejected
    } else {
      ContractError::rpc(call, message)
    }
  }
}

/// Coarse classification used by callers to choose how to report an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Bad user input. Reported inline, never reached the network.
  Input,
  /// A precondition checked before any network call.
  Precondition,
  /// RPC failure, revert or wallet rejection.
  Network,
  /// Client view no longer matches the chain. Prompt a refresh, not a retry.
  Stale,
  Upload,
  Storage,
  Internal,
}

#[derive(Debug, Error)]
pub enum MarketError {
  #[error("Invalid quantity {quantity}: must be at least 1")]
  InvalidQuantity { quantity: u64 },

  #[error("Missing required field '{field}'")]
  MissingField { field: &'static str },

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Account {account} is not a registered seller")]
  SellerNotRegistered { account: Address },

  #[error("Cart holds products from seller {locked}; product {product_id} belongs to {owner}")]
  SellerMismatch {
    locked: Address,
    owner: Address,
    product_id: u64,
  },

  #[error("Cart is empty")]
  EmptyCart,

  #[error("Action {action:?} is not available for order {order_id} in state {state}")]
  ActionUnavailable {
    order_id: u64,
    action: OrderAction,
    state: OrderState,
  },

  #[error("Only {available} units of product {product_id} available, {requested} requested")]
  OutOfStock {
    product_id: u64,
    requested: u64,
    available: u64,
  },

  /// The transition confirmed on chain; only the follow-up re-read failed.
  #[error("Transaction {} confirmed, but the order list could not be re-read: {source}", .receipt.tx_hash)]
  OrdersNotRefreshed {
    receipt: TxReceipt,
    source: Box<MarketError>,
  },

  #[error("Product {product_id} is no longer listed")]
  ProductUnavailable { product_id: u64 },

  #[error("Cart stale, please refresh")]
  StaleCart,

  #[error("Contract call failed: {source}")]
  Contract {
    #[from]
    source: ContractError,
  },

  #[error("Image upload failed")]
  UploadFailed,

  #[error("Pending checkout storage failed: {0}")]
  Storage(String),

  #[error("Workflow error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Configuration error: {0}")]
  Config(String),
}

impl MarketError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      MarketError::InvalidQuantity { .. } | MarketError::MissingField { .. } | MarketError::InvalidInput(_) => {
        ErrorKind::Input
      }
      MarketError::SellerNotRegistered { .. }
      | MarketError::SellerMismatch { .. }
      | MarketError::EmptyCart
      | MarketError::ActionUnavailable { .. } => ErrorKind::Precondition,
      MarketError::OutOfStock { .. }
      | MarketError::ProductUnavailable { .. }
      | MarketError::StaleCart
      | MarketError::OrdersNotRefreshed { .. } => ErrorKind::Stale,
      MarketError::Contract { .. } => ErrorKind::Network,
      MarketError::UploadFailed => ErrorKind::Upload,
      MarketError::Storage(_) => ErrorKind::Storage,
      MarketError::Workflow { .. } | MarketError::Config(_) => ErrorKind::Internal,
    }
  }

  pub fn is_stale(&self) -> bool {
    self.kind() == ErrorKind::Stale
  }

  pub fn is_wallet_rejection(&self) -> bool {
    matches!(
      self,
      MarketError::Contract {
        source: ContractError::WalletRejected
      }
    )
  }

  /// Receipt of a transaction that did commit even though the call as a
  /// whole failed.
  pub fn committed_receipt(&self) -> Option<TxReceipt> {
    match self {
      MarketError::OrdersNotRefreshed { receipt, .. } => Some(*receipt),
      _ => None,
    }
  }

  /// The revert reason, when the contract refused the transaction.
  pub fn revert_reason(&self) -> Option<&str> {
    match self {
      MarketError::Contract {
        source: ContractError::Reverted { reason },
      } => Some(reason.as_str()),
      _ => None,
    }
  }
}

pub type Result<T, E = MarketError> = std::result::Result<T, E>;
