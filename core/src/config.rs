// openmarket/src/config.rs

use crate::error::{MarketError, Result};
use crate::orders::{EligibilityWindows, ReturnGate};
use alloy_primitives::{address, Address};
use chrono::Duration;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PINNING_ENDPOINT: &str = "https://api.pinata.cloud/pinning/pinFileToIPFS";
pub const DEFAULT_GATEWAY_URL: &str = "https://sapphire-important-squid-465.mypinata.cloud/ipfs";
/// Contract totals are in tinybars; the payable value is in weibars.
pub const DEFAULT_VALUE_SCALE_EXPONENT: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
  pub seller_registry: Address,
  pub inventory_registry: Address,
  pub order_registry: Address,
  pub escrow: Address,
}

impl Default for ContractAddresses {
  fn default() -> Self {
    Self {
      seller_registry: address!("80AF715B1fB86d9A3B4b4D73E1A5bF297538Fc2F"),
      inventory_registry: address!("26840e50BF03eca348d31B77726e0E14A058cdfD"),
      order_registry: address!("1196e182B07Ae4d650A08590A3c382a52f6fdcA1"),
      escrow: address!("5Fc9D5c7Cb173FB21144797cCA8DDd347686a41e"),
    }
  }
}

#[derive(Clone, PartialEq, Eq)]
pub struct PinningConfig {
  pub endpoint: String,
  pub api_key: Option<String>,
  pub secret_api_key: Option<String>,
}

impl Default for PinningConfig {
  fn default() -> Self {
    Self {
      endpoint: DEFAULT_PINNING_ENDPOINT.to_string(),
      api_key: None,
      secret_api_key: None,
    }
  }
}

impl std::fmt::Debug for PinningConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
    f.debug_struct("PinningConfig")
      .field("endpoint", &self.endpoint)
      .field("api_key", &redact(&self.api_key))
      .field("secret_api_key", &redact(&self.secret_api_key))
      .finish()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketConfig {
  pub contracts: ContractAddresses,
  pub pinning: PinningConfig,
  /// Base URL images are served from; the CID is appended.
  pub gateway_url: String,
  pub windows: EligibilityWindows,
  /// `paid value = contract total * 10^value_scale_exponent`.
  pub value_scale_exponent: u8,
  /// Where an in-flight checkout is persisted. `None` keeps it in memory.
  pub pending_checkout_path: Option<PathBuf>,
}

impl Default for MarketConfig {
  fn default() -> Self {
    Self {
      contracts: ContractAddresses::default(),
      pinning: PinningConfig::default(),
      gateway_url: DEFAULT_GATEWAY_URL.to_string(),
      windows: EligibilityWindows::default(),
      value_scale_exponent: DEFAULT_VALUE_SCALE_EXPONENT,
      pending_checkout_path: None,
    }
  }
}

impl MarketConfig {
  /// Loads `.env` if present, then reads `OPENMARKET_*` variables.
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  /// Builds the config from any variable source. Unset or blank variables
  /// take their defaults; malformed ones are a `MarketError::Config`.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let defaults = MarketConfig::default();

    let contracts = ContractAddresses {
      seller_registry: parse_or(&get_env, "OPENMARKET_SELLER_REGISTRY", defaults.contracts.seller_registry)?,
      inventory_registry: parse_or(
        &get_env,
        "OPENMARKET_INVENTORY_REGISTRY",
        defaults.contracts.inventory_registry,
      )?,
      order_registry: parse_or(&get_env, "OPENMARKET_ORDER_REGISTRY", defaults.contracts.order_registry)?,
      escrow: parse_or(&get_env, "OPENMARKET_ESCROW", defaults.contracts.escrow)?,
    };

    let pinning = PinningConfig {
      endpoint: get_env("OPENMARKET_PINATA_ENDPOINT").unwrap_or(defaults.pinning.endpoint),
      api_key: get_env("OPENMARKET_PINATA_API_KEY"),
      secret_api_key: get_env("OPENMARKET_PINATA_SECRET_API_KEY"),
    };

    let gateway_url = get_env("OPENMARKET_GATEWAY_URL").unwrap_or(defaults.gateway_url);

    let return_window_secs: u32 = parse_or(
      &get_env,
      "OPENMARKET_RETURN_WINDOW_SECS",
      defaults.windows.return_window.num_seconds() as u32,
    )?;
    let claim_delay_secs: u32 = parse_or(
      &get_env,
      "OPENMARKET_CLAIM_DELAY_SECS",
      defaults.windows.claim_delay.num_seconds() as u32,
    )?;
    let return_gate = match get_env("OPENMARKET_RETURN_GATE") {
      Some(raw) => ReturnGate::from_str(&raw)
        .map_err(|e| MarketError::Config(format!("Invalid OPENMARKET_RETURN_GATE: {}", e)))?,
      None => defaults.windows.return_gate,
    };

    let value_scale_exponent = parse_or(
      &get_env,
      "OPENMARKET_VALUE_SCALE_EXPONENT",
      defaults.value_scale_exponent,
    )?;
    let pending_checkout_path = get_env("OPENMARKET_PENDING_CHECKOUT_PATH").map(PathBuf::from);

    let config = Self {
      contracts,
      pinning,
      gateway_url,
      windows: EligibilityWindows {
        return_window: Duration::seconds(i64::from(return_window_secs)),
        claim_delay: Duration::seconds(i64::from(claim_delay_secs)),
        return_gate,
      },
      value_scale_exponent,
      pending_checkout_path,
    };
    tracing::info!("Marketplace configuration loaded successfully.");
    tracing::debug!(config = ?config, "Loaded config details");
    Ok(config)
  }
}

fn parse_or<T>(get_env: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match get_env(name) {
    Some(raw) => raw
      .parse::<T>()
      .map_err(|e| MarketError::Config(format!("Invalid {}: {}", name, e))),
    None => Ok(default),
  }
}
