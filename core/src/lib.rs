// src/lib.rs

//! OpenMarket: client-side workflows for an on-chain marketplace.
//!
//! The contracts own all durable state (sellers, inventory, orders, escrow).
//! This crate is the client half:
//!  - A catalog fetcher that routes city/category filters to registry reads.
//!  - A cart locked to a single seller, checked against live stock on every add.
//!  - A checkout that lets the order registry price the cart, then pays exactly that.
//!  - An order tracker that offers per-state actions and submits transitions.
//!  - Seller registration and inventory management.
//!  - An image upload bridge to an IPFS pinning service.
//!
//! Multi-call flows run as `workflow::Pipeline`s so each step is traced.

pub mod error;
pub mod workflow;

pub mod config;
pub mod contracts;
pub mod display;
pub mod model;

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod seller;
pub mod session;
pub mod upload;

// --- Re-exports for the Public API ---

pub use crate::error::{ContractError, ErrorKind, MarketError, Result};
pub use crate::workflow::{FlowError, FlowOutcome, FlowState, Pipeline, StepControl};

pub use crate::config::{ContractAddresses, MarketConfig, PinningConfig};
pub use crate::contracts::{Contracts, InventoryRegistry, OrderRegistry, SellerRegistry, TxHash, TxReceipt, Wallet};
pub use crate::model::{
  Cart, CartItem, Category, Order, OrderItem, OrderLine, OrderState, Product, ProductDraft, ProductUpdate, Seller,
  SellerProfile, ValidatedCartItem,
};

pub use crate::cart::CartManager;
pub use crate::catalog::{Catalog, CatalogQuery};
pub use crate::checkout::{Checkout, CheckoutReceipt, PendingCheckout, PendingCheckoutStore, Quote};
pub use crate::orders::{ActionAvailability, EligibilityWindows, OrderAction, OrderTracker, ReturnGate, Role};
pub use crate::seller::{Registration, SellerDesk};
pub use crate::session::Session;
pub use crate::upload::{ImageFile, ImageUploadBridge, PinataEndpoint, PinningEndpoint, UploadedImage};
