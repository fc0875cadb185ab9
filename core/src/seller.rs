// openmarket/src/seller.rs

//! Seller registration and inventory management.

use crate::contracts::{Contracts, TxHash, TxReceipt};
use crate::error::{ContractError, MarketError, Result};
use crate::model::{Product, ProductDraft, ProductUpdate, SellerProfile};
use crate::upload::{ImageFile, ImageUploadBridge, UploadedImage};
use tracing::{error, info, instrument, warn};

/// Revert reason of the seller registry for a duplicate registration.
pub const ALREADY_REGISTERED_REASON: &str = "Seller already registered";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
  Registered { tx_hash: TxHash },
  AlreadyRegistered,
}

/// Seller-side operations for the connected account.
#[derive(Debug, Clone)]
pub struct SellerDesk {
  contracts: Contracts,
}

impl SellerDesk {
  pub fn new(contracts: Contracts) -> Self {
    Self { contracts }
  }

  pub async fn is_registered(&self) -> Result<bool> {
    Ok(self.contracts.sellers.is_registered(self.contracts.account()).await?)
  }

  async fn require_registered(&self) -> Result<()> {
    if self.is_registered().await? {
      Ok(())
    } else {
      let account = self.contracts.account();
      warn!("Account {} is not a registered seller.", account);
      Err(MarketError::SellerNotRegistered { account })
    }
  }

  /// Registers the connected account as a seller.
  ///
  /// An account that is already registered gets `AlreadyRegistered` and no
  /// transaction, whether the precheck or the registry's revert says so.
  #[instrument(name = "SellerDesk::register", skip_all, fields(city = %profile.city), err(Display))]
  pub async fn register(&self, profile: &SellerProfile) -> Result<Registration> {
    profile.validate()?;

    if self.is_registered().await? {
      info!("Account {} is already a registered seller.", self.contracts.account());
      return Ok(Registration::AlreadyRegistered);
    }

    let tx_hash = match self.contracts.sellers.register_seller(profile).await {
      Ok(tx_hash) => tx_hash,
      Err(ContractError::Reverted { reason }) if reason.contains(ALREADY_REGISTERED_REASON) => {
        info!("Seller registry reports the account is already registered.");
        return Ok(Registration::AlreadyRegistered);
      }
      Err(e) => {
        error!("Seller registration failed: {}", e);
        return Err(e.into());
      }
    };
    self.contracts.confirm(tx_hash).await?;
    info!("Registered seller '{}'.", profile.business_name);
    Ok(Registration::Registered { tx_hash })
  }

  /// All of the seller's products, enabled or not.
  #[instrument(name = "SellerDesk::inventory", skip_all, err(Display))]
  pub async fn inventory(&self) -> Result<Vec<Product>> {
    self.require_registered().await?;
    let products = self
      .contracts
      .inventory
      .get_products_by_seller(self.contracts.account())
      .await?;
    Ok(products)
  }

  #[instrument(name = "SellerDesk::add_product", skip_all, fields(name = %draft.name), err(Display))]
  pub async fn add_product(&self, draft: &ProductDraft) -> Result<TxReceipt> {
    draft.validate()?;
    self.require_registered().await?;
    let tx_hash = self.contracts.inventory.add_product(draft).await?;
    let receipt = self.contracts.confirm(tx_hash).await?;
    info!("Product '{}' listed.", draft.name);
    Ok(receipt)
  }

  /// Uploads `image`, then lists the product with the returned CID.
  pub async fn add_product_with_image(
    &self,
    draft: ProductDraft,
    image: ImageFile,
    bridge: &ImageUploadBridge,
  ) -> Result<(UploadedImage, TxReceipt)> {
    draft.validate_details()?;
    self.require_registered().await?;

    let uploaded = bridge.upload(image).await?;
    let draft = ProductDraft {
      image_cid: uploaded.cid.clone(),
      ..draft
    };
    let receipt = self.add_product(&draft).await?;
    Ok((uploaded, receipt))
  }

  #[instrument(name = "SellerDesk::update_product", skip_all, fields(product_id = update.id), err(Display))]
  pub async fn update_product(&self, update: &ProductUpdate) -> Result<TxReceipt> {
    update.validate()?;
    self.require_registered().await?;
    let tx_hash = self.contracts.inventory.update_product(update).await?;
    let receipt = self.contracts.confirm(tx_hash).await?;
    info!("Product {} updated.", update.id);
    Ok(receipt)
  }
}
