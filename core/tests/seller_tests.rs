// tests/seller_tests.rs
mod common;

use alloy_primitives::Address;
use async_trait::async_trait;
use common::*;
use openmarket::{
  ContractError, Contracts, ErrorKind, ImageFile, ImageUploadBridge, MarketError, ProductUpdate, Registration, Seller,
  SellerDesk, SellerProfile, SellerRegistry, TxHash,
};
use serial_test::serial;
use std::sync::Arc;

/// Seller registry whose precheck always answers "not registered", so
/// registration reaches the contract even for a known seller.
struct LaggingRegistry(Arc<FakeChain>);

#[async_trait]
impl SellerRegistry for LaggingRegistry {
  async fn is_registered(&self, _account: Address) -> Result<bool, ContractError> {
    Ok(false)
  }

  async fn register_seller(&self, profile: &SellerProfile) -> Result<TxHash, ContractError> {
    self.0.register_seller(profile).await
  }

  async fn get_sellers_by_city(&self, city: &str) -> Result<Vec<Seller>, ContractError> {
    self.0.get_sellers_by_city(city).await
  }
}

fn setup() -> (Arc<FakeChain>, SellerDesk) {
  setup_tracing();
  let chain = FakeChain::new(seller_a());
  let desk = SellerDesk::new(chain.contracts());
  (chain, desk)
}

#[tokio::test]
#[serial]
async fn test_register_new_seller() {
  let (chain, desk) = setup();
  assert!(!desk.is_registered().await.unwrap());

  let outcome = desk.register(&profile("Loom & Thread", "Pune")).await.unwrap();

  assert!(matches!(outcome, Registration::Registered { .. }));
  assert!(desk.is_registered().await.unwrap());
  assert_eq!(chain.call_count("waitForReceipt"), 1);
}

#[tokio::test]
#[serial]
async fn test_registered_seller_is_not_registered_twice() {
  let (chain, desk) = setup();
  chain.seed_seller(seller_a(), "Pune");

  let outcome = desk.register(&profile("Loom & Thread", "Pune")).await.unwrap();

  assert_eq!(outcome, Registration::AlreadyRegistered);
  assert_eq!(chain.call_count("registerSeller"), 0);
}

#[tokio::test]
#[serial]
async fn test_duplicate_revert_maps_to_already_registered() {
  let (chain, _) = setup();
  chain.seed_seller(seller_a(), "Pune");
  let base = chain.contracts();
  let contracts = Contracts::new(
    Arc::new(LaggingRegistry(chain.clone())),
    base.inventory.clone(),
    base.orders.clone(),
    base.wallet.clone(),
  );
  let desk = SellerDesk::new(contracts);

  let outcome = desk.register(&profile("Loom & Thread", "Pune")).await.unwrap();

  assert_eq!(outcome, Registration::AlreadyRegistered);
  assert_eq!(chain.call_count("registerSeller"), 1);
  assert_eq!(chain.call_count("waitForReceipt"), 0);
}

#[tokio::test]
#[serial]
async fn test_register_requires_every_profile_field() {
  let (chain, desk) = setup();
  let incomplete = SellerProfile {
    email: "  ".to_string(),
    ..profile("Loom & Thread", "Pune")
  };

  let err = desk.register(&incomplete).await.unwrap_err();

  assert!(matches!(err, MarketError::MissingField { field: "email" }));
  assert!(chain.calls().is_empty());
}

#[tokio::test]
#[serial]
async fn test_unregistered_account_cannot_manage_inventory() {
  let (chain, desk) = setup();

  let err = desk.inventory().await.unwrap_err();
  assert!(matches!(err, MarketError::SellerNotRegistered { account } if account == seller_a()));
  assert_eq!(err.kind(), ErrorKind::Precondition);

  let err = desk.add_product(&draft("Atlas", 300, 4)).await.unwrap_err();
  assert!(matches!(err, MarketError::SellerNotRegistered { .. }));
  assert_eq!(chain.call_count("addProduct"), 0);
}

#[tokio::test]
#[serial]
async fn test_add_and_update_products() {
  let (chain, desk) = setup();
  chain.seed_seller(seller_a(), "Pune");
  chain.seed_product(product(1, seller_b(), 100, 1));

  desk.add_product(&draft("Atlas", 300, 4)).await.unwrap();
  let inventory = desk.inventory().await.unwrap();
  assert_eq!(inventory.len(), 1);
  let listed = &inventory[0];
  assert_eq!(listed.name, "Atlas");
  assert_eq!(listed.owner, seller_a());
  assert_eq!(listed.release_date, Some(chain.now()));

  let update = ProductUpdate {
    price: 350,
    enabled: false,
    ..ProductUpdate::from(listed)
  };
  desk.update_product(&update).await.unwrap();
  let inventory = desk.inventory().await.unwrap();
  assert_eq!(inventory[0].price, 350);
  assert!(!inventory[0].enabled);

  // Someone else's listing is refused by the registry.
  let foreign = ProductUpdate::from(&chain.product(1).unwrap());
  let err = desk.update_product(&foreign).await.unwrap_err();
  assert_eq!(err.revert_reason(), Some("Not product owner"));
}

#[tokio::test]
#[serial]
async fn test_product_fields_are_validated_before_any_call() {
  let (chain, desk) = setup();

  let err = desk.add_product(&draft("", 300, 4)).await.unwrap_err();
  assert!(matches!(err, MarketError::MissingField { field: "name" }));

  let err = desk.add_product(&draft("Atlas", 0, 4)).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Input);

  let mut no_image = draft("Atlas", 300, 4);
  no_image.image_cid.clear();
  let err = desk.add_product(&no_image).await.unwrap_err();
  assert!(matches!(err, MarketError::MissingField { field: "image_cid" }));

  assert!(chain.calls().is_empty());
}

#[tokio::test]
#[serial]
async fn test_add_product_with_uploaded_image() {
  let (chain, desk) = setup();
  chain.seed_seller(seller_a(), "Pune");
  let pinning = FakePinning::new(PinOutcome::Pinned {
    cid: "QmFresh",
    size: Some(42),
  });
  let bridge = ImageUploadBridge::new(pinning.clone(), "https://gateway.test/ipfs/");
  let mut without_image = draft("Atlas", 300, 4);
  without_image.image_cid.clear();

  let (uploaded, _) = desk
    .add_product_with_image(without_image, ImageFile::new("atlas.png", vec![1, 2, 3]), &bridge)
    .await
    .unwrap();

  assert_eq!(uploaded.cid, "QmFresh");
  assert_eq!(pinning.received().len(), 1);
  assert_eq!(desk.inventory().await.unwrap()[0].image_cid, "QmFresh");
}

#[tokio::test]
#[serial]
async fn test_failed_image_upload_lists_nothing() {
  let (chain, desk) = setup();
  chain.seed_seller(seller_a(), "Pune");
  let bridge = ImageUploadBridge::new(FakePinning::new(PinOutcome::HttpStatus(502)), "https://gateway.test/ipfs/");

  let err = desk
    .add_product_with_image(draft("Atlas", 300, 4), ImageFile::new("atlas.png", vec![1]), &bridge)
    .await
    .unwrap_err();

  assert!(matches!(err, MarketError::UploadFailed));
  assert_eq!(chain.call_count("addProduct"), 0);
}
