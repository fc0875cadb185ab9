// tests/upload_tests.rs
mod common;

use common::*;
use openmarket::upload::DEFAULT_IMAGE_NAME;
use openmarket::{ErrorKind, ImageFile, ImageUploadBridge, MarketError};
use serial_test::serial;

const GATEWAY: &str = "https://gateway.test/ipfs/";

#[tokio::test]
#[serial]
async fn test_upload_returns_cid_and_pinned_size() {
  setup_tracing();
  let pinning = FakePinning::new(PinOutcome::Pinned {
    cid: "QmPinned",
    size: Some(2048),
  });
  let bridge = ImageUploadBridge::new(pinning.clone(), GATEWAY);
  let file = ImageFile::new("shoe.jpg", vec![0xff, 0xd8, 0xff]).with_content_type("image/jpeg");

  let uploaded = bridge.upload(file.clone()).await.unwrap();

  assert_eq!(uploaded.cid, "QmPinned");
  assert_eq!(uploaded.size, 2048);
  assert_eq!(uploaded.name, "shoe.jpg");
  assert_eq!(pinning.received(), vec![file]);
  assert_eq!(bridge.image_url(&uploaded.cid), "https://gateway.test/ipfs/QmPinned");
}

#[tokio::test]
#[serial]
async fn test_missing_pin_size_falls_back_to_byte_count() {
  setup_tracing();
  let pinning = FakePinning::new(PinOutcome::Pinned {
    cid: "QmNoSize",
    size: None,
  });
  let bridge = ImageUploadBridge::new(pinning.clone(), GATEWAY);

  let uploaded = bridge.upload(ImageFile::new("   ", vec![7; 5])).await.unwrap();

  assert_eq!(uploaded.size, 5);
  assert_eq!(uploaded.name, DEFAULT_IMAGE_NAME);
  assert_eq!(pinning.received()[0].name, DEFAULT_IMAGE_NAME);
}

#[tokio::test]
#[serial]
async fn test_empty_file_is_rejected_before_pinning() {
  setup_tracing();
  let pinning = FakePinning::new(PinOutcome::Pinned {
    cid: "QmNever",
    size: None,
  });
  let bridge = ImageUploadBridge::new(pinning.clone(), GATEWAY);

  let err = bridge.upload(ImageFile::new("empty.png", Vec::new())).await.unwrap_err();

  assert!(matches!(err, MarketError::InvalidInput(ref msg) if msg == "No file uploaded"));
  assert_eq!(err.kind(), ErrorKind::Input);
  assert!(pinning.received().is_empty());
}

#[tokio::test]
#[serial]
async fn test_every_endpoint_failure_is_upload_failed() {
  setup_tracing();
  let pinning = FakePinning::new(PinOutcome::HttpStatus(401));
  let bridge = ImageUploadBridge::new(pinning.clone(), GATEWAY);

  let outcomes = [
    PinOutcome::HttpStatus(401),
    PinOutcome::HttpStatus(500),
    PinOutcome::Malformed,
    PinOutcome::Unreachable,
  ];
  for outcome in outcomes {
    pinning.set_outcome(outcome);
    let err = bridge.upload(ImageFile::new("a.png", vec![1])).await.unwrap_err();
    assert!(matches!(err, MarketError::UploadFailed));
    assert_eq!(err.kind(), ErrorKind::Upload);
  }
  assert_eq!(pinning.received().len(), 4);
}
