// openmarket/src/model/mod.rs

pub mod cart;
pub mod category;
pub mod order;
pub mod product;
pub mod seller;

pub use cart::{Cart, CartItem, ValidatedCartItem};
pub use category::{Category, UnknownCategory};
pub use order::{Order, OrderItem, OrderLine, OrderState};
pub use product::{Product, ProductDraft, ProductUpdate};
pub use seller::{Seller, SellerProfile};

use chrono::{DateTime, Utc};

/// Converts a contract timestamp (unix seconds) into a `DateTime`.
/// The contracts use 0 for "not set".
pub fn timestamp_from_unix(secs: u64) -> Option<DateTime<Utc>> {
  if secs == 0 {
    return None;
  }
  i64::try_from(secs).ok().and_then(|s| DateTime::from_timestamp(s, 0))
}
