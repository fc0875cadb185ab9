// openmarket/src/model/category.rs

//! Product categories.
//!
//! The ordinal is the contract encoding and the label is what the UI shows.
//! `TABLE` is the only place either mapping lives; reordering it is a
//! breaking change to the contract interface.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
#[repr(u8)]
pub enum Category {
  Fashion = 0,
  Electronics = 1,
  Furniture = 2,
  Books = 3,
  Beauty = 4,
  Sports = 5,
}

/// Indexed by ordinal.
const TABLE: [(Category, &str); 6] = [
  (Category::Fashion, "Fashion"),
  (Category::Electronics, "Electronics"),
  (Category::Furniture, "Furniture"),
  (Category::Books, "Books"),
  (Category::Beauty, "Beauty"),
  (Category::Sports, "Sports"),
];

impl Category {
  pub const ALL: [Category; 6] = [
    Category::Fashion,
    Category::Electronics,
    Category::Furniture,
    Category::Books,
    Category::Beauty,
    Category::Sports,
  ];

  pub fn ordinal(self) -> u8 {
    self as u8
  }

  pub fn label(self) -> &'static str {
    TABLE[self as usize].1
  }

  pub fn from_ordinal(ordinal: u8) -> Option<Self> {
    TABLE.get(ordinal as usize).map(|(category, _)| *category)
  }

  /// Exact, case-sensitive match on the UI label.
  pub fn from_label(label: &str) -> Option<Self> {
    TABLE.iter().find(|(_, l)| *l == label).map(|(category, _)| *category)
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
  type Err = UnknownCategory;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Category::from_label(s).ok_or_else(|| UnknownCategory(s.to_string()))
  }
}

impl From<Category> for &'static str {
  fn from(category: Category) -> Self {
    category.label()
  }
}

impl TryFrom<String> for Category {
  type Error = UnknownCategory;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl TryFrom<u8> for Category {
  type Error = UnknownCategory;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Category::from_ordinal(value).ok_or_else(|| UnknownCategory(value.to_string()))
  }
}
