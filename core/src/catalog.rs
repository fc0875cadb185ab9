// openmarket/src/catalog.rs

use crate::config::MarketConfig;
use crate::contracts::Contracts;
use crate::display;
use crate::error::Result;
use crate::model::{Category, Product};
use tracing::{event, instrument, Level};

/// Catalog filters. A blank city counts as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
  pub city: Option<String>,
  pub category: Option<Category>,
}

impl CatalogQuery {
  pub fn all() -> Self {
    Self::default()
  }

  pub fn with_city(mut self, city: impl Into<String>) -> Self {
    self.city = Some(city.into());
    self
  }

  pub fn with_category(mut self, category: Category) -> Self {
    self.category = Some(category);
    self
  }

  fn city_filter(&self) -> Option<&str> {
    self.city.as_deref().map(str::trim).filter(|c| !c.is_empty())
  }
}

/// Reads the product listing from the inventory registry.
#[derive(Debug, Clone)]
pub struct Catalog {
  contracts: Contracts,
  gateway_url: String,
}

impl Catalog {
  pub fn new(contracts: Contracts, config: &MarketConfig) -> Self {
    Self {
      contracts,
      gateway_url: config.gateway_url.clone(),
    }
  }

  /// Enabled products matching `query`.
  ///
  /// With a city set, products are collected seller by seller in the order
  /// the seller registry returns them. Any failed read fails the whole fetch;
  /// partial listings are never returned.
  #[instrument(
    name = "Catalog::fetch",
    skip_all,
    fields(city = ?query.city, category = ?query.category),
    err(Display)
  )]
  pub async fn fetch(&self, query: &CatalogQuery) -> Result<Vec<Product>> {
    let inventory = &self.contracts.inventory;

    let products = match (query.city_filter(), query.category) {
      (None, None) => inventory.get_all_products().await?,
      (None, Some(category)) => inventory.get_products_by_category(category).await?,
      (Some(city), category) => {
        let sellers = self.contracts.sellers.get_sellers_by_city(city).await?;
        event!(Level::DEBUG, sellers = sellers.len(), "Resolved sellers for city.");

        let mut products = Vec::new();
        for seller in &sellers {
          let batch = match category {
            Some(category) => inventory.get_products_by_seller_of_category(seller.wallet, category).await?,
            None => inventory.get_products_by_seller(seller.wallet).await?,
          };
          products.extend(batch);
        }
        products
      }
    };

    let fetched = products.len();
    let listed: Vec<Product> = products.into_iter().filter(|p| p.enabled).collect();
    event!(Level::INFO, fetched, listed = listed.len(), "Catalog fetched.");
    Ok(listed)
  }

  pub fn image_url(&self, cid: &str) -> String {
    display::image_url(&self.gateway_url, cid)
  }
}
