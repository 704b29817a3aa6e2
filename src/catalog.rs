//! Product metadata from the remote catalog service.
//!
//! The catalog is a boundary: when it cannot be reached, or answers with
//! something unexpected, the batch carries on with no products at all.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use std::{collections::HashMap, fs, path::Path, time::Duration};

pub const DEFAULT_CATALOG_URL: &str = "https://dummyjson.com/products?limit=100";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// One product as the catalog service describes it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CatalogProduct {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProductsPage {
    #[serde(default)]
    products: Vec<CatalogProduct>,
}

/// Metadata attached to transactions during enrichment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductMeta {
    pub title: String,
    pub category: String,
    pub brand: String,
    pub rating: f64,
}

/// Product metadata keyed by numeric product id.
#[derive(Debug, Clone, Default)]
pub struct ProductMapping(HashMap<i64, ProductMeta>);

impl ProductMapping {
    /// Builds the mapping, skipping products that have no id.
    ///
    /// Missing text fields become empty strings, and a missing rating
    /// becomes `0.0`. A later product with the same id replaces an earlier
    /// one.
    #[must_use]
    pub fn from_products(products: &[CatalogProduct]) -> Self {
        let map = products
            .iter()
            .filter_map(|p| {
                let id = p.id?;
                let meta = ProductMeta {
                    title: p.title.clone().unwrap_or_default(),
                    category: p.category.clone().unwrap_or_default(),
                    brand: p.brand.clone().unwrap_or_default(),
                    rating: p.rating.unwrap_or_default(),
                };
                Some((id, meta))
            })
            .collect();
        Self(map)
    }

    #[must_use]
    pub fn get(&self, id: i64) -> Option<&ProductMeta> {
        self.0.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Decodes a catalog response body of the form `{"products": [...]}`.
///
/// # Errors
///
/// Returns an error if `body` is not a JSON object of that shape.
pub fn decode_products(body: &str) -> Result<Vec<CatalogProduct>> {
    let page: ProductsPage = serde_json::from_str(body)?;
    Ok(page.products)
}

/// Reads catalog products from a JSON file saved from the catalog service.
///
/// # Errors
///
/// Returns errors if the file cannot be read or decoded.
pub fn load_products(path: impl AsRef<Path>) -> Result<Vec<CatalogProduct>> {
    let path = path.as_ref();
    let body = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    decode_products(&body).with_context(|| format!("decoding {}", path.display()))
}

/// A blocking client for the product catalog service.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    url: String,
    timeout: Duration,
}

impl CatalogClient {
    #[must_use]
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    /// Fetches every product from the catalog.
    ///
    /// Never fails: network errors, error statuses and undecodable bodies
    /// are logged and treated as an empty catalog.
    #[must_use]
    pub fn fetch_all_products(&self) -> Vec<CatalogProduct> {
        match self.try_fetch() {
            Ok(products) => {
                info!(count = products.len(), "catalog fetch successful");
                products
            }
            Err(e) => {
                warn!("catalog fetch failed: {e:#}");
                Vec::new()
            }
        }
    }

    fn try_fetch(&self) -> Result<Vec<CatalogProduct>> {
        debug!(url = %self.url, timeout = ?self.timeout, "fetching catalog");
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("building HTTP client")?;
        let response = client
            .get(&self.url)
            .send()
            .with_context(|| format!("requesting {}", self.url))?
            .error_for_status()?;
        let body = response.text().context("reading catalog response")?;
        decode_products(&body).context("decoding catalog response")
    }
}
