//! Barcode normalisation and product lookup.
//!
//! The built-in table answers first; an optional remote lookup (Open Food
//! Facts-shaped JSON) fills the gaps and is cached, misses included.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use moka::future::Cache;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use common::metrics;
use configs::BarcodeConfig;
use models::category::{guess_category, Category};
use models::inventory::{InventoryInput, InventoryItem};
use upstream::{ClientOptions, UpstreamClient, UpstreamError};

use crate::errors::ServiceError;
use crate::inventory::InventoryService;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSource {
    MockDb,
    Remote,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub code: String,
    pub name: String,
    pub brand: Option<String>,
    pub category: Category,
    pub unit: String,
    pub size: Option<String>,
    pub shelf_life_days: i64,
    pub source: ProductSource,
}

/// Strip spaces and dashes, check length and GTIN check digit. UPC-A is
/// promoted to EAN-13 with a leading zero.
pub fn normalize(code: &str) -> Result<String, ServiceError> {
    let digits: String = code.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ServiceError::invalid(format!("barcode must be digits: {code}")));
    }
    if !matches!(digits.len(), 8 | 12 | 13 | 14) {
        return Err(ServiceError::invalid(format!("barcode length {} not one of 8, 12, 13, 14", digits.len())));
    }
    if !check_digit_ok(&digits) {
        return Err(ServiceError::invalid(format!("barcode check digit mismatch: {digits}")));
    }
    Ok(if digits.len() == 12 { format!("0{digits}") } else { digits })
}

/// GTIN mod-10: weights 3,1,3,... from the digit left of the check digit.
fn check_digit_ok(digits: &str) -> bool {
    let values: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    let Some((&check, body)) = values.split_last() else { return false };
    let sum: u32 = body.iter().rev().enumerate().map(|(i, d)| if i % 2 == 0 { d * 3 } else { *d }).sum();
    (10 - sum % 10) % 10 == check
}

#[allow(clippy::too_many_arguments)]
fn mock(code: &str, name: &str, brand: &str, category: Category, unit: &str, size: &str, shelf_life_days: i64) -> Product {
    Product {
        code: code.into(),
        name: name.into(),
        brand: (!brand.is_empty()).then(|| brand.to_string()),
        category,
        unit: unit.into(),
        size: (!size.is_empty()).then(|| size.to_string()),
        shelf_life_days,
        source: ProductSource::MockDb,
    }
}

static MOCK_DB: Lazy<Vec<Product>> = Lazy::new(|| {
    vec![
        mock("5449000000996", "Coca-Cola Original", "Coca-Cola", Category::Beverages, "can", "330 ml", 270),
        mock("3017620422003", "Nutella", "Ferrero", Category::Condiments, "jar", "400 g", 365),
        mock("8076800195057", "Spaghetti No.5", "Barilla", Category::Grains, "box", "500 g", 730),
        mock("0036000291452", "Organic Whole Milk", "Horizon", Category::Dairy, "gallon", "", 10),
        mock("0041331000857", "Black Beans", "Goya", Category::Grains, "can", "439 g", 730),
        mock("0028400044912", "Classic Potato Chips", "Lay's", Category::Snacks, "bag", "283 g", 60),
        mock("0078742135267", "Large White Eggs", "Great Value", Category::Dairy, "dozen", "", 28),
        mock("96385074", "Bananas", "", Category::Produce, "bunch", "", 7),
        mock("5901234123457", "Greek Yogurt Plain", "Fage", Category::Dairy, "tub", "500 g", 14),
    ]
});

/// Product data source behind the built-in table.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    /// `Ok(None)` when the source does not know the code.
    async fn fetch(&self, code: &str) -> Result<Option<Product>, UpstreamError>;
}

/// `remote_lookup_url` with a `{code}` placeholder, answering Open Food Facts JSON.
pub struct OpenFoodFactsLookup {
    client: UpstreamClient,
    url_template: String,
}

impl OpenFoodFactsLookup {
    pub fn new(url_template: &str) -> Result<Self, UpstreamError> {
        let client = UpstreamClient::new("barcode", url_template, ClientOptions::default())?;
        Ok(Self { client, url_template: url_template.to_string() })
    }
}

#[async_trait]
impl ProductLookup for OpenFoodFactsLookup {
    async fn fetch(&self, code: &str) -> Result<Option<Product>, UpstreamError> {
        let url = if self.url_template.contains("{code}") {
            self.url_template.replace("{code}", code)
        } else {
            format!("{}/{code}", self.client.base_url())
        };
        match self.client.get_json(&url).await {
            Ok(body) => Ok(product_from_off(code, &body)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Read `{status, product: {product_name, brands, categories, quantity}}`.
pub fn product_from_off(code: &str, body: &Value) -> Option<Product> {
    if body.get("status").and_then(Value::as_i64) == Some(0) {
        return None;
    }
    let p = body.get("product")?;
    let text = |key: &str| p.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty());
    let name = text("product_name")?.to_string();
    let tags = text("categories").unwrap_or_default();
    let category = tags
        .split(',')
        .find_map(Category::parse)
        .or_else(|| Some(guess_category(tags)).filter(|c| *c != Category::Other))
        .unwrap_or_else(|| guess_category(&name));
    Some(Product {
        code: code.to_string(),
        brand: text("brands").and_then(|b| b.split(',').next()).map(|b| b.trim().to_string()),
        size: text("quantity").map(String::from),
        unit: "pcs".into(),
        shelf_life_days: category.shelf_life_days(),
        category,
        name,
        source: ProductSource::Remote,
    })
}

#[derive(Clone)]
pub struct BarcodeService {
    remote: Option<Arc<dyn ProductLookup>>,
    cache: Cache<String, Option<Product>>,
    inventory: Arc<InventoryService>,
}

impl BarcodeService {
    pub fn new(remote: Option<Arc<dyn ProductLookup>>, cfg: &BarcodeConfig, inventory: Arc<InventoryService>) -> Self {
        let cache = Cache::builder()
            .max_capacity(cfg.cache_capacity)
            .time_to_live(Duration::from_secs(cfg.cache_ttl_secs))
            .build();
        Self { remote, cache, inventory }
    }

    pub fn from_config(cfg: &BarcodeConfig, inventory: Arc<InventoryService>) -> Result<Self, ServiceError> {
        let remote = match cfg.remote_lookup_url.as_deref() {
            Some(url) => Some(Arc::new(OpenFoodFactsLookup::new(url)?) as Arc<dyn ProductLookup>),
            None => None,
        };
        Ok(Self::new(remote, cfg, inventory))
    }

    pub async fn lookup(&self, code: &str) -> Result<Product, ServiceError> {
        let code = normalize(code)?;
        if let Some(p) = MOCK_DB.iter().find(|p| p.code == code) {
            return Ok(p.clone());
        }
        let Some(remote) = &self.remote else {
            return Err(ServiceError::not_found("product"));
        };
        // Concurrent misses for one code share a single remote call.
        let entry = self
            .cache
            .entry(code.clone())
            .or_try_insert_with(async {
                remote.fetch(&code).await.map_err(|e| {
                    warn!(event = "barcode_remote_failed", code = %code, error = %e);
                    ServiceError::from(e)
                })
            })
            .await
            .map_err(unshare)?;
        if entry.is_fresh() {
            info!(event = "barcode_remote_lookup", code = %code, found = entry.value().is_some());
        } else {
            metrics::BARCODE_CACHE_HITS.inc();
            debug!(event = "barcode_cache_hit", code = %code, found = entry.value().is_some());
        }
        entry.into_value().ok_or_else(|| ServiceError::not_found("product"))
    }

    pub async fn add_to_inventory(&self, code: &str, quantity: Option<f64>, today: NaiveDate) -> Result<InventoryItem, ServiceError> {
        let product = self.lookup(code).await?;
        let input = InventoryInput {
            category: Some(product.category),
            unit: Some(product.unit.clone()),
            barcode: Some(product.code.clone()),
            purchase_date: Some(today),
            expiry_date: Some(today + chrono::Duration::days(product.shelf_life_days)),
            ..InventoryInput::named(display_name(&product), quantity.unwrap_or(1.0))
        };
        self.inventory.create(input).await
    }
}

/// Callers waiting on a failed shared lookup each get their own copy of the error.
fn unshare(e: Arc<ServiceError>) -> ServiceError {
    Arc::try_unwrap(e).unwrap_or_else(|shared| match &*shared {
        ServiceError::Unavailable(m) => ServiceError::Unavailable(m.clone()),
        ServiceError::Upstream(m) => ServiceError::Upstream(m.clone()),
        other => ServiceError::Upstream(other.to_string()),
    })
}

fn display_name(p: &Product) -> String {
    match &p.brand {
        Some(b) if !p.name.contains(b.as_str()) => format!("{b} {}", p.name),
        _ => p.name.clone(),
    }
}
