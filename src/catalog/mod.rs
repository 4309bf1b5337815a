mod import;
mod seed;

pub use import::{load_csv_file, parse_product_csv};

use crate::error::{InvoiceError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Number of matches shown when searching the catalog for a line item.
pub const SEARCH_LIMIT: usize = 20;
/// Number of suggestions offered while typing a description.
pub const SUGGEST_LIMIT: usize = 10;

/// A product that can be billed on a line item. Prices are always in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub code: String,
    pub name: String,
    #[serde(rename = "price")]
    pub unit_price_usd: f64,
}

impl ProductRecord {
    pub fn new(code: impl Into<String>, name: impl Into<String>, unit_price_usd: f64) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            unit_price_usd,
        }
    }

    /// A zero price means the user has to type the price in.
    pub fn requires_manual_entry(&self) -> bool {
        self.unit_price_usd == 0.0
    }
}

/// In-memory product list. Duplicate codes are allowed; lookups return the
/// first match in list order.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<ProductRecord>,
}

impl Default for Catalog {
    fn default() -> Self {
        let mut catalog = Self {
            products: Vec::new(),
        };
        catalog.reset_to_default();
        catalog
    }
}

impl Catalog {
    pub fn from_records(products: Vec<ProductRecord>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Discard the current set and install `records`.
    pub fn replace_all(&mut self, records: Vec<ProductRecord>) {
        self.products = records;
    }

    pub fn append_all(&mut self, records: Vec<ProductRecord>) {
        self.products.extend(records);
    }

    pub fn reset_to_default(&mut self) {
        self.products = seed::DEFAULT_PRODUCTS
            .iter()
            .map(|(code, name, price)| ProductRecord::new(*code, *name, *price))
            .collect();
    }

    pub fn find_by_code(&self, code: &str) -> Option<&ProductRecord> {
        self.products.iter().find(|p| p.code == code)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ProductRecord> {
        self.products.iter().find(|p| p.name == name)
    }

    /// Case-insensitive substring match on name or code, in list order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&ProductRecord> {
        let needle = query.to_lowercase();
        self.products
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle) || p.code.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect()
    }

    /// Name-prefix suggestions while typing a description. Empty input suggests nothing.
    pub fn suggest(&self, prefix: &str) -> Vec<&ProductRecord> {
        if prefix.is_empty() {
            return Vec::new();
        }
        let needle = prefix.to_lowercase();
        self.products
            .iter()
            .filter(|p| p.name.to_lowercase().starts_with(&needle))
            .take(SUGGEST_LIMIT)
            .collect()
    }
}

/// Load catalog.json, falling back to the built-in set when it is absent.
pub fn load_catalog(config_dir: &Path) -> Result<Catalog> {
    let path = config_dir.join("catalog.json");
    if !path.exists() {
        return Ok(Catalog::default());
    }
    let content = fs::read_to_string(&path)?;
    let records: Vec<ProductRecord> = serde_json::from_str(&content)?;
    Ok(Catalog::from_records(records))
}

/// Save catalog.json
pub fn save_catalog(config_dir: &Path, catalog: &Catalog) -> Result<()> {
    let path = config_dir.join("catalog.json");
    let content = serde_json::to_string_pretty(catalog.products())?;
    fs::write(path, content)?;
    Ok(())
}

/// Remove catalog.json so the built-in set is used again.
pub fn reset_catalog(config_dir: &Path) -> Result<Catalog> {
    let path = config_dir.join("catalog.json");
    if path.exists() {
        fs::remove_file(&path).map_err(InvoiceError::Io)?;
    }
    Ok(Catalog::default())
}
