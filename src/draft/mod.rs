mod editor;
mod store;

pub use editor::{CurrencySwitch, InvoiceEditor};
pub use store::{DraftField, DraftStore, FileStore, MemoryStore};

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InvoiceError;

/// Maximum number of rows on one invoice.
pub const MAX_ITEMS: usize = 20;

/// The two invoice flavors. Each keeps its own persisted draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subtype {
    Proforma,
    Commercial,
}

impl Subtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subtype::Proforma => "proforma",
            Subtype::Commercial => "commercial",
        }
    }

    /// Only proforma invoices carry the shipping/payment terms panel.
    pub fn carries_payment_terms(&self) -> bool {
        matches!(self, Subtype::Proforma)
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subtype {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proforma" => Ok(Subtype::Proforma),
            "commercial" => Ok(Subtype::Commercial),
            _ => Err(InvoiceError::UnknownSubtype(s.to_string())),
        }
    }
}

/// One row of the invoice. `total` always equals `quantity * unit_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub item_code: String,
    pub description: String,
    pub quantity: u32,
    /// Already in the invoice currency.
    pub unit_price: f64,
    pub total: f64,
}

impl LineItem {
    pub fn blank(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            item_code: String::new(),
            description: String::new(),
            quantity: 1,
            unit_price: 0.0,
            total: 0.0,
        }
    }

    pub fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity.clamp(1, u32::MAX as i64) as u32;
        self.recompute();
    }

    pub fn set_unit_price(&mut self, price: f64) {
        self.unit_price = if price.is_finite() { price.max(0.0) } else { 0.0 };
        self.recompute();
    }

    fn recompute(&mut self) {
        self.total = (self.quantity as f64 * self.unit_price).max(0.0);
    }
}

/// Parse a free-text quantity. Anything non-numeric or below one becomes one.
pub fn coerce_quantity(raw: &str) -> i64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 1.0 => v.trunc().min(u32::MAX as f64) as i64,
        _ => 1,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientInfo {
    pub name: String,
    pub tel: String,
    pub address: String,
    pub country: String,
    /// ISO date (YYYY-MM-DD).
    pub date: String,
    #[serde(rename = "piNo")]
    pub document_number: String,
    pub tax_percent: f64,
    pub discount_percent: f64,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            tel: String::new(),
            address: String::new(),
            country: String::new(),
            date: Local::now().format("%Y-%m-%d").to_string(),
            document_number: String::new(),
            tax_percent: 0.0,
            discount_percent: 0.0,
        }
    }
}

/// Shipping and payment conditions printed on proforma invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentTerms {
    pub payment_terms: String,
    pub price_validity: String,
    pub port_of_loading: String,
    pub port_of_destination: String,
    pub time_of_shipment: String,
    pub bank_name: String,
    pub account_no: String,
    pub remarks: String,
}

impl Default for PaymentTerms {
    fn default() -> Self {
        Self {
            payment_terms: "100% Advance".to_string(),
            price_validity: String::new(),
            port_of_loading: "Egypt".to_string(),
            port_of_destination: String::new(),
            time_of_shipment: String::new(),
            bank_name: "Emirates NBD".to_string(),
            account_no: "1020399670707".to_string(),
            remarks: String::new(),
        }
    }
}

/// Editable invoice state for one subtype.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub subtype: Subtype,
    pub currency: String,
    pub items: Vec<LineItem>,
    pub client: ClientInfo,
    pub payment_terms: PaymentTerms,
}

impl InvoiceDraft {
    pub fn new(subtype: Subtype) -> Self {
        Self {
            subtype,
            currency: "USD".to_string(),
            items: vec![LineItem::blank("1")],
            client: ClientInfo::default(),
            payment_terms: PaymentTerms::default(),
        }
    }

    pub fn totals(&self) -> Totals {
        Totals::compute(
            &self.items,
            self.client.tax_percent,
            self.client.discount_percent,
        )
    }

    pub fn item(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == id)
    }
}

/// Derived amounts; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub grand_total: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub net_total: f64,
}

impl Totals {
    pub fn compute(items: &[LineItem], tax_percent: f64, discount_percent: f64) -> Self {
        let grand_total: f64 = items.iter().map(|i| i.total).sum();
        let tax_amount = grand_total * tax_percent / 100.0;
        let discount_amount = grand_total * discount_percent / 100.0;
        Self {
            grand_total,
            tax_amount,
            discount_amount,
            net_total: grand_total + tax_amount - discount_amount,
        }
    }
}
