use crate::error::{InvoiceError, Result};

/// A billing currency with a fixed conversion rate from USD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrencyDefinition {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    pub usd_rate: f64,
}

pub const USD: CurrencyDefinition = CurrencyDefinition {
    code: "USD",
    name: "US Dollar",
    symbol: "$",
    usd_rate: 1.0,
};

pub const EGP: CurrencyDefinition = CurrencyDefinition {
    code: "EGP",
    name: "Egyptian Pound",
    symbol: "LE",
    usd_rate: 50.0,
};

pub const CURRENCIES: [CurrencyDefinition; 2] = [USD, EGP];

impl CurrencyDefinition {
    /// Convert a catalog (USD) price into this currency.
    pub fn from_usd(&self, usd: f64) -> f64 {
        usd * self.usd_rate
    }
}

/// Look up a currency by code, case-insensitively.
pub fn find(code: &str) -> Option<CurrencyDefinition> {
    CURRENCIES
        .iter()
        .copied()
        .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
}

pub fn require(code: &str) -> Result<CurrencyDefinition> {
    find(code).ok_or_else(|| InvoiceError::UnknownCurrency(code.to_string()))
}

/// Stored codes that no longer resolve fall back to USD.
pub fn resolve_or_default(code: &str) -> CurrencyDefinition {
    find(code).unwrap_or(USD)
}
