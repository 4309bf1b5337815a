use serde::{Deserialize, Serialize};

use crate::currency;
use crate::draft::{InvoiceDraft, Subtype};

/// A row as handed to the renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotItem {
    pub item_code: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total: f64,
}

/// Fully resolved invoice data. Renderers only lay this out; they make no
/// catalog lookups and no business decisions.
///
/// Optional terms are `None` when they do not apply to the subtype or were
/// left empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSnapshot {
    pub subtype: Subtype,
    pub client_name: String,
    pub client_tel: String,
    pub client_address: String,
    pub client_country: String,
    pub date: String,
    pub document_number: String,
    pub currency: String,
    pub currency_symbol: String,
    pub items: Vec<SnapshotItem>,
    pub grand_total: f64,
    pub tax_percent: f64,
    pub tax_amount: f64,
    pub discount_percent: f64,
    pub discount_amount: f64,
    pub net_total: f64,
    pub payment_terms: Option<String>,
    pub price_validity: Option<String>,
    pub port_of_loading: Option<String>,
    pub port_of_destination: Option<String>,
    pub time_of_shipment: Option<String>,
    pub bank_name: Option<String>,
    pub account_no: Option<String>,
    pub remarks: Option<String>,
}

impl InvoiceSnapshot {
    pub fn from_draft(draft: &InvoiceDraft) -> Self {
        let currency = currency::resolve_or_default(&draft.currency);
        let totals = draft.totals();
        let carries_terms = draft.subtype.carries_payment_terms();
        let terms = &draft.payment_terms;
        let term = |value: &String| {
            let trimmed = value.trim();
            (carries_terms && !trimmed.is_empty()).then(|| trimmed.to_string())
        };

        Self {
            subtype: draft.subtype,
            client_name: draft.client.name.clone(),
            client_tel: draft.client.tel.clone(),
            client_address: draft.client.address.clone(),
            client_country: draft.client.country.clone(),
            date: draft.client.date.clone(),
            document_number: draft.client.document_number.clone(),
            currency: currency.code.to_string(),
            currency_symbol: currency.symbol.to_string(),
            items: draft
                .items
                .iter()
                .map(|item| SnapshotItem {
                    item_code: item.item_code.clone(),
                    description: item.description.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total: item.total,
                })
                .collect(),
            grand_total: totals.grand_total,
            tax_percent: draft.client.tax_percent,
            tax_amount: totals.tax_amount,
            discount_percent: draft.client.discount_percent,
            discount_amount: totals.discount_amount,
            net_total: totals.net_total,
            payment_terms: term(&terms.payment_terms),
            price_validity: term(&terms.price_validity),
            port_of_loading: term(&terms.port_of_loading),
            port_of_destination: term(&terms.port_of_destination),
            time_of_shipment: term(&terms.time_of_shipment),
            bank_name: term(&terms.bank_name),
            account_no: term(&terms.account_no),
            remarks: term(&terms.remarks),
        }
    }

    /// True when at least one shipping/payment field is populated.
    pub fn has_payment_terms(&self) -> bool {
        [
            &self.payment_terms,
            &self.price_validity,
            &self.port_of_loading,
            &self.port_of_destination,
            &self.time_of_shipment,
            &self.bank_name,
            &self.account_no,
            &self.remarks,
        ]
        .iter()
        .any(|f| f.is_some())
    }
}
