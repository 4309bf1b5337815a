use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::{
    ClientInfo, DraftField, DraftStore, InvoiceDraft, LineItem, PaymentTerms, Subtype, MAX_ITEMS,
};
use crate::catalog::{Catalog, ProductRecord};
use crate::currency::{self, CurrencyDefinition};
use crate::error::{InvoiceError, Result};

/// Result of a currency change.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencySwitch {
    pub converted: usize,
    /// Rows whose description does not name a priced catalog product. Their
    /// unit price was left as typed.
    pub untouched: Vec<String>,
}

/// Owns a draft and writes every changed slice back to the store.
///
/// Writes are best effort: a failed write is logged and the in-memory draft
/// stays authoritative.
pub struct InvoiceEditor<S: DraftStore> {
    store: S,
    draft: InvoiceDraft,
}

impl<S: DraftStore> InvoiceEditor<S> {
    /// Restore the last draft of `subtype`, or start a fresh one.
    pub fn open(store: S, subtype: Subtype) -> Self {
        let defaults = InvoiceDraft::new(subtype);
        let mut draft = InvoiceDraft {
            currency: read_slice(&store, subtype, DraftField::Currency)
                .unwrap_or(defaults.currency),
            items: read_slice(&store, subtype, DraftField::Items).unwrap_or(defaults.items),
            client: read_slice(&store, subtype, DraftField::ClientInfo)
                .unwrap_or(defaults.client),
            payment_terms: read_slice(&store, subtype, DraftField::PaymentTerms)
                .unwrap_or(defaults.payment_terms),
            subtype,
        };
        if draft.items.is_empty() {
            draft.items.push(LineItem::blank("1"));
        }
        for item in &mut draft.items {
            let quantity = item.quantity as i64;
            item.set_quantity(quantity);
        }
        Self { store, draft }
    }

    pub fn draft(&self) -> &InvoiceDraft {
        &self.draft
    }

    pub fn subtype(&self) -> Subtype {
        self.draft.subtype
    }

    pub fn currency(&self) -> CurrencyDefinition {
        currency::resolve_or_default(&self.draft.currency)
    }

    pub fn into_draft(self) -> InvoiceDraft {
        self.draft
    }

    /// Switch the invoice currency and reprice rows that name a catalog product.
    pub fn set_currency(&mut self, code: &str, catalog: &Catalog) -> Result<CurrencySwitch> {
        let target = currency::require(code)?;
        self.draft.currency = target.code.to_string();
        self.persist(DraftField::Currency);

        let mut switch = CurrencySwitch {
            converted: 0,
            untouched: Vec::new(),
        };
        for item in &mut self.draft.items {
            match catalog.find_by_name(&item.description) {
                Some(product) if product.unit_price_usd > 0.0 => {
                    item.set_unit_price(target.from_usd(product.unit_price_usd));
                    switch.converted += 1;
                }
                _ => switch.untouched.push(item.id.clone()),
            }
        }
        self.persist(DraftField::Items);
        Ok(switch)
    }

    /// Append a blank row. Returns its id, or `None` once the invoice is full.
    pub fn add_item(&mut self) -> Option<String> {
        if self.draft.items.len() >= MAX_ITEMS {
            return None;
        }
        let id = self.fresh_id();
        self.draft.items.push(LineItem::blank(id.clone()));
        self.persist(DraftField::Items);
        Some(id)
    }

    /// Remove a row. The last remaining row is never removed (`Ok(false)`).
    pub fn remove_item(&mut self, id: &str) -> Result<bool> {
        if self.draft.item(id).is_none() {
            return Err(InvoiceError::ItemNotFound(id.to_string()));
        }
        if self.draft.items.len() <= 1 {
            return Ok(false);
        }
        self.draft.items.retain(|i| i.id != id);
        self.persist(DraftField::Items);
        Ok(true)
    }

    pub fn set_quantity(&mut self, id: &str, quantity: i64) -> Result<()> {
        self.with_item(id, |item| item.set_quantity(quantity))
    }

    pub fn set_unit_price(&mut self, id: &str, price: f64) -> Result<()> {
        self.with_item(id, |item| item.set_unit_price(price))
    }

    pub fn set_description(&mut self, id: &str, description: &str) -> Result<()> {
        self.with_item(id, |item| item.description = description.to_string())
    }

    pub fn set_item_code(&mut self, id: &str, code: &str) -> Result<()> {
        self.with_item(id, |item| item.item_code = code.to_string())
    }

    pub fn select_product_by_code(
        &mut self,
        id: &str,
        code: &str,
        catalog: &Catalog,
    ) -> Result<LineItem> {
        let product = catalog
            .find_by_code(code)
            .ok_or_else(|| InvoiceError::ProductNotFound(code.to_string()))?
            .clone();
        self.apply_product(id, &product)
    }

    pub fn select_product_by_name(
        &mut self,
        id: &str,
        name: &str,
        catalog: &Catalog,
    ) -> Result<LineItem> {
        let product = catalog
            .find_by_name(name)
            .ok_or_else(|| InvoiceError::ProductNotFound(name.to_string()))?
            .clone();
        self.apply_product(id, &product)
    }

    pub fn update_client(&mut self, edit: impl FnOnce(&mut ClientInfo)) {
        edit(&mut self.draft.client);
        let client = &mut self.draft.client;
        client.tax_percent = non_negative(client.tax_percent);
        client.discount_percent = non_negative(client.discount_percent);
        self.persist(DraftField::ClientInfo);
    }

    pub fn update_payment_terms(&mut self, edit: impl FnOnce(&mut PaymentTerms)) {
        edit(&mut self.draft.payment_terms);
        self.persist(DraftField::PaymentTerms);
    }

    /// Drop the stored draft for this subtype and start over.
    pub fn clear(&mut self) -> Result<()> {
        self.store.clear(self.draft.subtype)?;
        self.draft = InvoiceDraft::new(self.draft.subtype);
        Ok(())
    }

    fn apply_product(&mut self, id: &str, product: &ProductRecord) -> Result<LineItem> {
        let price = self.currency().from_usd(product.unit_price_usd);
        self.with_item(id, |item| {
            item.item_code = product.code.clone();
            item.description = product.name.clone();
            item.set_unit_price(price);
            item.clone()
        })
    }

    fn with_item<T>(&mut self, id: &str, edit: impl FnOnce(&mut LineItem) -> T) -> Result<T> {
        let item = self
            .draft
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| InvoiceError::ItemNotFound(id.to_string()))?;
        let out = edit(item);
        self.persist(DraftField::Items);
        Ok(out)
    }

    fn fresh_id(&self) -> String {
        let mut candidate = Utc::now().timestamp_millis();
        while self.draft.item(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        candidate.to_string()
    }

    fn persist(&self, field: DraftField) {
        let subtype = self.draft.subtype;
        let encoded = match field {
            DraftField::Currency => serde_json::to_string(&self.draft.currency),
            DraftField::Items => serde_json::to_string(&self.draft.items),
            DraftField::ClientInfo => serde_json::to_string(&self.draft.client),
            DraftField::PaymentTerms => serde_json::to_string(&self.draft.payment_terms),
        };
        let result = encoded
            .map_err(InvoiceError::from)
            .and_then(|value| self.store.set(subtype, field, &value));
        if let Err(e) = result {
            warn!(%subtype, field = field.key(), "failed to persist draft slice: {e}");
        }
    }
}

fn read_slice<T: DeserializeOwned>(
    store: &impl DraftStore,
    subtype: Subtype,
    field: DraftField,
) -> Option<T> {
    let raw = match store.get(subtype, field) {
        Ok(raw) => raw?,
        Err(e) => {
            warn!(%subtype, field = field.key(), "failed to read draft slice: {e}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(%subtype, field = field.key(), "ignoring corrupt draft slice: {e}");
            None
        }
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}
