use hekma_invoice::catalog::{Catalog, ProductRecord};
use hekma_invoice::draft::{
    coerce_quantity, DraftField, DraftStore, FileStore, InvoiceEditor, MemoryStore, Subtype,
    Totals, MAX_ITEMS,
};
use hekma_invoice::snapshot::InvoiceSnapshot;
use hekma_invoice::InvoiceError;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn catalog() -> Catalog {
    Catalog::from_records(vec![
        ProductRecord::new("HF32", "Oxygen regulator", 5.0),
        ProductRecord::new("HF37", "Air flowmeter", 4.5),
        ProductRecord::new("HF99", "Custom manifold", 0.0),
    ])
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_new_draft_defaults() {
    let editor = InvoiceEditor::open(MemoryStore::new(), Subtype::Proforma);
    let draft = editor.draft();

    assert_eq!(draft.currency, "USD");
    assert_eq!(draft.items.len(), 1);
    assert_eq!(draft.items[0].id, "1");
    assert_eq!(draft.items[0].quantity, 1);
    assert_eq!(draft.items[0].total, 0.0);
    assert_eq!(draft.client.tax_percent, 0.0);
    assert_eq!(draft.client.date.len(), 10);
    assert_eq!(draft.payment_terms.payment_terms, "100% Advance");
    assert_eq!(draft.payment_terms.port_of_loading, "Egypt");
    assert_eq!(draft.payment_terms.bank_name, "Emirates NBD");
    assert_eq!(draft.payment_terms.account_no, "1020399670707");
}

#[test]
fn test_item_total_follows_every_mutation() {
    let mut editor = InvoiceEditor::open(MemoryStore::new(), Subtype::Proforma);

    editor.set_unit_price("1", 2.5).unwrap();
    editor.set_quantity("1", 4).unwrap();
    assert_eq!(editor.draft().items[0].total, 10.0);

    editor.set_quantity("1", 0).unwrap();
    assert_eq!(editor.draft().items[0].quantity, 1);
    assert_eq!(editor.draft().items[0].total, 2.5);

    editor.set_unit_price("1", -7.0).unwrap();
    assert_eq!(editor.draft().items[0].unit_price, 0.0);
    assert_eq!(editor.draft().items[0].total, 0.0);

    editor.set_unit_price("1", f64::NAN).unwrap();
    assert_eq!(editor.draft().items[0].unit_price, 0.0);
}

#[test]
fn test_coerce_quantity() {
    assert_eq!(coerce_quantity("3"), 3);
    assert_eq!(coerce_quantity(" 7 "), 7);
    assert_eq!(coerce_quantity("2.9"), 2);
    assert_eq!(coerce_quantity("0"), 1);
    assert_eq!(coerce_quantity("-4"), 1);
    assert_eq!(coerce_quantity("ten"), 1);
    assert_eq!(coerce_quantity(""), 1);
}

#[test]
fn test_item_cap_and_last_item() {
    let mut editor = InvoiceEditor::open(MemoryStore::new(), Subtype::Commercial);

    while editor.draft().items.len() < MAX_ITEMS {
        assert!(editor.add_item().is_some());
    }
    assert_eq!(editor.add_item(), None);
    assert_eq!(editor.draft().items.len(), MAX_ITEMS);

    let ids: Vec<String> = editor.draft().items.iter().map(|i| i.id.clone()).collect();
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());

    for id in &ids[1..] {
        assert!(editor.remove_item(id).unwrap());
    }
    assert!(!editor.remove_item("1").unwrap());
    assert_eq!(editor.draft().items.len(), 1);
}

#[test]
fn test_unknown_item_id() {
    let mut editor = InvoiceEditor::open(MemoryStore::new(), Subtype::Proforma);
    assert!(matches!(
        editor.set_quantity("42", 3),
        Err(InvoiceError::ItemNotFound(_))
    ));
    assert!(matches!(
        editor.remove_item("42"),
        Err(InvoiceError::ItemNotFound(_))
    ));
}

#[test]
fn test_select_product_fills_row_in_current_currency() {
    let catalog = catalog();
    let mut editor = InvoiceEditor::open(MemoryStore::new(), Subtype::Proforma);
    editor.set_currency("EGP", &catalog).unwrap();
    editor.set_quantity("1", 2).unwrap();

    let item = editor.select_product_by_code("1", "HF37", &catalog).unwrap();
    assert_eq!(item.item_code, "HF37");
    assert_eq!(item.description, "Air flowmeter");
    assert_eq!(item.unit_price, 225.0);
    assert_eq!(item.quantity, 2);
    assert_eq!(item.total, 450.0);

    let item = editor
        .select_product_by_name("1", "Custom manifold", &catalog)
        .unwrap();
    assert_eq!(item.unit_price, 0.0);

    assert!(matches!(
        editor.select_product_by_code("1", "NOPE", &catalog),
        Err(InvoiceError::ProductNotFound(_))
    ));
}

#[test]
fn test_currency_round_trip_restores_prices() {
    let catalog = catalog();
    let mut editor = InvoiceEditor::open(MemoryStore::new(), Subtype::Proforma);
    editor.select_product_by_code("1", "HF37", &catalog).unwrap();
    editor.set_quantity("1", 3).unwrap();

    let switch = editor.set_currency("EGP", &catalog).unwrap();
    assert_eq!(switch.converted, 1);
    assert!(switch.untouched.is_empty());
    assert_eq!(editor.draft().items[0].quantity, 3);
    assert!(close(editor.draft().items[0].unit_price, 4.5 * 50.0));

    editor.set_currency("USD", &catalog).unwrap();
    assert!(close(editor.draft().items[0].unit_price, 4.5));
    assert!(close(editor.draft().items[0].total, 13.5));
}

#[test]
fn test_currency_switch_leaves_typed_rows() {
    let catalog = catalog();
    let mut editor = InvoiceEditor::open(MemoryStore::new(), Subtype::Proforma);
    editor.set_description("1", "Hand-made bracket").unwrap();
    editor.set_unit_price("1", 12.0).unwrap();

    let switch = editor.set_currency("EGP", &catalog).unwrap();
    assert_eq!(switch.converted, 0);
    assert_eq!(switch.untouched, vec!["1".to_string()]);
    assert_eq!(editor.draft().items[0].unit_price, 12.0);
    assert_eq!(editor.currency().symbol, "LE");

    assert!(matches!(
        editor.set_currency("EUR", &catalog),
        Err(InvoiceError::UnknownCurrency(_))
    ));
    assert_eq!(editor.draft().currency, "EGP");
}

#[test]
fn test_totals_identities() {
    let mut editor = InvoiceEditor::open(MemoryStore::new(), Subtype::Proforma);
    editor.set_unit_price("1", 100.0).unwrap();
    let second = editor.add_item().unwrap();
    editor.set_unit_price(&second, 50.0).unwrap();
    editor.set_quantity(&second, 2).unwrap();
    editor.update_client(|c| {
        c.tax_percent = 14.0;
        c.discount_percent = 5.0;
    });

    let totals = editor.draft().totals();
    assert_eq!(totals.grand_total, 200.0);
    assert!(close(totals.tax_amount, 28.0));
    assert!(close(totals.discount_amount, 10.0));
    assert!(close(
        totals.net_total,
        totals.grand_total + totals.tax_amount - totals.discount_amount
    ));

    let empty = Totals::compute(&[], 14.0, 5.0);
    assert_eq!(empty.net_total, 0.0);
}

#[test]
fn test_negative_percentages_are_clamped() {
    let mut editor = InvoiceEditor::open(MemoryStore::new(), Subtype::Proforma);
    editor.update_client(|c| {
        c.tax_percent = -3.0;
        c.discount_percent = f64::INFINITY;
    });
    assert_eq!(editor.draft().client.tax_percent, 0.0);
    assert_eq!(editor.draft().client.discount_percent, 0.0);
}

#[test]
fn test_drafts_restore_from_store() {
    let store = MemoryStore::new();
    let catalog = catalog();
    {
        let mut editor = InvoiceEditor::open(store.clone(), Subtype::Proforma);
        editor.select_product_by_code("1", "HF32", &catalog).unwrap();
        editor.set_quantity("1", 6).unwrap();
        editor.update_client(|c| c.name = "Cairo Medical".to_string());
        editor.update_payment_terms(|t| t.remarks = "Fragile".to_string());
        editor.set_currency("EGP", &catalog).unwrap();
    }

    let restored = InvoiceEditor::open(store, Subtype::Proforma);
    let draft = restored.draft();
    assert_eq!(draft.currency, "EGP");
    assert_eq!(draft.client.name, "Cairo Medical");
    assert_eq!(draft.payment_terms.remarks, "Fragile");
    assert_eq!(draft.items[0].quantity, 6);
    assert_eq!(draft.items[0].total, 1500.0);
}

#[test]
fn test_subtypes_never_share_state() {
    let store = MemoryStore::new();
    let mut proforma = InvoiceEditor::open(store.clone(), Subtype::Proforma);
    let mut commercial = InvoiceEditor::open(store.clone(), Subtype::Commercial);

    proforma.update_client(|c| c.name = "Proforma Client".to_string());
    commercial.update_client(|c| c.name = "Commercial Client".to_string());
    proforma.update_client(|c| c.tel = "0100".to_string());

    let proforma = InvoiceEditor::open(store.clone(), Subtype::Proforma);
    let commercial = InvoiceEditor::open(store, Subtype::Commercial);
    assert_eq!(proforma.draft().client.name, "Proforma Client");
    assert_eq!(commercial.draft().client.name, "Commercial Client");
    assert_eq!(commercial.draft().client.tel, "");
}

#[test]
fn test_corrupt_slice_falls_back_to_default() {
    let store = MemoryStore::new();
    store
        .set(Subtype::Proforma, DraftField::Items, "{not json")
        .unwrap();
    store
        .set(Subtype::Proforma, DraftField::Currency, "\"EGP\"")
        .unwrap();

    let editor = InvoiceEditor::open(store, Subtype::Proforma);
    assert_eq!(editor.draft().items.len(), 1);
    assert_eq!(editor.draft().currency, "EGP");
}

#[test]
fn test_clear_only_touches_one_subtype() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());

    let mut proforma = InvoiceEditor::open(store.clone(), Subtype::Proforma);
    proforma.update_client(|c| c.name = "Keep me".to_string());
    let mut commercial = InvoiceEditor::open(store.clone(), Subtype::Commercial);
    commercial.update_client(|c| c.name = "Drop me".to_string());
    assert!(dir.path().join("commercial").join("clientInfo.json").exists());

    commercial.clear().unwrap();
    assert_eq!(commercial.draft().client.name, "");
    assert!(!dir.path().join("commercial").exists());

    let proforma = InvoiceEditor::open(store, Subtype::Proforma);
    assert_eq!(proforma.draft().client.name, "Keep me");
}

#[test]
fn test_snapshot_carries_terms_only_for_proforma() {
    let store = MemoryStore::new();
    let proforma = InvoiceEditor::open(store.clone(), Subtype::Proforma);
    let mut commercial = InvoiceEditor::open(store, Subtype::Commercial);
    commercial.update_payment_terms(|t| t.remarks = "Ignored".to_string());

    let snapshot = InvoiceSnapshot::from_draft(proforma.draft());
    assert!(snapshot.has_payment_terms());
    assert_eq!(snapshot.payment_terms.as_deref(), Some("100% Advance"));
    assert_eq!(snapshot.remarks, None);
    assert_eq!(snapshot.currency_symbol, "$");

    let snapshot = InvoiceSnapshot::from_draft(commercial.draft());
    assert!(!snapshot.has_payment_terms());
}
