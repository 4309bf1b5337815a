use hekma_invoice::catalog::{
    load_catalog, load_csv_file, parse_product_csv, reset_catalog, save_catalog, Catalog,
    ProductRecord,
};
use hekma_invoice::InvoiceError;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_parse_quoted_row() {
    let records = parse_product_csv("Product,Code,Price\n\"Oxygen regulator\",HF32,5.00");
    assert_eq!(records, vec![ProductRecord::new("HF32", "Oxygen regulator", 5.0)]);
}

#[test]
fn test_parse_drops_rows_without_code() {
    let records = parse_product_csv("Product,Code,Price\nValve,,2.00\nRegulator\nHose,HF1,1.5\n");
    assert_eq!(records, vec![ProductRecord::new("HF1", "Hose", 1.5)]);
}

#[test]
fn test_parse_bad_price_is_zero() {
    let records = parse_product_csv("Product,Code,Price\nValve,HF9,call us\n");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].unit_price_usd, 0.0);
    assert!(records[0].requires_manual_entry());
}

#[test]
fn test_parse_price_with_exponent() {
    let records = parse_product_csv("Product,Code,Price\nValve,HF9,1.5e2\n");
    assert_eq!(records, vec![ProductRecord::new("HF9", "Valve", 150.0)]);
}

#[test]
fn test_parse_ignores_extra_columns_and_blank_lines() {
    let records = parse_product_csv("\n\nProduct,Code,Price\n\nValve,HF9,3,extra,columns\n\n");
    assert_eq!(records, vec![ProductRecord::new("HF9", "Valve", 3.0)]);
}

#[test]
fn test_header_only_parses_to_nothing() {
    assert!(parse_product_csv("Product,Code,Price").is_empty());
    assert!(parse_product_csv("").is_empty());
}

#[test]
fn test_load_csv_file_checks_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("products.xlsx");
    fs::write(&path, "Product,Code,Price\nValve,HF9,3\n").unwrap();

    assert!(matches!(
        load_csv_file(&path),
        Err(InvoiceError::InvalidFileType(_))
    ));
}

#[test]
fn test_load_csv_file_accepts_upper_case_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("PRODUCTS.CSV");
    fs::write(&path, "Product,Code,Price\nValve,HF9,3\n").unwrap();

    assert_eq!(load_csv_file(&path).unwrap().len(), 1);
}

#[test]
fn test_load_csv_file_rejects_binary() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("products.csv");
    fs::write(&path, [0xff, 0xfe, 0x00, 0x41]).unwrap();

    assert!(matches!(
        load_csv_file(&path),
        Err(InvoiceError::ImportRead(_))
    ));
}

#[test]
fn test_default_catalog() {
    let catalog = Catalog::default();
    assert!(!catalog.is_empty());
    let product = catalog.find_by_code("HF32").unwrap();
    assert_eq!(product.name, "Oxygen propane on a French network hose");
    assert_eq!(product.unit_price_usd, 5.0);
}

#[test]
fn test_replace_append_and_reset() {
    let mut catalog = Catalog::default();
    let defaults = catalog.len();

    catalog.replace_all(vec![ProductRecord::new("A1", "Alpha", 1.0)]);
    assert_eq!(catalog.len(), 1);
    assert!(catalog.find_by_code("HF32").is_none());

    catalog.append_all(vec![ProductRecord::new("A1", "Alpha copy", 2.0)]);
    assert_eq!(catalog.len(), 2);
    // First match wins on duplicate codes.
    assert_eq!(catalog.find_by_code("A1").unwrap().name, "Alpha");

    catalog.reset_to_default();
    assert_eq!(catalog.len(), defaults);
}

#[test]
fn test_search_matches_name_or_code() {
    let catalog = Catalog::from_records(vec![
        ProductRecord::new("HF1", "Oxygen valve", 1.0),
        ProductRecord::new("XY2", "Suction probe", 2.0),
        ProductRecord::new("HF3", "Air probe", 3.0),
    ]);

    let codes: Vec<&str> = catalog
        .search("PROBE", 10)
        .into_iter()
        .map(|p| p.code.as_str())
        .collect();
    assert_eq!(codes, vec!["XY2", "HF3"]);

    let codes: Vec<&str> = catalog
        .search("hf", 1)
        .into_iter()
        .map(|p| p.code.as_str())
        .collect();
    assert_eq!(codes, vec!["HF1"]);
}

#[test]
fn test_suggest_uses_name_prefix() {
    let catalog = Catalog::from_records(vec![
        ProductRecord::new("HF1", "Oxygen valve", 1.0),
        ProductRecord::new("HF2", "Air oxygen probe", 2.0),
    ]);

    let names: Vec<&str> = catalog.suggest("oxy").into_iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Oxygen valve"]);
    assert!(catalog.suggest("").is_empty());
}

#[test]
fn test_catalog_persists_to_config_dir() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::from_records(vec![ProductRecord::new("A1", "Alpha", 1.5)]);

    save_catalog(dir.path(), &catalog).unwrap();
    let loaded = load_catalog(dir.path()).unwrap();
    assert_eq!(loaded.products(), catalog.products());

    let reset = reset_catalog(dir.path()).unwrap();
    assert!(!dir.path().join("catalog.json").exists());
    assert_eq!(reset.len(), Catalog::default().len());
}
