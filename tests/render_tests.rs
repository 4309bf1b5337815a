use hekma_invoice::config::{AssetSettings, Company};
use hekma_invoice::draft::{InvoiceDraft, Subtype};
use hekma_invoice::render::{
    self, raster, text::TextMetrics, vector, Assets, DocumentJob, GenerationState, RenderPath,
};
use hekma_invoice::snapshot::{InvoiceSnapshot, SnapshotItem};
use std::fs;
use std::thread;
use tempfile::TempDir;

fn snapshot(subtype: Subtype, items: usize) -> InvoiceSnapshot {
    let mut draft = InvoiceDraft::new(subtype);
    draft.client.name = "Cairo Medical".to_string();
    draft.client.document_number = "PI-12".to_string();
    draft.client.date = "2024-05-01".to_string();
    let mut snapshot = InvoiceSnapshot::from_draft(&draft);
    snapshot.items = (0..items)
        .map(|i| SnapshotItem {
            item_code: format!("HF{i:02}"),
            description: format!(
                "Oxygen flowmeter probe, German network, model {i} with wall adapter"
            ),
            quantity: 2,
            unit_price: 5.0,
            total: 10.0,
        })
        .collect();
    snapshot.grand_total = items as f64 * 10.0;
    snapshot.net_total = snapshot.grand_total;
    snapshot
}

fn missing_assets() -> AssetSettings {
    AssetSettings {
        logo: Some("/nonexistent/logo.png".to_string()),
        signature: Some("/nonexistent/signature.png".to_string()),
        font: Some("/nonexistent/font.ttf".to_string()),
    }
}

#[test]
fn test_empty_invoice_has_one_placeholder_row() {
    let snapshot = snapshot(Subtype::Commercial, 0);
    let doc = vector::layout_invoice(&snapshot, &Company::default(), &Assets::none());

    let placeholders: usize = doc
        .pages
        .iter()
        .map(|p| p.texts().filter(|t| *t == "No items added").count())
        .sum();
    assert_eq!(placeholders, 1);

    let bytes = render::render_vector(&snapshot, &Company::default(), &Assets::none()).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn test_long_invoice_repeats_table_header() {
    let snapshot = snapshot(Subtype::Proforma, 25);
    let doc = vector::layout_invoice(&snapshot, &Company::default(), &Assets::none());

    assert!(doc.page_count() > 1);
    for page in &doc.pages[1..] {
        if page.contains_text("Oxygen flowmeter probe") {
            assert_eq!(page.texts().next(), Some("#"));
        }
    }
    assert_eq!(doc.pages[1].texts().next(), Some("#"));

    // Every row made it into the document exactly once.
    let rows: usize = doc
        .pages
        .iter()
        .map(|p| p.texts().filter(|t| t.starts_with("HF")).count())
        .sum();
    assert_eq!(rows, 25);
}

#[test]
fn test_brand_bar_on_every_page() {
    let company = Company::default();
    let doc = vector::layout_invoice(&snapshot(Subtype::Proforma, 25), &company, &Assets::none());
    for page in &doc.pages {
        assert!(page.contains_text(&company.bar_text));
    }
}

#[test]
fn test_payment_terms_only_on_proforma() {
    let company = Company::default();
    let has_terms = |subtype| {
        vector::layout_invoice(&snapshot(subtype, 2), &company, &Assets::none())
            .pages
            .iter()
            .any(|p| p.contains_text("PAYMENT TERMS & CONDITIONS"))
    };
    assert!(has_terms(Subtype::Proforma));
    assert!(!has_terms(Subtype::Commercial));
}

#[test]
fn test_missing_assets_never_fail_generation() {
    let assets = Assets::load(&missing_assets());
    assert!(assets.logo.is_none());
    assert!(assets.signature.is_none());
    assert!(assets.font.is_none());

    let snapshot = snapshot(Subtype::Proforma, 3);
    let company = Company::default();
    assert!(render::render_vector(&snapshot, &company, &assets).is_ok());
    assert!(render::render_raster(&snapshot, &company, &assets).is_ok());
}

#[test]
fn test_raster_canvas_grows_with_items() {
    let company = Company::default();
    let short = raster::compose(&snapshot(Subtype::Proforma, 1), &company, &Assets::none());
    let long = raster::compose(&snapshot(Subtype::Proforma, 20), &company, &Assets::none());
    assert_eq!(short.page_count(), 1);
    assert!(long.size.height > short.size.height);

    let bitmap = raster::rasterize(&long, &TextMetrics::builtin());
    assert_eq!(bitmap.width(), (raster::CANVAS_WIDTH * raster::CAPTURE_SCALE) as u32);
    let pages = raster::slice_pages(&bitmap);
    let page_height = (bitmap.width() as f32 * 297.0 / 210.0).round() as u32;
    assert_eq!(pages.len(), bitmap.height().div_ceil(page_height) as usize);
}

#[test]
fn test_job_moves_through_states() {
    let dir = TempDir::new().unwrap();
    let snapshot = snapshot(Subtype::Proforma, 2);
    let mut job = DocumentJob::new(
        &snapshot,
        &Company::default(),
        &AssetSettings::default(),
        dir.path(),
        RenderPath::Vector,
    );
    assert_eq!(job.state(), &GenerationState::Idle);

    let path = job.run().unwrap();
    assert_eq!(job.state(), &GenerationState::Succeeded(path.clone()));
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("Proforma_Invoice_PI-12_"));
    assert!(fs::read(&path).unwrap().starts_with(b"%PDF"));
}

#[test]
fn test_job_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "file").unwrap();

    let mut job = DocumentJob::new(
        &snapshot(Subtype::Commercial, 1),
        &Company::default(),
        &AssetSettings::default(),
        &blocker,
        RenderPath::Vector,
    );
    assert!(job.run_with(Assets::none()).is_err());
    assert!(matches!(job.state(), GenerationState::Failed(_)));
}

#[test]
fn test_job_owns_its_snapshot() {
    let mut snapshot = snapshot(Subtype::Proforma, 1);
    let job = DocumentJob::new(
        &snapshot,
        &Company::default(),
        &AssetSettings::default(),
        "unused",
        RenderPath::Vector,
    );
    snapshot.client_name = "Changed after submit".to_string();
    assert_eq!(job.snapshot().client_name, "Cairo Medical");
}

#[test]
fn test_concurrent_jobs_do_not_interfere() {
    let dir = TempDir::new().unwrap();
    let handles: Vec<_> = [("PI-A", RenderPath::Vector), ("PI-B", RenderPath::Raster)]
        .into_iter()
        .map(|(number, path)| {
            let mut snapshot = snapshot(Subtype::Proforma, 4);
            snapshot.document_number = number.to_string();
            let out = dir.path().to_path_buf();
            thread::spawn(move || {
                let mut job = DocumentJob::new(
                    &snapshot,
                    &Company::default(),
                    &AssetSettings::default(),
                    out,
                    path,
                );
                job.run_with(Assets::none()).unwrap()
            })
        })
        .collect();

    let mut names: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().unwrap().file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert!(names[0].starts_with("Invoice_PI-B_2024-05-01"));
    assert!(names[1].starts_with("Proforma_Invoice_PI-A_"));
}
