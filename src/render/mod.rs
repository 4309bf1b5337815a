pub mod assets;
pub mod layout;
pub mod pdf;
pub mod raster;
pub mod shipment;
pub mod text;
pub mod vector;

pub use assets::Assets;
pub use layout::LaidOutDocument;
pub use shipment::ShipmentReport;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use tracing::{error, info};

use crate::config::{AssetSettings, Company};
use crate::draft::Subtype;
use crate::error::Result;
use crate::snapshot::InvoiceSnapshot;
use text::TextMetrics;

/// Which renderer produces the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPath {
    /// Paginated vector drawing with selectable text.
    Vector,
    /// One captured bitmap sliced into pages.
    Raster,
}

/// `$12.50`
pub fn money(symbol: &str, amount: f64) -> String {
    format!("{symbol}{amount:.2}")
}

/// Two decimals, no symbol.
pub fn decimal(amount: f64) -> String {
    format!("{amount:.2}")
}

/// Shortest form: `14`, `2.5`.
pub fn plain_number(value: f64) -> String {
    format!("{value}")
}

pub(crate) fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Replace characters that are not allowed in file names.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// `Proforma_Invoice_PI-7_2024-05-01.pdf`
pub fn vector_filename(snapshot: &InvoiceSnapshot, today: NaiveDate) -> String {
    let prefix = match snapshot.subtype {
        Subtype::Proforma => "Proforma",
        Subtype::Commercial => "Commercial",
    };
    let number = non_empty_or(snapshot.document_number.trim(), "New");
    sanitize_filename(&format!(
        "{prefix}_Invoice_{number}_{}.pdf",
        today.format("%Y-%m-%d")
    ))
}

/// `Invoice_PI-7_2024-05-01.pdf`; without a number the current timestamp is
/// used, without a date today's.
pub fn raster_filename(snapshot: &InvoiceSnapshot, now: DateTime<Local>) -> String {
    let number = match snapshot.document_number.trim() {
        "" => now.timestamp_millis().to_string(),
        number => number.to_string(),
    };
    let date = match snapshot.date.trim() {
        "" => now.format("%Y-%m-%d").to_string(),
        date => date.to_string(),
    };
    sanitize_filename(&format!("Invoice_{number}_{date}.pdf"))
}

/// Render an invoice through the vector path into PDF bytes.
pub fn render_vector(
    snapshot: &InvoiceSnapshot,
    company: &Company,
    assets: &Assets,
) -> Result<Vec<u8>> {
    let document = vector::layout_invoice(snapshot, company, assets);
    let metrics = TextMetrics::from_font(assets.font.clone());
    pdf::write_pdf(&document, vector::document_title(snapshot.subtype), &metrics)
}

/// Render an invoice through the image-capture path into PDF bytes.
pub fn render_raster(
    snapshot: &InvoiceSnapshot,
    company: &Company,
    assets: &Assets,
) -> Result<Vec<u8>> {
    let canvas = raster::compose(snapshot, company, assets);
    let metrics = raster::capture_metrics(assets);
    let bitmap = raster::rasterize(&canvas, &metrics);
    let document = raster::paginate(raster::slice_pages(&bitmap));
    pdf::write_pdf(&document, "Invoice", &TextMetrics::builtin())
}

pub fn render_shipment(
    report: &ShipmentReport,
    company: &Company,
    assets: &Assets,
    generated_at: &str,
) -> Result<Vec<u8>> {
    let document = shipment::layout_shipment(report, company, assets, generated_at);
    let metrics = TextMetrics::from_font(assets.font.clone());
    pdf::write_pdf(&document, "Shipment Tracking Report", &metrics)
}

/// Write `bytes` to `dir/filename` through a `.part` sibling, so a finished
/// name never points at a half-written file.
pub fn write_document(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let target = dir.join(filename);
    let partial = dir.join(format!("{filename}.part"));
    fs::write(&partial, bytes)?;
    if let Err(e) = fs::rename(&partial, &target) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }
    Ok(target)
}

/// Lifecycle of one document generation.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationState {
    Idle,
    Rendering,
    Succeeded(PathBuf),
    Failed(String),
}

/// One invocation of a renderer. The job owns a private copy of the
/// snapshot, so concurrent jobs never observe each other's data.
#[derive(Debug)]
pub struct DocumentJob {
    snapshot: InvoiceSnapshot,
    company: Company,
    asset_settings: AssetSettings,
    output_dir: PathBuf,
    path: RenderPath,
    state: GenerationState,
}

impl DocumentJob {
    pub fn new(
        snapshot: &InvoiceSnapshot,
        company: &Company,
        asset_settings: &AssetSettings,
        output_dir: impl Into<PathBuf>,
        path: RenderPath,
    ) -> Self {
        Self {
            snapshot: snapshot.clone(),
            company: company.clone(),
            asset_settings: asset_settings.clone(),
            output_dir: output_dir.into(),
            path,
            state: GenerationState::Idle,
        }
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    pub fn snapshot(&self) -> &InvoiceSnapshot {
        &self.snapshot
    }

    /// Fetch the configured assets, then render and write the document.
    pub fn run(&mut self) -> Result<PathBuf> {
        self.state = GenerationState::Rendering;
        let assets = Assets::load(&self.asset_settings);
        self.finish(assets)
    }

    /// Render with already-loaded assets.
    pub fn run_with(&mut self, assets: Assets) -> Result<PathBuf> {
        self.state = GenerationState::Rendering;
        self.finish(assets)
    }

    fn finish(&mut self, assets: Assets) -> Result<PathBuf> {
        info!(subtype = %self.snapshot.subtype, path = ?self.path, "generating invoice");
        let now = Local::now();
        let result = match self.path {
            RenderPath::Vector => render_vector(&self.snapshot, &self.company, &assets)
                .map(|bytes| (vector_filename(&self.snapshot, now.date_naive()), bytes)),
            RenderPath::Raster => render_raster(&self.snapshot, &self.company, &assets)
                .map(|bytes| (raster_filename(&self.snapshot, now), bytes)),
        }
        .and_then(|(filename, bytes)| write_document(&self.output_dir, &filename, &bytes));

        match &result {
            Ok(path) => {
                info!(path = %path.display(), "invoice written");
                self.state = GenerationState::Succeeded(path.clone());
            }
            Err(e) => {
                error!("invoice generation failed: {e}");
                self.state = GenerationState::Failed(e.to_string());
            }
        }
        result
    }
}
