use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::assets::Assets;
use super::layout::{
    Align, Cell, Column, LaidOutDocument, PageFlow, Paint, Rgb, Row, Table, TableStyle,
    TextStyle, A4,
};
use super::text::{TextMetrics, PT_TO_MM};
use super::{plain_number, sanitize_filename};
use crate::config::Company;
use crate::error::{InvoiceError, Result};

const MARGIN: f32 = 20.0;
const YELLOW: Rgb = Rgb(255, 235, 59);
const FOOTER_TOP: f32 = A4.height - 30.0;
const FOOTER_HEIGHT: f32 = 25.0;

/// A company taking part in a waste shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub address: String,
    pub license_id: String,
    #[serde(default)]
    pub tax_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentDetails {
    pub shipment_id: String,
    pub driver: String,
    pub waste_description: String,
    pub quantity: f64,
    pub quantity_unit: String,
    pub status: String,
    pub packaging: String,
    pub disposal_method: String,
    pub entry_time: String,
    pub exit_time: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingStep {
    pub step: String,
    pub completed: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingStatus {
    pub current: String,
    pub steps: Vec<TrackingStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentReport {
    pub generator: Party,
    pub transporter: Party,
    pub recycler: Party,
    pub shipment: ShipmentDetails,
    pub tracking: TrackingStatus,
}

impl ShipmentReport {
    /// Read a report from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| InvoiceError::ShipmentParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Built-in demonstration record.
    pub fn sample(date: NaiveDate) -> Self {
        let party = |name: &str, address: &str, license: &str, tax: Option<&str>| Party {
            name: name.to_string(),
            address: address.to_string(),
            license_id: license.to_string(),
            tax_id: tax.map(str::to_string),
        };
        let step = |name: &str, timestamp: Option<&str>| TrackingStep {
            step: name.to_string(),
            completed: timestamp.is_some(),
            timestamp: timestamp.map(str::to_string),
        };
        Self {
            generator: party(
                "Eco Waste Solutions",
                "123 Green Street, Cairo, Egypt",
                "TX-394820",
                Some("TX-394820-2024"),
            ),
            transporter: party(
                "Safe Transport Co.",
                "456 Transport Ave, Cairo, Egypt",
                "TR-582947",
                None,
            ),
            recycler: party(
                "Green Recycling Ltd.",
                "789 Recycle Blvd, Cairo, Egypt",
                "RC-738291",
                None,
            ),
            shipment: ShipmentDetails {
                shipment_id: "SH-2024-001".to_string(),
                driver: "Ahmed Ali".to_string(),
                waste_description: "Plastic bottles and containers".to_string(),
                quantity: 580.0,
                quantity_unit: "KG".to_string(),
                status: "Solid".to_string(),
                packaging: "Bags".to_string(),
                disposal_method: "Recycling".to_string(),
                entry_time: "09:00 AM".to_string(),
                exit_time: "12:00 PM".to_string(),
                date: date.format("%d/%m/%Y").to_string(),
            },
            tracking: TrackingStatus {
                current: "In Transit".to_string(),
                steps: vec![
                    step("Pending", Some("2024-01-15 08:00")),
                    step("Registered", Some("2024-01-15 08:30")),
                    step("In Transit", Some("2024-01-15 09:00")),
                    step("In Delivery", None),
                    step("Sorting", None),
                    step("Recycling", None),
                    step("Completed", None),
                ],
            },
        }
    }

    pub fn filename(&self, today: NaiveDate) -> String {
        sanitize_filename(&format!(
            "Shipment_Report_{}_{}.pdf",
            self.shipment.shipment_id,
            today.format("%Y-%m-%d")
        ))
    }
}

/// Lay out the shipment tracking report. `generated_at` is printed in the
/// footer as given.
pub fn layout_shipment(
    report: &ShipmentReport,
    company: &Company,
    assets: &Assets,
    generated_at: &str,
) -> LaidOutDocument {
    let metrics = TextMetrics::from_font(assets.font.clone());
    let mut flow = PageFlow::new(A4, MARGIN, A4.height - MARGIN, PT_TO_MM, metrics);

    header(&mut flow, assets);
    flow.set_cursor(55.0);

    section(&mut flow, "COMPANY INFORMATION");
    party_table(&mut flow, "Generator Company:", &report.generator);
    flow.advance(10.0);
    party_table(&mut flow, "Transporter Company:", &report.transporter);
    flow.advance(10.0);
    party_table(&mut flow, "Recycler Company:", &report.recycler);
    flow.advance(15.0);

    section(&mut flow, "SHIPMENT DETAILS");
    details_table(&mut flow, &report.shipment);
    flow.advance(15.0);

    section(&mut flow, "SHIPMENT TRACKING STATUS");
    tracking_table(&mut flow, &report.tracking);
    flow.advance(20.0);

    verification(&mut flow);
    footer(&mut flow, company, generated_at);
    flow.finish()
}

fn header(flow: &mut PageFlow, assets: &Assets) {
    let width = flow.size().width;
    flow.rect(0.0, 0.0, width, 45.0, Paint::Fill(YELLOW));
    match assets.logo.clone() {
        Some(logo) => {
            let logo = flow.add_image(logo);
            flow.image(logo, MARGIN + 5.0, 8.0, 30.0, 30.0);
        }
        None => {
            flow.rect(
                MARGIN,
                8.0,
                40.0,
                30.0,
                Paint::Stroke {
                    color: Rgb::BLACK,
                    width: 0.5,
                },
            );
            flow.text(
                "COMPANY LOGO",
                MARGIN + 20.0,
                24.0,
                TextStyle::regular(8.0),
                Align::Center,
            );
        }
    }
    flow.text(
        "SHIPMENT TRACKING REPORT",
        width / 2.0 + 15.0,
        20.0,
        TextStyle::bold(18.0),
        Align::Center,
    );
    if flow.metrics().has_unicode_font() {
        flow.text(
            "تقرير تتبع الشحنة",
            width / 2.0 + 15.0,
            33.0,
            TextStyle::regular(14.0),
            Align::Center,
        );
    }
}

/// Yellow banner with a centered heading.
fn section(flow: &mut PageFlow, title: &str) {
    let width = flow.size().width;
    flow.ensure_space(30.0);
    let y = flow.cursor();
    flow.rect(
        MARGIN - 5.0,
        y - 3.0,
        width - 2.0 * (MARGIN - 5.0),
        12.0,
        Paint::Fill(YELLOW),
    );
    flow.text(title, width / 2.0, y + 4.0, TextStyle::bold(14.0), Align::Center);
    flow.advance(15.0);
}

fn key_value_rows(pairs: Vec<(&str, String)>, key_fill: Option<Rgb>) -> Vec<Row> {
    pairs
        .into_iter()
        .map(|(key, value)| {
            let mut key = Cell::new(key).bold();
            key.fill = key_fill;
            Row::from(vec![key, Cell::new(value)])
        })
        .collect()
}

fn party_table(flow: &mut PageFlow, label: &str, party: &Party) {
    flow.ensure_space(30.0);
    let y = flow.cursor();
    flow.text(label, MARGIN, y, TextStyle::bold(12.0), Align::Left);
    flow.advance(5.0);

    let mut pairs = vec![
        ("Company Name", party.name.clone()),
        ("Address", party.address.clone()),
        ("License ID", party.license_id.clone()),
    ];
    if let Some(tax_id) = party.tax_id.as_deref().filter(|t| !t.trim().is_empty()) {
        pairs.push(("Tax ID", tax_id.to_string()));
    }
    let table = Table {
        columns: vec![Column::new(40.0, Align::Left), Column::new(140.0, Align::Left)],
        header: None,
        rows: key_value_rows(pairs, None),
        style: TableStyle {
            font_size: 10.0,
            header_size: 10.0,
            padding: 3.0,
            header_fill: YELLOW,
            body_fill: None,
            alternate_fill: None,
            text_color: Rgb::BLACK,
            grid: None,
        },
    };
    flow.table(MARGIN, &table);
}

fn details_table(flow: &mut PageFlow, details: &ShipmentDetails) {
    let pairs = vec![
        ("Shipment ID", details.shipment_id.clone()),
        ("Date", details.date.clone()),
        ("Driver", details.driver.clone()),
        ("Waste Description", details.waste_description.clone()),
        (
            "Quantity",
            format!("{} {}", plain_number(details.quantity), details.quantity_unit),
        ),
        ("Status", details.status.clone()),
        ("Packaging", details.packaging.clone()),
        ("Disposal Method", details.disposal_method.clone()),
        ("Entry Time", details.entry_time.clone()),
        ("Exit Time", details.exit_time.clone()),
    ];
    let table = Table {
        columns: vec![Column::new(50.0, Align::Left), Column::new(120.0, Align::Left)],
        header: None,
        rows: key_value_rows(pairs, Some(Rgb(248, 249, 250))),
        style: TableStyle {
            font_size: 11.0,
            header_size: 11.0,
            padding: 4.0,
            header_fill: YELLOW,
            body_fill: None,
            alternate_fill: Some(Rgb::gray(250)),
            text_color: Rgb::BLACK,
            grid: Some((Rgb::BLACK, 0.1)),
        },
    };
    flow.table(MARGIN, &table);
}

fn tracking_table(flow: &mut PageFlow, tracking: &TrackingStatus) {
    flow.ensure_space(20.0);
    let y = flow.cursor();
    let current = format!("Current Status: {}", tracking.current);
    flow.text(&current, MARGIN, y, TextStyle::bold(12.0), Align::Left);
    flow.advance(10.0);

    let unicode = flow.metrics().has_unicode_font();
    let rows = tracking
        .steps
        .iter()
        .map(|step| {
            let status = if step.completed {
                let text = if unicode { "✓ Completed" } else { "Completed" };
                Cell::new(text).fill(Rgb(200, 255, 200)).color(Rgb(0, 100, 0))
            } else {
                let text = if unicode { "⏳ Pending" } else { "Pending" };
                Cell::new(text).fill(Rgb(255, 245, 200)).color(Rgb(150, 100, 0))
            };
            let timestamp = step.timestamp.clone().unwrap_or_else(|| "-".to_string());
            Row::from(vec![Cell::new(step.step.clone()), status, Cell::new(timestamp)])
        })
        .collect();
    let table = Table {
        columns: vec![
            Column::new(60.0, Align::Left),
            Column::new(40.0, Align::Center),
            Column::new(60.0, Align::Center),
        ],
        header: Some(vec![
            Cell::new("Status Step"),
            Cell::new("Status"),
            Cell::new("Timestamp"),
        ]),
        rows,
        style: TableStyle {
            font_size: 10.0,
            header_size: 10.0,
            padding: 4.0,
            header_fill: YELLOW,
            body_fill: None,
            alternate_fill: None,
            text_color: Rgb::BLACK,
            grid: None,
        },
    };
    flow.table(MARGIN, &table);
}

fn verification(flow: &mut PageFlow) {
    let width = flow.size().width;
    if A4.height - flow.cursor() < 80.0 {
        flow.new_page();
        flow.set_cursor(30.0);
    }
    section(flow, "OFFICIAL VERIFICATION");
    flow.advance(5.0);
    let y = flow.cursor();

    let column_width = (width - 3.0 * MARGIN) / 2.0;
    let style = TextStyle::regular(11.0);
    for (x, role) in [
        (MARGIN, "Generator Representative:"),
        (MARGIN + column_width + 20.0, "Transporter Representative:"),
    ] {
        let lines = [
            role,
            "Name: _________________________",
            "Signature: _____________________",
            "Date: _________________________",
            "Official Stamp:",
        ];
        for (row, line) in lines.iter().enumerate() {
            flow.text(line, x, y + 8.0 * row as f32, style, Align::Left);
        }
        flow.rect(
            x,
            y + 35.0,
            40.0,
            25.0,
            Paint::Stroke {
                color: Rgb::BLACK,
                width: 0.2,
            },
        );
    }
    flow.set_cursor(y + 70.0);
}

fn footer(flow: &mut PageFlow, company: &Company, generated_at: &str) {
    // Pinned to the bottom of the page, or just below content that runs past it.
    let mut top = flow.cursor().max(FOOTER_TOP - 5.0);
    if top + FOOTER_HEIGHT > A4.height {
        flow.new_page();
        top = FOOTER_TOP - 5.0;
    }
    let width = flow.size().width;
    flow.rect(0.0, top, width, FOOTER_HEIGHT, Paint::Fill(YELLOW));
    let generated_by = format!("Generated by {}", company.seller_name);
    flow.text(
        &generated_by,
        width / 2.0,
        top + 10.0,
        TextStyle::bold(12.0),
        Align::Center,
    );
    let generated_on = format!("Report generated on: {generated_at}");
    flow.text(
        &generated_on,
        width / 2.0,
        top + 17.0,
        TextStyle::regular(10.0),
        Align::Center,
    );
    flow.set_cursor(top + FOOTER_HEIGHT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::layout::DrawOp;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_sample_filename() {
        let report = ShipmentReport::sample(today());
        assert_eq!(
            report.filename(today()),
            "Shipment_Report_SH-2024-001_2024-01-15.pdf"
        );
    }

    #[test]
    fn test_layout_contains_all_sections() {
        let report = ShipmentReport::sample(today());
        let doc = layout_shipment(&report, &Company::default(), &Assets::none(), "15/01/2024");
        let all: Vec<&str> = doc.pages.iter().flat_map(|p| p.texts()).collect();
        for heading in [
            "COMPANY INFORMATION",
            "SHIPMENT DETAILS",
            "SHIPMENT TRACKING STATUS",
            "OFFICIAL VERIFICATION",
            "Tax ID",
            "580 KG",
            "Current Status: In Transit",
        ] {
            assert!(all.iter().any(|t| t.contains(heading)), "missing {heading}");
        }
        // Status cells plus the step of the same name.
        assert_eq!(all.iter().filter(|t| **t == "Completed").count(), 4);
        assert_eq!(all.iter().filter(|t| **t == "Pending").count(), 5);
        assert!(doc.pages.last().unwrap().contains_text("Report generated on: 15/01/2024"));
    }

    fn footer_band(doc: &LaidOutDocument) -> (usize, f32) {
        doc.pages
            .iter()
            .enumerate()
            .find_map(|(index, page)| {
                page.ops.iter().find_map(|op| match op {
                    DrawOp::Rect {
                        y,
                        h,
                        paint: Paint::Fill(fill),
                        ..
                    } if *fill == YELLOW && *h == FOOTER_HEIGHT => Some((index, *y)),
                    _ => None,
                })
            })
            .unwrap()
    }

    fn footer_after(cursor: f32) -> LaidOutDocument {
        let metrics = TextMetrics::builtin();
        let mut flow = PageFlow::new(A4, MARGIN, A4.height - MARGIN, PT_TO_MM, metrics);
        flow.set_cursor(cursor);
        footer(&mut flow, &Company::default(), "15/01/2024");
        flow.finish()
    }

    #[test]
    fn test_footer_pinned_to_page_bottom() {
        assert_eq!(footer_band(&footer_after(120.0)), (0, FOOTER_TOP - 5.0));
    }

    #[test]
    fn test_footer_follows_content_near_bottom() {
        let (page, y) = footer_band(&footer_after(265.0));
        assert_eq!(page, 0);
        assert!(y >= 265.0);
        assert!(y + FOOTER_HEIGHT <= A4.height);
    }

    #[test]
    fn test_footer_breaks_when_it_no_longer_fits() {
        let doc = footer_after(275.0);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(footer_band(&doc), (1, FOOTER_TOP - 5.0));
        assert!(doc.pages[1].contains_text("Report generated on: 15/01/2024"));
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("shipment.toml");
        let report = ShipmentReport::sample(today());
        fs::write(&path, toml::to_string(&report).unwrap()).unwrap();
        assert_eq!(ShipmentReport::load(&path).unwrap(), report);
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("shipment.toml");
        fs::write(&path, "generator = 3").unwrap();
        assert!(matches!(
            ShipmentReport::load(&path),
            Err(InvoiceError::ShipmentParse { .. })
        ));
    }
}
