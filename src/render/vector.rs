//! Print layout of an invoice on A4, block by block.

use super::assets::Assets;
use super::layout::{
    Align, Cell, Column, ImageRef, LaidOutDocument, PageFlow, Paint, Rgb, Row, Table, TableStyle,
    TextStyle, A4,
};
use super::text::{TextMetrics, PT_TO_MM};
use super::{money, non_empty_or, plain_number};
use crate::config::Company;
use crate::draft::Subtype;
use crate::snapshot::InvoiceSnapshot;

const MARGIN: f32 = 15.0;
const CONTENT_WIDTH: f32 = A4.width - 2.0 * MARGIN;
const BOTTOM_LIMIT: f32 = A4.height - MARGIN;

pub(crate) const BRAND_YELLOW: Rgb = Rgb(245, 232, 28);
const TABLE_HEADER_YELLOW: Rgb = Rgb(255, 235, 59);

const HEADER_HEIGHT: f32 = 45.0;
const TITLE_TOP: f32 = 55.0;
const TOTALS_WIDTH: f32 = 85.0;
const TOTALS_HEIGHT: f32 = 35.0;
const SELLER_HEIGHT: f32 = 35.0;
const TERMS_MIN_HEIGHT: f32 = 45.0;
const FOOTER_HEIGHT: f32 = 30.0;
const BAR_HEIGHT: f32 = 8.0;

pub const ITEM_HEADERS: [&str; 6] = [
    "#",
    "Item Code",
    "Description",
    "Quantity",
    "Unit Price",
    "Total",
];

const ITEM_COLUMNS: [Column; 6] = [
    Column::new(12.0, Align::Center),
    Column::new(25.0, Align::Center),
    Column::new(75.0, Align::Left),
    Column::new(20.0, Align::Center),
    Column::new(25.0, Align::Right),
    Column::new(25.0, Align::Right),
];

pub fn document_title(subtype: Subtype) -> &'static str {
    match subtype {
        Subtype::Proforma => "PROFORMA INVOICE",
        Subtype::Commercial => "Quotation invoice",
    }
}

pub fn arabic_subtitle(subtype: Subtype) -> &'static str {
    match subtype {
        Subtype::Proforma => "فاتورة مبدئية",
        Subtype::Commercial => "فاتورة تجارية",
    }
}

/// Lay out an invoice. Missing assets degrade to placeholders; this never
/// fails.
pub fn layout_invoice(
    snapshot: &InvoiceSnapshot,
    company: &Company,
    assets: &Assets,
) -> LaidOutDocument {
    let metrics = TextMetrics::from_font(assets.font.clone());
    let mut flow = PageFlow::new(A4, MARGIN, BOTTOM_LIMIT, PT_TO_MM, metrics);
    let logo = assets.logo.clone().map(|img| flow.add_image(img));
    let signature = assets.signature.clone().map(|img| flow.add_image(img));

    header(&mut flow, company, logo);
    title_banner(&mut flow, snapshot.subtype);
    client_panel(&mut flow, snapshot);
    items_table(&mut flow, snapshot);
    totals_panel(&mut flow, snapshot);
    seller_block(&mut flow, company, signature);
    if snapshot.subtype.carries_payment_terms() && snapshot.has_payment_terms() {
        payment_terms_panel(&mut flow, snapshot);
    }
    footer(&mut flow, company);
    flow.for_each_page(|page| brand_bar(page, &company.bar_text));
    flow.finish()
}

fn header(flow: &mut PageFlow, company: &Company, logo: Option<ImageRef>) {
    let width = flow.size().width;
    flow.rect(
        0.0,
        0.0,
        width,
        HEADER_HEIGHT,
        Paint::FillStroke {
            fill: BRAND_YELLOW,
            stroke: Rgb::BLACK,
            width: 0.5,
        },
    );

    match logo {
        Some(logo) => flow.image(logo, MARGIN + 2.0, 10.0, 26.0, 26.0),
        None => flow.rect(
            MARGIN,
            8.0,
            30.0,
            30.0,
            Paint::FillStroke {
                fill: Rgb::WHITE,
                stroke: Rgb::BLACK,
                width: 0.3,
            },
        ),
    }

    let center = width / 2.0;
    flow.text(&company.name, center, 20.0, TextStyle::bold(14.0), Align::Center);
    flow.text(&company.tagline, center, 28.0, TextStyle::regular(10.0), Align::Center);
    let info = TextStyle::regular(9.0);
    flow.text(&company.address, center, 34.0, info, Align::Center);
    flow.text(&company.contact, center, 38.0, info, Align::Center);
    if !company.email.is_empty() {
        let email = format!("Email: {}", company.email);
        flow.text(&email, center, 42.0, info, Align::Center);
    }

    if flow.metrics().has_unicode_font() {
        flow.text(
            &company.name_ar,
            width - MARGIN,
            20.0,
            TextStyle::bold(11.0),
            Align::Right,
        );
    }
}

fn title_banner(flow: &mut PageFlow, subtype: Subtype) {
    let width = flow.size().width;
    let y = TITLE_TOP;
    flow.rect(
        MARGIN,
        y,
        CONTENT_WIDTH,
        18.0,
        Paint::FillStroke {
            fill: Rgb::gray(230),
            stroke: Rgb::BLACK,
            width: 0.3,
        },
    );
    flow.text(
        document_title(subtype),
        width / 2.0,
        y + 11.0,
        TextStyle::bold(16.0),
        Align::Center,
    );
    if flow.metrics().has_unicode_font() {
        flow.text(
            arabic_subtitle(subtype),
            width - MARGIN - 3.0,
            y + 11.0,
            TextStyle::regular(11.0),
            Align::Right,
        );
    }
    flow.set_cursor(y + 25.0);
}

fn client_panel(flow: &mut PageFlow, snapshot: &InvoiceSnapshot) {
    let width = flow.size().width;
    let has_country = !snapshot.client_country.trim().is_empty();
    let height = if has_country { 35.0 } else { 30.0 };
    flow.ensure_space(height);
    let y = flow.cursor();

    flow.rect(
        MARGIN,
        y,
        CONTENT_WIDTH,
        height,
        Paint::FillStroke {
            fill: Rgb::gray(250),
            stroke: Rgb::BLACK,
            width: 0.3,
        },
    );
    flow.text("CLIENT INFORMATION", MARGIN + 5.0, y + 7.0, TextStyle::bold(11.0), Align::Left);
    flow.line(MARGIN + 5.0, y + 10.0, width - MARGIN - 5.0, y + 10.0, Rgb::gray(150), 0.2);

    let style = TextStyle::regular(9.0);
    let left = MARGIN + 5.0;
    let right = width - MARGIN - 60.0;

    let mut fields = vec![
        ("Client:", snapshot.client_name.as_str()),
        ("Tel:", snapshot.client_tel.as_str()),
        ("Address:", snapshot.client_address.as_str()),
    ];
    if has_country {
        fields.push(("Country:", snapshot.client_country.as_str()));
    }
    let value_width = right - (left + 20.0) - 4.0;
    for (row, (label, value)) in fields.into_iter().enumerate() {
        let line_y = y + 16.0 + 5.0 * row as f32;
        flow.text(label, left, line_y, style, Align::Left);
        let value = flow.fit(non_empty_or(value, "N/A"), 9.0, false, value_width);
        flow.text(&value, left + 20.0, line_y, style, Align::Left);
    }

    let currency = non_empty_or(&snapshot.currency, "USD").to_string();
    let right_fields = [
        ("Date:", non_empty_or(&snapshot.date, "N/A").to_string(), 15.0),
        ("Invoice No.:", non_empty_or(&snapshot.document_number, "N/A").to_string(), 25.0),
        ("Currency:", currency, 20.0),
    ];
    for (row, (label, value, offset)) in right_fields.iter().enumerate() {
        let line_y = y + 16.0 + 5.0 * row as f32;
        flow.text(label, right, line_y, style, Align::Left);
        let room = width - MARGIN - 3.0 - (right + offset);
        let value = flow.fit(value, 9.0, false, room);
        flow.text(&value, right + offset, line_y, style, Align::Left);
    }

    flow.set_cursor(y + height + 8.0);
}

/// Rows for the items table. An empty invoice still gets one row.
pub fn item_rows(snapshot: &InvoiceSnapshot) -> Vec<[String; 6]> {
    let symbol = &snapshot.currency_symbol;
    if snapshot.items.is_empty() {
        return vec![[
            "1".to_string(),
            "N/A".to_string(),
            "No items added".to_string(),
            "0".to_string(),
            money(symbol, 0.0),
            money(symbol, 0.0),
        ]];
    }
    snapshot
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            // Recomputed here rather than trusting the stored total.
            let total = item.quantity as f64 * item.unit_price;
            [
                (index + 1).to_string(),
                non_empty_or(&item.item_code, "N/A").to_string(),
                non_empty_or(&item.description, "No description").to_string(),
                item.quantity.to_string(),
                money(symbol, item.unit_price),
                money(symbol, total),
            ]
        })
        .collect()
}

fn items_table(flow: &mut PageFlow, snapshot: &InvoiceSnapshot) {
    let table = Table {
        columns: ITEM_COLUMNS.to_vec(),
        header: Some(ITEM_HEADERS.iter().map(|h| Cell::new(*h).bold()).collect()),
        rows: item_rows(snapshot)
            .into_iter()
            .map(|cells| Row::from(cells.into_iter().map(Cell::new).collect::<Vec<_>>()))
            .collect(),
        style: TableStyle {
            font_size: 8.0,
            header_size: 9.0,
            padding: 2.0,
            header_fill: TABLE_HEADER_YELLOW,
            body_fill: None,
            alternate_fill: Some(Rgb::gray(250)),
            text_color: Rgb::BLACK,
            grid: Some((Rgb::BLACK, 0.1)),
        },
    };
    flow.table(MARGIN, &table);
}

fn totals_panel(flow: &mut PageFlow, snapshot: &InvoiceSnapshot) {
    let symbol = &snapshot.currency_symbol;
    let x = flow.size().width - MARGIN - TOTALS_WIDTH;
    flow.advance(13.0);
    flow.ensure_space(TOTALS_HEIGHT);
    let y = flow.cursor();

    flow.rect(
        x,
        y,
        TOTALS_WIDTH,
        TOTALS_HEIGHT,
        Paint::FillStroke {
            fill: Rgb::gray(245),
            stroke: Rgb::BLACK,
            width: 0.3,
        },
    );
    flow.text(
        "TOTALS SUMMARY",
        x + TOTALS_WIDTH / 2.0,
        y + 6.0,
        TextStyle::bold(10.0),
        Align::Center,
    );

    let label_x = x + 3.0;
    let value_x = x + TOTALS_WIDTH - 3.0;
    let lines = [
        ("Subtotal:".to_string(), money(symbol, snapshot.grand_total)),
        (
            format!("Tax ({}%):", plain_number(snapshot.tax_percent)),
            money(symbol, snapshot.tax_amount),
        ),
        (
            format!("Discount ({}%):", plain_number(snapshot.discount_percent)),
            format!("-{}", money(symbol, snapshot.discount_amount)),
        ),
    ];
    let style = TextStyle::regular(8.0);
    for (row, (label, value)) in lines.iter().enumerate() {
        let line_y = y + 12.0 + 5.0 * row as f32;
        flow.text(label, label_x, line_y, style, Align::Left);
        flow.text(value, value_x, line_y, style, Align::Right);
    }

    flow.line(label_x, y + 25.0, value_x, y + 25.0, Rgb::BLACK, 0.3);
    let emphasis = TextStyle::bold(10.0);
    flow.text("NET TOTAL:", label_x, y + 31.0, emphasis, Align::Left);
    flow.text(&money(symbol, snapshot.net_total), value_x, y + 31.0, emphasis, Align::Right);

    flow.set_cursor(y + TOTALS_HEIGHT + 10.0);
}

fn seller_block(flow: &mut PageFlow, company: &Company, signature: Option<ImageRef>) {
    let width = flow.size().width;
    flow.ensure_space(SELLER_HEIGHT);
    let y = flow.cursor();

    flow.rect(
        MARGIN,
        y,
        CONTENT_WIDTH,
        SELLER_HEIGHT,
        Paint::FillStroke {
            fill: Rgb::gray(248),
            stroke: Rgb::BLACK,
            width: 0.3,
        },
    );
    flow.text("THE SELLER", width / 2.0, y + 5.0, TextStyle::bold(9.0), Align::Center);
    flow.line(MARGIN + 10.0, y + 7.0, width - MARGIN - 10.0, y + 7.0, Rgb::gray(150), 0.2);

    let left = MARGIN + 8.0;
    let right = width / 2.0 + 10.0;
    let field_y = y + 12.0;
    let label = TextStyle::regular(7.0);

    flow.text("Name:", left, field_y, label, Align::Left);
    flow.line(left + 12.0, field_y + 1.0, left + 85.0, field_y + 1.0, Rgb::gray(120), 0.1);
    flow.text(&company.seller_name, left + 12.0, field_y + 6.0, TextStyle::bold(8.0), Align::Left);

    flow.text("Signature:", right, field_y, label, Align::Left);
    if let Some(signature) = signature {
        flow.image(signature, right + 22.0, field_y - 4.0, 50.0, 13.0);
    }

    flow.text("Date:", right, field_y + 12.0, label, Align::Left);
    flow.line(right + 12.0, field_y + 13.0, right + 70.0, field_y + 13.0, Rgb::gray(120), 0.1);

    flow.set_cursor(y + SELLER_HEIGHT + 10.0);
}

struct TermLine {
    text: String,
    style: TextStyle,
    indent: f32,
    advance: f32,
}

fn term_lines(flow: &PageFlow, snapshot: &InvoiceSnapshot) -> Vec<TermLine> {
    let regular = TextStyle::regular(8.0);
    let bold = TextStyle::bold(8.0);
    let line = |text: String, style: TextStyle, indent: f32, advance: f32| TermLine {
        text,
        style,
        indent,
        advance,
    };

    let mut lines = Vec::new();
    let simple = [
        ("Payment Terms", &snapshot.payment_terms),
        ("Price Validity", &snapshot.price_validity),
        ("Port of Loading", &snapshot.port_of_loading),
        ("Port of Destination", &snapshot.port_of_destination),
        ("Time of Shipment", &snapshot.time_of_shipment),
    ];
    for (label, value) in simple {
        if let Some(value) = value {
            lines.push(line(format!("{label}: {value}"), regular, 0.0, 4.0));
        }
    }

    if snapshot.bank_name.is_some() || snapshot.account_no.is_some() {
        lines.push(line("Banking Details:".to_string(), bold, 0.0, 4.0));
        if let Some(bank) = &snapshot.bank_name {
            lines.push(line(format!("Bank: {bank}"), regular, 5.0, 3.0));
        }
        if let Some(account) = &snapshot.account_no {
            lines.push(line(format!("Account No: {account}"), regular, 5.0, 3.0));
        }
    }

    if let Some(remarks) = &snapshot.remarks {
        lines.push(line("Remarks:".to_string(), bold, 0.0, 4.0));
        let wrap_width = CONTENT_WIDTH - 20.0;
        for text in flow.wrap(remarks, 8.0, false, wrap_width) {
            lines.push(line(text, regular, 5.0, flow.line_height(8.0)));
        }
    }
    lines
}

fn payment_terms_panel(flow: &mut PageFlow, snapshot: &InvoiceSnapshot) {
    let width = flow.size().width;
    let lines = term_lines(flow, snapshot);
    let content: f32 = lines.iter().map(|l| l.advance).sum();
    let height = (15.0 + content + 6.0).max(TERMS_MIN_HEIGHT);
    flow.ensure_space(height);
    let y = flow.cursor();

    flow.rect(
        MARGIN,
        y,
        CONTENT_WIDTH,
        height,
        Paint::FillStroke {
            fill: Rgb::gray(248),
            stroke: Rgb::BLACK,
            width: 0.3,
        },
    );
    flow.text(
        "PAYMENT TERMS & CONDITIONS",
        width / 2.0,
        y + 6.0,
        TextStyle::bold(10.0),
        Align::Center,
    );
    flow.line(MARGIN + 10.0, y + 9.0, width - MARGIN - 10.0, y + 9.0, Rgb::gray(150), 0.2);

    let mut line_y = y + 15.0;
    for line in &lines {
        flow.text(&line.text, MARGIN + 5.0 + line.indent, line_y, line.style, Align::Left);
        line_y += line.advance;
    }

    flow.set_cursor(y + height + 10.0);
}

fn footer(flow: &mut PageFlow, company: &Company) {
    let width = flow.size().width;
    flow.ensure_space(FOOTER_HEIGHT);
    let y = flow.cursor();

    flow.rect(0.0, y, width, FOOTER_HEIGHT, Paint::Fill(Rgb::gray(240)));
    flow.line(0.0, y, width, y, Rgb::BLACK, 0.5);

    let center = width / 2.0;
    flow.text(
        "Thank you for your business!",
        center,
        y + 8.0,
        TextStyle::bold(11.0),
        Align::Center,
    );
    if !company.website.is_empty() {
        let visit = format!("For more information, visit: {}", company.website);
        flow.text(&visit, center, y + 15.0, TextStyle::regular(9.0), Align::Center);
    }
    flow.text(
        &company.copyright,
        center,
        y + 23.0,
        TextStyle::regular(7.0).colored(Rgb::gray(80)),
        Align::Center,
    );
    flow.set_cursor(y + FOOTER_HEIGHT);
}

pub(crate) fn brand_bar(flow: &mut PageFlow, text: &str) {
    let size = flow.size();
    flow.rect(
        0.0,
        size.height - BAR_HEIGHT,
        size.width,
        BAR_HEIGHT,
        Paint::Fill(BRAND_YELLOW),
    );
    flow.text(
        text,
        size.width / 2.0,
        size.height - 3.0,
        TextStyle::bold(8.0),
        Align::Center,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::layout::DrawOp;
    use crate::snapshot::SnapshotItem;

    fn snapshot(subtype: Subtype, items: usize) -> InvoiceSnapshot {
        InvoiceSnapshot {
            subtype,
            client_name: "Cairo Medical".to_string(),
            client_tel: String::new(),
            client_address: "12 Tahrir Sq.".to_string(),
            client_country: String::new(),
            date: "2024-05-01".to_string(),
            document_number: "PI-7".to_string(),
            currency: "USD".to_string(),
            currency_symbol: "$".to_string(),
            items: (0..items)
                .map(|i| SnapshotItem {
                    item_code: format!("HF{i}"),
                    description: "Oxygen regulator".to_string(),
                    quantity: 2,
                    unit_price: 5.0,
                    total: 999.0,
                })
                .collect(),
            grand_total: 10.0 * items as f64,
            tax_percent: 14.0,
            tax_amount: 1.4 * items as f64,
            discount_percent: 0.0,
            discount_amount: 0.0,
            net_total: 11.4 * items as f64,
            payment_terms: None,
            price_validity: None,
            port_of_loading: None,
            port_of_destination: None,
            time_of_shipment: None,
            bank_name: None,
            account_no: None,
            remarks: None,
        }
    }

    #[test]
    fn test_row_total_is_recomputed() {
        let rows = item_rows(&snapshot(Subtype::Commercial, 1));
        assert_eq!(rows[0][5], "$10.00");
        assert_eq!(rows[0][4], "$5.00");
    }

    #[test]
    fn test_blank_fields_get_placeholders() {
        let mut s = snapshot(Subtype::Commercial, 1);
        s.items[0].item_code.clear();
        s.items[0].description = "   ".to_string();
        let rows = item_rows(&s);
        assert_eq!(rows[0][1], "N/A");
        assert_eq!(rows[0][2], "No description");
    }

    #[test]
    fn test_missing_client_fields_render_na() {
        let doc = layout_invoice(
            &snapshot(Subtype::Commercial, 1),
            &Company::default(),
            &Assets::none(),
        );
        let page = &doc.pages[0];
        // Tel is blank
        assert!(page.texts().any(|t| t == "N/A"));
        assert!(!page.contains_text("Country:"));
    }

    #[test]
    fn test_country_grows_client_panel() {
        let mut s = snapshot(Subtype::Commercial, 1);
        s.client_country = "Egypt".to_string();
        let doc = layout_invoice(&s, &Company::default(), &Assets::none());
        assert!(doc.pages[0].contains_text("Country:"));
        assert!(doc.pages[0].contains_text("Egypt"));
    }

    #[test]
    fn test_placeholder_box_without_logo() {
        let doc = layout_invoice(
            &snapshot(Subtype::Proforma, 1),
            &Company::default(),
            &Assets::none(),
        );
        assert!(doc.images.is_empty());
        assert!(doc.pages[0].ops.iter().any(|op| matches!(
            op,
            DrawOp::Rect { w, h, paint: Paint::FillStroke { fill: Rgb::WHITE, .. }, .. }
                if *w == 30.0 && *h == 30.0
        )));
    }

    #[test]
    fn test_arabic_lines_omitted_without_unicode_font() {
        let doc = layout_invoice(
            &snapshot(Subtype::Proforma, 1),
            &Company::default(),
            &Assets::none(),
        );
        assert!(!doc.pages[0].texts().any(super::super::text::contains_arabic));
    }

    #[test]
    fn test_titles_differ_by_subtype() {
        let company = Company::default();
        let proforma = layout_invoice(&snapshot(Subtype::Proforma, 1), &company, &Assets::none());
        let commercial =
            layout_invoice(&snapshot(Subtype::Commercial, 1), &company, &Assets::none());
        assert!(proforma.pages[0].contains_text("PROFORMA INVOICE"));
        assert!(commercial.pages[0].contains_text("Quotation invoice"));
    }

    #[test]
    fn test_long_remarks_wrap_inside_panel() {
        let mut s = snapshot(Subtype::Proforma, 1);
        let remarks = "Delivery within thirty days of receiving the advance payment. ".repeat(6);
        s.remarks = Some(remarks.clone());
        let doc = layout_invoice(&s, &Company::default(), &Assets::none());
        let page = doc
            .pages
            .iter()
            .find(|p| p.contains_text("Remarks:"))
            .expect("remarks are laid out");
        let mut wrapped = 0;
        for op in &page.ops {
            if let DrawOp::Text { text, x, size, .. } = op {
                if text.len() > 20 && remarks.contains(text.as_str()) {
                    let width = TextMetrics::builtin().width(text, *size, false) * PT_TO_MM;
                    assert!(x + width <= A4.width - MARGIN);
                    wrapped += 1;
                }
            }
        }
        assert!(wrapped > 1);
    }
}
