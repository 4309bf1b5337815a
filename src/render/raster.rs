//! Image-capture rendering: the whole invoice is composed onto one tall
//! bitmap, which is then cut into A4-height slices, one per page.
//!
//! Text is not selectable and the items table may be cut mid-row.

use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use rusttype::{point, Font, Scale};
use tracing::{debug, warn};

use super::assets::Assets;
use super::layout::{
    Align, Cell, Column, DrawOp, ImageRef, LaidOutDocument, Page, PageFlow, PageSize, Paint, Rgb,
    Row, Table, TableStyle, TextStyle, A4,
};
use super::text::TextMetrics;
use super::vector::arabic_subtitle;
use super::{decimal, plain_number};
use crate::config::Company;
use crate::draft::Subtype;
use crate::snapshot::InvoiceSnapshot;

/// Composition width in CSS pixels.
pub const CANVAS_WIDTH: f32 = 800.0;
/// Device pixels per CSS pixel.
pub const CAPTURE_SCALE: f32 = 2.0;

/// Bundled face for captures made without a font asset.
static FALLBACK_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

const PADDING: f32 = 15.0;
const INNER_WIDTH: f32 = CANVAS_WIDTH - 2.0 * PADDING;
const RIGHT_EDGE: f32 = CANVAS_WIDTH - PADDING;
const CENTER: f32 = CANVAS_WIDTH / 2.0;

const YELLOW: Rgb = Rgb(255, 224, 38);
const PANEL: Rgb = Rgb(248, 249, 250);
const RULE: Rgb = Rgb(233, 236, 239);
const INK: Rgb = Rgb(26, 26, 26);
const LABEL: Rgb = Rgb(51, 51, 51);
const MUTED: Rgb = Rgb(85, 85, 85);

/// Metrics for the capture path: the configured font, or the bundled one.
pub fn capture_metrics(assets: &Assets) -> TextMetrics {
    let metrics = TextMetrics::from_font(assets.font.clone());
    if metrics.has_unicode_font() {
        metrics
    } else {
        TextMetrics::with_font(Arc::new(FALLBACK_FONT.to_vec()))
    }
}

/// Compose the invoice onto a single continuous page, in CSS pixels.
pub fn compose(snapshot: &InvoiceSnapshot, company: &Company, assets: &Assets) -> LaidOutDocument {
    let metrics = capture_metrics(assets);
    let size = PageSize {
        width: CANVAS_WIDTH,
        height: 0.0,
    };
    let mut flow = PageFlow::new(size, PADDING, f32::INFINITY, 1.0, metrics);

    header(&mut flow, company, assets);
    title(&mut flow, snapshot);
    client_panel(&mut flow, snapshot);
    items_table(&mut flow, snapshot);
    totals(&mut flow, snapshot);
    seller(&mut flow, company, assets);
    footer(&mut flow, company);

    let height = flow.cursor() + PADDING;
    let mut document = flow.finish();
    document.size.height = height;
    document
}

fn header(flow: &mut PageFlow, company: &Company, assets: &Assets) {
    let top = flow.cursor();
    let height = 126.0;
    flow.rect(PADDING, top, INNER_WIDTH, height, Paint::Fill(YELLOW));

    let logo_x = PADDING + (INNER_WIDTH - 90.0) / 2.0;
    let logo_y = top + 18.0;
    flow.rect(
        logo_x,
        logo_y,
        90.0,
        90.0,
        Paint::FillStroke {
            fill: Rgb::WHITE,
            stroke: Rgb::gray(229),
            width: 2.0,
        },
    );
    match assets.logo.clone() {
        Some(logo) => {
            let logo = flow.add_image(logo);
            flow.image(logo, logo_x + 7.5, logo_y + 7.5, 75.0, 75.0);
        }
        None => {
            let cx = logo_x + 45.0;
            flow.text(
                "EL HEKMA",
                cx,
                logo_y + 38.0,
                TextStyle::bold(12.0).colored(LABEL),
                Align::Center,
            );
            let small = TextStyle::regular(10.0).colored(Rgb::gray(102));
            flow.text("ENGINEERING", cx, logo_y + 53.0, small, Align::Center);
            flow.text("OFFICE", cx, logo_y + 66.0, small, Align::Center);
        }
    }

    let column_width = logo_x - 15.0 - (PADDING + 18.0);
    let body = TextStyle::regular(10.0).colored(Rgb::gray(42));

    let arabic_x = logo_x - 15.0;
    let email_ar = format!("البريد الإلكتروني: {}", company.email);
    flow.text(
        &company.name_ar,
        arabic_x,
        top + 36.0,
        TextStyle::bold(16.0).colored(INK),
        Align::Right,
    );
    let mut line_y = top + 58.0;
    for line in [&company.address_ar, &company.contact_ar, &email_ar] {
        let fitted = flow.fit(line, 10.0, false, column_width);
        flow.text(&fitted, arabic_x, line_y, body, Align::Right);
        line_y += 18.0;
    }

    let english_x = logo_x + 90.0 + 15.0;
    flow.text(
        &company.name,
        english_x,
        top + 36.0,
        TextStyle::bold(16.0).colored(INK),
        Align::Left,
    );
    let email = format!("Email: {}", company.email);
    let mut lines = flow.wrap(&company.address, 10.0, false, column_width);
    lines.push(company.contact.clone());
    lines.push(email);
    let mut line_y = top + 54.0;
    for line in lines.iter().take(4) {
        flow.text(line, english_x, line_y, body, Align::Left);
        line_y += 16.0;
    }

    flow.set_cursor(top + height + 20.0);
}

fn title(flow: &mut PageFlow, snapshot: &InvoiceSnapshot) {
    let top = flow.cursor();
    let title = match snapshot.subtype {
        Subtype::Commercial => "COMMERCIAL INVOICE",
        Subtype::Proforma => "PROFORMA INVOICE",
    };
    let subtitle = arabic_subtitle(snapshot.subtype);
    flow.text(title, CENTER, top + 22.0, TextStyle::bold(22.0).colored(INK), Align::Center);
    flow.text(subtitle, CENTER, top + 48.0, TextStyle::regular(14.0).colored(MUTED), Align::Center);
    flow.set_cursor(top + 56.0 + 25.0);
}

/// Bold label followed by a muted value on one line.
fn labelled(flow: &mut PageFlow, label: &str, value: &str, x: f32, y: f32, align: Align) {
    let label_style = TextStyle::bold(12.0).colored(LABEL);
    let value_style = TextStyle::regular(12.0).colored(MUTED);
    match align {
        Align::Right => {
            let value_width = flow.text_width(value, 12.0, false);
            flow.text(value, x, y, value_style, Align::Right);
            flow.text(label, x - value_width - 5.0, y, label_style, Align::Right);
        }
        _ => {
            let label_width = flow.text_width(label, 12.0, true);
            flow.text(label, x, y, label_style, Align::Left);
            flow.text(value, x + label_width + 5.0, y, value_style, Align::Left);
        }
    }
}

fn client_panel(flow: &mut PageFlow, snapshot: &InvoiceSnapshot) {
    let top = flow.cursor();
    let height = 102.0;
    flow.rect(PADDING, top, INNER_WIDTH, height, Paint::Fill(PANEL));
    flow.rect(PADDING, top, 4.0, height, Paint::Fill(YELLOW));

    let left = PADDING + 19.0;
    let right = RIGHT_EDGE - 15.0;
    let rows = [
        ("Client / العميل:", snapshot.client_name.as_str()),
        ("Tel / التليفون:", snapshot.client_tel.as_str()),
        ("Address / العنوان:", snapshot.client_address.as_str()),
    ];
    for (index, (label, value)) in rows.into_iter().enumerate() {
        labelled(flow, label, value, left, top + 27.0 + 24.0 * index as f32, Align::Left);
    }
    let rows = [
        ("Date / التاريخ:", snapshot.date.as_str()),
        ("PI No. / رقم الفاتورة:", snapshot.document_number.as_str()),
    ];
    for (index, (label, value)) in rows.into_iter().enumerate() {
        labelled(flow, label, value, right, top + 27.0 + 24.0 * index as f32, Align::Right);
    }

    flow.set_cursor(top + height + 25.0);
}

fn items_table(flow: &mut PageFlow, snapshot: &InvoiceSnapshot) {
    let centered = |width| Column::new(width, Align::Center);
    let headers = ["#", "Item Code", "Description / الوصف", "Qty", "Unit Price", "Total"];
    let table = Table {
        columns: vec![
            centered(40.0),
            centered(100.0),
            Column::new(310.0, Align::Left),
            centered(70.0),
            centered(120.0),
            centered(130.0),
        ],
        header: Some(headers.iter().map(|h| Cell::new(*h).bold().color(INK)).collect()),
        rows: snapshot
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                Row::from(vec![
                    Cell::new((index + 1).to_string()),
                    Cell::new(item.item_code.clone()),
                    Cell::new(item.description.clone()),
                    Cell::new(item.quantity.to_string()),
                    Cell::new(decimal(item.unit_price)),
                    Cell::new(decimal(item.total)).bold().color(INK),
                ])
            })
            .collect(),
        style: TableStyle {
            font_size: 11.0,
            header_size: 11.0,
            padding: 10.0,
            header_fill: YELLOW,
            body_fill: Some(PANEL),
            alternate_fill: Some(Rgb::WHITE),
            text_color: LABEL,
            grid: Some((RULE, 1.0)),
        },
    };
    flow.table(PADDING, &table);
    flow.advance(25.0);
}

fn totals(flow: &mut PageFlow, snapshot: &InvoiceSnapshot) {
    let width = 350.0;
    let x = RIGHT_EDGE - width;
    let mut y = flow.cursor();
    let rows = [
        ("Grand Total / الإجمالي:".to_string(), decimal(snapshot.grand_total), PANEL),
        (
            format!("Tax ({}%) / الضريبة:", plain_number(snapshot.tax_percent)),
            decimal(snapshot.tax_amount),
            Rgb::WHITE,
        ),
        (
            format!("Discount ({}%) / الخصم:", plain_number(snapshot.discount_percent)),
            format!("-{}", decimal(snapshot.discount_amount)),
            PANEL,
        ),
    ];
    for (label, value, fill) in &rows {
        flow.rect(x, y, width, 46.0, Paint::Fill(*fill));
        flow.line(x, y + 46.0, x + width, y + 46.0, RULE, 1.0);
        let baseline = y + 14.0 + 16.0;
        flow.text(label, x + 14.0, baseline, TextStyle::bold(16.0).colored(LABEL), Align::Left);
        flow.text(
            value,
            x + width - 14.0,
            baseline,
            TextStyle::bold(16.0).colored(INK),
            Align::Right,
        );
        y += 46.0;
    }
    flow.rect(x, y, width, 56.0, Paint::Fill(YELLOW));
    let emphasis = TextStyle::bold(17.0).colored(INK);
    flow.text("Net Total / صافي الإجمالي:", x + 18.0, y + 36.0, emphasis, Align::Left);
    flow.text(&decimal(snapshot.net_total), x + width - 18.0, y + 36.0, emphasis, Align::Right);

    flow.set_cursor(y + 56.0 + 35.0);
}

fn seller(flow: &mut PageFlow, company: &Company, assets: &Assets) {
    let top = flow.cursor();
    let height = 189.0;
    flow.rect(PADDING, top, INNER_WIDTH, height, Paint::Fill(PANEL));
    flow.rect(PADDING, top, 3.0, height, Paint::Fill(YELLOW));

    let left = PADDING + 15.0;
    flow.text(
        "THE SELLER / البائع",
        CENTER,
        top + 26.0,
        TextStyle::bold(14.0).colored(INK),
        Align::Center,
    );
    labelled(flow, "Name / الاسم:", &company.seller_name, left, top + 58.0, Align::Left);

    flow.text(
        "Signature / التوقيع:",
        left,
        top + 82.0,
        TextStyle::bold(12.0).colored(LABEL),
        Align::Left,
    );
    if let Some(signature) = assets.signature.clone() {
        let signature = flow.add_image(signature);
        flow.image(signature, left + 15.0, top + 87.0, 120.0, 26.0);
    }
    flow.line(left, top + 115.0, left + 150.0, top + 115.0, LABEL, 2.0);

    flow.text(
        "Date / التاريخ:",
        left,
        top + 139.0,
        TextStyle::bold(12.0).colored(LABEL),
        Align::Left,
    );
    flow.line(left, top + 167.0, left + 120.0, top + 167.0, LABEL, 2.0);

    flow.set_cursor(top + height + 20.0);
}

fn footer(flow: &mut PageFlow, company: &Company) {
    let top = flow.cursor() + 20.0;
    let height = 110.0;
    flow.rect(PADDING, top, INNER_WIDTH, height, Paint::Fill(PANEL));
    flow.line(PADDING, top + 1.0, RIGHT_EDGE, top + 1.0, YELLOW, 2.0);

    let label = "For more information, visit: ";
    let label_width = flow.text_width(label, 13.0, false);
    let url_width = flow.text_width(&company.website, 13.0, true);
    let start = CENTER - (label_width + url_width) / 2.0;
    flow.text(label, start, top + 46.0, TextStyle::regular(13.0).colored(MUTED), Align::Left);
    flow.text(
        &company.website,
        start + label_width,
        top + 46.0,
        TextStyle::bold(13.0).colored(YELLOW),
        Align::Left,
    );
    flow.text(
        &company.copyright,
        CENTER,
        top + 77.0,
        TextStyle::regular(13.0).colored(MUTED),
        Align::Center,
    );

    flow.set_cursor(top + height);
}

/// Paint a composed canvas at `CAPTURE_SCALE`.
pub fn rasterize(document: &LaidOutDocument, metrics: &TextMetrics) -> RgbImage {
    let width = (document.size.width * CAPTURE_SCALE).ceil().max(1.0) as u32;
    let height = (document.size.height * CAPTURE_SCALE).ceil().max(1.0) as u32;
    let font = metrics
        .font_data()
        .and_then(|data| Font::try_from_vec((**data).clone()))
        .or_else(|| {
            debug!("no usable font asset, using the bundled face");
            Font::try_from_bytes(FALLBACK_FONT)
        });
    if font.is_none() {
        warn!("bundled font could not be loaded, raster text is omitted");
    }

    let mut painter = Painter {
        surface: Surface {
            pixels: RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255])),
            scale: CAPTURE_SCALE,
        },
        font,
    };
    for page in &document.pages {
        for op in &page.ops {
            painter.draw(op, &document.images);
        }
    }
    painter.surface.pixels
}

/// Cut the canvas into A4-proportioned slices, top to bottom. The last
/// slice is padded with white.
pub fn slice_pages(canvas: &RgbImage) -> Vec<RgbImage> {
    let width = canvas.width();
    let page_height = (width as f32 * A4.height / A4.width).round().max(1.0) as u32;
    let count = canvas.height().div_ceil(page_height).max(1);
    (0..count)
        .map(|index| {
            let mut page = RgbImage::from_pixel(width, page_height, image::Rgb([255, 255, 255]));
            let start = index * page_height;
            let rows = page_height.min(canvas.height().saturating_sub(start));
            let slice = imageops::crop_imm(canvas, 0, start, width, rows).to_image();
            imageops::replace(&mut page, &slice, 0, 0);
            page
        })
        .collect()
}

/// Place each slice as a full-bleed image on its own A4 page.
pub fn paginate(slices: Vec<RgbImage>) -> LaidOutDocument {
    let mut pages = Vec::with_capacity(slices.len());
    let mut images = Vec::with_capacity(slices.len());
    for (index, slice) in slices.into_iter().enumerate() {
        images.push(DynamicImage::ImageRgb8(slice));
        pages.push(Page {
            ops: vec![DrawOp::Image {
                image: ImageRef(index),
                x: 0.0,
                y: 0.0,
                w: A4.width,
                h: A4.height,
            }],
        });
    }
    debug!(pages = pages.len(), "raster capture paginated");
    LaidOutDocument {
        size: A4,
        pages,
        images,
    }
}

struct Surface {
    pixels: RgbImage,
    scale: f32,
}

impl Surface {
    fn blend(&mut self, x: i64, y: i64, color: Rgb, alpha: f32) {
        if x < 0 || y < 0 || alpha <= 0.0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.pixels.width() || y >= self.pixels.height() {
            return;
        }
        let alpha = alpha.min(1.0);
        let inv = 1.0 - alpha;
        let dst = self.pixels.get_pixel_mut(x, y);
        dst.0[0] = (color.0 as f32 * alpha + dst.0[0] as f32 * inv) as u8;
        dst.0[1] = (color.1 as f32 * alpha + dst.0[1] as f32 * inv) as u8;
        dst.0[2] = (color.2 as f32 * alpha + dst.0[2] as f32 * inv) as u8;
    }

    /// Device-pixel span of `[start, start + len)`, at least one pixel wide.
    fn span(&self, start: f32, len: f32) -> (i64, i64) {
        let from = (start * self.scale).round() as i64;
        let to = ((start + len) * self.scale).round() as i64;
        (from, to.max(from + 1))
    }

    fn fill(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let (x0, x1) = self.span(x, w);
        let (y0, y1) = self.span(y, h);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color, 1.0);
            }
        }
    }

    fn stroke(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb, width: f32) {
        self.fill(x, y, w, width, color);
        self.fill(x, y + h - width, w, width, color);
        self.fill(x, y, width, h, color);
        self.fill(x + w - width, y, width, h, color);
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Rgb, width: f32) {
        let half = width / 2.0;
        if (y1 - y2).abs() < f32::EPSILON {
            self.fill(x1.min(x2), y1 - half, (x2 - x1).abs(), width, color);
        } else if (x1 - x2).abs() < f32::EPSILON {
            self.fill(x1 - half, y1.min(y2), width, (y2 - y1).abs(), color);
        } else {
            let length = ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt();
            let steps = (length * self.scale).ceil().max(1.0) as usize;
            for step in 0..=steps {
                let t = step as f32 / steps as f32;
                let (x, y) = (x1 + (x2 - x1) * t, y1 + (y2 - y1) * t);
                self.fill(x - half, y - half, width, width, color);
            }
        }
    }

    fn image(&mut self, source: &DynamicImage, x: f32, y: f32, w: f32, h: f32) {
        let (x0, x1) = self.span(x, w);
        let (y0, y1) = self.span(y, h);
        let resized = imageops::resize(
            &source.to_rgba8(),
            (x1 - x0) as u32,
            (y1 - y0) as u32,
            FilterType::Triangle,
        );
        for (ox, oy, pixel) in resized.enumerate_pixels() {
            let color = Rgb(pixel[0], pixel[1], pixel[2]);
            self.blend(x0 + ox as i64, y0 + oy as i64, color, pixel[3] as f32 / 255.0);
        }
    }
}

struct Painter {
    surface: Surface,
    font: Option<Font<'static>>,
}

impl Painter {
    fn draw(&mut self, op: &DrawOp, images: &[DynamicImage]) {
        match *op {
            DrawOp::Rect { x, y, w, h, paint } => match paint {
                Paint::Fill(fill) => self.surface.fill(x, y, w, h, fill),
                Paint::Stroke { color, width } => self.surface.stroke(x, y, w, h, color, width),
                Paint::FillStroke { fill, stroke, width } => {
                    self.surface.fill(x, y, w, h, fill);
                    self.surface.stroke(x, y, w, h, stroke, width);
                }
            },
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                color,
                width,
            } => self.surface.line(x1, y1, x2, y2, color, width),
            DrawOp::Text {
                ref text,
                x,
                y,
                size,
                bold,
                color,
            } => self.text(text, x, y, size, bold, color),
            DrawOp::Image { image, x, y, w, h } => {
                if let Some(source) = images.get(image.0) {
                    self.surface.image(source, x, y, w, h);
                }
            }
        }
    }

    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, bold: bool, color: Rgb) {
        let Some(font) = self.font.as_ref() else {
            return;
        };
        let surface = &mut self.surface;
        let scale = surface.scale;
        let glyph_scale = Scale::uniform(size * scale);
        // Bold is faked with a second pass shifted right.
        let passes: &[f32] = if bold { &[0.0, 0.5] } else { &[0.0] };
        for shift in passes {
            let origin = point((x + shift) * scale, y * scale);
            for glyph in font.layout(text, glyph_scale, origin) {
                let Some(bb) = glyph.pixel_bounding_box() else {
                    continue;
                };
                glyph.draw(|gx, gy, v| {
                    surface.blend(
                        gx as i64 + bb.min.x as i64,
                        gy as i64 + bb.min.y as i64,
                        color,
                        v,
                    );
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_pages_pads_last_page() {
        let canvas = RgbImage::from_pixel(210, 700, image::Rgb([0, 0, 0]));
        let pages = slice_pages(&canvas);
        assert_eq!(pages.len(), 3);
        assert!(pages.iter().all(|p| p.dimensions() == (210, 297)));
        assert_eq!(pages[2].get_pixel(0, 0), &image::Rgb([0, 0, 0]));
        assert_eq!(pages[2].get_pixel(0, 296), &image::Rgb([255, 255, 255]));
    }

    #[test]
    fn test_slice_pages_exact_fit() {
        let canvas = RgbImage::new(210, 297 * 2);
        assert_eq!(slice_pages(&canvas).len(), 2);
    }

    #[test]
    fn test_paginate_places_full_bleed_images() {
        let doc = paginate(vec![RgbImage::new(10, 14), RgbImage::new(10, 14)]);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.images.len(), 2);
        assert!(matches!(
            doc.pages[1].ops[0],
            DrawOp::Image { x, y, w, h, .. }
                if x == 0.0 && y == 0.0 && w == A4.width && h == A4.height
        ));
    }

    fn dark_pixels(canvas: &RgbImage) -> usize {
        canvas.pixels().filter(|p| p.0.iter().all(|c| *c < 120)).count()
    }

    #[test]
    fn test_text_is_drawn_without_font_asset() {
        let mut draft = crate::draft::InvoiceDraft::new(Subtype::Proforma);
        draft.client.name = "Cairo Medical".to_string();
        let snapshot = InvoiceSnapshot::from_draft(&draft);
        let canvas = compose(&snapshot, &Company::default(), &Assets::none());

        let mut bare = canvas.clone();
        for page in &mut bare.pages {
            page.ops.retain(|op| !matches!(op, DrawOp::Text { .. }));
        }

        let inked = dark_pixels(&rasterize(&canvas, &TextMetrics::builtin()));
        let rules = dark_pixels(&rasterize(&bare, &TextMetrics::builtin()));
        assert!(inked > rules + 1000, "text added only {} pixels", inked.saturating_sub(rules));
    }

    #[test]
    fn test_capture_metrics_fall_back_to_bundled_font() {
        assert!(capture_metrics(&Assets::none()).has_unicode_font());
    }

    #[test]
    fn test_fill_paints_scaled_area() {
        let mut surface = Surface {
            pixels: RgbImage::from_pixel(20, 20, image::Rgb([255, 255, 255])),
            scale: 2.0,
        };
        surface.fill(1.0, 1.0, 2.0, 2.0, Rgb::BLACK);
        assert_eq!(surface.pixels.get_pixel(2, 2), &image::Rgb([0, 0, 0]));
        assert_eq!(surface.pixels.get_pixel(5, 5), &image::Rgb([0, 0, 0]));
        assert_eq!(surface.pixels.get_pixel(6, 6), &image::Rgb([255, 255, 255]));
    }
}
