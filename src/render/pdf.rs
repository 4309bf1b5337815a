use std::io::{BufWriter, Cursor};

use image::{DynamicImage, RgbImage};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Rect,
};
use tracing::{debug, warn};

use super::layout::{DrawOp, LaidOutDocument, Paint, Rgb};
use super::text::{latin_fallback, TextMetrics, PT_TO_MM};
use crate::error::{InvoiceError, Result};

/// Resolution images are embedded at before scaling to their box.
const IMAGE_DPI: f32 = 300.0;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    unicode: bool,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference, metrics: &TextMetrics) -> Result<Self> {
        if let Some(data) = metrics.font_data() {
            match doc.add_external_font(Cursor::new(data.as_slice())) {
                // One embedded face serves both weights.
                Ok(font) => {
                    return Ok(Self {
                        bold: font.clone(),
                        regular: font,
                        unicode: true,
                    })
                }
                Err(e) => warn!("failed to embed font, using Helvetica: {e}"),
            }
        }
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| InvoiceError::PdfGeneration(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| InvoiceError::PdfGeneration(e.to_string()))?;
        Ok(Self {
            regular,
            bold,
            unicode: false,
        })
    }
}

/// Serialize a laid-out document with printpdf. Nothing touches the disk.
pub fn write_pdf(
    document: &LaidOutDocument,
    title: &str,
    metrics: &TextMetrics,
) -> Result<Vec<u8>> {
    let size = document.size;
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(size.width), Mm(size.height), "Layer 1");
    let fonts = Fonts::load(&doc, metrics)?;

    for (index, page) in document.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(size.width), Mm(size.height), "Layer 1");
            doc.get_page(page).get_layer(layer)
        };
        let canvas = Canvas {
            layer,
            page_height: size.height,
            fonts: &fonts,
        };
        for op in &page.ops {
            canvas.draw(op, &document.images);
        }
    }
    debug!(pages = document.pages.len(), title, "pdf assembled");

    let mut writer = BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer)
        .map_err(|e| InvoiceError::PdfGeneration(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| InvoiceError::PdfGeneration(e.to_string()))
}

struct Canvas<'a> {
    layer: PdfLayerReference,
    page_height: f32,
    fonts: &'a Fonts,
}

impl Canvas<'_> {
    /// printpdf puts the origin bottom-left.
    fn y(&self, top_down: f32) -> Mm {
        Mm(self.page_height - top_down)
    }

    fn draw(&self, op: &DrawOp, images: &[DynamicImage]) {
        match op {
            DrawOp::Rect { x, y, w, h, paint } => {
                let rect = Rect::new(Mm(*x), self.y(y + h), Mm(x + w), self.y(*y));
                let mode = match *paint {
                    Paint::Fill(fill) => {
                        self.layer.set_fill_color(color(fill));
                        PaintMode::Fill
                    }
                    Paint::Stroke { color: stroke, width } => {
                        self.stroke(stroke, width);
                        PaintMode::Stroke
                    }
                    Paint::FillStroke { fill, stroke, width } => {
                        self.layer.set_fill_color(color(fill));
                        self.stroke(stroke, width);
                        PaintMode::FillStroke
                    }
                };
                self.layer.add_rect(rect.with_mode(mode));
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                color: stroke,
                width,
            } => {
                self.stroke(*stroke, *width);
                self.layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(*x1), self.y(*y1)), false),
                        (Point::new(Mm(*x2), self.y(*y2)), false),
                    ],
                    is_closed: false,
                });
            }
            DrawOp::Text {
                text,
                x,
                y,
                size,
                bold,
                color: fill,
            } => {
                let text = if self.fonts.unicode {
                    text.clone()
                } else {
                    latin_fallback(text)
                };
                if text.trim().is_empty() {
                    return;
                }
                let font = if *bold {
                    &self.fonts.bold
                } else {
                    &self.fonts.regular
                };
                self.layer.set_fill_color(color(*fill));
                self.layer.use_text(text, *size, Mm(*x), self.y(*y), font);
            }
            DrawOp::Image { image, x, y, w, h } => {
                let Some(source) = images.get(image.0) else {
                    warn!(index = image.0, "draw op references a missing image");
                    return;
                };
                let flat = flatten_alpha(source);
                let natural_w = flat.width().max(1) as f32 / IMAGE_DPI * 25.4;
                let natural_h = flat.height().max(1) as f32 / IMAGE_DPI * 25.4;
                Image::from_dynamic_image(&flat).add_to_layer(
                    self.layer.clone(),
                    ImageTransform {
                        translate_x: Some(Mm(*x)),
                        translate_y: Some(self.y(y + h)),
                        rotate: None,
                        scale_x: Some(w / natural_w),
                        scale_y: Some(h / natural_h),
                        dpi: Some(IMAGE_DPI),
                    },
                );
            }
        }
    }

    fn stroke(&self, stroke: Rgb, width_mm: f32) {
        self.layer.set_outline_color(color(stroke));
        self.layer.set_outline_thickness(width_mm / PT_TO_MM);
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        rgb.0 as f32 / 255.0,
        rgb.1 as f32 / 255.0,
        rgb.2 as f32 / 255.0,
        None,
    ))
}

/// Composite transparent pixels onto white; embedded images carry no alpha.
pub(crate) fn flatten_alpha(source: &DynamicImage) -> DynamicImage {
    if !source.color().has_alpha() {
        return source.clone();
    }
    let rgba = source.to_rgba8();
    let mut flat = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        flat.put_pixel(x, y, image::Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }
    DynamicImage::ImageRgb8(flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::layout::{Align, PageFlow, TextStyle, A4};

    #[test]
    fn test_write_pdf_produces_pdf_bytes() {
        let metrics = TextMetrics::builtin();
        let mut flow = PageFlow::new(A4, 15.0, 282.0, PT_TO_MM, metrics.clone());
        flow.rect(15.0, 15.0, 180.0, 20.0, Paint::Fill(Rgb(245, 232, 28)));
        flow.text("Hello © ﻣﺮﺣﺒﺎ", 105.0, 25.0, TextStyle::bold(12.0), Align::Center);
        flow.line(15.0, 40.0, 195.0, 40.0, Rgb::BLACK, 0.2);
        let logo = flow.add_image(DynamicImage::new_rgba8(8, 8));
        flow.image(logo, 20.0, 50.0, 20.0, 20.0);
        flow.new_page();
        let doc = flow.finish();

        let bytes = write_pdf(&doc, "Test", &metrics).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_flatten_alpha_blends_to_white() {
        let transparent = DynamicImage::new_rgba8(2, 2);
        let flat = flatten_alpha(&transparent).to_rgb8();
        assert_eq!(flat.get_pixel(0, 0), &image::Rgb([255, 255, 255]));
    }
}
