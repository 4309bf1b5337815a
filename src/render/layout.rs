use image::DynamicImage;

use super::text::{visual_order, TextMetrics, LINE_HEIGHT_FACTOR};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// A4 portrait in millimetres.
pub const A4: PageSize = PageSize {
    width: 210.0,
    height: 297.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    pub const fn gray(level: u8) -> Rgb {
        Rgb(level, level, level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Fill(Rgb),
    Stroke { color: Rgb, width: f32 },
    FillStroke { fill: Rgb, stroke: Rgb, width: f32 },
}

/// Index into [`LaidOutDocument::images`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef(pub usize);

/// One drawing instruction. Coordinates grow right and down from the
/// top-left corner of the page; text `y` is the baseline and `x` the left
/// edge after alignment.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        paint: Paint,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Rgb,
        width: f32,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        bold: bool,
        color: Rgb,
    },
    Image {
        image: ImageRef,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Text content in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }
}

/// The finished, backend-neutral document.
#[derive(Debug, Clone)]
pub struct LaidOutDocument {
    pub size: PageSize,
    pub pages: Vec<Page>,
    pub images: Vec<DynamicImage>,
}

impl LaidOutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Vertical cursor over a growing list of pages.
///
/// `text_scale` converts font sizes into layout units: millimetres per point
/// for print layouts, 1.0 for pixel canvases.
pub struct PageFlow {
    size: PageSize,
    top: f32,
    bottom: f32,
    cursor: f32,
    text_scale: f32,
    metrics: TextMetrics,
    pages: Vec<Page>,
    images: Vec<DynamicImage>,
}

impl PageFlow {
    pub fn new(
        size: PageSize,
        top: f32,
        bottom: f32,
        text_scale: f32,
        metrics: TextMetrics,
    ) -> Self {
        Self {
            size,
            top,
            bottom,
            cursor: top,
            text_scale,
            metrics,
            pages: vec![Page::default()],
            images: Vec::new(),
        }
    }

    pub fn size(&self) -> PageSize {
        self.size
    }

    pub fn metrics(&self) -> &TextMetrics {
        &self.metrics
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn set_cursor(&mut self, y: f32) {
        self.cursor = y;
    }

    pub fn advance(&mut self, dy: f32) {
        self.cursor += dy;
    }

    pub fn page_number(&self) -> usize {
        self.pages.len()
    }

    pub fn remaining(&self) -> f32 {
        self.bottom - self.cursor
    }

    /// Break to a new page unless `height` fits below the cursor. Returns
    /// true when a page was added. A block taller than a whole page is
    /// drawn from the top of a fresh page and allowed to overflow.
    pub fn ensure_space(&mut self, height: f32) -> bool {
        if self.cursor + height <= self.bottom || self.cursor <= self.top {
            return false;
        }
        self.new_page();
        true
    }

    pub fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor = self.top;
    }

    pub fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    pub fn add_image(&mut self, image: DynamicImage) -> ImageRef {
        self.images.push(image);
        ImageRef(self.images.len() - 1)
    }

    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: Paint) {
        self.push(DrawOp::Rect { x, y, w, h, paint });
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Rgb, width: f32) {
        self.push(DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            color,
            width,
        });
    }

    pub fn image(&mut self, image: ImageRef, x: f32, y: f32, w: f32, h: f32) {
        self.push(DrawOp::Image { image, x, y, w, h });
    }

    /// Text width in layout units.
    pub fn text_width(&self, text: &str, size: f32, bold: bool) -> f32 {
        self.metrics.width(text, size, bold) * self.text_scale
    }

    pub fn line_height(&self, size: f32) -> f32 {
        size * LINE_HEIGHT_FACTOR * self.text_scale
    }

    pub fn wrap(&self, text: &str, size: f32, bold: bool, max_width: f32) -> Vec<String> {
        self.metrics
            .wrap(text, size, bold, max_width / self.text_scale)
    }

    pub fn fit(&self, text: &str, size: f32, bold: bool, max_width: f32) -> String {
        self.metrics.fit(text, size, bold, max_width / self.text_scale)
    }

    /// Draw one line of text anchored at `x` according to `align`. Arabic
    /// runs are stored in visual order.
    pub fn text(&mut self, text: &str, x: f32, y: f32, style: TextStyle, align: Align) {
        if text.is_empty() {
            return;
        }
        let text = visual_order(text);
        let text = text.as_str();
        let width = self.text_width(text, style.size, style.bold);
        let left = match align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };
        self.push(DrawOp::Text {
            text: text.to_string(),
            x: left,
            y,
            size: style.size,
            bold: style.bold,
            color: style.color,
        });
    }

    /// Draw a table at the cursor, breaking pages between rows. The header
    /// row is redrawn at the top of every continuation page.
    pub fn table(&mut self, x: f32, table: &Table) {
        let header_height = table
            .header
            .as_ref()
            .map(|cells| self.row_layout(table, cells, table.style.header_size, true).0);
        let first_row = table
            .rows
            .first()
            .map(|r| self.row_layout(table, &r.cells, table.style.font_size, false).0)
            .unwrap_or(0.0);
        self.ensure_space(header_height.unwrap_or(0.0) + first_row);
        self.table_header(x, table);

        for (index, row) in table.rows.iter().enumerate() {
            let (height, lines) = self.row_layout(table, &row.cells, table.style.font_size, false);
            if self.ensure_space(height) {
                self.table_header(x, table);
            }
            let fill = row.fill.or(if index % 2 == 1 {
                table.style.alternate_fill
            } else {
                table.style.body_fill
            });
            self.table_row(
                x,
                table,
                &row.cells,
                &lines,
                height,
                fill,
                table.style.font_size,
                false,
            );
        }
    }

    fn table_header(&mut self, x: f32, table: &Table) {
        if let Some(cells) = &table.header {
            let (height, lines) = self.row_layout(table, cells, table.style.header_size, true);
            self.table_row(
                x,
                table,
                cells,
                &lines,
                height,
                Some(table.style.header_fill),
                table.style.header_size,
                true,
            );
        }
    }

    fn row_layout(
        &self,
        table: &Table,
        cells: &[Cell],
        size: f32,
        header: bool,
    ) -> (f32, Vec<Vec<String>>) {
        let pad = table.style.padding;
        let lines: Vec<Vec<String>> = cells
            .iter()
            .zip(&table.columns)
            .map(|(cell, column)| {
                let bold = header || cell.bold;
                self.wrap(&cell.text, size, bold, column.width - 2.0 * pad)
            })
            .collect();
        let max_lines = lines.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let height = max_lines as f32 * self.line_height(size) + 2.0 * pad;
        (height, lines)
    }

    #[allow(clippy::too_many_arguments)]
    fn table_row(
        &mut self,
        x: f32,
        table: &Table,
        cells: &[Cell],
        lines: &[Vec<String>],
        height: f32,
        row_fill: Option<Rgb>,
        size: f32,
        header: bool,
    ) {
        let top = self.cursor;
        let pad = table.style.padding;
        let line_height = self.line_height(size);
        let ascent = size * self.text_scale * 0.8;
        let mut left = x;
        for ((cell, column), cell_lines) in cells.iter().zip(&table.columns).zip(lines) {
            if let Some(fill) = cell.fill.or(row_fill) {
                self.rect(left, top, column.width, height, Paint::Fill(fill));
            }
            if let Some((color, width)) = table.style.grid {
                self.rect(left, top, column.width, height, Paint::Stroke { color, width });
            }
            let anchor = match column.align {
                Align::Left => left + pad,
                Align::Center => left + column.width / 2.0,
                Align::Right => left + column.width - pad,
            };
            let style = TextStyle {
                size,
                bold: header || cell.bold,
                color: cell.color.unwrap_or(table.style.text_color),
            };
            for (i, line) in cell_lines.iter().enumerate() {
                let baseline = top + pad + ascent + i as f32 * line_height;
                self.text(line, anchor, baseline, style, column.align);
            }
            left += column.width;
        }
        self.cursor = top + height;
    }

    /// Run `stamp` once per finished page, e.g. for page furniture.
    pub fn for_each_page(&mut self, mut stamp: impl FnMut(&mut PageFlow)) {
        let pages = std::mem::take(&mut self.pages);
        let cursor = self.cursor;
        let mut stamped = Vec::with_capacity(pages.len());
        for page in pages {
            self.pages = vec![page];
            stamp(self);
            stamped.append(&mut self.pages);
        }
        self.pages = stamped;
        self.cursor = cursor;
    }

    pub fn finish(self) -> LaidOutDocument {
        LaidOutDocument {
            size: self.size,
            pages: self.pages,
            images: self.images,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub bold: bool,
    pub color: Rgb,
}

impl TextStyle {
    pub const fn regular(size: f32) -> Self {
        Self {
            size,
            bold: false,
            color: Rgb::BLACK,
        }
    }

    pub const fn bold(size: f32) -> Self {
        Self {
            size,
            bold: true,
            color: Rgb::BLACK,
        }
    }

    pub const fn colored(self, color: Rgb) -> Self {
        Self { color, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub width: f32,
    pub align: Align,
}

impl Column {
    pub const fn new(width: f32, align: Align) -> Self {
        Self { width, align }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub text: String,
    pub bold: bool,
    pub fill: Option<Rgb>,
    pub color: Option<Rgb>,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn fill(mut self, fill: Rgb) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub fill: Option<Rgb>,
}

impl From<Vec<Cell>> for Row {
    fn from(cells: Vec<Cell>) -> Self {
        Self { cells, fill: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableStyle {
    pub font_size: f32,
    pub header_size: f32,
    pub padding: f32,
    pub header_fill: Rgb,
    pub body_fill: Option<Rgb>,
    pub alternate_fill: Option<Rgb>,
    pub text_color: Rgb,
    pub grid: Option<(Rgb, f32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub header: Option<Vec<Cell>>,
    pub rows: Vec<Row>,
    pub style: TableStyle,
}
