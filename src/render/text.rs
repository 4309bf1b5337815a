use std::sync::Arc;

use tracing::warn;

/// Points to millimetres.
pub const PT_TO_MM: f32 = 25.4 / 72.0;

/// Line advance as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.15;

/// Helvetica advance widths (1/1000 em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

/// Text measurement against either an embedded TrueType font or the
/// built-in Helvetica metrics.
///
/// Widths are returned in font-size units: `width("M", 10.0)` is the advance
/// of "M" set at size 10, in whatever unit the size was given in.
#[derive(Clone, Default)]
pub struct TextMetrics {
    font: Option<Arc<Vec<u8>>>,
}

impl TextMetrics {
    /// Metrics for the built-in Latin-only font.
    pub fn builtin() -> Self {
        Self { font: None }
    }

    /// Metrics for an embedded font. Unparseable data falls back to the
    /// built-in metrics.
    pub fn with_font(data: Arc<Vec<u8>>) -> Self {
        if ttf_parser::Face::parse(&data, 0).is_err() {
            warn!("font data could not be parsed, using built-in metrics");
            return Self::builtin();
        }
        Self { font: Some(data) }
    }

    pub fn from_font(data: Option<Arc<Vec<u8>>>) -> Self {
        data.map(Self::with_font).unwrap_or_default()
    }

    /// True when text outside Latin-1 can be drawn.
    pub fn has_unicode_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn font_data(&self) -> Option<&Arc<Vec<u8>>> {
        self.font.as_ref()
    }

    pub fn width(&self, text: &str, size: f32, bold: bool) -> f32 {
        let em = match self.font.as_deref().and_then(|d| ttf_parser::Face::parse(d, 0).ok()) {
            Some(face) => ttf_advance_em(&face, text),
            None => {
                let em = helvetica_advance_em(text);
                if bold {
                    em * 1.06
                } else {
                    em
                }
            }
        };
        em * size
    }

    /// Greedy word wrap to `max_width` (same units as `width`). Explicit
    /// newlines always break. Words longer than a line are split by char.
    pub fn wrap(&self, text: &str, size: f32, bold: bool, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let mut current = String::new();
            for word in paragraph.split_whitespace() {
                let candidate = if current.is_empty() {
                    word.to_string()
                } else {
                    format!("{current} {word}")
                };
                if self.width(&candidate, size, bold) <= max_width {
                    current = candidate;
                    continue;
                }
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                if self.width(word, size, bold) <= max_width {
                    current = word.to_string();
                } else {
                    for chunk in self.split_long_word(word, size, bold, max_width) {
                        if !current.is_empty() {
                            lines.push(std::mem::take(&mut current));
                        }
                        current = chunk;
                    }
                }
            }
            lines.push(current);
        }
        lines
    }

    fn split_long_word(&self, word: &str, size: f32, bold: bool, max_width: f32) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        for ch in word.chars() {
            current.push(ch);
            if self.width(&current, size, bold) > max_width && current.chars().count() > 1 {
                current.pop();
                chunks.push(std::mem::take(&mut current));
                current.push(ch);
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    /// Shorten `text` with a trailing "..." until it fits `max_width`.
    pub fn fit(&self, text: &str, size: f32, bold: bool, max_width: f32) -> String {
        if self.width(text, size, bold) <= max_width {
            return text.to_string();
        }
        let mut chars: Vec<char> = text.chars().collect();
        while !chars.is_empty() {
            chars.pop();
            let candidate = format!("{}...", chars.iter().collect::<String>().trim_end());
            if self.width(&candidate, size, bold) <= max_width {
                return candidate;
            }
        }
        String::new()
    }
}

impl std::fmt::Debug for TextMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextMetrics")
            .field("embedded_font", &self.font.is_some())
            .finish()
    }
}

fn ttf_advance_em(face: &ttf_parser::Face<'_>, text: &str) -> f32 {
    let units = face.units_per_em() as f32;
    let fallback = face
        .glyph_index(' ')
        .and_then(|g| face.glyph_hor_advance(g))
        .unwrap_or(0) as f32;
    text.chars()
        .map(|ch| {
            face.glyph_index(ch)
                .and_then(|g| face.glyph_hor_advance(g))
                .map(|a| a as f32)
                .unwrap_or(fallback)
        })
        .sum::<f32>()
        / units
}

fn helvetica_advance_em(text: &str) -> f32 {
    text.chars()
        .map(|ch| {
            let code = ch as u32;
            if (32..=126).contains(&code) {
                HELVETICA_WIDTHS[(code - 32) as usize] as f32
            } else {
                556.0
            }
        })
        .sum::<f32>()
        / 1000.0
}

pub fn is_arabic(ch: char) -> bool {
    matches!(ch as u32,
        0x0600..=0x065F | 0x066A..=0x06EF | 0x06FA..=0x06FF
        | 0x0750..=0x077F | 0x08A0..=0x08FF | 0xFB50..=0xFDFF | 0xFE70..=0xFEFF)
}

pub fn contains_arabic(text: &str) -> bool {
    text.chars().any(is_arabic)
}

fn is_strong_ltr(ch: char) -> bool {
    ch.is_alphanumeric() && !is_arabic(ch)
}

/// Reorder a logical string into left-to-right drawing order.
///
/// Arabic runs are reversed; Latin words and digit groups keep their order.
/// The paragraph direction follows the first strong character. No contextual
/// shaping is applied.
pub fn visual_order(text: &str) -> String {
    if !contains_arabic(text) {
        return text.to_string();
    }

    let rtl_paragraph = text
        .chars()
        .find(|&c| is_arabic(c) || is_strong_ltr(c))
        .map(is_arabic)
        .unwrap_or(false);

    // Neutral characters join the run they sit inside; between runs of
    // different direction they take the paragraph direction.
    let mut runs: Vec<(bool, String)> = Vec::new();
    let mut pending = String::new();
    for ch in text.chars() {
        let rtl = if is_arabic(ch) {
            true
        } else if is_strong_ltr(ch) {
            false
        } else {
            pending.push(ch);
            continue;
        };
        match runs.last_mut() {
            Some((last, run)) if *last == rtl => {
                run.push_str(&pending);
                pending.clear();
                run.push(ch);
            }
            _ => {
                if !pending.is_empty() {
                    runs.push((rtl_paragraph, std::mem::take(&mut pending)));
                }
                runs.push((rtl, ch.to_string()));
            }
        }
    }
    if !pending.is_empty() {
        runs.push((rtl_paragraph, pending));
    }

    let oriented = runs.into_iter().map(|(rtl, run)| {
        if rtl {
            run.chars().rev().map(mirror).collect::<String>()
        } else {
            run
        }
    });
    if rtl_paragraph {
        oriented.rev().collect()
    } else {
        oriented.collect()
    }
}

fn mirror(ch: char) -> char {
    match ch {
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '<' => '>',
        '>' => '<',
        _ => ch,
    }
}

/// Map text onto what the built-in font can encode. Arabic is dropped.
pub fn latin_fallback(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            ' '..='~' => out.push(ch),
            '©' => out.push_str("(c)"),
            '®' => out.push_str("(R)"),
            '–' | '—' => out.push('-'),
            '‘' | '’' => out.push('\''),
            '“' | '”' => out.push('"'),
            '…' => out.push_str("..."),
            '\u{0660}'..='\u{0669}' => {
                out.push(char::from(b'0' + (ch as u32 - 0x0660) as u8));
            }
            _ if ch.is_whitespace() => out.push(' '),
            _ => {}
        }
    }
    out
}
