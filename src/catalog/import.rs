use std::fs;
use std::path::Path;

use tracing::debug;

use super::ProductRecord;
use crate::error::{InvoiceError, Result};

/// Parse product rows out of `Name,Code,Price` text.
///
/// The first line is a header and is always skipped. Fields may be wrapped in
/// double quotes to protect commas; a quote only toggles the quoted state and
/// is never part of the value. Lines with fewer than three fields, or with an
/// empty name or code, are dropped. An unparsable price becomes `0.0`.
pub fn parse_product_csv(content: &str) -> Vec<ProductRecord> {
    let mut products = Vec::new();

    for (index, raw) in content.trim().lines().enumerate().skip(1) {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let fields = split_line(line);
        if fields.len() < 3 {
            debug!(line = index + 1, "skipping row with {} field(s)", fields.len());
            continue;
        }

        let name = fields[0].trim();
        let code = fields[1].trim();
        if name.is_empty() || code.is_empty() {
            debug!(line = index + 1, "skipping row without name or code");
            continue;
        }

        products.push(ProductRecord::new(code, name, parse_price(&fields[2])));
    }

    products
}

/// Read and parse a `.csv` file from disk.
pub fn load_csv_file(path: &Path) -> Result<Vec<ProductRecord>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(InvoiceError::InvalidFileType(path.to_path_buf()));
    }

    let bytes = fs::read(path).map_err(|_| InvoiceError::ImportRead(path.to_path_buf()))?;
    let content =
        String::from_utf8(bytes).map_err(|_| InvoiceError::ImportRead(path.to_path_buf()))?;

    Ok(parse_product_csv(&content))
}

fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }

    fields.push(current);
    fields
}

/// Leading-number parse: "5.00 USD" reads as 5.0, "1.5e2" as 150.0,
/// garbage as 0.0.
fn parse_price(raw: &str) -> f64 {
    let s = raw.trim();
    let mut end = 0;
    let mut prev = None;
    for (i, c) in s.char_indices() {
        let sign = c == '-' || c == '+';
        let accepted = c.is_ascii_digit()
            || matches!(c, '.' | 'e' | 'E')
            || (sign && (i == 0 || matches!(prev, Some('e' | 'E'))));
        if !accepted {
            break;
        }
        end = i + c.len_utf8();
        prev = Some(c);
    }

    let mut candidate = &s[..end];
    while !candidate.is_empty() {
        if let Ok(value) = candidate.parse::<f64>() {
            return if value.is_finite() { value } else { 0.0 };
        }
        candidate = &candidate[..candidate.len() - 1];
    }
    0.0
}
