//! Receipt/invoice number extraction (factura, boleta, folio).

use regex::Captures;

use super::FieldExtractor;
use super::patterns::{INVOICE_PATTERNS, TRAILING_TOKEN};

/// Invoice number extractor.
pub struct InvoiceNumberExtractor;

impl InvoiceNumberExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InvoiceNumberExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for InvoiceNumberExtractor {
    type Output = String;

    fn extract_line(&self, line: &str) -> Option<String> {
        // Numbers are reported lowercased. The first pattern that matches
        // decides, even if it yields nothing.
        let line = line.to_lowercase();
        let caps = INVOICE_PATTERNS.iter().find_map(|pattern| pattern.captures(&line))?;
        token_from_captures(&caps)
    }
}

/// Capture group 1 if present, otherwise the trailing token of the match.
fn token_from_captures(caps: &Captures<'_>) -> Option<String> {
    if let Some(group) = caps.get(1) {
        return Some(group.as_str().to_string());
    }

    TRAILING_TOKEN
        .find(caps.get(0)?.as_str())
        .map(|m| m.as_str().to_string())
}

/// First invoice number found scanning the lines in order.
pub fn extract_invoice_number<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    InvoiceNumberExtractor::new().extract(lines)
}
