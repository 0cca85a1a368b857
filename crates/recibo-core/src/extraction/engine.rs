//! Single-pass extraction engine.

use crate::models::receipt::ExtractionResult;

use super::description::describe;
use super::rules::{
    AmountExtractor, CategoryDetector, DateExtractor, DueDateExtractor, FieldExtractor,
    InvoiceNumberExtractor, VendorExtractor,
};

/// Rule-based extraction engine over the compiled-in rule tables.
///
/// Holds no mutable state; one instance can serve any number of threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractionEngine;

impl ExtractionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Extract financial fields from OCR lines.
    ///
    /// Never fails: fields with no matching rule stay `None`.
    pub fn extract<S: AsRef<str>>(&self, lines: &[S]) -> ExtractionResult {
        let amounts = AmountExtractor::new();
        let dates = DateExtractor::new();
        let due_dates = DueDateExtractor::new();
        let invoice_numbers = InvoiceNumberExtractor::new();
        let vendors = VendorExtractor::new();

        let mut result = ExtractionResult::empty();

        // Whole-document pass, independent of the line loop
        let text = lines
            .iter()
            .map(|l| l.as_ref())
            .collect::<Vec<_>>()
            .join("\n");
        result.category = CategoryDetector::new().detect(&text);

        for line in lines {
            let line = line.as_ref();

            if result.amount.is_none() {
                result.amount = amounts.extract_line(line);
            }
            if result.date.is_none() {
                result.date = dates.extract_line(line);
            }
            if result.due_date.is_none() {
                result.due_date = due_dates.extract_line(line);
            }
            if result.invoice_number.is_none() {
                result.invoice_number = invoice_numbers.extract_line(line);
            }
            if result.vendor.is_none() {
                result.vendor = vendors.extract_line(line);
            }
        }

        result.description = describe(result.vendor.as_deref(), result.amount, result.category);
        result
    }

    /// Split raw OCR text on `\n` and extract.
    pub fn extract_text(&self, text: &str) -> ExtractionResult {
        let lines: Vec<&str> = text.split('\n').collect();
        self.extract(&lines)
    }
}

/// Extract financial fields from OCR lines with the default engine.
pub fn extract<S: AsRef<str>>(lines: &[S]) -> ExtractionResult {
    ExtractionEngine::new().extract(lines)
}

/// Extract financial fields from a raw OCR text block.
pub fn extract_text(text: &str) -> ExtractionResult {
    ExtractionEngine::new().extract_text(text)
}
