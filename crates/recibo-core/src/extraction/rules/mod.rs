//! Rule-based field extractors for Chilean receipts.

pub mod amounts;
pub mod category;
pub mod dates;
pub mod invoice_number;
pub mod patterns;
pub mod vendor;

pub use amounts::{AmountExtractor, extract_amount, format_clp, parse_clp_amount};
pub use category::{CategoryDetector, detect_category};
pub use dates::{DateExtractor, DueDateExtractor, extract_date, extract_due_date, parse_raw_date};
pub use invoice_number::{InvoiceNumberExtractor, extract_invoice_number};
pub use vendor::{VendorExtractor, extract_vendor};

/// Trait for line-oriented field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Try to extract the field from a single OCR line.
    fn extract_line(&self, line: &str) -> Option<Self::Output>;

    /// First line, in order, that yields a value.
    fn extract<S: AsRef<str>>(&self, lines: &[S]) -> Option<Self::Output> {
        lines.iter().find_map(|line| self.extract_line(line.as_ref()))
    }
}
