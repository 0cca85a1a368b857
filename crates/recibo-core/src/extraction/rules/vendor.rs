//! Vendor (business name) heuristic.

use super::FieldExtractor;
use super::patterns::{BARE_NUMBER, VENDOR_EXCLUSIONS};

/// Picks the first line that looks like a business name.
pub struct VendorExtractor;

impl VendorExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VendorExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for VendorExtractor {
    type Output = String;

    fn extract_line(&self, line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.chars().count() <= 3 {
            return None;
        }

        let lower = line.to_lowercase();
        if VENDOR_EXCLUSIONS.iter().any(|keyword| lower.contains(keyword)) {
            return None;
        }

        if BARE_NUMBER.is_match(trimmed) {
            return None;
        }

        Some(trimmed.to_string())
    }
}

/// First vendor-like line, trimmed but otherwise verbatim.
pub fn extract_vendor<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    VendorExtractor::new().extract(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_lines_are_skipped() {
        let lines = ["", "  ab ", "SII", "  Farmacias Ahumada  "];
        assert_eq!(extract_vendor(&lines), Some("Farmacias Ahumada".to_string()));
    }

    #[test]
    fn test_excluded_keywords() {
        let lines = [
            "Total Ventas SPA",
            "Dirección: Av. Siempre Viva 742",
            "Comercial Andes Ltda",
        ];
        assert_eq!(extract_vendor(&lines), Some("Comercial Andes Ltda".to_string()));
    }

    #[test]
    fn test_bare_numbers_are_skipped() {
        let extractor = VendorExtractor::new();

        assert_eq!(extractor.extract_line("15.990"), None);
        assert_eq!(extractor.extract_line(" 1234,50 "), None);
        assert_eq!(
            extractor.extract_line("1234 Comercio"),
            Some("1234 Comercio".to_string())
        );
    }

    #[test]
    fn test_no_vendor() {
        let lines = ["Total: $1.000", "Fecha: 01/01/2024"];
        assert_eq!(extract_vendor(&lines), None);
    }
}
