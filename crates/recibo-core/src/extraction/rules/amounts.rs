//! Amount extraction for Chilean receipts.

use super::FieldExtractor;
use super::patterns::AMOUNT_PATTERNS;

/// Amount field extractor.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = f64;

    fn extract_line(&self, line: &str) -> Option<f64> {
        // A candidate that fails to parse falls through to the next pattern
        AMOUNT_PATTERNS
            .iter()
            .filter_map(|pattern| pattern.captures(line))
            .find_map(|caps| parse_clp_amount(&caps[1]))
    }
}

/// First amount found scanning the lines in order.
pub fn extract_amount<S: AsRef<str>>(lines: &[S]) -> Option<f64> {
    AmountExtractor::new().extract(lines)
}

/// Parse a Chilean-formatted amount (e.g., "1.234.567" or "45,50").
///
/// `.` is dropped as a thousands separator and `,` becomes the decimal
/// point. Anything that is not a plain decimal afterwards is rejected.
pub fn parse_clp_amount(s: &str) -> Option<f64> {
    let normalized = s.replace('.', "").replace(',', ".");

    if normalized.is_empty() || !normalized.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }

    normalized.parse::<f64>().ok()
}

/// Format an amount Chilean style, truncated to whole pesos (1.234.567).
///
/// Returns `None` for NaN and infinities.
pub fn format_clp(amount: f64) -> Option<String> {
    if !amount.is_finite() {
        return None;
    }

    let pesos = amount.trunc();
    let digits = format!("{:.0}", pesos.abs());
    let chars: Vec<char> = digits.chars().collect();

    let mut formatted = String::new();
    if pesos < 0.0 {
        formatted.push('-');
    }

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    Some(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clp_amount() {
        assert_eq!(parse_clp_amount("1.234.567"), Some(1234567.0));
        assert_eq!(parse_clp_amount("45,50"), Some(45.5));
        assert_eq!(parse_clp_amount("15.990"), Some(15990.0));
        assert_eq!(parse_clp_amount("1.234,56"), Some(1234.56));
    }

    #[test]
    fn test_parse_clp_amount_rejects_garbage() {
        assert_eq!(parse_clp_amount("."), None);
        assert_eq!(parse_clp_amount(","), None);
        assert_eq!(parse_clp_amount("1,2,3"), None);
        assert_eq!(parse_clp_amount("inf"), None);
    }

    #[test]
    fn test_format_clp() {
        assert_eq!(format_clp(15990.0).as_deref(), Some("15.990"));
        assert_eq!(format_clp(1234567.89).as_deref(), Some("1.234.567"));
        assert_eq!(format_clp(999.0).as_deref(), Some("999"));
        assert_eq!(format_clp(0.0).as_deref(), Some("0"));
        assert_eq!(format_clp(1000.0).as_deref(), Some("1.000"));
        assert_eq!(format_clp(-2500.7).as_deref(), Some("-2.500"));
    }

    #[test]
    fn test_format_clp_huge_values_are_exact() {
        assert_eq!(
            format_clp(1e40).as_deref(),
            Some("10.000.000.000.000.000.303.786.028.427.003.666.890.752")
        );
    }

    #[test]
    fn test_format_clp_non_finite() {
        assert_eq!(format_clp(f64::INFINITY), None);
        assert_eq!(format_clp(f64::NAN), None);
    }

    #[test]
    fn test_labeled_amounts() {
        let extractor = AmountExtractor::new();

        assert_eq!(extractor.extract_line("Total: $15.990"), Some(15990.0));
        assert_eq!(extractor.extract_line("MONTO 8.500"), Some(8500.0));
        assert_eq!(extractor.extract_line("Neto: 12.605"), Some(12605.0));
        assert_eq!(extractor.extract_line("IVA: 2.395"), Some(2395.0));
        assert_eq!(extractor.extract_line("son 20.000 pesos"), Some(20000.0));
        assert_eq!(extractor.extract_line("Gracias por su compra"), None);
    }

    #[test]
    fn test_malformed_candidate_falls_through() {
        let extractor = AmountExtractor::new();

        // "$." fails to parse, the labeled pattern on the same line still wins
        assert_eq!(extractor.extract_line("$. total 4.990"), Some(4990.0));

        // Unparseable lines are skipped for later ones
        let lines = ["Total: $.", "Pago: $3.200"];
        assert_eq!(extract_amount(&lines), Some(3200.0));
    }

    #[test]
    fn test_first_line_wins() {
        let lines = ["Subtotal: $10.000", "Total: $11.900"];
        assert_eq!(extract_amount(&lines), Some(10000.0));
    }
}
