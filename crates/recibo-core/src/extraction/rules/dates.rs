//! Date extraction for Chilean receipts.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use super::FieldExtractor;
use super::patterns::{DATE_PATTERNS, DUE_DATE_PATTERNS, RAW_DATE, RAW_NUMERIC_DATE};

/// Issue date extractor. Yields the raw matched date text.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = String;

    fn extract_line(&self, line: &str) -> Option<String> {
        DATE_PATTERNS
            .iter()
            .filter_map(|pattern| pattern.find(line))
            .find_map(|m| RAW_DATE.find(m.as_str()))
            .map(|m| m.as_str().to_string())
    }
}

/// Due date extractor. Only fires on labeled numeric dates.
pub struct DueDateExtractor;

impl DueDateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DueDateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DueDateExtractor {
    type Output = String;

    fn extract_line(&self, line: &str) -> Option<String> {
        DUE_DATE_PATTERNS
            .iter()
            .filter_map(|pattern| pattern.find(line))
            .find_map(|m| RAW_NUMERIC_DATE.find(m.as_str()))
            .map(|m| m.as_str().to_string())
    }
}

/// First issue date found scanning the lines in order.
pub fn extract_date<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    DateExtractor::new().extract(lines)
}

/// First due date found scanning the lines in order.
pub fn extract_due_date<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    DueDateExtractor::new().extract(lines)
}

lazy_static! {
    static ref NUMERIC_PARTS: Regex =
        Regex::new(r"^(\d{1,2})[-/](\d{1,2})[-/](\d{2,4})$").unwrap();
    static ref SPELLED_PARTS: Regex =
        Regex::new(r"(?i)^(\d{1,2})\s+de\s+(\S+)\s+de\s+(\d{2,4})$").unwrap();
}

/// Interpret a raw extracted date as a calendar date.
///
/// Accepts the two shapes the extractors store. Returns `None` for
/// impossible dates such as `31/02/2024` or unknown month names.
pub fn parse_raw_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Some(caps) = NUMERIC_PARTS.captures(raw) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = parse_year(&caps[3])?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = SPELLED_PARTS.captures(raw) {
        let day: u32 = caps[1].parse().ok()?;
        let month = spanish_month_to_number(&caps[2])?;
        let year = parse_year(&caps[3])?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    match s.len() {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        2 if year <= 50 => Some(2000 + year),
        2 => Some(1900 + year),
        4 => Some(year),
        _ => None,
    }
}

fn spanish_month_to_number(month: &str) -> Option<u32> {
    match month.to_lowercase().as_str() {
        "enero" => Some(1),
        "febrero" => Some(2),
        "marzo" => Some(3),
        "abril" => Some(4),
        "mayo" => Some(5),
        "junio" => Some(6),
        "julio" => Some(7),
        "agosto" => Some(8),
        "septiembre" | "setiembre" => Some(9),
        "octubre" => Some(10),
        "noviembre" => Some(11),
        "diciembre" => Some(12),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_numeric_date() {
        let extractor = DateExtractor::new();

        assert_eq!(extractor.extract_line("12/05/2024"), Some("12/05/2024".to_string()));
        assert_eq!(extractor.extract_line("Fecha: 1-2-24"), Some("1-2-24".to_string()));
        assert_eq!(extractor.extract_line("Sin fecha"), None);
    }

    #[test]
    fn test_extract_spelled_date() {
        let extractor = DateExtractor::new();

        assert_eq!(
            extractor.extract_line("Santiago, 5 de marzo de 2024"),
            Some("5 de marzo de 2024".to_string())
        );
    }

    #[test]
    fn test_spelled_date_is_case_sensitive() {
        let extractor = DateExtractor::new();

        assert_eq!(extractor.extract_line("3 DE ABRIL DE 2024"), None);
        assert_eq!(
            extractor.extract_line("3 de ABRIL de 2024"),
            Some("3 de ABRIL de 2024".to_string())
        );
    }

    #[test]
    fn test_label_is_stripped() {
        let extractor = DateExtractor::new();

        assert_eq!(
            extractor.extract_line("Fecha de emisión: 03/02/2024"),
            Some("03/02/2024".to_string())
        );
    }

    #[test]
    fn test_due_date_requires_label() {
        let extractor = DueDateExtractor::new();

        assert_eq!(extractor.extract_line("15/01/2024"), None);
        assert_eq!(
            extractor.extract_line("Vencimiento: 15/01/2024"),
            Some("15/01/2024".to_string())
        );
        assert_eq!(
            extractor.extract_line("PAGAR ANTES DEL 30-06-2024"),
            Some("30-06-2024".to_string())
        );
    }

    #[test]
    fn test_date_and_due_date_are_independent() {
        let lines = ["Fecha: 01/01/2024", "Vencimiento: 15/01/2024"];

        assert_eq!(extract_date(&lines), Some("01/01/2024".to_string()));
        assert_eq!(extract_due_date(&lines), Some("15/01/2024".to_string()));
    }

    #[test]
    fn test_parse_raw_date() {
        assert_eq!(parse_raw_date("12/05/2024"), NaiveDate::from_ymd_opt(2024, 5, 12));
        assert_eq!(parse_raw_date("1-2-24"), NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(parse_raw_date("1-2-99"), NaiveDate::from_ymd_opt(1999, 2, 1));
        assert_eq!(
            parse_raw_date("5 de Marzo de 2024"),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(parse_raw_date("31/02/2024"), None);
        assert_eq!(parse_raw_date("5 de brumario de 2024"), None);
        assert_eq!(parse_raw_date("12/05/202"), None);
    }
}
