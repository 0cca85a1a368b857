//! Keyword-based expense category detection.

use crate::models::receipt::Category;

use super::patterns::CATEGORY_KEYWORDS;

/// Whole-document category detector.
pub struct CategoryDetector {
    table: &'static [(Category, &'static [&'static str])],
}

impl CategoryDetector {
    pub fn new() -> Self {
        Self {
            table: CATEGORY_KEYWORDS,
        }
    }

    /// Pick the category with the most keyword hits in `text`.
    ///
    /// Each keyword counts once, as a plain substring of the lowercased
    /// text. Ties keep the category that comes first in the table; zero
    /// hits means no category.
    pub fn detect(&self, text: &str) -> Option<Category> {
        let mut best: Option<(Category, usize)> = None;
        for (category, hits) in self.scores(text) {
            let best_hits = best.map(|(_, n)| n).unwrap_or(0);
            if hits > best_hits {
                best = Some((category, hits));
            }
        }

        best.map(|(category, _)| category)
    }

    /// Keyword hits per category, in table order.
    pub fn scores(&self, text: &str) -> Vec<(Category, usize)> {
        let text = text.to_lowercase();
        self.table
            .iter()
            .map(|(category, keywords)| {
                (*category, keywords.iter().filter(|k| text.contains(*k)).count())
            })
            .collect()
    }
}

impl Default for CategoryDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Detect the category of a whole document given as lines.
pub fn detect_category<S: AsRef<str>>(lines: &[S]) -> Option<Category> {
    let text = lines
        .iter()
        .map(|l| l.as_ref())
        .collect::<Vec<_>>()
        .join("\n");
    CategoryDetector::new().detect(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_keyword() {
        assert_eq!(
            CategoryDetector::new().detect("JUMBO LOS DOMINICOS"),
            Some(Category::Supermercado)
        );
    }

    #[test]
    fn test_most_hits_wins() {
        // one supermarket hit against two health hits
        let text = "Tottus\nFarmacia Cruz Verde";
        assert_eq!(CategoryDetector::new().detect(text), Some(Category::Salud));
    }

    #[test]
    fn test_tie_keeps_table_order() {
        // movistar -> telecomunicaciones, hospital -> salud, one hit each
        let lines = ["Movistar", "Hospital"];
        let scores = CategoryDetector::new().scores("movistar\nhospital");
        assert_eq!(scores[2], (Category::Telecomunicaciones, 1));
        assert_eq!(scores[4], (Category::Salud, 1));
        assert_eq!(detect_category(&lines), Some(Category::Telecomunicaciones));

        // order of appearance in the text does not matter
        let lines = ["Hospital", "Movistar"];
        assert_eq!(detect_category(&lines), Some(Category::Telecomunicaciones));
    }

    #[test]
    fn test_no_hits() {
        assert_eq!(CategoryDetector::new().detect("FERRETERIA EL CLAVO"), None);
        assert_eq!(detect_category::<&str>(&[]), None);
    }

    #[test]
    fn test_keyword_counts_once() {
        let scores = CategoryDetector::new().scores("jumbo jumbo jumbo");
        assert_eq!(scores[0], (Category::Supermercado, 1));
    }
}
