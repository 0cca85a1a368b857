//! Rule tables for Chilean receipt extraction.
//!
//! Every table is ordered: extractors try entries top to bottom and the
//! first usable match wins. All tables are compiled once and never mutated.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::receipt::Category;

/// `DD/MM/YYYY` or `DD-MM-YY` shaped dates.
pub const NUMERIC_DATE: &str = r"\d{1,2}[-/]\d{1,2}[-/]\d{2,4}";

/// `DD de <mes> de YYYY` shaped dates.
pub const SPELLED_DATE: &str = r"\d{1,2}\s+de\s+[a-zA-ZáéíóúÁÉÍÓÚñÑ]+\s+de\s+\d{2,4}";

/// Substrings that disqualify a line from being the vendor name.
pub const VENDOR_EXCLUSIONS: &[&str] = &[
    "total",
    "fecha",
    "factura",
    "dirección",
    "monto",
    "valor",
    "precio",
];

/// Expense categories with their keywords, in tie-break order.
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Supermercado,
        &[
            "jumbo",
            "lider",
            "unimarc",
            "santa isabel",
            "tottus",
            "supermercado",
            "super",
            "líder",
            "walmart",
        ],
    ),
    (
        Category::ServiciosBasicos,
        &[
            "luz",
            "agua",
            "gas",
            "electricidad",
            "enel",
            "aguas andinas",
            "metrogas",
            "abastible",
            "gasco",
            "saesa",
            "chilectra",
        ],
    ),
    (
        Category::Telecomunicaciones,
        &[
            "movistar",
            "entel",
            "claro",
            "wom",
            "vtr",
            "gtd",
            "directv",
            "internet",
            "telefonía",
            "móvil",
            "celular",
        ],
    ),
    (
        Category::Transporte,
        &[
            "metro",
            "transantiago",
            "red",
            "bip",
            "uber",
            "cabify",
            "taxi",
            "didi",
            "combustible",
            "copec",
            "shell",
            "estacionamiento",
            "peaje",
        ],
    ),
    (
        Category::Salud,
        &[
            "isapre",
            "fonasa",
            "clínica",
            "hospital",
            "farmacia",
            "cruz verde",
            "salcobrand",
            "ahumada",
            "doctor",
            "médico",
            "consulta",
        ],
    ),
    (
        Category::Educacion,
        &[
            "colegio",
            "universidad",
            "instituto",
            "matrícula",
            "escuela",
            "educación",
            "curso",
            "capacitación",
        ],
    ),
    (
        Category::Entretenimiento,
        &[
            "cine",
            "teatro",
            "netflix",
            "spotify",
            "amazon",
            "concierto",
            "evento",
            "entradas",
            "suscripción",
        ],
    ),
    (
        Category::Restaurantes,
        &[
            "restaurant",
            "restaurante",
            "comida",
            "delivery",
            "pedidosya",
            "ubereats",
            "rappi",
            "doordash",
        ],
    ),
    (
        Category::Ropa,
        &[
            "falabella",
            "paris",
            "ripley",
            "corona",
            "ropa",
            "calzado",
            "vestuario",
            "h&m",
            "zara",
        ],
    ),
    (
        Category::Hogar,
        &[
            "sodimac",
            "easy",
            "homecenter",
            "construcción",
            "muebles",
            "decoración",
            "hogar",
        ],
    ),
];

/// Compile with case folding.
fn compile(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){}", p)).unwrap())
        .collect()
}

/// Compile as written, case-sensitive.
fn compile_exact(patterns: &[String]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

/// Label-gated amount pattern: `<label>: $1.234.567`.
fn labeled_amount(label: &str) -> String {
    format!(r"{}:?\s*\$?\s*([\d.,]+)", label)
}

lazy_static! {
    // Amounts in Chilean pesos, capture group 1 holds the number
    pub static ref AMOUNT_PATTERNS: Vec<Regex> = compile(&[
        r"\$\s*([\d.,]+)".to_string(),
        labeled_amount("total"),
        labeled_amount("monto"),
        labeled_amount("valor"),
        labeled_amount("precio"),
        labeled_amount("pagar"),
        labeled_amount("pago"),
        labeled_amount("subtotal"),
        labeled_amount("total a pagar"),
        labeled_amount("importe"),
        r"([\d.,]+)\s*pesos".to_string(),
        labeled_amount("iva"),
        labeled_amount("neto"),
    ]);

    // Issue dates, bare shapes first. Matched case-sensitively, so labels
    // and the spelled "de" must be lowercase.
    pub static ref DATE_PATTERNS: Vec<Regex> = compile_exact(&[
        NUMERIC_DATE.to_string(),
        SPELLED_DATE.to_string(),
        format!(r"fecha:?\s*{}", NUMERIC_DATE),
        format!(r"fecha de emisión:?\s*{}", NUMERIC_DATE),
        format!(r"emisión:?\s*{}", NUMERIC_DATE),
        format!(r"fecha:?\s*{}", SPELLED_DATE),
    ]);

    // Due dates are always label-gated
    pub static ref DUE_DATE_PATTERNS: Vec<Regex> = compile(&[
        format!(r"vence:?\s*{}", NUMERIC_DATE),
        format!(r"vencimiento:?\s*{}", NUMERIC_DATE),
        format!(r"fecha de vencimiento:?\s*{}", NUMERIC_DATE),
        format!(r"pagar antes del:?\s*{}", NUMERIC_DATE),
    ]);

    // Strips any label captured by the outer date patterns
    pub static ref RAW_DATE: Regex =
        Regex::new(&format!("{}|{}", NUMERIC_DATE, SPELLED_DATE)).unwrap();

    pub static ref RAW_NUMERIC_DATE: Regex = Regex::new(NUMERIC_DATE).unwrap();

    // Invoice/receipt document numbers
    pub static ref INVOICE_PATTERNS: Vec<Regex> = compile(&[
        r"factura:?\s*#?\s*([\w-]+)".to_string(),
        r"boleta:?\s*#?\s*([\w-]+)".to_string(),
        r"documento:?\s*#?\s*([\w-]+)".to_string(),
        r"no[.:]?\s*([\w-]+)".to_string(),
        r"factura electrónica:?\s*#?\s*([\w-]+)".to_string(),
        r"boleta electrónica:?\s*#?\s*([\w-]+)".to_string(),
        r"folio:?\s*([\w-]+)".to_string(),
        r"n°\s*factura:?\s*([\w-]+)".to_string(),
        r"n°\s*boleta:?\s*([\w-]+)".to_string(),
        r"n°\s*documento:?\s*([\w-]+)".to_string(),
    ]);

    pub static ref TRAILING_TOKEN: Regex = Regex::new(r"[\w-]+$").unwrap();

    // A line that is nothing but a decimal number
    pub static ref BARE_NUMBER: Regex = Regex::new(r"^\d+[.,]\d+$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_compile() {
        assert_eq!(AMOUNT_PATTERNS.len(), 13);
        assert_eq!(DATE_PATTERNS.len(), 6);
        assert_eq!(DUE_DATE_PATTERNS.len(), 4);
        assert_eq!(INVOICE_PATTERNS.len(), 10);
        assert_eq!(CATEGORY_KEYWORDS.len(), 10);
    }

    #[test]
    fn test_category_order_is_fixed() {
        let order: Vec<&str> = CATEGORY_KEYWORDS.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "supermercado",
                "servicios_basicos",
                "telecomunicaciones",
                "transporte",
                "salud",
                "educacion",
                "entretenimiento",
                "restaurantes",
                "ropa",
                "hogar",
            ]
        );
    }

    #[test]
    fn test_raw_date_strips_label() {
        let m = RAW_DATE.find("Fecha de emisión: 03/02/2024").unwrap();
        assert_eq!(m.as_str(), "03/02/2024");

        let m = RAW_DATE.find("fecha: 5 de marzo de 2024").unwrap();
        assert_eq!(m.as_str(), "5 de marzo de 2024");
    }
}
