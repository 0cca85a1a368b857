//! Receipt data models produced by the extraction engine.

use serde::{Deserialize, Serialize};

/// Structured financial data extracted from one OCR text block.
///
/// Every field except `currency` is optional: `None` means no rule matched,
/// which is distinct from a matched-but-empty value. Absent fields serialize
/// as JSON `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Amount in pesos, parsed from Chilean-formatted text.
    pub amount: Option<f64>,

    /// Issue date, exactly as matched (`12/05/2024`, `5 de marzo de 2024`).
    pub date: Option<String>,

    /// Human-readable summary derived from vendor, amount and category.
    pub description: Option<String>,

    /// Line chosen as the business name.
    pub vendor: Option<String>,

    /// Receipt, invoice or folio number.
    pub invoice_number: Option<String>,

    /// Expense category inferred from keywords.
    pub category: Option<Category>,

    /// Payment due date, exactly as matched.
    pub due_date: Option<String>,

    /// Always Chilean pesos.
    pub currency: Currency,
}

impl ExtractionResult {
    /// Result with every optional field absent.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when no rule matched at all.
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.date.is_none()
            && self.description.is_none()
            && self.vendor.is_none()
            && self.invoice_number.is_none()
            && self.category.is_none()
            && self.due_date.is_none()
    }
}

/// Currency tag. The only supported locale is Chile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// Chilean peso.
    #[default]
    #[serde(rename = "CLP")]
    Clp,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Clp => "CLP",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Closed set of expense categories common in Chile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Supermarkets (Jumbo, Líder, Unimarc...).
    Supermercado,
    /// Electricity, water and gas.
    ServiciosBasicos,
    /// Phone, internet and TV.
    Telecomunicaciones,
    /// Public transport, ride hailing, fuel and tolls.
    Transporte,
    /// Health insurance, clinics and pharmacies.
    Salud,
    /// Schools, universities and courses.
    Educacion,
    /// Cinema, streaming and events.
    Entretenimiento,
    /// Restaurants and food delivery.
    Restaurantes,
    /// Clothing and department stores.
    Ropa,
    /// Home improvement and furniture.
    Hogar,
}

impl Category {
    /// The snake_case tag used in JSON and descriptions.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Supermercado => "supermercado",
            Category::ServiciosBasicos => "servicios_basicos",
            Category::Telecomunicaciones => "telecomunicaciones",
            Category::Transporte => "transporte",
            Category::Salud => "salud",
            Category::Educacion => "educacion",
            Category::Entretenimiento => "entretenimiento",
            Category::Restaurantes => "restaurantes",
            Category::Ropa => "ropa",
            Category::Hogar => "hogar",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed confidence reported for a successful OCR pass.
pub const DEFAULT_CONFIDENCE: f32 = 0.85;

/// Body returned for one processed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    /// Raw OCR text.
    pub text: String,

    /// Extracted fields, or the OCR failure message.
    pub extracted_data: ExtractedData,

    /// Coarse OCR quality score, not extraction accuracy.
    pub confidence: f32,
}

/// Payload of [`ProcessResponse::extracted_data`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractedData {
    /// Extraction ran (or was skipped on empty text).
    Fields(ExtractionResult),
    /// The OCR engine failed; extraction never ran.
    Failed { error: String },
}

impl ProcessResponse {
    /// Response for a successful OCR pass.
    pub fn extracted(text: String, result: ExtractionResult) -> Self {
        Self {
            text,
            extracted_data: ExtractedData::Fields(result),
            confidence: DEFAULT_CONFIDENCE,
        }
    }

    /// Response for OCR that produced no text.
    pub fn empty(text: String) -> Self {
        Self {
            text,
            extracted_data: ExtractedData::Fields(ExtractionResult::empty()),
            confidence: 0.0,
        }
    }

    /// Response for an OCR engine failure.
    pub fn ocr_failed(error: impl std::fmt::Display) -> Self {
        Self {
            text: "Falló el procesamiento OCR".to_string(),
            extracted_data: ExtractedData::Failed {
                error: error.to_string(),
            },
            confidence: 0.0,
        }
    }

    /// Extracted fields, if extraction ran.
    pub fn fields(&self) -> Option<&ExtractionResult> {
        match &self.extracted_data {
            ExtractedData::Fields(result) => Some(result),
            ExtractedData::Failed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_result_serializes_nulls() {
        let json = serde_json::to_value(ExtractionResult::empty()).unwrap();
        assert_eq!(json["amount"], serde_json::Value::Null);
        assert_eq!(json["vendor"], serde_json::Value::Null);
        assert_eq!(json["currency"], "CLP");
    }

    #[test]
    fn test_category_tags() {
        let json = serde_json::to_string(&Category::ServiciosBasicos).unwrap();
        assert_eq!(json, "\"servicios_basicos\"");
        let parsed: Category = serde_json::from_str("\"salud\"").unwrap();
        assert_eq!(parsed, Category::Salud);
        assert!(serde_json::from_str::<Category>("\"otros\"").is_err());
    }

    #[test]
    fn test_ocr_failure_payload() {
        let response = ProcessResponse::ocr_failed("engine unavailable");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["extracted_data"]["error"], "engine unavailable");
        assert_eq!(json["confidence"], 0.0);
        assert!(response.fields().is_none());
    }

    #[test]
    fn test_untagged_roundtrip_keeps_fields() {
        let mut result = ExtractionResult::empty();
        result.amount = Some(1500.0);
        let response = ProcessResponse::extracted("x".to_string(), result.clone());

        let json = serde_json::to_string(&response).unwrap();
        let back: ProcessResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fields(), Some(&result));
    }
}
