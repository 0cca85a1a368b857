//! Turns an uploaded file into a [`ProcessResponse`].
//!
//! PDFs use their embedded text when there is enough of it and otherwise
//! OCR the first image of the first page. Images go straight to OCR.
//! Plain-text files are treated as an OCR dump and only run through
//! field extraction.

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::{PdfError, RecError, Result};
use crate::extraction::extract_text;
use crate::models::config::RecConfig;
use crate::models::receipt::ProcessResponse;
use crate::ocr::{ImagePreprocessor, TextRecognizer, recognize_with_fallback};
use crate::pdf::{PdfExtractor, PdfProcessor};

/// What an upload is, judged from its name and content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
    Image,
}

impl DocumentKind {
    /// Detect the kind from the content type, falling back to the file
    /// extension. Anything unrecognised is assumed to be an image.
    pub fn detect(filename: Option<&str>, content_type: Option<&str>) -> Self {
        let content_type = content_type.map(|ct| ct.trim().to_ascii_lowercase());
        let extension = filename
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match (content_type.as_deref(), extension.as_deref()) {
            (Some("application/pdf"), _) | (_, Some("pdf")) => DocumentKind::Pdf,
            (Some(ct), _) if ct.starts_with("text/plain") => DocumentKind::Text,
            (_, Some("txt")) => DocumentKind::Text,
            _ => DocumentKind::Image,
        }
    }
}

/// Where the text of a document came from.
enum TextSource {
    Text(String),
    OcrFailed(String),
}

/// Runs documents through text acquisition and field extraction.
pub struct DocumentProcessor<R: TextRecognizer> {
    recognizer: R,
    preprocessor: ImagePreprocessor,
    config: RecConfig,
}

impl<R: TextRecognizer> DocumentProcessor<R> {
    /// Create a processor around a recognizer.
    pub fn new(recognizer: R, config: RecConfig) -> Self {
        let preprocessor = ImagePreprocessor::from_config(&config.ocr);
        Self {
            recognizer,
            preprocessor,
            config,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &RecConfig {
        &self.config
    }

    /// Process one uploaded document.
    ///
    /// Decode failures are errors. OCR engine failures are not: they yield
    /// the degraded response with zero confidence.
    pub fn process(
        &self,
        bytes: &[u8],
        filename: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<ProcessResponse> {
        if bytes.is_empty() {
            return Err(RecError::UnsupportedFormat("empty upload".to_string()));
        }

        let kind = DocumentKind::detect(filename, content_type);
        debug!(
            "Processing {} ({} bytes) as {:?}",
            filename.unwrap_or("<unnamed>"),
            bytes.len(),
            kind
        );

        let source = match kind {
            DocumentKind::Text => TextSource::Text(String::from_utf8_lossy(bytes).into_owned()),
            DocumentKind::Image => {
                let image = image::load_from_memory(bytes)?;
                self.ocr(&image)
            }
            DocumentKind::Pdf => self.pdf_text(bytes)?,
        };

        let response = match source {
            TextSource::OcrFailed(error) => ProcessResponse::ocr_failed(error),
            TextSource::Text(text) if text.trim().is_empty() => {
                warn!("No text found in {}", filename.unwrap_or("document"));
                ProcessResponse::empty(text)
            }
            TextSource::Text(text) => {
                let result = extract_text(&text);
                ProcessResponse::extracted(text, result)
            }
        };

        info!(
            "Processed {}: {} chars, confidence {:.2}",
            filename.unwrap_or("document"),
            response.text.len(),
            response.confidence
        );
        Ok(response)
    }

    fn pdf_text(&self, bytes: &[u8]) -> Result<TextSource> {
        let pdf = PdfExtractor::from_bytes(bytes)?;
        let pdf_config = &self.config.pdf;

        if pdf_config.prefer_embedded_text {
            match pdf.extract_text() {
                Ok(text) if text.trim().chars().count() >= pdf_config.min_text_length => {
                    debug!("Using embedded PDF text ({} chars)", text.len());
                    return Ok(TextSource::Text(text));
                }
                Ok(_) => debug!("Embedded PDF text too short, falling back to OCR"),
                Err(e) => debug!("Embedded text extraction failed: {}", e),
            }
        }

        match pdf.first_page_image() {
            Ok(image) => Ok(self.ocr(&image)),
            Err(PdfError::ImageExtraction(reason)) => {
                warn!("Nothing to OCR on the first page: {}", reason);
                Ok(TextSource::Text(String::new()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn ocr(&self, image: &DynamicImage) -> TextSource {
        let enhance = self.config.ocr.enhance;
        match recognize_with_fallback(&self.recognizer, &self.preprocessor, image, enhance) {
            Ok(outcome) => {
                if outcome.used_fallback {
                    debug!("Kept text from the unenhanced image");
                }
                TextSource::Text(outcome.result.text)
            }
            Err(e) => {
                warn!("OCR failed: {}", e);
                TextSource::OcrFailed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use crate::models::receipt::{Category, ExtractedData, ExtractionResult};
    use crate::ocr::OcrResult;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    enum FakeRecognizer {
        Text(&'static str),
        Failing,
    }

    impl TextRecognizer for FakeRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> std::result::Result<OcrResult, OcrError> {
            match self {
                FakeRecognizer::Text(text) => Ok(OcrResult::from_text(*text)),
                FakeRecognizer::Failing => Err(OcrError::Recognition("engine crashed".to_string())),
            }
        }
    }

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::new_rgb8(8, 8)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn processor(recognizer: FakeRecognizer) -> DocumentProcessor<FakeRecognizer> {
        DocumentProcessor::new(recognizer, RecConfig::default())
    }

    #[test]
    fn test_detect_kind() {
        assert_eq!(DocumentKind::detect(Some("boleta.PDF"), None), DocumentKind::Pdf);
        assert_eq!(DocumentKind::detect(None, Some("application/pdf")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::detect(Some("dump.txt"), None), DocumentKind::Text);
        assert_eq!(
            DocumentKind::detect(Some("upload"), Some("text/plain; charset=utf-8")),
            DocumentKind::Text
        );
        assert_eq!(DocumentKind::detect(Some("foto.jpg"), Some("image/jpeg")), DocumentKind::Image);
        assert_eq!(DocumentKind::detect(None, None), DocumentKind::Image);
    }

    #[test]
    fn test_text_upload_is_extracted() {
        let text = "SUPERMERCADO LIDER\nTotal: $12.990\nFecha: 05/03/2024";
        let response = processor(FakeRecognizer::Failing)
            .process(text.as_bytes(), Some("dump.txt"), None)
            .unwrap();

        assert_eq!(response.confidence, 0.85);
        let fields = response.fields().unwrap();
        assert_eq!(fields.amount, Some(12990.0));
        assert_eq!(fields.date.as_deref(), Some("05/03/2024"));
        assert_eq!(fields.vendor.as_deref(), Some("SUPERMERCADO LIDER"));
        assert_eq!(fields.category, Some(Category::Supermercado));
    }

    #[test]
    fn test_image_goes_through_ocr() {
        let response = processor(FakeRecognizer::Text("Farmacia Cruz Verde\nMonto: $4.500"))
            .process(&png_bytes(), Some("foto.png"), Some("image/png"))
            .unwrap();

        assert_eq!(response.text, "Farmacia Cruz Verde\nMonto: $4.500");
        let fields = response.fields().unwrap();
        assert_eq!(fields.amount, Some(4500.0));
        assert_eq!(fields.category, Some(Category::Salud));
    }

    #[test]
    fn test_blank_ocr_has_zero_confidence() {
        let response = processor(FakeRecognizer::Text("   "))
            .process(&png_bytes(), Some("foto.png"), None)
            .unwrap();

        assert_eq!(response.confidence, 0.0);
        assert_eq!(response.fields(), Some(&ExtractionResult::empty()));
    }

    #[test]
    fn test_ocr_failure_is_degraded_response() {
        let response = processor(FakeRecognizer::Failing)
            .process(&png_bytes(), Some("foto.png"), None)
            .unwrap();

        assert_eq!(response.text, "Falló el procesamiento OCR");
        assert_eq!(response.confidence, 0.0);
        assert!(matches!(
            response.extracted_data,
            ExtractedData::Failed { ref error } if error.contains("engine crashed")
        ));
    }

    #[test]
    fn test_undecodable_image_is_client_error() {
        let err = processor(FakeRecognizer::Text("x"))
            .process(b"definitely not an image", Some("foto.jpg"), None)
            .unwrap_err();

        assert!(matches!(err, RecError::Image(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_empty_upload_is_rejected() {
        let err = processor(FakeRecognizer::Text("x"))
            .process(b"", Some("foto.jpg"), None)
            .unwrap_err();

        assert!(matches!(err, RecError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_broken_pdf_is_error() {
        let err = processor(FakeRecognizer::Text("x"))
            .process(b"%PDF-garbage", Some("boleta.pdf"), None)
            .unwrap_err();

        assert!(matches!(err, RecError::Pdf(_)));
    }
}
