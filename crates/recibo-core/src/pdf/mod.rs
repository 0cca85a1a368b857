//! PDF processing module.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;
use image::DynamicImage;

/// Type of PDF content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfType {
    /// Contains extractable text.
    Text,
    /// Contains only images (scanned receipt).
    Image,
    /// Contains both text and images.
    Hybrid,
    /// Empty or unreadable.
    Empty,
}

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Classify the PDF by whether it carries text, images or both.
    fn analyze(&self, min_text_length: usize) -> PdfType;

    /// Extract text from the entire PDF.
    fn extract_text(&self) -> Result<String>;

    /// Extract embedded images from a page (1-indexed).
    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>>;

    /// The image to OCR for the first page.
    fn first_page_image(&self) -> Result<DynamicImage> {
        self.extract_images(1)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                PdfError::ImageExtraction("no images found on the first page".to_string())
            })
    }
}
