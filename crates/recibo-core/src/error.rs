//! Error types for the recibo-core library.
//!
//! Field extraction itself never fails; these errors belong to the
//! collaborators that turn uploaded files into text.

use thiserror::Error;

/// Main error type for the recibo library.
#[derive(Error, Debug)]
pub enum RecError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Image decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The upload is neither a PDF, an image nor plain text.
    #[error("unsupported document: {0}")]
    UnsupportedFormat(String),
}

impl RecError {
    /// True when the caller sent something unusable, as opposed to a
    /// failure on our side.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RecError::Image(_) | RecError::UnsupportedFormat(_))
    }
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The engine failed while reading the image.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// No OCR engine is available in this build or configuration.
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),
}

/// Result type for the recibo library.
pub type Result<T> = std::result::Result<T, RecError>;
