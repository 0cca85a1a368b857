//! Core library for Chilean receipt and bill processing.
//!
//! This crate provides:
//! - Rule-based extraction of amount, dates, vendor, invoice number and
//!   expense category from OCR text
//! - PDF processing (embedded text and first-page images)
//! - An OCR seam with image preprocessing and a blank-result fallback
//! - Receipt data models and configuration

pub mod document;
pub mod error;
pub mod extraction;
pub mod models;
pub mod ocr;
pub mod pdf;

pub use document::{DocumentKind, DocumentProcessor};
pub use error::{OcrError, PdfError, RecError, Result};
pub use extraction::rules::{format_clp, parse_clp_amount, parse_raw_date};
pub use extraction::{ExtractionEngine, extract, extract_text};
pub use models::config::RecConfig;
pub use models::receipt::{Category, Currency, ExtractedData, ExtractionResult, ProcessResponse};
pub use ocr::{OcrResult, TextBox, TextRecognizer};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{PdfProcessor, PdfType};
