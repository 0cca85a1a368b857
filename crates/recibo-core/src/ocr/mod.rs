//! OCR collaborator: the recognizer seam, preprocessing and the
//! enhanced-then-original fallback policy.

mod preprocessing;
#[cfg(feature = "native")]
mod pure_engine;

pub use preprocessing::ImagePreprocessor;
#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::OcrError;

/// A detected text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub score: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Result of OCR processing on an image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResult {
    /// Detected and recognized text boxes.
    pub boxes: Vec<TextBox>,

    /// Full text (boxes joined with newlines).
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrResult {
    /// Result carrying only text, for recognizers without box output.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Sort boxes by reading order (top-to-bottom, left-to-right) and
    /// rebuild the text, one box per line.
    pub fn sort_by_reading_order(&mut self) {
        self.boxes.sort_by(|a, b| {
            let (ax, ay, _, _) = a.rect();
            let (bx, by, _, _) = b.rect();

            // Group by approximate vertical position (within 20 pixels)
            let row_a = (ay / 20.0) as i32;
            let row_b = (by / 20.0) as i32;

            if row_a != row_b {
                row_a.cmp(&row_b)
            } else {
                ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
            }
        });

        self.text = self
            .boxes
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
    }

    /// True when no visible text was recognized.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Anything that can turn an image into text.
pub trait TextRecognizer {
    /// Recognize text in a single image.
    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for &T {
    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
        (**self).recognize(image)
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
        (**self).recognize(image)
    }
}

/// Outcome of OCR with the fallback policy applied.
#[derive(Debug, Clone)]
pub struct OcrOutcome {
    /// The result that was kept.
    pub result: OcrResult,
    /// True when the enhanced pass was blank and the original image was used.
    pub used_fallback: bool,
}

/// Recognize text, retrying on the unenhanced image when the enhanced
/// pass comes back blank.
///
/// `enhance = false` skips straight to the grayscale image.
pub fn recognize_with_fallback<R: TextRecognizer>(
    recognizer: &R,
    preprocessor: &ImagePreprocessor,
    image: &DynamicImage,
    enhance: bool,
) -> Result<OcrOutcome, OcrError> {
    let gray = preprocessor.grayscale(image);

    if enhance {
        let enhanced = preprocessor.enhance(&gray);
        let result = recognizer.recognize(&enhanced)?;
        if !result.is_blank() {
            debug!("Enhanced OCR pass produced {} chars", result.text.len());
            return Ok(OcrOutcome {
                result,
                used_fallback: false,
            });
        }
        warn!("No text found in enhanced image, retrying with the original");
    }

    let result = recognizer.recognize(&gray)?;
    Ok(OcrOutcome {
        result,
        used_fallback: enhance,
    })
}
