//! Configuration structures for the document pipeline and service.
//!
//! The extraction rule tables are compiled in and deliberately absent here.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{RecError, Result};

/// Main configuration for recibo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// HTTP service configuration.
    pub server: ServerConfig,

    /// Model configuration.
    pub models: ModelConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Run the first OCR pass on an adaptive-threshold enhanced image.
    pub enhance: bool,

    /// Block size for adaptive thresholding (odd).
    pub threshold_block_size: u32,

    /// Constant subtracted from the local mean.
    pub threshold_offset: i32,

    /// Maximum image dimension (longer side) for processing.
    pub max_image_size: u32,

    /// Keep `[UNK]` tokens emitted by the recognizer.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enhance: true,
            threshold_block_size: 11,
            threshold_offset: 2,
            max_image_size: 2048,
            keep_unk: false,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Use embedded text before falling back to OCR.
    pub prefer_embedded_text: bool,

    /// Minimum text length to consider PDF as text-based.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            prefer_embedded_text: true,
            min_text_length: 50,
        }
    }
}

/// HTTP service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Largest accepted upload in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Model file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files. `None` uses the data directory.
    pub model_dir: Option<PathBuf>,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

impl ModelConfig {
    /// File names of the detection model, recognition model and dictionary.
    pub fn files(&self) -> [&str; 3] {
        [&self.detection_model, &self.recognition_model, &self.dictionary]
    }

    /// True when all model files exist in `dir`.
    pub fn is_complete(&self, dir: &std::path::Path) -> bool {
        self.files().iter().all(|name| dir.join(name).exists())
    }
}

impl RecConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| RecError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| RecError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
