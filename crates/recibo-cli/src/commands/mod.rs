//! CLI subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod models;
pub mod process;
pub mod serve;

use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::{debug, warn};

use recibo_core::models::config::RecConfig;
use recibo_core::ocr::{OcrResult, PureOcrEngine, TextRecognizer};
use recibo_core::{DocumentProcessor, OcrError};

/// Recognizer shared across request handlers.
pub type SharedRecognizer = Box<dyn TextRecognizer + Send + Sync>;

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("recibo")
        .join("config.json")
}

/// Resolve the config file: explicit path, else the default location.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load configuration. A missing default file yields defaults, a missing
/// explicit file is an error.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<RecConfig> {
    if let Some(path) = config_path {
        return Ok(RecConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Loading config from {}", path.display());
        Ok(RecConfig::from_file(&path)?)
    } else {
        Ok(RecConfig::default())
    }
}

/// Default model directory under the user data directory.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("recibo")
        .join("models")
}

/// Model directory: flag, then config, then the data directory.
pub fn resolve_model_dir(config: &RecConfig, flag: Option<&Path>) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| config.models.model_dir.clone())
        .unwrap_or_else(default_model_dir)
}

/// Stand-in recognizer used when the OCR models cannot be loaded.
/// Every call fails, which the processor turns into its degraded reply.
pub struct MissingModels {
    reason: String,
}

impl TextRecognizer for MissingModels {
    fn recognize(&self, _image: &DynamicImage) -> Result<OcrResult, OcrError> {
        Err(OcrError::Unavailable(self.reason.clone()))
    }
}

/// Load the OCR engine, or a [`MissingModels`] stand-in if that fails.
pub fn load_recognizer(config: &RecConfig, model_dir: &Path) -> SharedRecognizer {
    match PureOcrEngine::from_dir(model_dir, &config.models, config.ocr.clone()) {
        Ok(engine) => Box::new(engine),
        Err(e) => {
            warn!("OCR models unavailable: {}", e);
            Box::new(MissingModels {
                reason: format!(
                    "{}. Run 'recibo models download' to install them in {}",
                    e,
                    model_dir.display()
                ),
            })
        }
    }
}

/// Processor for OCR text dumps, which never reach the recognizer.
pub fn text_processor(config: &RecConfig) -> DocumentProcessor<SharedRecognizer> {
    let recognizer: SharedRecognizer = Box::new(MissingModels {
        reason: "OCR engine not loaded for text input".to_string(),
    });
    DocumentProcessor::new(recognizer, config.clone())
}

/// Build a processor with the configured OCR engine.
pub fn build_processor(
    config: &RecConfig,
    model_dir: &Path,
) -> DocumentProcessor<SharedRecognizer> {
    DocumentProcessor::new(load_recognizer(config, model_dir), config.clone())
}
