//! Financial field extraction from OCR text.
//!
//! The engine runs every sub-extractor over the same lines in a single
//! forward pass (first match per field wins), detects the category over the
//! whole document, and derives the description last.

mod description;
mod engine;
pub mod rules;

pub use description::describe;
pub use engine::{ExtractionEngine, extract, extract_text};
pub use rules::FieldExtractor;
