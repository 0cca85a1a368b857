//! PDF text and image extraction using lopdf and pdf-extract.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{PdfProcessor, PdfType, Result};
use crate::error::PdfError;

/// PDF content extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Load a PDF from bytes in one step.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut extractor = Self::new();
        extractor.load(data)?;
        Ok(extractor)
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("no document loaded".to_string()))
    }

    /// Scan every object in the document for image streams.
    fn extract_all_images(&self) -> Vec<DynamicImage> {
        let Some(doc) = self.document.as_ref() else {
            return Vec::new();
        };

        let images: Vec<DynamicImage> = doc
            .objects
            .values()
            .filter_map(|object| decode_image_object(doc, object))
            .collect();

        debug!("Found {} images in document", images.len());
        images
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract reads the raw bytes, so hand it the decrypted copy
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn analyze(&self, min_text_length: usize) -> PdfType {
        let text = self.extract_text().unwrap_or_default();
        let has_text = text.trim().chars().count() >= min_text_length.max(1);
        let has_images = !self.extract_all_images().is_empty();

        let pdf_type = match (has_text, has_images) {
            (true, false) => PdfType::Text,
            (false, true) => PdfType::Image,
            (true, true) => PdfType::Hybrid,
            (false, false) => PdfType::Empty,
        };

        debug!("PDF analysis: has_text={}, has_images={} -> {:?}", has_text, has_images, pdf_type);
        pdf_type
    }

    fn extract_text(&self) -> Result<String> {
        self.document()?;
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let doc = self.document()?;
        let pages = doc.get_pages();
        let page_id = pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut images = Vec::new();

        if let Some(resources) = page_resources(doc, *page_id)
            && let Ok(xobjects) = resources.get(b"XObject")
            && let Ok((_, Object::Dictionary(xobjects))) = doc.dereference(xobjects)
        {
            for (_name, reference) in xobjects.iter() {
                if let Ok((_, object)) = doc.dereference(reference)
                    && let Some(image) = decode_image_object(doc, object)
                {
                    images.push(image);
                }
            }
        }

        // Some scanners write images without listing them as page XObjects
        if images.is_empty() {
            debug!("No XObject images found on page {}, scanning all objects", page);
            images = self.extract_all_images();
        }

        debug!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }
}

/// Resources dictionary for a page, walking up `Parent` for inherited ones.
fn page_resources(doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
    let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
        return None;
    };

    if let Ok(resources) = dict.get(b"Resources")
        && let Ok((_, Object::Dictionary(resources))) = doc.dereference(resources)
    {
        return Some(resources.clone());
    }

    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => page_resources(doc, *parent_id),
        _ => None,
    }
}

fn decode_image_object(doc: &Document, object: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = object else {
        return None;
    };
    let dict = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    trace!("Found image object: {}x{}", width, height);

    let filter = dict.get(b"Filter").ok().and_then(|filter| match filter {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(filters) => filters.first().and_then(|o| o.as_name().ok()),
        _ => None,
    });

    match filter {
        Some(b"DCTDecode") => {
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                .ok();
        }
        Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
            trace!("Skipping image with unsupported filter");
            return None;
        }
        _ => {}
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);

    if bits != 8 {
        trace!("Unsupported bits per component: {}", bits);
        return None;
    }

    decode_raw(data, width, height, color_space)
}

fn decode_raw(
    mut data: Vec<u8>,
    width: u32,
    height: u32,
    color_space: &[u8],
) -> Option<DynamicImage> {
    let pixels = (width as usize) * (height as usize);

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            data.truncate(pixels * 3);
            RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            data.truncate(pixels);
            GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode image: colorspace={}, data_len={}",
                String::from_utf8_lossy(color_space),
                data.len()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
        assert!(extractor.extract_text().is_err());
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = PdfExtractor::from_bytes(b"not a pdf").err();
        assert!(matches!(err, Some(PdfError::Parse(_))));
    }

    #[test]
    fn test_decode_raw_gray() {
        let image = decode_raw(vec![0, 128, 255, 64], 2, 2, b"DeviceGray").unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.to_luma8().get_pixel(1, 0)[0], 128);
    }

    #[test]
    fn test_decode_raw_short_buffer() {
        assert!(decode_raw(vec![0; 5], 2, 2, b"DeviceRGB").is_none());
        assert!(decode_raw(vec![0; 12], 2, 2, b"Indexed").is_none());
    }
}
