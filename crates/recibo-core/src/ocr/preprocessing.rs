//! Image preprocessing for OCR.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use tracing::debug;

use crate::models::config::OcrConfig;

/// Image preprocessor for the OCR pipeline.
pub struct ImagePreprocessor {
    /// Maximum image dimension.
    max_size: u32,
    /// Neighbourhood size for adaptive thresholding.
    block_size: u32,
    /// Constant subtracted from the local mean.
    offset: i32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self {
            max_size: 2048,
            block_size: 11,
            offset: 2,
        }
    }

    /// Create a preprocessor from OCR configuration.
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new()
            .with_max_size(config.max_image_size)
            .with_threshold(config.threshold_block_size, config.threshold_offset)
    }

    /// Set maximum image dimension.
    pub fn with_max_size(mut self, size: u32) -> Self {
        self.max_size = size.max(1);
        self
    }

    /// Set adaptive threshold parameters. Even block sizes are rounded up.
    pub fn with_threshold(mut self, block_size: u32, offset: i32) -> Self {
        self.block_size = block_size.max(3) | 1;
        self.offset = offset;
        self
    }

    /// Downscale to the maximum size and convert to grayscale.
    pub fn grayscale(&self, image: &DynamicImage) -> DynamicImage {
        let (width, height) = image.dimensions();
        let (new_width, new_height) = self.calculate_resize_dimensions(width, height);

        let image = if (new_width, new_height) != (width, height) {
            debug!("Resizing image {}x{} -> {}x{}", width, height, new_width, new_height);
            image.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
        } else {
            image.clone()
        };

        match image {
            DynamicImage::ImageLuma8(_) => image,
            other => DynamicImage::ImageLuma8(other.to_luma8()),
        }
    }

    /// Apply adaptive thresholding for better contrast.
    pub fn enhance(&self, image: &DynamicImage) -> DynamicImage {
        let gray = image.to_luma8();
        let enhanced = self.adaptive_threshold(&gray);

        DynamicImage::ImageLuma8(enhanced)
    }

    fn calculate_resize_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let max_dim = width.max(height);

        if max_dim <= self.max_size {
            return (width, height);
        }

        let scale = self.max_size as f32 / max_dim as f32;
        let new_width = (width as f32 * scale) as u32;
        let new_height = (height as f32 * scale) as u32;

        (new_width.max(1), new_height.max(1))
    }

    fn adaptive_threshold(&self, image: &GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let mut result = GrayImage::new(width, height);

        // Summed-area table, one extra row and column of zeros
        let stride = (width + 1) as usize;
        let mut integral = vec![0u64; stride * (height + 1) as usize];
        for y in 0..height {
            let mut row_sum = 0u64;
            for x in 0..width {
                row_sum += image.get_pixel(x, y)[0] as u64;
                let idx = (y as usize + 1) * stride + x as usize + 1;
                integral[idx] = integral[idx - stride] + row_sum;
            }
        }

        let half_block = self.block_size / 2;

        for y in 0..height {
            for x in 0..width {
                let y_start = y.saturating_sub(half_block) as usize;
                let y_end = (y + half_block + 1).min(height) as usize;
                let x_start = x.saturating_sub(half_block) as usize;
                let x_end = (x + half_block + 1).min(width) as usize;

                let sum = integral[y_end * stride + x_end] + integral[y_start * stride + x_start]
                    - integral[y_start * stride + x_end]
                    - integral[y_end * stride + x_start];
                let count = ((y_end - y_start) * (x_end - x_start)) as u64;

                let mean = (sum / count) as i32;
                let threshold = mean - self.offset;
                let pixel_value = image.get_pixel(x, y)[0] as i32;

                let output = if pixel_value > threshold { 255 } else { 0 };
                result.put_pixel(x, y, Luma([output]));
            }
        }

        result
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_dimensions() {
        let preprocessor = ImagePreprocessor::new().with_max_size(960);

        // Image smaller than target
        let (w, h) = preprocessor.calculate_resize_dimensions(500, 300);
        assert_eq!((w, h), (500, 300));

        // Image larger than target
        let (w, h) = preprocessor.calculate_resize_dimensions(1920, 1080);
        assert_eq!(w, 960);
        assert!(h < 960);
    }

    #[test]
    fn test_grayscale_converts_color() {
        let rgb = DynamicImage::new_rgb8(40, 20);
        let gray = ImagePreprocessor::new().grayscale(&rgb);

        assert!(matches!(gray, DynamicImage::ImageLuma8(_)));
        assert_eq!(gray.dimensions(), (40, 20));
    }

    #[test]
    fn test_enhance_binarizes() {
        let mut img = GrayImage::from_pixel(30, 30, Luma([200]));
        for x in 10..20 {
            img.put_pixel(x, 15, Luma([20]));
        }

        let enhanced = ImagePreprocessor::new().enhance(&DynamicImage::ImageLuma8(img));
        let enhanced = enhanced.to_luma8();

        assert_eq!(enhanced.get_pixel(15, 15)[0], 0);
        assert_eq!(enhanced.get_pixel(2, 2)[0], 255);
        assert!(enhanced.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_block_size_is_odd() {
        let preprocessor = ImagePreprocessor::new().with_threshold(10, 2);
        assert_eq!(preprocessor.block_size, 11);
    }
}
