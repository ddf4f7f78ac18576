use image::{DynamicImage, imageops::FilterType};

pub const DEFAULT_THUMBNAIL_MAX_DIMENSION: u32 = 400;
pub const DEFAULT_THUMBNAIL_JPEG_QUALITY: u8 = 80;
pub const THUMBNAIL_MIME_TYPE: &str = "image/jpeg";

/// Bounding box and encoder settings for generated thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailConfig {
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_THUMBNAIL_MAX_DIMENSION,
            jpeg_quality: DEFAULT_THUMBNAIL_JPEG_QUALITY,
        }
    }
}

#[derive(Debug)]
pub struct ThumbnailResult {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub original_width: u32,
    pub original_height: u32,
    pub mime_type: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("image decode error: {0}")]
    Decode(String),
    #[error("image encode error: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThumbnailService {
    config: ThumbnailConfig,
}

impl ThumbnailService {
    pub fn new(config: ThumbnailConfig) -> Self {
        Self { config }
    }

    /// Decode `data`, shrink it into the configured bounding box and re-encode as JPEG.
    ///
    /// Images with alpha or a palette are flattened to RGB first. Images already
    /// inside the box keep their dimensions.
    pub fn generate(&self, data: &[u8]) -> Result<ThumbnailResult, ThumbnailError> {
        let img =
            image::load_from_memory(data).map_err(|e| ThumbnailError::Decode(e.to_string()))?;

        let original_width = img.width();
        let original_height = img.height();

        let (thumb_width, thumb_height) = calculate_thumbnail_dimensions(
            original_width,
            original_height,
            self.config.max_dimension,
        );

        let thumbnail = if (thumb_width, thumb_height) == (original_width, original_height) {
            img
        } else {
            img.resize_exact(thumb_width, thumb_height, FilterType::Lanczos3)
        };
        let bytes = encode_jpeg(&thumbnail, self.config.jpeg_quality)?;

        Ok(ThumbnailResult {
            bytes,
            width: thumb_width,
            height: thumb_height,
            original_width,
            original_height,
            mime_type: THUMBNAIL_MIME_TYPE,
        })
    }
}

/// Calculate thumbnail dimensions preserving aspect ratio, never upscaling.
///
/// A zero box is treated as 1px.
fn calculate_thumbnail_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let max_dimension = max_dimension.max(1);
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }

    let width_ratio = max_dimension as f64 / width as f64;
    let height_ratio = max_dimension as f64 / height as f64;
    let ratio = width_ratio.min(height_ratio);

    let new_width = (width as f64 * ratio).round() as u32;
    let new_height = (height as f64 * ratio).round() as u32;

    (
        new_width.clamp(1, max_dimension),
        new_height.clamp(1, max_dimension),
    )
}

/// Encode a DynamicImage as JPEG with specified quality.
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ThumbnailError> {
    let rgb = img.to_rgb8();
    let mut output = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| ThumbnailError::Encode(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 128]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_calculate_dimensions_smaller_than_max() {
        assert_eq!(calculate_thumbnail_dimensions(100, 80, 400), (100, 80));
    }

    #[test]
    fn test_calculate_dimensions_landscape() {
        assert_eq!(calculate_thumbnail_dimensions(800, 600, 400), (400, 300));
    }

    #[test]
    fn test_calculate_dimensions_portrait() {
        // 600x800 scaled by 0.5
        assert_eq!(calculate_thumbnail_dimensions(600, 800, 400), (300, 400));
    }

    #[test]
    fn test_calculate_dimensions_extreme_aspect() {
        assert_eq!(calculate_thumbnail_dimensions(10_000, 2, 400), (400, 1));
    }

    #[test]
    fn test_calculate_dimensions_zero_box() {
        assert_eq!(calculate_thumbnail_dimensions(800, 600, 0), (1, 1));
    }

    #[test]
    fn test_generate_with_zero_box_does_not_panic() {
        let service = ThumbnailService::new(ThumbnailConfig {
            max_dimension: 0,
            jpeg_quality: DEFAULT_THUMBNAIL_JPEG_QUALITY,
        });
        let result = service.generate(&png_bytes(40, 20)).unwrap();
        assert_eq!((result.width, result.height), (1, 1));
    }

    #[test]
    fn test_generate_rgba_png_becomes_bounded_jpeg() {
        let service = ThumbnailService::default();
        let result = service.generate(&png_bytes(1000, 500)).unwrap();

        assert_eq!((result.width, result.height), (400, 200));
        assert_eq!((result.original_width, result.original_height), (1000, 500));
        assert_eq!(result.mime_type, "image/jpeg");

        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!(image::guess_format(&result.bytes).unwrap(), ImageFormat::Jpeg);
        assert_eq!((decoded.width(), decoded.height()), (400, 200));
    }

    #[test]
    fn test_generate_does_not_upscale() {
        let service = ThumbnailService::default();
        let result = service.generate(&png_bytes(32, 16)).unwrap();
        assert_eq!((result.width, result.height), (32, 16));
    }

    #[test]
    fn test_generate_respects_configured_box() {
        let service = ThumbnailService::new(ThumbnailConfig {
            max_dimension: 50,
            jpeg_quality: 60,
        });
        let result = service.generate(&png_bytes(200, 400)).unwrap();
        assert_eq!((result.width, result.height), (25, 50));
    }

    #[test]
    fn test_generate_rejects_garbage() {
        let err = ThumbnailService::default()
            .generate(b"definitely not an image")
            .unwrap_err();
        assert!(matches!(err, ThumbnailError::Decode(_)));
    }
}
