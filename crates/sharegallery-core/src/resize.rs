use std::io::Cursor;

use async_trait::async_trait;
use image::imageops::FilterType;
use image::ImageFormat;
use thiserror::Error;

/// Default thumbnail height in pixels
pub const DEFAULT_THUMBNAIL_HEIGHT: u32 = 400;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResizeError {
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Corrupt image: {0}")]
    CorruptImage(String),
}

/// Turns source image bytes into a smaller encoding of the same picture
#[async_trait]
pub trait Resizer: Send + Sync {
    async fn resize(&self, source: Vec<u8>, target_height: u32) -> Result<Vec<u8>, ResizeError>;
}

/// Resizer backed by the `image` crate. Keeps the source format and scales
/// the width proportionally.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageResizer;

impl ImageResizer {
    pub fn resize_blocking(source: &[u8], target_height: u32) -> Result<Vec<u8>, ResizeError> {
        let format = image::guess_format(source)
            .map_err(|_| ResizeError::UnsupportedFormat("unrecognised image data".to_string()))?;
        if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif) {
            return Err(ResizeError::UnsupportedFormat(format!("{format:?}")));
        }

        let img = image::load_from_memory_with_format(source, format)
            .map_err(|e| ResizeError::CorruptImage(e.to_string()))?;

        let target_height = target_height.max(1);
        let width = scaled_width(img.width(), img.height(), target_height);
        let thumbnail = img.resize_exact(width, target_height, FilterType::Lanczos3);

        let mut buffer = Cursor::new(Vec::new());
        thumbnail
            .write_to(&mut buffer, format)
            .map_err(|e| ResizeError::CorruptImage(e.to_string()))?;

        Ok(buffer.into_inner())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn scaled_width(width: u32, height: u32, target_height: u32) -> u32 {
    if height == 0 {
        return 1;
    }
    let scaled = (f64::from(width) * f64::from(target_height) / f64::from(height)).round();
    (scaled as u32).max(1)
}

#[async_trait]
impl Resizer for ImageResizer {
    async fn resize(&self, source: Vec<u8>, target_height: u32) -> Result<Vec<u8>, ResizeError> {
        tokio::task::spawn_blocking(move || Self::resize_blocking(&source, target_height))
            .await
            .map_err(|e| ResizeError::CorruptImage(format!("resize task failed: {e}")))?
    }
}
