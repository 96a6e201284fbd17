use base64::{engine::general_purpose::STANDARD, Engine};
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, GenericImageView};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::CompressionPreset;
use crate::error::{Error, Result};

const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Compress an uploaded image into a JPEG data URI.
/// Runs on a blocking thread so the event loop is never stalled.
pub async fn compress(bytes: Vec<u8>, preset: CompressionPreset) -> Result<String> {
    tokio::task::spawn_blocking(move || compress_blocking(&bytes, preset))
        .await
        .map_err(|e| Error::Task(format!("Task join error: {}", e)))?
}

/// Read an image file and compress it
pub async fn compress_file(path: PathBuf, preset: CompressionPreset) -> Result<String> {
    let bytes = tokio::fs::read(&path).await?;
    debug!(path = %path.display(), bytes = bytes.len(), "compressing image file");
    compress(bytes, preset).await
}

/// Blocking version of compression
///
/// The image is scaled down so its longest edge fits `max_dimension`,
/// keeping the aspect ratio. Smaller images keep their size.
pub fn compress_blocking(bytes: &[u8], preset: CompressionPreset) -> Result<String> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = img.dimensions();

    let img = if width > preset.max_dimension || height > preset.max_dimension {
        img.resize(preset.max_dimension, preset.max_dimension, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, jpeg_quality(preset.quality));
    rgb.write_with_encoder(encoder)?;

    info!(
        from = %format!("{}x{}", width, height),
        to = %format!("{}x{}", rgb.width(), rgb.height()),
        size_kb = jpeg.len() / 1024,
        "image compressed"
    );

    Ok(format!("{}{}", DATA_URI_PREFIX, STANDARD.encode(&jpeg)))
}

/// Map a (0, 1] quality factor to the encoder's 1..=100 scale
fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Raw bytes of a base64 data URI
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| Error::Validation("not a data URI".to_string()))?;

    if !header.starts_with("data:") || !header.ends_with(";base64") {
        return Err(Error::Validation(format!("unsupported data URI header: {}", header)));
    }

    STANDARD
        .decode(payload)
        .map_err(|e| Error::Validation(format!("invalid base64 payload: {}", e)))
}
