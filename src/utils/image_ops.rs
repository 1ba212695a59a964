use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError, ImageFormat, RgbImage};
use std::io::Cursor;
use thiserror::Error;

/// Failure of an off-runtime image operation
#[derive(Debug, Error)]
pub enum ImageOpError {
    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("Blocking image task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Asynchronously decode image bytes to 8-bit RGB using spawn_blocking.
///
/// Image decoding is CPU-intensive, especially for large images.
pub async fn decode_rgb_async(bytes: Vec<u8>) -> Result<RgbImage, ImageOpError> {
    let decoded = tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes).map(|img| img.to_rgb8())
    })
    .await??;
    Ok(decoded)
}

/// Asynchronously encode an image to PNG bytes using spawn_blocking.
pub async fn encode_png_async(img: RgbImage) -> Result<Vec<u8>, ImageOpError> {
    let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ImageError> {
        let mut png_bytes = Vec::new();
        DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)?;
        Ok(png_bytes)
    })
    .await??;
    Ok(bytes)
}

/// Synchronous JPEG encode at the given quality (1-100)
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut jpeg_bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg_bytes, quality);
    img.write_with_encoder(encoder)?;
    Ok(jpeg_bytes)
}

/// Asynchronously encode an image to JPEG bytes using spawn_blocking.
pub async fn encode_jpeg_async(img: RgbImage, quality: u8) -> Result<Vec<u8>, ImageOpError> {
    let bytes = tokio::task::spawn_blocking(move || encode_jpeg(&img, quality)).await??;
    Ok(bytes)
}
