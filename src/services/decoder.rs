//! Pixel dimensions of an allow-listed image.

use crate::services::mime_gate::AllowedFormat;
use image::GenericImageView;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("decoder task aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

/// Fully decode `content` as `format` and return `(width, height)`.
///
/// Header-only parsing is not enough: a body whose pixel data is truncated
/// or corrupt must fail here.
pub fn decode_dimensions(content: &[u8], format: AllowedFormat) -> Result<(u32, u32), DecodeError> {
    let image = image::load_from_memory_with_format(content, format.image_format())?;
    Ok(image.dimensions())
}

/// [`decode_dimensions`] on the blocking pool, keeping the request task free
/// while pixels are decoded.
pub async fn decode_dimensions_blocking(
    content: Vec<u8>,
    format: AllowedFormat,
) -> Result<(u32, u32), DecodeError> {
    tokio::task::spawn_blocking(move || decode_dimensions(&content, format)).await?
}
