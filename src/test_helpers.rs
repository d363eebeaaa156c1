//! Shared test utilities: in-memory fixture images.
//!
//! Fixtures are generated rather than checked in so each test states the
//! exact dimensions it relies on.

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;

/// Encode a `width` x `height` gradient as `format`.
///
/// The gradient keeps compressed bodies well above the sniffing probe for
/// all but the tiniest sizes.
pub fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let pixels = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 7) as u8, (y * 13) as u8, (x ^ y) as u8])
    });
    write(DynamicImage::ImageRgb8(pixels), format)
}

/// Like [`encode`] but with an alpha channel. ICO only embeds RGBA images.
pub fn encode_rgba(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let pixels = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x * 7) as u8, (y * 13) as u8, (x ^ y) as u8, 255 - (x + y) as u8])
    });
    write(DynamicImage::ImageRgba8(pixels), format)
}

fn write(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).unwrap();
    out.into_inner()
}
