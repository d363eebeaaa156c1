//! Content sniffing and the allow-list of image types.
//!
//! Only the first [`PROBE_LEN`] bytes of an object are ever inspected here,
//! and nothing past the allow-list check depends on the declared name or
//! extension of the object.

use image::ImageFormat;
use std::io::{self, ErrorKind};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Number of leading bytes examined when sniffing.
pub const PROBE_LEN: usize = 512;

/// Canonical formats accepted for decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllowedFormat {
    Gif,
    Ico,
    Jpeg,
    Webp,
    Png,
}

impl AllowedFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllowedFormat::Gif => "gif",
            AllowedFormat::Ico => "ico",
            AllowedFormat::Jpeg => "jpeg",
            AllowedFormat::Webp => "webp",
            AllowedFormat::Png => "png",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            AllowedFormat::Gif => ImageFormat::Gif,
            AllowedFormat::Ico => ImageFormat::Ico,
            AllowedFormat::Jpeg => ImageFormat::Jpeg,
            AllowedFormat::Webp => ImageFormat::WebP,
            AllowedFormat::Png => ImageFormat::Png,
        }
    }
}

const ALLOWED_MIMES: [(&str, AllowedFormat); 5] = [
    ("image/gif", AllowedFormat::Gif),
    ("image/x-icon", AllowedFormat::Ico),
    ("image/jpeg", AllowedFormat::Jpeg),
    ("image/webp", AllowedFormat::Webp),
    ("image/png", AllowedFormat::Png),
];

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Look `mime` up in the allow-list. `None` means the type is rejected.
pub fn allowed_format(mime: &str) -> Option<AllowedFormat> {
    ALLOWED_MIMES
        .iter()
        .find(|(candidate, _)| *candidate == mime)
        .map(|(_, format)| *format)
}

/// Infer a media type from the leading bytes of some content.
///
/// Always returns something: content matching no known signature is
/// `text/plain` when it looks like text and `application/octet-stream`
/// otherwise.
pub fn sniff(probe: &[u8]) -> &'static str {
    let probe = &probe[..probe.len().min(PROBE_LEN)];
    match probe {
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => "image/gif",
        [0x00, 0x00, 0x01 | 0x02, 0x00, ..] => "image/x-icon",
        [0xff, 0xd8, 0xff, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, ..] => "image/png",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', b'V', b'P', ..] => {
            "image/webp"
        }
        [b'B', b'M', ..] => "image/bmp",
        [b'%', b'P', b'D', b'F', b'-', ..] => "application/pdf",
        [b'P', b'K', 0x03, 0x04, ..] => "application/zip",
        [0x1f, 0x8b, 0x08, ..] => "application/x-gzip",
        _ if probe.iter().any(|b| is_binary_byte(*b)) => OCTET_STREAM,
        _ => TEXT_PLAIN,
    }
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0b | 0x0e..=0x1a | 0x1c..=0x1f)
}

/// Read the sniffing probe from the start of `reader`.
///
/// With `strict` set, an object shorter than [`PROBE_LEN`] is an error;
/// otherwise whatever precedes end-of-stream is returned.
pub async fn read_probe<R>(reader: &mut R, strict: bool) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut probe = Vec::with_capacity(PROBE_LEN);
    reader.take(PROBE_LEN as u64).read_to_end(&mut probe).await?;

    if strict && probe.len() < PROBE_LEN {
        return Err(io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("probe ended after {} of {} bytes", probe.len(), PROBE_LEN),
        ));
    }
    Ok(probe)
}
