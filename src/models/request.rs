//! The inbound trigger payload.

use serde::{Deserialize, Deserializer, Serialize};

/// Identifies the source image: an object key within a bucket.
///
/// Absent or nil fields decode as empty strings so that a payload missing
/// either field is reported as a validation failure rather than a parse
/// failure.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageRequest {
    #[serde(default, deserialize_with = "nil_as_empty")]
    pub filename: String,
    #[serde(default, deserialize_with = "nil_as_empty")]
    pub bucket: String,
}

fn nil_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ImageRequest {
    /// Both fields must be non-empty before any storage access is attempted.
    pub fn is_complete(&self) -> bool {
        !self.filename.is_empty() && !self.bucket.is_empty()
    }

    /// Key of the companion metadata object, e.g. `photo.png.img.meta`.
    pub fn metadata_key(&self) -> String {
        format!("{}{}", self.filename, META_FILE_EXTENSION)
    }
}

pub const META_FILE_EXTENSION: &str = ".img.meta";
