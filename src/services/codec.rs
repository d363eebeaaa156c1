//! MessagePack wire codec shared by requests, responses and the persisted
//! metadata object.
//!
//! Structs are always encoded as maps keyed by field name, never as
//! positional arrays, so that any MessagePack client can read them.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Media type of every response body.
pub const CONTENT_TYPE: &str = "application/msgpack";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed payload: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("unencodable value: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}

/// Body of every failure response.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ErrorPayload {
    pub message: String,
    pub status_code: u16,
}

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(rmp_serde::to_vec_named(value)?)
}

/// Decode a complete value. Truncated input and trailing garbage inside the
/// value are both rejected.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    Ok(rmp_serde::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        request::ImageRequest,
        shape::{ImageShape, Orientation, Shape},
    };
    use std::collections::BTreeMap;

    #[derive(Deserialize, Debug, PartialEq)]
    #[serde(untagged)]
    enum Field {
        Int(u64),
        Text(String),
    }

    #[test]
    fn request_round_trips() {
        let req = ImageRequest {
            filename: "photo.png".into(),
            bucket: "b1".into(),
        };
        let bytes = encode(&req).unwrap();
        assert_eq!(decode::<ImageRequest>(&bytes).unwrap(), req);
    }

    #[test]
    fn shape_is_encoded_as_named_map() {
        let shape = ImageShape::from_dimensions(800, 600);
        let bytes = encode(&shape).unwrap();

        let map: BTreeMap<String, Field> = decode(&bytes).unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map["shape"], Field::Text("Rectangle".into()));
        assert_eq!(map["orientation"], Field::Text("Landscape".into()));
        assert_eq!(map["width"], Field::Int(800));
        assert_eq!(map["height"], Field::Int(600));

        let back: ImageShape = decode(&bytes).unwrap();
        assert_eq!(back.shape, Shape::Rectangle);
        assert_eq!(back.orientation, Orientation::Landscape);
    }

    #[test]
    fn error_payload_round_trips() {
        let payload = ErrorPayload {
            message: "File type not allowed".into(),
            status_code: 400,
        };
        let bytes = encode(&payload).unwrap();
        assert_eq!(decode::<ErrorPayload>(&bytes).unwrap(), payload);
    }

    #[test]
    fn request_from_foreign_map_encoder() {
        // A map written by another client, with an extra field and the keys
        // in a different order.
        let mut map = BTreeMap::new();
        map.insert("bucket", "b1");
        map.insert("extra", "ignored");
        map.insert("filename", "wide.jpg");
        let bytes = encode(&map).unwrap();

        let req: ImageRequest = decode(&bytes).unwrap();
        assert_eq!(req.filename, "wide.jpg");
        assert_eq!(req.bucket, "b1");
    }

    #[test]
    fn missing_fields_decode_empty() {
        let mut map = BTreeMap::new();
        map.insert("filename", "photo.png");
        let req: ImageRequest = decode(&encode(&map).unwrap()).unwrap();
        assert!(req.bucket.is_empty());
        assert!(!req.is_complete());
    }

    #[test]
    fn truncated_input_is_rejected() {
        let bytes = encode(&ImageRequest {
            filename: "photo.png".into(),
            bucket: "b1".into(),
        })
        .unwrap();
        let err = decode::<ImageRequest>(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
        assert!(decode::<ImageRequest>(&[]).is_err());
        assert!(decode::<ImageRequest>(b"not msgpack").is_err());
    }
}
