use crate::services::{
    codec::{self, ErrorPayload},
    decoder::DecodeError,
    storage::StorageError,
};
use axum::{
    extract::rejection::BytesRejection,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::fmt;
use thiserror::Error;

/// The response-side error: a status plus the message the caller gets to see.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            message: self.message.clone(),
            status_code: self.status.as_u16(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match codec::encode(&self.payload()) {
            Ok(body) => (
                self.status,
                [(header::CONTENT_TYPE, codec::CONTENT_TYPE)],
                body,
            )
                .into_response(),
            Err(err) => {
                tracing::error!("failed to encode error payload: {}", err);
                fallback_response()
            }
        }
    }
}

/// Plain-text 500 used when not even an error payload can be encoded.
pub fn fallback_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to create response",
    )
        .into_response()
}

/// Every way an invocation can fail, grouped by who is at fault.
///
/// The `#[error]` strings are the caller-facing messages. Underlying causes
/// are logged but never leave the process.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to parse request data")]
    UnreadableBody(#[source] BytesRejection),
    #[error("Failed to parse request data")]
    MalformedRequest(#[source] codec::CodecError),
    #[error("Incorrect filename or bucket")]
    MissingField,
    #[error("File type not allowed")]
    FileTypeNotAllowed,

    #[error("Failed to create client")]
    Session(#[source] StorageError),
    #[error("Failed to read source file")]
    ReadSource(#[source] StorageError),
    #[error("Failed to determine MIME type")]
    Probe(#[source] std::io::Error),
    #[error("Failed to decode source image")]
    DecodeImage(#[source] DecodeError),
    #[error("Failed to create metadata")]
    EncodeMetadata(#[source] codec::CodecError),
    #[error("Failed to save metadata to .img.meta")]
    SaveMetadata(#[source] StorageError),
}

impl PipelineError {
    /// Client input errors map to 400, everything else is on our side.
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::UnreadableBody(_)
            | PipelineError::MalformedRequest(_)
            | PipelineError::MissingField
            | PipelineError::FileTypeNotAllowed => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.status(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_bad_requests() {
        let err = PipelineError::FileTypeNotAllowed;
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(err).message, "File type not allowed");
        assert!(PipelineError::MissingField.is_client_error());
    }

    #[test]
    fn storage_failures_are_internal() {
        let err = PipelineError::ReadSource(StorageError::ObjectNotFound {
            bucket: "b1".into(),
            key: "missing.png".into(),
        });
        let app = AppError::from(err);
        assert_eq!(app.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app.message, "Failed to read source file");
        assert_eq!(app.payload().status_code, 500);
    }
}
