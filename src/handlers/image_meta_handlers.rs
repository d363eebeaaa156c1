//! HTTP handler for the image metadata trigger.
//! The body is decoded and processed entirely by `ImageMetaPipeline`; this
//! layer only turns the outcome into a MessagePack response.

use crate::{
    errors::{AppError, PipelineError},
    services::{codec, pipeline::ImageMetaPipeline},
};
use axum::{
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// `/`: compute and persist shape metadata for one image.
///
/// Success is `200` with `{shape, orientation, width, height}`; every failure
/// is `{message, status_code}` with the same status on the response. A body
/// that cannot be buffered is a malformed request like any other.
pub async fn image_meta(
    State(pipeline): State<ImageMetaPipeline>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let body = body.map_err(|rejection| {
        let err = PipelineError::UnreadableBody(rejection);
        tracing::warn!(cause = ?err, "rejected: {}", err);
        err
    })?;
    let shape = pipeline.invoke(&body).await?;

    let payload = codec::encode(&shape).map_err(|err| {
        tracing::error!("failed to encode response: {}", err);
        AppError::internal("Failed to create response")
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, codec::CONTENT_TYPE)],
        payload,
    )
        .into_response())
}
