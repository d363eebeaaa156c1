//! src/services/pipeline.rs
//!
//! ImageMetaPipeline: one invocation, start to finish:
//! decode request → validate → open session → probe + sniff → read body →
//! decode pixels → classify → encode → write `<filename>.img.meta`.
//!
//! Steps run strictly in that order and the first failure ends the
//! invocation. Nothing is retried and a half-finished invocation leaves no
//! metadata object behind. The session opened for an invocation is closed on
//! every exit path, and every reader and writer is released before it.

use crate::{
    errors::PipelineError,
    models::{request::ImageRequest, shape::ImageShape},
    services::{
        codec, decoder,
        mime_gate::{self, AllowedFormat},
        storage::{StorageBackend, StorageSession},
    },
};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{Span, debug, error, field, info, instrument, warn};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineOptions {
    /// Require a full-length sniffing probe; objects shorter than the probe
    /// are then rejected as unreadable.
    pub strict_probe: bool,
}

/// Shared across requests, but holds nothing request-specific: each call to
/// [`ImageMetaPipeline::invoke`] opens and closes its own session.
#[derive(Clone)]
pub struct ImageMetaPipeline {
    backend: Arc<dyn StorageBackend>,
    options: PipelineOptions,
}

impl ImageMetaPipeline {
    pub fn new(backend: Arc<dyn StorageBackend>, options: PipelineOptions) -> Self {
        Self { backend, options }
    }

    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    /// Run one invocation against the raw request body.
    #[instrument(
        name = "image_meta",
        skip_all,
        fields(
            invocation_id = %Uuid::new_v4(),
            bucket = field::Empty,
            filename = field::Empty
        )
    )]
    pub async fn invoke(&self, body: &[u8]) -> Result<ImageShape, PipelineError> {
        let outcome = self.run(body).await;
        match &outcome {
            Ok(shape) => info!(
                shape = %shape.shape,
                orientation = %shape.orientation,
                width = shape.width,
                height = shape.height,
                "metadata saved"
            ),
            Err(err) if err.is_client_error() => warn!(cause = ?err, "rejected: {}", err),
            Err(err) => error!(cause = ?err, "failed: {}", err),
        }
        outcome
    }

    async fn run(&self, body: &[u8]) -> Result<ImageShape, PipelineError> {
        let request: ImageRequest = codec::decode(body).map_err(PipelineError::MalformedRequest)?;
        if !request.is_complete() {
            return Err(PipelineError::MissingField);
        }

        let span = Span::current();
        span.record("bucket", request.bucket.as_str());
        span.record("filename", request.filename.as_str());

        let session = self
            .backend
            .connect()
            .await
            .map_err(PipelineError::Session)?;
        let outcome = self.process(session.as_ref(), &request).await;
        session.close().await;
        outcome
    }

    async fn process(
        &self,
        session: &dyn StorageSession,
        request: &ImageRequest,
    ) -> Result<ImageShape, PipelineError> {
        let format = self.probe(session, request).await?;
        let content = read_source(session, request).await?;

        let (width, height) = decoder::decode_dimensions_blocking(content, format)
            .await
            .map_err(PipelineError::DecodeImage)?;
        let shape = ImageShape::from_dimensions(width, height);

        let meta = codec::encode(&shape).map_err(PipelineError::EncodeMetadata)?;
        save_metadata(session, request, &meta).await?;
        Ok(shape)
    }

    /// Sniff the head of the source object and check it against the
    /// allow-list. The probe reader is dropped before returning.
    async fn probe(
        &self,
        session: &dyn StorageSession,
        request: &ImageRequest,
    ) -> Result<AllowedFormat, PipelineError> {
        let mut reader = session
            .open_reader(&request.bucket, &request.filename)
            .await
            .map_err(PipelineError::ReadSource)?;
        let probe = mime_gate::read_probe(&mut reader, self.options.strict_probe)
            .await
            .map_err(PipelineError::Probe)?;

        let mime = mime_gate::sniff(&probe);
        let Some(format) = mime_gate::allowed_format(mime) else {
            debug!("sniffed {} from {} byte probe, not allowed", mime, probe.len());
            return Err(PipelineError::FileTypeNotAllowed);
        };
        debug!("sniffed {} ({}) from {} byte probe", mime, format.as_str(), probe.len());
        Ok(format)
    }
}

/// Read the whole source object through a fresh reader; the probe reader is
/// never rewound.
async fn read_source(
    session: &dyn StorageSession,
    request: &ImageRequest,
) -> Result<Vec<u8>, PipelineError> {
    let mut reader = session
        .open_reader(&request.bucket, &request.filename)
        .await
        .map_err(PipelineError::ReadSource)?;
    let mut content = Vec::new();
    reader
        .read_to_end(&mut content)
        .await
        .map_err(|err| PipelineError::ReadSource(err.into()))?;
    Ok(content)
}

/// Replace `<filename>.img.meta` with `meta`. A writer abandoned on error is
/// dropped uncommitted.
async fn save_metadata(
    session: &dyn StorageSession,
    request: &ImageRequest,
    meta: &[u8],
) -> Result<(), PipelineError> {
    let key = request.metadata_key();
    let mut writer = session
        .open_writer(&request.bucket, &key)
        .await
        .map_err(PipelineError::SaveMetadata)?;
    writer
        .write_all(meta)
        .await
        .map_err(PipelineError::SaveMetadata)?;
    writer.close().await.map_err(PipelineError::SaveMetadata)?;
    debug!("wrote {} bytes to {}", meta.len(), key);
    Ok(())
}
