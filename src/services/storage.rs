//! Storage gateway: the seam between the pipeline and whatever object store
//! holds the images.
//!
//! A backend hands out one [`StorageSession`] per invocation. Readers are
//! plain `AsyncRead` handles released on drop. Writers must be committed with
//! [`ObjectWriter::close`]; a writer dropped before that leaves no object
//! behind.

use async_trait::async_trait;
use std::{io, pin::Pin};
use thiserror::Error;
use tokio::io::AsyncRead;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage root unavailable: {0}")]
    Unavailable(String),
    #[error("bucket `{0}` not found")]
    BucketNotFound(String),
    #[error("bucket `{name}` invalid: {reason}")]
    InvalidBucketName { name: String, reason: String },
    #[error("object `{key}` not found in bucket `{bucket}`")]
    ObjectNotFound { bucket: String, key: String },
    #[error("invalid object key")]
    InvalidObjectKey,
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// Process-wide handle able to open sessions. Holds no per-request state.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn connect(&self) -> StorageResult<Box<dyn StorageSession>>;
}

#[async_trait]
pub trait StorageSession: Send + Sync {
    /// Open a fresh reader positioned at the start of the object. May be
    /// called any number of times for the same object.
    async fn open_reader(&self, bucket: &str, key: &str) -> StorageResult<ObjectReader>;

    /// Open a writer that replaces the object at `key` once closed.
    async fn open_writer(&self, bucket: &str, key: &str) -> StorageResult<Box<dyn ObjectWriter>>;

    /// Release the session. Called exactly once, on every exit path.
    async fn close(self: Box<Self>);
}

#[async_trait]
pub trait ObjectWriter: Send {
    async fn write_all(&mut self, buf: &[u8]) -> StorageResult<()>;

    /// Flush and publish everything written so far.
    async fn close(self: Box<Self>) -> StorageResult<()>;
}
