//! In-memory backend that records every call made against it.

use crate::services::storage::{
    ObjectReader, ObjectWriter, StorageBackend, StorageError, StorageResult, StorageSession,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    collections::HashMap,
    io::{self, Cursor, ErrorKind},
    pin::Pin,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    task::{Context, Poll},
};
use tokio::io::{AsyncRead, ReadBuf};

#[derive(Default, Debug)]
pub struct CallCounts {
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    pub readers: AtomicUsize,
    pub writers: AtomicUsize,
}

/// Objects keyed by `(bucket, key)`, plus knobs for injecting failures.
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<Mutex<HashMap<(String, String), Bytes>>>,
    pub calls: Arc<CallCounts>,
    pub fail_connect: bool,
    pub fail_writes: bool,
    /// Readers opened at or after this 1-based position error on first read.
    pub fail_reads_from: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), body.into());
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn connects(&self) -> usize {
        self.calls.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.calls.closes.load(Ordering::SeqCst)
    }

    pub fn readers(&self) -> usize {
        self.calls.readers.load(Ordering::SeqCst)
    }

    pub fn writers(&self) -> usize {
        self.calls.writers.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageBackend for MemoryStore {
    async fn connect(&self) -> StorageResult<Box<dyn StorageSession>> {
        self.calls.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(StorageError::Unavailable("injected".into()));
        }
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl StorageSession for MemoryStore {
    async fn open_reader(&self, bucket: &str, key: &str) -> StorageResult<ObjectReader> {
        let nth = self.calls.readers.fetch_add(1, Ordering::SeqCst) + 1;
        let body = self
            .get(bucket, key)
            .ok_or_else(|| StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;
        let reader: ObjectReader = match self.fail_reads_from {
            Some(from) if nth >= from => Box::pin(FailingReader),
            _ => Box::pin(Cursor::new(body)),
        };
        Ok(reader)
    }

    async fn open_writer(&self, bucket: &str, key: &str) -> StorageResult<Box<dyn ObjectWriter>> {
        self.calls.writers.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryWriter {
            store: self.clone(),
            bucket: bucket.to_string(),
            key: key.to_string(),
            buf: Vec::new(),
        }))
    }

    async fn close(self: Box<Self>) {
        self.calls.closes.fetch_add(1, Ordering::SeqCst);
    }
}

struct MemoryWriter {
    store: MemoryStore,
    bucket: String,
    key: String,
    buf: Vec<u8>,
}

#[async_trait]
impl ObjectWriter for MemoryWriter {
    async fn write_all(&mut self, buf: &[u8]) -> StorageResult<()> {
        if self.store.fail_writes {
            return Err(StorageError::Io(io::Error::new(
                ErrorKind::BrokenPipe,
                "injected",
            )));
        }
        self.buf.extend_from_slice(buf);
        Ok(())
    }

    async fn close(self: Box<Self>) -> StorageResult<()> {
        let MemoryWriter {
            store,
            bucket,
            key,
            buf,
        } = *self;
        store.put(&bucket, &key, buf);
        Ok(())
    }
}

/// Reader whose every read fails.
pub struct FailingReader;

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(ErrorKind::ConnectionReset, "injected")))
    }
}
