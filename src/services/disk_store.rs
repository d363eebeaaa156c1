//! src/services/disk_store.rs
//!
//! DiskStore: a local-directory object store. Each bucket is a directory
//! directly beneath `base_path`, each object a file at `base_path/{bucket}/{key}`
//! so that images can be dropped in place by any other tool. Buckets are never
//! created here; a missing bucket directory is reported as not found.

use crate::services::storage::{
    ObjectReader, ObjectWriter, StorageBackend, StorageError, StorageResult, StorageSession,
};
use async_trait::async_trait;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

const MAX_OBJECT_KEY_LEN: usize = 1024;
const BUCKET_NAME_MAX_LEN: usize = 63;

/// Backend rooted at a directory. Cloning is cheap; sessions borrow nothing
/// from it.
#[derive(Clone, Debug)]
pub struct DiskStore {
    /// Base directory on disk holding one sub-directory per bucket.
    pub base_path: PathBuf,
}

impl DiskStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

#[async_trait]
impl StorageBackend for DiskStore {
    /// Opening a session only checks that the root is a reachable directory.
    async fn connect(&self) -> StorageResult<Box<dyn StorageSession>> {
        match fs::metadata(&self.base_path).await {
            Ok(meta) if meta.is_dir() => Ok(Box::new(DiskSession {
                base_path: self.base_path.clone(),
            })),
            Ok(_) => Err(StorageError::Unavailable(format!(
                "{} is not a directory",
                self.base_path.display()
            ))),
            Err(err) => Err(StorageError::Unavailable(format!(
                "{}: {}",
                self.base_path.display(),
                err
            ))),
        }
    }
}

pub struct DiskSession {
    base_path: PathBuf,
}

impl DiskSession {
    /// Resolve `bucket/key` to a path, validating both and requiring the
    /// bucket directory to exist.
    async fn resolve(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        ensure_bucket_name_safe(bucket)?;
        ensure_key_safe(key)?;

        let bucket_root = self.base_path.join(bucket);
        match fs::metadata(&bucket_root).await {
            Ok(meta) if meta.is_dir() => Ok(bucket_root.join(key)),
            Ok(_) => Err(StorageError::BucketNotFound(bucket.to_string())),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::BucketNotFound(bucket.to_string()))
            }
            Err(err) => Err(StorageError::Io(err)),
        }
    }
}

#[async_trait]
impl StorageSession for DiskSession {
    async fn open_reader(&self, bucket: &str, key: &str) -> StorageResult<ObjectReader> {
        let path = self.resolve(bucket, key).await?;
        let not_found = || StorageError::ObjectNotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        };

        let file = File::open(&path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                not_found()
            } else {
                StorageError::Io(err)
            }
        })?;
        if !file.metadata().await?.is_file() {
            return Err(not_found());
        }

        debug!("opened reader for {}", path.display());
        Ok(Box::pin(file))
    }

    async fn open_writer(&self, bucket: &str, key: &str) -> StorageResult<Box<dyn ObjectWriter>> {
        let final_path = self.resolve(bucket, key).await?;
        let parent = final_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            StorageError::Io(io::Error::new(
                ErrorKind::Other,
                "object path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;

        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let file = File::create(&tmp_path).await?;
        debug!("opened writer for {} via {}", final_path.display(), tmp_path.display());

        Ok(Box::new(DiskObjectWriter {
            file,
            tmp_path,
            final_path,
            committed: false,
        }))
    }

    async fn close(self: Box<Self>) {
        debug!("closed disk session on {}", self.base_path.display());
    }
}

/// Streams into a temp file next to the destination; `close` renames it into
/// place. Until then the destination is untouched.
pub struct DiskObjectWriter {
    file: File,
    tmp_path: PathBuf,
    final_path: PathBuf,
    committed: bool,
}

#[async_trait]
impl ObjectWriter for DiskObjectWriter {
    async fn write_all(&mut self, buf: &[u8]) -> StorageResult<()> {
        self.file.write_all(buf).await?;
        Ok(())
    }

    async fn close(mut self: Box<Self>) -> StorageResult<()> {
        self.file.flush().await?;
        self.file.sync_all().await?;

        if let Err(err) = fs::rename(&self.tmp_path, &self.final_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&self.final_path).await?;
                fs::rename(&self.tmp_path, &self.final_path).await?;
            } else {
                return Err(StorageError::Io(err));
            }
        }
        self.committed = true;
        debug!("committed {}", self.final_path.display());
        Ok(())
    }
}

impl Drop for DiskObjectWriter {
    fn drop(&mut self) {
        if !self.committed {
            // Drop cannot await. The unlink touches one small temp file owned
            // by this writer, so it runs inline on the current worker.
            match std::fs::remove_file(&self.tmp_path) {
                Ok(()) => debug!("discarded uncommitted {}", self.tmp_path.display()),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => debug!("failed to discard {}: {}", self.tmp_path.display(), err),
            }
        }
    }
}

/// Basic key validation to avoid trivial path traversal vectors.
///
/// Rejects keys that begin with `/`, have a `..` path component, or contain
/// control characters or backslashes. Dots inside a name are fine.
fn ensure_key_safe(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
        return Err(StorageError::InvalidObjectKey);
    }
    if key.starts_with('/') || key.split('/').any(|component| component == "..") {
        return Err(StorageError::InvalidObjectKey);
    }
    if key
        .bytes()
        .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
    {
        return Err(StorageError::InvalidObjectKey);
    }
    Ok(())
}

/// Validate bucket name format.
///
/// - 1–63 characters
/// - lowercase letters, digits, dots, hyphens, underscores only
/// - cannot start/end with dot or hyphen
/// - cannot contain consecutive dots
fn ensure_bucket_name_safe(name: &str) -> StorageResult<()> {
    let invalid = |reason: &str| StorageError::InvalidBucketName {
        name: name.to_string(),
        reason: reason.into(),
    };

    if name.is_empty() || name.len() > BUCKET_NAME_MAX_LEN {
        return Err(invalid("must be between 1 and 63 characters"));
    }

    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-' | '_'))
    {
        return Err(invalid(
            "allowed characters are lowercase letters, digits, dots, hyphens, and underscores",
        ));
    }

    if name.starts_with('.') || name.ends_with('.') || name.starts_with('-') || name.ends_with('-')
    {
        return Err(invalid("must start and end with a lowercase letter or digit"));
    }

    if name.contains("..") {
        return Err(invalid("cannot contain consecutive dots"));
    }

    Ok(())
}
