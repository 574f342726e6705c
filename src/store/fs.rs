//! Directory-backed object store.
//!
//! Key segments map one-to-one onto path components below the root, so
//! `pdf/doc/page_00000001.pdf` lives at `{root}/pdf/doc/page_00000001.pdf`.
//! Writes go to a sibling temp file first and are renamed into place, so a
//! concurrent `exists` never observes a half-written object.

use super::{paginate, ListPage, ObjectStore};
use crate::error::{StoreError, StoreOp};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

const PARTIAL_SUFFIX: &str = ".partial";

static PARTIAL_SEQ: AtomicU64 = AtomicU64::new(0);

/// Object store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Use `root` as the store root. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let invalid = |reason: &str| StoreError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        if key.is_empty() {
            return Err(invalid("empty key"));
        }
        if key.contains('\\') {
            return Err(invalid("backslash in key"));
        }

        let mut path = self.root.clone();
        for segment in key.split('/') {
            match segment {
                "" => return Err(invalid("empty path segment")),
                "." | ".." => return Err(invalid("relative path segment")),
                s if s.ends_with(PARTIAL_SUFFIX) => return Err(invalid("reserved suffix")),
                s => path.push(s),
            }
        }
        Ok(path)
    }

    /// Directory that contains every key starting with `prefix`.
    fn listing_dir(&self, prefix: &str) -> Result<PathBuf, StoreError> {
        match prefix.rfind('/') {
            Some(idx) => self.key_path(&prefix[..idx]),
            None => Ok(self.root.clone()),
        }
    }
}

fn backend(op: StoreOp, key: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend {
        op,
        key: key.to_string(),
        detail: err.to_string(),
    }
}

/// Collect every object key below `dir`, relative to `root`.
async fn walk(root: &Path, dir: PathBuf, prefix: &str) -> Result<Vec<String>, StoreError> {
    let mut keys = Vec::new();
    let mut pending = vec![dir];

    while let Some(current) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&current).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(backend(StoreOp::List, prefix, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| backend(StoreOp::List, prefix, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| backend(StoreOp::List, prefix, e))?;
            let path = entry.path();

            if file_type.is_dir() {
                pending.push(path);
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let segments: Option<Vec<&str>> =
                relative.components().map(|c| c.as_os_str().to_str()).collect();
            let Some(segments) = segments else {
                continue;
            };
            let key = segments.join("/");
            if key.ends_with(PARTIAL_SUFFIX) || !key.starts_with(prefix) {
                continue;
            }
            keys.push(key);
        }
    }

    Ok(keys)
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| backend(StoreOp::Put, key, e))?;
        }

        let seq = PARTIAL_SEQ.fetch_add(1, Ordering::Relaxed);
        let mut partial = path.clone().into_os_string();
        partial.push(format!(".{}-{}{}", std::process::id(), seq, PARTIAL_SUFFIX));
        let partial = PathBuf::from(partial);

        let written = match tokio::fs::write(&partial, &bytes).await {
            Ok(()) => tokio::fs::rename(&partial, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            // A short write or a failed rename leaves the temp file behind.
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(backend(StoreOp::Put, key, e));
        }

        debug!("Stored {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.key_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
                key: key.to_string(),
            }),
            Err(e) => Err(backend(StoreOp::Get, key, e)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.key_path(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(backend(StoreOp::Exists, key, e)),
        }
    }

    async fn list(
        &self,
        prefix: &str,
        page_size: usize,
        continuation_token: &str,
    ) -> Result<ListPage, StoreError> {
        let dir = self.listing_dir(prefix)?;
        let mut keys = walk(&self.root, dir, prefix).await?;
        keys.sort();
        Ok(paginate(keys, page_size, continuation_token))
    }
}
