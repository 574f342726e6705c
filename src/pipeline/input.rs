//! Input resolution: load a user-supplied path or URL into memory.
//!
//! Splitting works on an in-memory buffer, so both local files and downloads
//! end up as bytes. The PDF magic (`%PDF`) is checked before returning so a
//! wrong file is reported as such rather than as an engine parse error.

use crate::error::PageStoreError;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

const PDF_MAGIC: &[u8] = b"%PDF";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Read `input` (a local path or an http(s) URL) into memory.
pub async fn read_source(input: &str, timeout_secs: u64) -> Result<Vec<u8>, PageStoreError> {
    let bytes = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };
    check_magic(input, &bytes)?;
    Ok(bytes)
}

/// Verify `bytes` starts with the PDF magic number.
pub fn check_magic(origin: &str, bytes: &[u8]) -> Result<(), PageStoreError> {
    if bytes.is_empty() {
        return Err(PageStoreError::EmptySource);
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(PageStoreError::NotAPdf {
            origin: origin.to_string(),
            magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
        });
    }
    Ok(())
}

async fn read_local(path_str: &str) -> Result<Vec<u8>, PageStoreError> {
    let path = PathBuf::from(path_str);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!("Read local source {} ({} bytes)", path.display(), bytes.len());
            Ok(bytes)
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(PageStoreError::PermissionDenied {
            path: path_str.to_string(),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(PageStoreError::SourceNotFound {
            path: path_str.to_string(),
        }),
        Err(e) => Err(PageStoreError::Internal(format!(
            "Failed to read '{}': {}",
            path_str, e
        ))),
    }
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, PageStoreError> {
    info!("Downloading source from: {}", url);

    let download_failed = |reason: String| PageStoreError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| download_failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            download_failed(format!("timed out after {}s", timeout_secs))
        } else {
            download_failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(download_failed(format!("HTTP {}", response.status())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| download_failed(e.to_string()))?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}
