//! Split a source document into single-page artifacts in the object store.
//!
//! Extraction is sequential (one engine, one blocking thread); uploads are
//! bounded-concurrent and settle-all. A split that loses some uploads fails
//! with a [`PageStoreError::BatchFailed`] naming the missing ordinals; pages
//! that did upload stay in the store.

use crate::config::PageServiceConfig;
use crate::engine::PdfEngine;
use crate::error::PageStoreError;
use crate::keys::{self, DocumentId};
use crate::output::SplitSummary;
use crate::pipeline::{extract, schedule};
use crate::store::{ObjectStore, PDF_CONTENT_TYPE};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Split `source` and store every page under `pdf/{document_id}/`.
///
/// # Errors
/// - `EmptySource` before any engine or store access
/// - extraction errors (`CorruptSource`, `NoPages`, `PageExtractionFailed`)
///   before any upload
/// - `BatchFailed` when at least one upload failed, after all have settled
pub async fn split_document(
    store: &dyn ObjectStore,
    engine: Arc<dyn PdfEngine>,
    config: &PageServiceConfig,
    document_id: &DocumentId,
    source: Vec<u8>,
) -> Result<SplitSummary, PageStoreError> {
    let start = Instant::now();
    if source.is_empty() {
        return Err(PageStoreError::EmptySource);
    }
    info!(
        "Splitting document {} ({} bytes)",
        document_id,
        source.len()
    );

    let pages = extract::extract_pages(engine, source).await?;
    let total = pages.len();

    let mut uploads = Vec::with_capacity(total);
    for page in pages {
        let key = keys::page_key(document_id, page.ordinal)?;
        uploads.push((page.ordinal, key, page.bytes));
    }

    let callback = config.progress_callback.clone();
    if let Some(ref cb) = callback {
        cb.on_split_start(total);
    }

    let tasks: Vec<_> = uploads
        .into_iter()
        .map(|(ordinal, key, bytes)| {
            let callback = callback.clone();
            let task = async move {
                let result = store
                    .put(&key, bytes, PDF_CONTENT_TYPE)
                    .await
                    .map_err(PageStoreError::from);
                match &result {
                    Ok(()) => {
                        debug!("Uploaded page {}/{} → {}", ordinal, total, key);
                        if let Some(ref cb) = callback {
                            cb.on_page_uploaded(ordinal, total);
                        }
                    }
                    Err(e) => {
                        if let Some(ref cb) = callback {
                            cb.on_page_failed(ordinal, total, &e.to_string());
                        }
                    }
                }
                result.map(|()| key)
            };
            (ordinal.to_string(), task)
        })
        .collect();

    let outcome = schedule::settle_all(tasks, config.upload_concurrency).await?;
    let uploaded = outcome.succeeded();
    if let Some(ref cb) = callback {
        cb.on_split_complete(total, uploaded);
    }

    if uploaded < total {
        warn!(
            "Split of {} incomplete: {}/{} pages stored, failed: [{}]",
            document_id,
            uploaded,
            total,
            outcome.failed_ids().join(", ")
        );
    }
    let keys = outcome.into_result("upload")?;

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Split complete: {} pages stored for {} in {}ms",
        total, document_id, duration_ms
    );

    Ok(SplitSummary {
        document_id: document_id.clone(),
        total_pages: total,
        keys,
        duration_ms,
    })
}
