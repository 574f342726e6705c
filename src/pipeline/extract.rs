//! Page extraction: split a source document into ordered single-page buffers.
//!
//! Extraction is strictly sequential. The engine is opened once per call on a
//! blocking thread, every ordinal `1..=N` is copied out in order, and each
//! single-page handle is released before the next one is created.

use crate::engine::{EngineError, PageSource, PdfEngine};
use crate::error::PageStoreError;
use crate::keys::check_ordinal;
use std::sync::Arc;
use tracing::{debug, info};

/// One page copied out of a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// 1-based position in the source.
    pub ordinal: u32,
    /// A complete single-page document, independent of the source buffer.
    pub bytes: Vec<u8>,
}

/// Split `source` on a blocking thread.
pub async fn extract_pages(
    engine: Arc<dyn PdfEngine>,
    source: Vec<u8>,
) -> Result<Vec<ExtractedPage>, PageStoreError> {
    tokio::task::spawn_blocking(move || extract_pages_blocking(engine.as_ref(), &source))
        .await
        .map_err(|e| PageStoreError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation of page extraction.
///
/// Returns exactly `N` pages with ordinals `1..=N`, or fails as a whole.
pub fn extract_pages_blocking(
    engine: &dyn PdfEngine,
    source: &[u8],
) -> Result<Vec<ExtractedPage>, PageStoreError> {
    if source.is_empty() {
        return Err(PageStoreError::EmptySource);
    }

    let mut pages: Vec<ExtractedPage> = Vec::new();
    let mut rejected: Option<PageStoreError> = None;

    engine
        .with_source(source, &mut |doc: &dyn PageSource| -> Result<(), EngineError> {
            let total = doc.page_count();
            if total == 0 {
                return Ok(());
            }
            if let Err(e) = check_ordinal(total as u64) {
                rejected = Some(e);
                return Ok(());
            }
            info!("Source loaded: {} pages", total);

            pages.reserve_exact(total);
            for index in 0..total {
                let bytes = doc.extract_page(index)?;
                debug!("Page {}/{} → {} bytes", index + 1, total, bytes.len());
                pages.push(ExtractedPage {
                    ordinal: (index + 1) as u32,
                    bytes,
                });
            }
            Ok(())
        })
        .map_err(extraction_error)?;

    if let Some(e) = rejected {
        return Err(e);
    }
    if pages.is_empty() {
        return Err(PageStoreError::NoPages);
    }
    Ok(pages)
}

fn extraction_error(err: EngineError) -> PageStoreError {
    match err {
        EngineError::Unavailable(detail) => PageStoreError::EngineUnavailable(detail),
        EngineError::Parse(detail) => PageStoreError::CorruptSource { detail },
        EngineError::Page { index, detail } => PageStoreError::PageExtractionFailed {
            ordinal: (index + 1) as u32,
            detail,
        },
        EngineError::Raster(detail) => PageStoreError::Internal(detail),
    }
}
