//! Paginated thumbnail batches.
//!
//! One call lists at most `page_size` page keys after the caller's cursor,
//! fetches and renders them with bounded concurrency, and returns them sorted
//! by page number. Stores are free to return a listing page in any order;
//! the sort restores reading order within the batch, and the fixed-width key
//! scheme keeps batches themselves in order.

use crate::config::PageServiceConfig;
use crate::engine::PdfEngine;
use crate::error::PageStoreError;
use crate::images;
use crate::keys::{self, DocumentId};
use crate::output::{Thumbnail, ThumbnailPage};
use crate::pipeline::{render, schedule};
use crate::store::ObjectStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Render one listing page of thumbnails.
///
/// `page_size` and `dpi` fall back to the configured thumbnail defaults.
/// Fails with `BatchFailed` when any page of the batch could not be fetched
/// or rendered; the failed file names are listed in the error.
pub async fn list_thumbnails(
    store: &dyn ObjectStore,
    engine: Arc<dyn PdfEngine>,
    config: &PageServiceConfig,
    document_id: &DocumentId,
    continuation_token: &str,
    page_size: Option<usize>,
    dpi: Option<u32>,
) -> Result<ThumbnailPage, PageStoreError> {
    let dpi = dpi.unwrap_or(config.thumbnail_dpi);
    render::validate_dpi(dpi, config.max_dpi)?;
    let page_size = page_size.unwrap_or(config.thumbnail_page_size);
    if page_size == 0 {
        return Err(PageStoreError::InvalidConfig(
            "Thumbnail page size must be ≥ 1".into(),
        ));
    }

    let prefix = keys::page_prefix(document_id);
    let listing = store.list(&prefix, page_size, continuation_token).await?;
    info!(
        "Listed {} keys under {} (more: {})",
        listing.keys.len(),
        prefix,
        !listing.is_last()
    );

    let mut pages = Vec::with_capacity(listing.keys.len());
    for key in listing.keys {
        match keys::parse_ordinal(&key) {
            Some(ordinal) => pages.push((ordinal, key)),
            None => warn!("Skipping non-page key {}", key),
        }
    }

    let tasks: Vec<_> = pages
        .into_iter()
        .map(|(ordinal, key)| {
            let engine = Arc::clone(&engine);
            let file_name = file_name_of(&key).to_string();
            let id = file_name.clone();
            let task = async move {
                let image = images::render_stored_page(store, engine, &key, dpi).await?;
                Ok::<_, PageStoreError>(Thumbnail {
                    b64: image.to_base64(),
                    width: image.width,
                    height: image.height,
                    key,
                    file_name,
                    page_number: ordinal,
                })
            };
            (id, task)
        })
        .collect();

    let outcome = schedule::settle_all(tasks, config.thumbnail_concurrency).await?;
    let mut images = outcome.into_result("thumbnails")?;
    images.sort_by_key(|t| t.page_number);

    Ok(ThumbnailPage {
        continuation_token: listing.next_continuation_token,
        images,
    })
}

fn file_name_of(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_last_segment() {
        assert_eq!(file_name_of("pdf/d/page_00000003.pdf"), "page_00000003.pdf");
        assert_eq!(file_name_of("page_00000003.pdf"), "page_00000003.pdf");
    }
}
