//! Single-page image operations: preview renders and cached high-resolution rasters.

use crate::config::PageServiceConfig;
use crate::engine::PdfEngine;
use crate::error::PageStoreError;
use crate::keys::{self, DocumentId};
use crate::output::{HighResOutcome, PreviewImage};
use crate::pipeline::render::{self, RenderedImage};
use crate::store::{ObjectStore, PNG_CONTENT_TYPE};
use std::sync::Arc;
use tracing::{debug, info};

/// Fetch the page stored under `key` and render it at `dpi`.
///
/// A missing page surfaces as `Store(NotFound)`; a present but unreadable
/// page as `RenderFailed`.
pub async fn render_stored_page(
    store: &dyn ObjectStore,
    engine: Arc<dyn PdfEngine>,
    key: &str,
    dpi: u32,
) -> Result<RenderedImage, PageStoreError> {
    let bytes = store.get(key).await?;
    debug!("Fetched {} ({} bytes)", key, bytes.len());
    render::render_page(engine, key.to_string(), bytes, dpi).await
}

/// Render a page for the selection preview.
///
/// Only `config.preview_dpi` is accepted; `None` means that value. Any other
/// DPI is rejected before the store or engine is touched.
pub async fn render_preview(
    store: &dyn ObjectStore,
    engine: Arc<dyn PdfEngine>,
    config: &PageServiceConfig,
    document_id: &DocumentId,
    ordinal: u32,
    dpi: Option<u32>,
) -> Result<PreviewImage, PageStoreError> {
    let requested = dpi.unwrap_or(config.preview_dpi);
    if requested != config.preview_dpi {
        return Err(PageStoreError::UnsupportedPreviewDpi {
            requested,
            supported: config.preview_dpi,
        });
    }
    let file_name = keys::page_file_name(ordinal)?;
    let key = keys::page_key(document_id, ordinal)?;

    let image = render_stored_page(store, engine, &key, requested).await?;
    Ok(PreviewImage {
        file_name,
        b64: image.to_base64(),
        width: image.width,
        height: image.height,
    })
}

/// Make sure the `high_res_dpi` raster of a page exists under `base/{document_id}/`.
///
/// Idempotent: when the raster is already present nothing is fetched,
/// rendered or written.
pub async fn ensure_high_res(
    store: &dyn ObjectStore,
    engine: Arc<dyn PdfEngine>,
    config: &PageServiceConfig,
    document_id: &DocumentId,
    ordinal: u32,
) -> Result<HighResOutcome, PageStoreError> {
    let page_key = keys::page_key(document_id, ordinal)?;
    let raster_key = keys::raster_key_for_ordinal(document_id, ordinal)?;

    if store.exists(&raster_key).await? {
        info!("Image {} already exists", raster_key);
        return Ok(HighResOutcome::AlreadyExists { key: raster_key });
    }

    info!("Creating image {} at {} DPI", raster_key, config.high_res_dpi);
    let image = render_stored_page(store, engine, &page_key, config.high_res_dpi).await?;
    let bytes = image.png.len();
    store.put(&raster_key, image.png, PNG_CONTENT_TYPE).await?;

    Ok(HighResOutcome::Created {
        key: raster_key,
        width: image.width,
        height: image.height,
        bytes,
    })
}
