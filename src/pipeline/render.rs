//! Page rasterisation: one stored single-page document → PNG at a given DPI.
//!
//! pdfium works in 72-DPI page space, so a page is scaled by `dpi / 72` on
//! both axes. Rendering is CPU-bound and runs inside `spawn_blocking`.

use crate::engine::{EngineError, PdfEngine};
use crate::error::PageStoreError;
use crate::pipeline::encode;
use std::sync::Arc;
use tracing::debug;

/// Native resolution of page coordinates.
pub const BASE_DPI: u32 = 72;

/// A rendered page, PNG-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RenderedImage {
    pub fn to_base64(&self) -> String {
        encode::to_base64(&self.png)
    }
}

/// Scale factor applied to page space for `dpi`.
pub fn scale_for_dpi(dpi: u32) -> f32 {
    dpi as f32 / BASE_DPI as f32
}

/// Reject resolutions outside `1..=max_dpi`.
pub fn validate_dpi(dpi: u32, max_dpi: u32) -> Result<(), PageStoreError> {
    if dpi == 0 {
        return Err(PageStoreError::InvalidDpi {
            dpi,
            reason: "must be positive".into(),
        });
    }
    if dpi > max_dpi {
        return Err(PageStoreError::InvalidDpi {
            dpi,
            reason: format!("exceeds the maximum of {}", max_dpi),
        });
    }
    Ok(())
}

/// Render `page` (stored under `key`) on a blocking thread.
pub async fn render_page(
    engine: Arc<dyn PdfEngine>,
    key: String,
    page: Vec<u8>,
    dpi: u32,
) -> Result<RenderedImage, PageStoreError> {
    tokio::task::spawn_blocking(move || render_page_blocking(engine.as_ref(), &key, &page, dpi))
        .await
        .map_err(|e| PageStoreError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of page rendering.
///
/// `key` is only used to label errors.
pub fn render_page_blocking(
    engine: &dyn PdfEngine,
    key: &str,
    page: &[u8],
    dpi: u32,
) -> Result<RenderedImage, PageStoreError> {
    let render_failed = |detail: String| PageStoreError::RenderFailed {
        key: key.to_string(),
        detail,
    };

    if page.is_empty() {
        return Err(render_failed("page buffer is empty".into()));
    }

    let image = engine
        .rasterize(page, scale_for_dpi(dpi))
        .map_err(|e| match e {
            EngineError::Unavailable(detail) => PageStoreError::EngineUnavailable(detail),
            other => render_failed(other.to_string()),
        })?;

    let png = encode::encode_png(&image).map_err(|e| render_failed(e.to_string()))?;
    debug!(
        "Rendered {} at {} DPI → {}x{} px",
        key,
        dpi,
        image.width(),
        image.height()
    );

    Ok(RenderedImage {
        png,
        width: image.width(),
        height: image.height(),
    })
}
