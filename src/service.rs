//! [`PageService`]: the object store, the engine and the configuration bound together.

use crate::config::PageServiceConfig;
use crate::engine::{PdfEngine, PdfiumEngine};
use crate::error::PageStoreError;
use crate::keys::DocumentId;
use crate::output::{HighResOutcome, PreviewImage, SplitSummary, ThumbnailPage};
use crate::pipeline::input;
use crate::store::ObjectStore;
use crate::{images, split, thumbnails};
use std::sync::Arc;

/// Entry point for every page operation.
///
/// Cheap to clone; clones share the store and engine.
///
/// ```rust,no_run
/// use pdfpages::{DocumentId, FsStore, PageService, PageServiceConfig};
/// use std::sync::Arc;
///
/// # async fn run() -> Result<(), pdfpages::PageStoreError> {
/// let service = PageService::with_pdfium(
///     Arc::new(FsStore::new("./store")),
///     PageServiceConfig::default(),
/// );
/// let id = DocumentId::new("report-2024")?;
/// let summary = service.split_from(&id, "report.pdf").await?;
/// let first = service.thumbnails(&id, "", None, None).await?;
/// assert!(first.images.len() <= 20);
/// # let _ = summary;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PageService {
    store: Arc<dyn ObjectStore>,
    engine: Arc<dyn PdfEngine>,
    config: PageServiceConfig,
}

impl PageService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        engine: Arc<dyn PdfEngine>,
        config: PageServiceConfig,
    ) -> Self {
        Self {
            store,
            engine,
            config,
        }
    }

    /// Use pdfium, located through `PDFIUM_LIB_PATH` or the default search.
    pub fn with_pdfium(store: Arc<dyn ObjectStore>, config: PageServiceConfig) -> Self {
        Self::new(store, Arc::new(PdfiumEngine::new()), config)
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn config(&self) -> &PageServiceConfig {
        &self.config
    }

    /// Split an in-memory source document into page artifacts.
    pub async fn split(
        &self,
        document_id: &DocumentId,
        source: Vec<u8>,
    ) -> Result<SplitSummary, PageStoreError> {
        split::split_document(
            self.store.as_ref(),
            Arc::clone(&self.engine),
            &self.config,
            document_id,
            source,
        )
        .await
    }

    /// Load `input` (a local path or http(s) URL) and split it.
    pub async fn split_from(
        &self,
        document_id: &DocumentId,
        input: &str,
    ) -> Result<SplitSummary, PageStoreError> {
        let source = input::read_source(input, self.config.download_timeout_secs).await?;
        self.split(document_id, source).await
    }

    /// Render one listing page of thumbnails; pass `""` for the first batch.
    pub async fn thumbnails(
        &self,
        document_id: &DocumentId,
        continuation_token: &str,
        page_size: Option<usize>,
        dpi: Option<u32>,
    ) -> Result<ThumbnailPage, PageStoreError> {
        thumbnails::list_thumbnails(
            self.store.as_ref(),
            Arc::clone(&self.engine),
            &self.config,
            document_id,
            continuation_token,
            page_size,
            dpi,
        )
        .await
    }

    /// Preview render of the page with `ordinal`.
    pub async fn preview(
        &self,
        document_id: &DocumentId,
        ordinal: u32,
        dpi: Option<u32>,
    ) -> Result<PreviewImage, PageStoreError> {
        images::render_preview(
            self.store.as_ref(),
            Arc::clone(&self.engine),
            &self.config,
            document_id,
            ordinal,
            dpi,
        )
        .await
    }

    /// Ensure the cached high-resolution raster of the page with `ordinal`.
    pub async fn ensure_high_res(
        &self,
        document_id: &DocumentId,
        ordinal: u32,
    ) -> Result<HighResOutcome, PageStoreError> {
        images::ensure_high_res(
            self.store.as_ref(),
            Arc::clone(&self.engine),
            &self.config,
            document_id,
            ordinal,
        )
        .await
    }
}
