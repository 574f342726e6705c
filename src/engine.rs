//! PDF processing engine: page extraction and rasterisation behind a trait.
//!
//! ## Thread safety
//!
//! pdfium keeps global library state and is not safe to drive from several
//! threads at once. Two rules follow:
//!
//! 1. Every operation binds its own [`Pdfium`] instance, opens its own document
//!    from its own buffer, and drops both before returning. No engine handle
//!    outlives the call that created it.
//! 2. All pdfium work in the process is serialised behind [`ENGINE_LOCK`].
//!    Concurrent thumbnail tasks still overlap their store I/O; only the CPU
//!    section is taken one at a time.
//!
//! Callers run these blocking methods on `tokio::task::spawn_blocking`.
//!
//! The [`PdfEngine`] trait is the seam the rest of the crate is written
//! against, so the scheduling and ordering logic can be exercised without a
//! pdfium shared library present.

use image::RgbImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming a pdfium library file or the directory holding it.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Process-wide serialisation point for pdfium calls.
static ENGINE_LOCK: Mutex<()> = Mutex::new(());

/// Errors raised inside the engine, before the caller attaches key/ordinal context.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The native library could not be loaded.
    #[error("{0}")]
    Unavailable(String),

    /// The buffer is not a document the engine can open.
    #[error("{0}")]
    Parse(String),

    /// A single page could not be copied out of its source.
    #[error("page index {index}: {detail}")]
    Page { index: usize, detail: String },

    /// The page opened but could not be rasterised.
    #[error("{0}")]
    Raster(String),
}

/// Read-only view of an opened multi-page source document.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Serialise page `index` (0-based) as an independent single-page document.
    ///
    /// The returned buffer shares no storage with the source.
    fn extract_page(&self, index: usize) -> Result<Vec<u8>, EngineError>;
}

/// A document engine able to split sources and rasterise single pages.
///
/// Methods block; run them on a blocking thread.
pub trait PdfEngine: Send + Sync {
    /// Open `source` and hand it to `visit` for the duration of the call.
    ///
    /// The opened document is released when this method returns, on success
    /// and on error alike.
    fn with_source(
        &self,
        source: &[u8],
        visit: &mut dyn FnMut(&dyn PageSource) -> Result<(), EngineError>,
    ) -> Result<(), EngineError>;

    /// Rasterise the first page of `page` at `scale` (1.0 = 72 DPI) to RGB.
    fn rasterize(&self, page: &[u8], scale: f32) -> Result<RgbImage, EngineError>;
}

/// pdfium-backed [`PdfEngine`].
#[derive(Debug, Clone, Default)]
pub struct PdfiumEngine {
    library_path: Option<PathBuf>,
}

impl PdfiumEngine {
    /// Locate pdfium via `PDFIUM_LIB_PATH`, then `./`, then the system path.
    pub fn new() -> Self {
        let library_path = std::env::var_os(PDFIUM_LIB_PATH_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self { library_path }
    }

    /// Use the pdfium library at `path` (a library file or its directory).
    pub fn with_library_path(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    /// Verify the library can be bound, without opening any document.
    pub fn probe(&self) -> Result<(), EngineError> {
        let _guard = engine_guard();
        self.bind().map(drop)
    }

    /// Run `f` against a freshly bound [`Pdfium`] while holding the engine lock.
    ///
    /// For code that needs raw pdfium access (fixture generation in tests)
    /// without racing the engine's own calls.
    #[doc(hidden)]
    pub fn with_pdfium<R>(&self, f: impl FnOnce(&Pdfium) -> R) -> Result<R, EngineError> {
        let _guard = engine_guard();
        let pdfium = self.bind()?;
        Ok(f(&pdfium))
    }

    fn bind(&self) -> Result<Pdfium, EngineError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(library_file(path)),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| EngineError::Unavailable(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}

fn engine_guard() -> MutexGuard<'static, ()> {
    // A panic inside a previous pdfium call poisons the lock; the guarded data
    // is `()`, so recovering it is sound.
    ENGINE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct PdfiumSource<'a> {
    pdfium: &'a Pdfium,
    document: PdfDocument<'a>,
}

impl PageSource for PdfiumSource<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn extract_page(&self, index: usize) -> Result<Vec<u8>, EngineError> {
        let page_error = |e: PdfiumError| EngineError::Page {
            index,
            detail: format!("{:?}", e),
        };

        // Scoped to this call: the single-page document is destroyed on return.
        let mut single = self.pdfium.create_new_pdf().map_err(page_error)?;
        single
            .pages_mut()
            .copy_page_from_document(&self.document, index as PdfPageIndex, 0)
            .map_err(page_error)?;
        let bytes = single.save_to_bytes().map_err(page_error)?;

        debug!("Extracted page index {} → {} bytes", index, bytes.len());
        Ok(bytes)
    }
}

impl PdfEngine for PdfiumEngine {
    fn with_source(
        &self,
        source: &[u8],
        visit: &mut dyn FnMut(&dyn PageSource) -> Result<(), EngineError>,
    ) -> Result<(), EngineError> {
        let _guard = engine_guard();
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_slice(source, None)
            .map_err(|e| EngineError::Parse(format!("{:?}", e)))?;

        let view = PdfiumSource {
            pdfium: &pdfium,
            document,
        };
        visit(&view)
    }

    fn rasterize(&self, page: &[u8], scale: f32) -> Result<RgbImage, EngineError> {
        let _guard = engine_guard();
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_slice(page, None)
            .map_err(|e| EngineError::Parse(format!("{:?}", e)))?;
        let pages = document.pages();
        let first = pages
            .get(0)
            .map_err(|e| EngineError::Raster(format!("no first page: {:?}", e)))?;

        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = first
            .render_with_config(&render_config)
            .map_err(|e| EngineError::Raster(format!("{:?}", e)))?;

        // Alpha is dropped: output is plain RGB.
        let image = bitmap.as_image().to_rgb8();
        debug!(
            "Rasterised page at scale {:.3} → {}x{} px",
            scale,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}
