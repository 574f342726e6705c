//! # pdfpages
//!
//! Split PDF documents into independently addressable single-page objects in
//! a key/value object store, and render stored pages to PNG on demand.
//!
//! ## Pipeline Overview
//!
//! ```text
//! split
//!  ├─ 1. Input    local file or HTTP(S) download, %PDF magic check
//!  ├─ 2. Extract  copy each page into its own document (pdfium, sequential)
//!  └─ 3. Upload   pdf/{id}/page_00000001.pdf … (5 in flight, settle-all)
//!
//! render
//!  ├─ thumbnails  list one page of keys → fetch+render ×20 → sort by page
//!  ├─ preview     one page at the fixed preview DPI (70)
//!  └─ high-res    base/{id}/page_XXXXXXXX.png at 220 DPI, written once
//! ```
//!
//! Page keys are zero-padded to 8 digits so the store's lexicographic listing
//! order is reading order.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfpages::{DocumentId, MemoryStore, PageService, PageServiceConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = PageService::with_pdfium(
//!         Arc::new(MemoryStore::new()),
//!         PageServiceConfig::default(),
//!     );
//!     let id = DocumentId::new("doc-1")?;
//!
//!     let summary = service.split_from(&id, "document.pdf").await?;
//!     eprintln!("{} pages stored", summary.total_pages);
//!
//!     let mut cursor = String::new();
//!     loop {
//!         let batch = service.thumbnails(&id, &cursor, None, None).await?;
//!         for thumb in &batch.images {
//!             println!("{} {}x{}", thumb.file_name, thumb.width, thumb.height);
//!         }
//!         if batch.is_last() {
//!             break;
//!         }
//!         cursor = batch.continuation_token;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfpages` binary (clap + anyhow + tracing-subscriber) |
//!
//! ## pdfium
//!
//! The pdfium shared library is loaded at runtime from `PDFIUM_LIB_PATH`
//! (a file or a directory), then the working directory, then the system
//! library path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod images;
pub mod keys;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod service;
pub mod split;
pub mod store;
pub mod thumbnails;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PageServiceConfig, PageServiceConfigBuilder};
pub use engine::{EngineError, PageSource, PdfEngine, PdfiumEngine};
pub use error::{BatchFailures, ErrorKind, ItemFailure, PageStoreError, StoreError, StoreOp};
pub use keys::DocumentId;
pub use output::{HighResOutcome, PreviewImage, SplitSummary, Thumbnail, ThumbnailPage};
pub use pipeline::render::RenderedImage;
pub use pipeline::schedule::{settle_all, BatchOutcome, ItemOutcome};
pub use progress::{NoopProgressCallback, ProgressCallback, SplitProgressCallback};
pub use service::PageService;
pub use store::{FsStore, ListPage, MemoryStore, ObjectStore};
