//! Progress-callback trait for per-page split events.
//!
//! Inject an [`Arc<dyn SplitProgressCallback>`] via
//! [`crate::config::PageServiceConfigBuilder::progress_callback`] to receive
//! events as pages are uploaded. The CLI uses this to drive its progress bar.
//!
//! # Example
//!
//! ```rust
//! use pdfpages::{PageServiceConfig, SplitProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     uploaded: AtomicUsize,
//! }
//!
//! impl SplitProgressCallback for CountingCallback {
//!     fn on_page_uploaded(&self, ordinal: u32, total_pages: usize) {
//!         let done = self.uploaded.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("page {} stored ({}/{})", ordinal, done, total_pages);
//!     }
//! }
//!
//! let config = PageServiceConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { uploaded: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the split operation as it uploads pages.
///
/// Uploads run concurrently, so `on_page_uploaded` and `on_page_failed` may
/// be called from several tasks at once and in any ordinal order.
/// All methods default to no-ops.
pub trait SplitProgressCallback: Send + Sync {
    /// Called once extraction finished, before any upload starts.
    fn on_split_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when the page with `ordinal` is stored.
    fn on_page_uploaded(&self, ordinal: u32, total_pages: usize) {
        let _ = (ordinal, total_pages);
    }

    /// Called when storing the page with `ordinal` failed.
    fn on_page_failed(&self, ordinal: u32, total_pages: usize, error: &str) {
        let _ = (ordinal, total_pages, error);
    }

    /// Called once every upload has settled.
    fn on_split_complete(&self, total_pages: usize, uploaded: usize) {
        let _ = (total_pages, uploaded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SplitProgressCallback for NoopProgressCallback {}

/// Type stored in [`crate::config::PageServiceConfig`].
pub type ProgressCallback = Arc<dyn SplitProgressCallback>;
