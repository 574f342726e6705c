//! Error types for the pdfpages library.
//!
//! Two layers of error reflect two layers of the system:
//!
//! * [`StoreError`]: a single object-store call failed. It always names the
//!   operation and the key so a failed batch can be traced back to the exact
//!   object.
//!
//! * [`PageStoreError`]: what every public operation returns. It wraps store
//!   errors unchanged in kind and adds validation, extraction, render and
//!   batch-aggregation failures.
//!
//! [`PageStoreError::kind`] collapses the variants into the coarse
//! [`ErrorKind`] taxonomy so callers (an HTTP layer, the CLI) can map a
//! failure to a response without matching on every variant. In particular a
//! page that is absent from the store (`Store`) is never confused with a page
//! that is present but corrupt (`Render`).

use std::fmt;
use thiserror::Error;

/// Object-store operation that produced a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Put,
    Get,
    Exists,
    List,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOp::Put => "put",
            StoreOp::Get => "get",
            StoreOp::Exists => "exists",
            StoreOp::List => "list",
        };
        f.write_str(name)
    }
}

/// Failure of one object-store call.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// `get` on a key that holds no object.
    #[error("object '{key}' not found")]
    NotFound { key: String },

    /// The key cannot be represented by this store (e.g. path traversal).
    #[error("invalid object key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Network or backend failure.
    #[error("store {op} failed for '{key}': {detail}")]
    Backend {
        op: StoreOp,
        key: String,
        detail: String,
    },
}

impl StoreError {
    /// Key the failing call was addressed to (the prefix, for `list`).
    pub fn key(&self) -> &str {
        match self {
            StoreError::NotFound { key }
            | StoreError::InvalidKey { key, .. }
            | StoreError::Backend { key, .. } => key,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// One failed item of a settle-all batch.
#[derive(Debug)]
pub struct ItemFailure {
    /// Identifier the item was scheduled under.
    pub id: String,
    pub error: PageStoreError,
}

/// Failed items of a batch, in submission order.
#[derive(Debug, Default)]
pub struct BatchFailures(Vec<ItemFailure>);

impl BatchFailures {
    pub fn new(items: Vec<ItemFailure>) -> Self {
        Self(items)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ItemFailure> {
        self.0.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.0.iter().map(|f| f.id.as_str()).collect()
    }

    /// Error recorded for item `id`, if it failed.
    pub fn get(&self, id: &str) -> Option<&PageStoreError> {
        self.0.iter().find(|f| f.id == id).map(|f| &f.error)
    }

    fn first_message(&self) -> String {
        self.0
            .first()
            .map(|f| f.error.to_string())
            .unwrap_or_default()
    }
}

impl IntoIterator for BatchFailures {
    type Item = ItemFailure;
    type IntoIter = std::vec::IntoIter<ItemFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Coarse classification of a [`PageStoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, rejected before any I/O.
    Validation,
    /// Source document is malformed or a page could not be copied out.
    Extraction,
    /// Object store failure (including "not found").
    Store,
    /// Page bytes present but cannot be rasterised.
    Render,
    /// At least one item of a settle-all batch failed.
    Batch,
    /// Engine unavailable or an internal task failure.
    Internal,
}

/// All errors returned by the pdfpages library.
#[derive(Debug, Error)]
pub enum PageStoreError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// Requested resolution is zero or above the configured ceiling.
    #[error("Invalid DPI {dpi}: {reason}")]
    InvalidDpi { dpi: u32, reason: String },

    /// Preview renders accept exactly one resolution.
    #[error("DPI must be {supported}, but got {requested}")]
    UnsupportedPreviewDpi { requested: u32, supported: u32 },

    /// The source buffer handed to a split was empty.
    #[error("Received empty source document")]
    EmptySource,

    /// Ordinal cannot be encoded in the fixed-width key scheme.
    #[error("Page ordinal {ordinal} is out of range (must be 1..={max})")]
    OrdinalOutOfRange { ordinal: u64, max: u32 },

    /// Document identifier failed boundary validation.
    #[error("Invalid document id '{id}': {reason}")]
    InvalidDocumentId { id: String, reason: String },

    /// A page name that is neither an ordinal nor `page_XXXXXXXX.pdf`.
    #[error("Invalid page name '{name}': expected an ordinal or page_XXXXXXXX.pdf")]
    InvalidPageName { name: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The source document cannot be opened.
    #[error("Source document is corrupt: {detail}")]
    CorruptSource { detail: String },

    /// The source document opened but reports zero pages.
    #[error("Source document contains no pages")]
    NoPages,

    /// Copying one page out of the source failed; the whole split aborts.
    #[error("Extraction failed for page {ordinal}: {detail}")]
    PageExtractionFailed { ordinal: u32, detail: String },

    // ── Store errors ──────────────────────────────────────────────────────
    #[error(transparent)]
    Store(#[from] StoreError),

    // ── Render errors ─────────────────────────────────────────────────────
    /// The stored page exists but cannot be rasterised or encoded.
    #[error("Rendering failed for '{key}': {detail}")]
    RenderFailed { key: String, detail: String },

    // ── Batch errors ──────────────────────────────────────────────────────
    /// A settle-all batch finished with at least one failed item.
    /// Every failed item keeps its own error, so a missing page and a corrupt
    /// page in the same batch stay distinguishable.
    #[error("{operation}: {}/{total} items failed [{}]; first error: {}", .failures.len(), .failures.ids().join(", "), .failures.first_message())]
    BatchFailed {
        operation: String,
        total: usize,
        failures: BatchFailures,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Local source file does not exist.
    #[error("Source file not found: '{path}'")]
    SourceNotFound { path: String },

    /// Local source file exists but is not readable.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: String },

    /// The bytes do not start with the PDF magic number.
    #[error("'{origin}' is not a PDF (first bytes: {magic:?})")]
    NotAPdf { origin: String, magic: Vec<u8> },

    /// Download of a remote source failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The pdfium shared library could not be bound.
    #[error(
        "PDF engine unavailable: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or directory) or install pdfium on the system library path."
    )]
    EngineUnavailable(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PageStoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PageStoreError::InvalidDpi { .. }
            | PageStoreError::UnsupportedPreviewDpi { .. }
            | PageStoreError::EmptySource
            | PageStoreError::OrdinalOutOfRange { .. }
            | PageStoreError::InvalidDocumentId { .. }
            | PageStoreError::InvalidPageName { .. }
            | PageStoreError::InvalidConfig(_)
            | PageStoreError::SourceNotFound { .. }
            | PageStoreError::PermissionDenied { .. }
            | PageStoreError::NotAPdf { .. }
            | PageStoreError::DownloadFailed { .. } => ErrorKind::Validation,
            PageStoreError::CorruptSource { .. }
            | PageStoreError::NoPages
            | PageStoreError::PageExtractionFailed { .. } => ErrorKind::Extraction,
            PageStoreError::Store(_) => ErrorKind::Store,
            PageStoreError::RenderFailed { .. } => ErrorKind::Render,
            PageStoreError::BatchFailed { .. } => ErrorKind::Batch,
            PageStoreError::EngineUnavailable(_) | PageStoreError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// True when the error means "the object is absent" rather than "broken".
    pub fn is_not_found(&self) -> bool {
        matches!(self, PageStoreError::Store(e) if e.is_not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_failed_display_enumerates_ids() {
        let e = PageStoreError::BatchFailed {
            operation: "upload".into(),
            total: 10,
            failures: BatchFailures::new(vec![
                ItemFailure {
                    id: "3".into(),
                    error: PageStoreError::Internal("boom".into()),
                },
                ItemFailure {
                    id: "7".into(),
                    error: StoreError::NotFound { key: "k".into() }.into(),
                },
            ]),
        };
        let msg = e.to_string();
        assert!(msg.contains("2/10"), "got: {msg}");
        assert!(msg.contains("[3, 7]"), "got: {msg}");
        assert!(msg.contains("first error: Internal error: boom"), "got: {msg}");
        assert_eq!(e.kind(), ErrorKind::Batch);

        let PageStoreError::BatchFailed { failures, .. } = e else {
            unreachable!()
        };
        assert_eq!(failures.get("3").map(PageStoreError::kind), Some(ErrorKind::Internal));
        assert!(failures.get("7").is_some_and(PageStoreError::is_not_found));
        assert!(failures.get("5").is_none());
    }

    #[test]
    fn store_error_display_names_op_and_key() {
        let e = StoreError::Backend {
            op: StoreOp::Put,
            key: "pdf/doc/page_00000001.pdf".into(),
            detail: "connection reset".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("put"));
        assert!(msg.contains("page_00000001.pdf"));
        assert_eq!(e.key(), "pdf/doc/page_00000001.pdf");
    }

    #[test]
    fn not_found_is_distinct_from_render_failure() {
        let missing: PageStoreError = StoreError::NotFound { key: "k".into() }.into();
        let corrupt = PageStoreError::RenderFailed {
            key: "k".into(),
            detail: "bad xref".into(),
        };
        assert!(missing.is_not_found());
        assert_eq!(missing.kind(), ErrorKind::Store);
        assert!(!corrupt.is_not_found());
        assert_eq!(corrupt.kind(), ErrorKind::Render);
    }

    #[test]
    fn preview_dpi_display() {
        let e = PageStoreError::UnsupportedPreviewDpi {
            requested: 99,
            supported: 70,
        };
        assert_eq!(e.to_string(), "DPI must be 70, but got 99");
        assert_eq!(e.kind(), ErrorKind::Validation);
    }
}
