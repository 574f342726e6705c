//! Result types returned by the page service.
//!
//! Thumbnail and preview types serialise with camelCase field names so they
//! can be returned as-is from an HTTP handler.

use crate::keys::DocumentId;
use serde::{Deserialize, Serialize};

/// Outcome of a successful split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitSummary {
    pub document_id: DocumentId,
    pub total_pages: usize,
    /// Page keys in ordinal order.
    pub keys: Vec<String>,
    pub duration_ms: u64,
}

/// One rendered page of a thumbnail batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thumbnail {
    /// Full storage key of the page artifact.
    pub key: String,
    /// `page_XXXXXXXX.pdf`.
    pub file_name: String,
    pub page_number: u32,
    /// Base64 PNG.
    pub b64: String,
    pub width: u32,
    pub height: u32,
}

/// One listing page worth of thumbnails, sorted by page number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailPage {
    /// Pass back to fetch the next batch; empty when there is none.
    pub continuation_token: String,
    pub images: Vec<Thumbnail>,
}

impl ThumbnailPage {
    pub fn is_last(&self) -> bool {
        self.continuation_token.is_empty()
    }
}

/// Preview render of a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewImage {
    pub file_name: String,
    pub b64: String,
    pub width: u32,
    pub height: u32,
}

/// Result of ensuring a cached high-resolution raster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HighResOutcome {
    /// The raster was already cached; nothing was written.
    AlreadyExists { key: String },
    /// The raster was rendered and stored.
    Created {
        key: String,
        width: u32,
        height: u32,
        bytes: usize,
    },
}

impl HighResOutcome {
    pub fn key(&self) -> &str {
        match self {
            HighResOutcome::AlreadyExists { key } | HighResOutcome::Created { key, .. } => key,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, HighResOutcome::Created { .. })
    }
}
