//! Storage key layout: deterministic, order-preserving object keys.
//!
//! Page artifacts live under `pdf/{document_id}/page_{ordinal:08}.pdf`.
//! The fixed 8-digit padding makes byte-wise key order equal numeric page
//! order: `page_00000002.pdf` sorts before `page_00000010.pdf`, whereas the
//! unpadded `page_10.pdf` would sort before `page_2.pdf`. Any store that lists
//! keys lexicographically therefore returns pages in reading order.
//!
//! Cached high-resolution rasters live under `base/{document_id}/{base_name}.png`,
//! where `base_name` is the page file name without its extension.

use crate::error::PageStoreError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the zero-padded ordinal.
pub const ORDINAL_WIDTH: usize = 8;

/// Largest ordinal representable in [`ORDINAL_WIDTH`] digits.
pub const MAX_ORDINAL: u32 = 99_999_999;

/// Key prefix for single-page PDF artifacts.
pub const PAGE_ROOT: &str = "pdf";

/// Key prefix for cached high-resolution rasters.
pub const RASTER_ROOT: &str = "base";

const MAX_DOCUMENT_ID_LEN: usize = 256;

static PAGE_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"page_(\d+)\.pdf$").unwrap());

/// Validated, opaque document identifier used as one key path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Validate `id` as a single key path segment.
    pub fn new(id: impl Into<String>) -> Result<Self, PageStoreError> {
        let id = id.into();
        let reject = |reason: &str| PageStoreError::InvalidDocumentId {
            id: id.clone(),
            reason: reason.to_string(),
        };

        if id.is_empty() {
            return Err(reject("must not be empty"));
        }
        if id.len() > MAX_DOCUMENT_ID_LEN {
            return Err(reject("longer than 256 bytes"));
        }
        if id.contains('/') || id.contains('\\') {
            return Err(reject("must not contain path separators"));
        }
        if id == "." || id.contains("..") {
            return Err(reject("must not contain '..' or be '.'"));
        }
        if id.chars().any(char::is_control) {
            return Err(reject("must not contain control characters"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = PageStoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

/// Reject ordinals that cannot be encoded without truncating the padding.
pub fn check_ordinal(ordinal: u64) -> Result<u32, PageStoreError> {
    if ordinal == 0 || ordinal > u64::from(MAX_ORDINAL) {
        return Err(PageStoreError::OrdinalOutOfRange {
            ordinal,
            max: MAX_ORDINAL,
        });
    }
    Ok(ordinal as u32)
}

/// `5` → `"00000005"`.
pub fn pad_ordinal(ordinal: u32) -> Result<String, PageStoreError> {
    let ordinal = check_ordinal(u64::from(ordinal))?;
    Ok(format!("{:0width$}", ordinal, width = ORDINAL_WIDTH))
}

/// `5` → `"page_00000005.pdf"`.
pub fn page_file_name(ordinal: u32) -> Result<String, PageStoreError> {
    Ok(format!("page_{}.pdf", pad_ordinal(ordinal)?))
}

/// Listing prefix covering every page artifact of a document.
pub fn page_prefix(document_id: &DocumentId) -> String {
    format!("{PAGE_ROOT}/{document_id}/")
}

/// `pdf/{document_id}/page_{ordinal:08}.pdf`.
pub fn page_key(document_id: &DocumentId, ordinal: u32) -> Result<String, PageStoreError> {
    Ok(format!("{}{}", page_prefix(document_id), page_file_name(ordinal)?))
}

/// `"page_00000021.pdf"` → `"page_00000021"`.
pub fn base_name(file_name: &str) -> &str {
    let file_name = file_name.rsplit('/').next().unwrap_or(file_name);
    file_name.split('.').next().unwrap_or(file_name)
}

/// `base/{document_id}/{base_name}.png`.
pub fn raster_key(document_id: &DocumentId, base_name: &str) -> String {
    format!("{RASTER_ROOT}/{document_id}/{base_name}.png")
}

/// Cached raster key for the page with the given ordinal.
pub fn raster_key_for_ordinal(
    document_id: &DocumentId,
    ordinal: u32,
) -> Result<String, PageStoreError> {
    let file_name = page_file_name(ordinal)?;
    Ok(raster_key(document_id, base_name(&file_name)))
}

/// Recover the ordinal from a page key or file name.
///
/// Returns `None` for keys that are not page artifacts or whose ordinal is
/// outside `1..=MAX_ORDINAL`.
pub fn parse_ordinal(key: &str) -> Option<u32> {
    let caps = PAGE_FILE_RE.captures(key)?;
    let ordinal: u64 = caps.get(1)?.as_str().parse().ok()?;
    check_ordinal(ordinal).ok()
}

/// Accept either a bare ordinal (`"21"`) or a page file name (`"page_00000021.pdf"`).
pub fn parse_page_ref(name: &str) -> Result<u32, PageStoreError> {
    let trimmed = name.trim();
    if let Ok(n) = trimmed.parse::<u64>() {
        return check_ordinal(n);
    }
    if !trimmed.contains('/') {
        if let Some(ordinal) = parse_ordinal(trimmed) {
            return Ok(ordinal);
        }
    }
    Err(PageStoreError::InvalidPageName {
        name: name.to_string(),
    })
}
