//! Object store contract consumed by the split and render operations.
//!
//! The store is an external collaborator: anything offering put/get/exists and
//! a paginated, prefix-scoped listing can back the crate (Azure Blob, S3,
//! MinIO, a local directory). Two implementations ship with the crate:
//!
//! * [`MemoryStore`]: in-process, for tests and embedding.
//! * [`FsStore`]: a directory tree, used by the CLI.
//!
//! Implementations must be safe to share across concurrent tasks: callers
//! hold an `Arc<dyn ObjectStore>` and issue many calls at once.

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Content type recorded for single-page PDF artifacts.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Content type recorded for rendered rasters.
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPage {
    /// Keys returned by this call. Stores make no ordering promise.
    pub keys: Vec<String>,
    /// Opaque cursor for the next call; empty when the listing is exhausted.
    pub next_continuation_token: String,
}

impl ListPage {
    pub fn is_last(&self) -> bool {
        self.next_continuation_token.is_empty()
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError>;

    /// Fetch an object; [`StoreError::NotFound`] when absent.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// List at most `page_size` keys under `prefix`, resuming after
    /// `continuation_token` (empty = from the start).
    async fn list(
        &self,
        prefix: &str,
        page_size: usize,
        continuation_token: &str,
    ) -> Result<ListPage, StoreError>;
}

/// Shared cursor logic for stores that can enumerate their keys in order.
///
/// `sorted_keys` must be sorted and contain only keys under the prefix. The
/// cursor is the last key of the previous page.
pub(crate) fn paginate(sorted_keys: Vec<String>, page_size: usize, continuation_token: &str) -> ListPage {
    let page_size = page_size.max(1);
    let mut remaining = sorted_keys
        .into_iter()
        .filter(|k| continuation_token.is_empty() || k.as_str() > continuation_token);

    let keys: Vec<String> = remaining.by_ref().take(page_size).collect();
    let has_more = remaining.next().is_some();

    let next_continuation_token = match (has_more, keys.last()) {
        (true, Some(last)) => last.clone(),
        _ => String::new(),
    };

    ListPage {
        keys,
        next_continuation_token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("pdf/d/page_{:08}.pdf", i)).collect()
    }

    #[test]
    fn paginate_walks_all_pages() {
        let all = keys(45);
        let mut token = String::new();
        let mut sizes = Vec::new();
        let mut seen = Vec::new();
        loop {
            let page = paginate(all.clone(), 20, &token);
            sizes.push(page.keys.len());
            seen.extend(page.keys.clone());
            if page.is_last() {
                break;
            }
            token = page.next_continuation_token;
        }
        assert_eq!(sizes, vec![20, 20, 5]);
        assert_eq!(seen, all);
    }

    #[test]
    fn exact_multiple_ends_with_empty_token() {
        let page = paginate(keys(20), 20, "");
        assert_eq!(page.keys.len(), 20);
        assert!(page.is_last());
    }

    #[test]
    fn empty_listing() {
        let page = paginate(Vec::new(), 20, "");
        assert!(page.keys.is_empty());
        assert!(page.is_last());
    }
}
