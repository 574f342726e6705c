//! Bounded settle-all task scheduler.
//!
//! [`settle_all`] drives a batch of independent futures with at most `limit`
//! in flight and returns only once every one of them has finished. A failing
//! item never cancels its siblings; the aggregate verdict is computed after
//! the fact by [`BatchOutcome::into_result`].
//!
//! Completion order is arbitrary. Outcomes are handed back in input order, so
//! callers that submitted work in ordinal order get results in ordinal order.

use crate::error::{BatchFailures, ItemFailure, PageStoreError};
use futures::stream::{self, StreamExt};
use std::future::Future;
use tracing::{debug, warn};

/// Result of one scheduled item, tagged with the identifier it was submitted under.
#[derive(Debug)]
pub struct ItemOutcome<T> {
    pub id: String,
    pub result: Result<T, PageStoreError>,
}

/// Every item's outcome, in submission order.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub items: Vec<ItemOutcome<T>>,
}

impl<T> BatchOutcome<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when no item failed (vacuously true for an empty batch).
    pub fn is_success(&self) -> bool {
        self.items.iter().all(|i| i.result.is_ok())
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_ok()).count()
    }

    /// Identifiers of failed items, in submission order.
    pub fn failed_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|i| i.result.is_err())
            .map(|i| i.id.clone())
            .collect()
    }

    /// Collapse into the successful values, or a [`PageStoreError::BatchFailed`]
    /// carrying every failed item with its original error.
    pub fn into_result(self, operation: &str) -> Result<Vec<T>, PageStoreError> {
        let total = self.items.len();
        let mut values = Vec::with_capacity(total);
        let mut failures = Vec::new();

        for item in self.items {
            match item.result {
                Ok(v) => values.push(v),
                Err(error) => failures.push(ItemFailure { id: item.id, error }),
            }
        }

        if failures.is_empty() {
            Ok(values)
        } else {
            Err(PageStoreError::BatchFailed {
                operation: operation.to_string(),
                total,
                failures: BatchFailures::new(failures),
            })
        }
    }
}

/// Run `tasks` with at most `limit` concurrently and wait for all of them.
///
/// Fails up front only when `limit` is zero; item failures are reported in
/// the returned [`BatchOutcome`].
pub async fn settle_all<T, Fut>(
    tasks: Vec<(String, Fut)>,
    limit: usize,
) -> Result<BatchOutcome<T>, PageStoreError>
where
    Fut: Future<Output = Result<T, PageStoreError>>,
{
    if limit == 0 {
        return Err(PageStoreError::InvalidConfig(
            "Concurrency limit must be ≥ 1".into(),
        ));
    }

    let total = tasks.len();
    debug!("Scheduling {} tasks with limit {}", total, limit);

    let mut settled: Vec<(usize, ItemOutcome<T>)> =
        stream::iter(tasks.into_iter().enumerate().map(|(pos, (id, task))| async move {
            let result = task.await;
            if let Err(ref e) = result {
                warn!("Task {} failed: {}", id, e);
            }
            (pos, ItemOutcome { id, result })
        }))
        .buffer_unordered(limit)
        .collect()
        .await;

    settled.sort_by_key(|(pos, _)| *pos);

    Ok(BatchOutcome {
        items: settled.into_iter().map(|(_, item)| item).collect(),
    })
}
