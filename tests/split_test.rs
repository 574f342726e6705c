//! Integration tests for splitting documents into page artifacts.

mod common;

use common::{mock_pdf, mock_pdf_lines, MockEngine, RecordingProgress, TestStore};
use pdfpages::keys::{page_key, parse_ordinal};
use pdfpages::{
    DocumentId, ErrorKind, FsStore, MemoryStore, ObjectStore, PageService, PageServiceConfig,
    PageStoreError,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn doc_id() -> DocumentId {
    common::init_tracing();
    DocumentId::new("doc-42").unwrap()
}

#[tokio::test]
async fn split_yields_one_artifact_per_page_in_key_order() {
    for n in [1u32, 2, 9, 10, 11, 99, 100, 101, 500] {
        let store = Arc::new(MemoryStore::new());
        let service = PageService::new(
            store.clone(),
            Arc::new(MockEngine::new()),
            PageServiceConfig::default(),
        );

        let summary = service.split(&doc_id(), mock_pdf(n)).await.unwrap();
        assert_eq!(summary.total_pages, n as usize);
        assert_eq!(summary.keys.len(), n as usize);

        let ordinals: Vec<u32> = summary
            .keys
            .iter()
            .map(|k| parse_ordinal(k).unwrap())
            .collect();
        assert_eq!(ordinals, (1..=n).collect::<Vec<_>>(), "n = {n}");
        assert!(
            summary.keys.windows(2).all(|w| w[0] < w[1]),
            "keys not strictly increasing for n = {n}"
        );

        // The store's own lexicographic order is reading order too.
        assert_eq!(store.keys().await, summary.keys);
        assert_eq!(
            store.content_type(&summary.keys[0]).await.as_deref(),
            Some("application/pdf")
        );
    }
}

#[tokio::test]
async fn each_artifact_holds_exactly_its_page() {
    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(MockEngine::new());
    let service = PageService::new(store.clone(), engine.clone(), PageServiceConfig::default());
    service.split(&doc_id(), mock_pdf(3)).await.unwrap();
    // The source is opened once and every page copied out of that handle.
    assert_eq!(engine.opens(), 1);
    assert_eq!(engine.rasterizations(), 0);

    let page2 = store.get(&page_key(&doc_id(), 2).unwrap()).await.unwrap();
    assert_eq!(String::from_utf8(page2).unwrap(), "%PDF-MOCK\n102x200");
}

#[tokio::test]
async fn failed_uploads_are_reported_and_not_rolled_back() {
    let store = Arc::new(TestStore::new().failing_puts(&[3, 7]));
    let progress = Arc::new(RecordingProgress::default());
    let config = PageServiceConfig::builder()
        .progress_callback(progress.clone())
        .build()
        .unwrap();
    let service = PageService::new(store.clone(), Arc::new(MockEngine::new()), config);

    let err = service.split(&doc_id(), mock_pdf(10)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Batch);
    match &err {
        PageStoreError::BatchFailed {
            operation,
            total,
            failures,
        } => {
            assert_eq!(operation, "upload");
            assert_eq!(failures.ids(), vec!["3", "7"]);
            assert_eq!(*total, 10);
            for failure in failures.iter() {
                assert_eq!(failure.error.kind(), ErrorKind::Store);
                assert!(!failure.error.is_not_found());
            }
        }
        other => panic!("expected BatchFailed, got {other:?}"),
    }
    assert!(err.to_string().contains("page_00000003.pdf"), "{err}");

    // Every upload settled; the 8 successful pages stay in the store.
    assert_eq!(store.puts.load(Ordering::SeqCst), 10);
    let stored: Vec<u32> = store
        .inner
        .keys()
        .await
        .iter()
        .map(|k| parse_ordinal(k).unwrap())
        .collect();
    assert_eq!(stored, vec![1, 2, 4, 5, 6, 8, 9, 10]);

    let mut failed = progress.failed.lock().unwrap().clone();
    failed.sort_unstable();
    assert_eq!(failed, vec![3, 7]);
    assert_eq!(progress.uploaded.lock().unwrap().len(), 8);
    assert_eq!(progress.started_with.load(Ordering::SeqCst), 10);
    assert_eq!(*progress.completed.lock().unwrap(), Some((10, 8)));
}

#[tokio::test]
async fn uploads_respect_the_concurrency_bound() {
    let store = Arc::new(TestStore::new().with_io_delay(Duration::from_millis(5)));
    let service = PageService::new(
        store.clone(),
        Arc::new(MockEngine::new()),
        PageServiceConfig::default(),
    );

    service.split(&doc_id(), mock_pdf(30)).await.unwrap();
    assert_eq!(store.puts.load(Ordering::SeqCst), 30);
    assert!(store.peak() <= 5, "peak {} exceeds 5", store.peak());
    assert!(store.peak() >= 2, "uploads never overlapped");
}

#[tokio::test]
async fn empty_source_is_rejected_before_any_io() {
    let store = Arc::new(TestStore::new());
    let engine = Arc::new(MockEngine::new());
    let service = PageService::new(store.clone(), engine.clone(), PageServiceConfig::default());

    let err = service.split(&doc_id(), Vec::new()).await.unwrap_err();
    assert!(matches!(err, PageStoreError::EmptySource));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(store.total_calls(), 0);
    assert_eq!(engine.opens(), 0);
}

#[tokio::test]
async fn corrupt_source_uploads_nothing() {
    let store = Arc::new(TestStore::new());
    let service = PageService::new(
        store.clone(),
        Arc::new(MockEngine::new()),
        PageServiceConfig::default(),
    );

    let err = service
        .split(&doc_id(), b"not a document".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, PageStoreError::CorruptSource { .. }));
    assert_eq!(err.kind(), ErrorKind::Extraction);
    assert_eq!(store.puts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn zero_page_source_is_an_extraction_error() {
    let store = Arc::new(TestStore::new());
    let service = PageService::new(
        store.clone(),
        Arc::new(MockEngine::new()),
        PageServiceConfig::default(),
    );

    let err = service.split(&doc_id(), mock_pdf(0)).await.unwrap_err();
    assert!(matches!(err, PageStoreError::NoPages));
    assert_eq!(store.puts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn one_bad_page_aborts_the_whole_split() {
    let store = Arc::new(TestStore::new());
    let service = PageService::new(
        store.clone(),
        Arc::new(MockEngine::new()),
        PageServiceConfig::default(),
    );

    let source = mock_pdf_lines(&["101x200", "102x200", "BAD", "104x200"]);
    match service.split(&doc_id(), source).await {
        Err(PageStoreError::PageExtractionFailed { ordinal, .. }) => assert_eq!(ordinal, 3),
        other => panic!("expected PageExtractionFailed, got {other:?}"),
    }
    assert_eq!(store.puts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn split_from_local_file_into_directory_store() {
    let input_dir = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    let input = input_dir.path().join("source.pdf");
    std::fs::write(&input, mock_pdf(4)).unwrap();

    let service = PageService::new(
        Arc::new(FsStore::new(store_dir.path())),
        Arc::new(MockEngine::new()),
        PageServiceConfig::default(),
    );
    let summary = service
        .split_from(&doc_id(), input.to_str().unwrap())
        .await
        .unwrap();

    assert_eq!(summary.total_pages, 4);
    for ordinal in 1..=4 {
        let path = store_dir
            .path()
            .join(format!("pdf/doc-42/page_{:08}.pdf", ordinal));
        assert!(path.is_file(), "missing {}", path.display());
    }
}

#[tokio::test]
async fn split_from_rejects_non_pdf_input() {
    let input_dir = TempDir::new().unwrap();
    let input = input_dir.path().join("notes.txt");
    std::fs::write(&input, "plain text").unwrap();

    let store = Arc::new(TestStore::new());
    let service = PageService::new(
        store.clone(),
        Arc::new(MockEngine::new()),
        PageServiceConfig::default(),
    );
    let err = service
        .split_from(&doc_id(), input.to_str().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, PageStoreError::NotAPdf { .. }));
    assert_eq!(store.total_calls(), 0);
}
