//! Shared fakes for the integration suites.
//!
//! `MockEngine` understands a tiny text document format so the split and
//! render logic can be exercised without the pdfium shared library:
//!
//! ```text
//! %PDF-MOCK
//! 101x200      ← page 1, 101×200 points
//! 102x200      ← page 2
//! BAD          ← page 3 cannot be extracted
//! ```
//!
//! An extracted page is the header plus its single line.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use pdfpages::{
    EngineError, ListPage, MemoryStore, ObjectStore, PageSource, PdfEngine, StoreError,
    SplitProgressCallback,
};
use pdfpages::error::StoreOp;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const MOCK_HEADER: &str = "%PDF-MOCK";

/// Route library logs to the test harness, filtered by `PDFPAGES_TEST_LOG`
/// (for example `PDFPAGES_TEST_LOG=pdfpages=debug`). Safe to call repeatedly.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("PDFPAGES_TEST_LOG")
        .unwrap_or_else(|_| EnvFilter::new("pdfpages=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Width in points of page `ordinal` in [`mock_pdf`] documents.
pub fn page_width(ordinal: u32) -> u32 {
    100 + ordinal
}

pub const PAGE_HEIGHT: u32 = 200;

/// An `n`-page mock document; page `i` is `(100 + i) × 200` points.
pub fn mock_pdf(n: u32) -> Vec<u8> {
    let mut doc = String::from(MOCK_HEADER);
    for ordinal in 1..=n {
        doc.push_str(&format!("\n{}x{}", page_width(ordinal), PAGE_HEIGHT));
    }
    doc.into_bytes()
}

/// A mock document built from explicit page lines.
pub fn mock_pdf_lines(lines: &[&str]) -> Vec<u8> {
    let mut doc = String::from(MOCK_HEADER);
    for line in lines {
        doc.push('\n');
        doc.push_str(line);
    }
    doc.into_bytes()
}

/// Pixel size the mock engine produces for a `w × h` page at `dpi`.
pub fn expected_size(w: u32, h: u32, dpi: u32) -> (u32, u32) {
    let scale = pdfpages::pipeline::render::scale_for_dpi(dpi);
    (
        (w as f32 * scale).round() as u32,
        (h as f32 * scale).round() as u32,
    )
}

// ── Engine ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockEngine {
    pub opens: AtomicUsize,
    pub rasterizations: AtomicUsize,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn rasterizations(&self) -> usize {
        self.rasterizations.load(Ordering::SeqCst)
    }
}

struct MockSource {
    lines: Vec<String>,
}

impl PageSource for MockSource {
    fn page_count(&self) -> usize {
        self.lines.len()
    }

    fn extract_page(&self, index: usize) -> Result<Vec<u8>, EngineError> {
        let line = &self.lines[index];
        if line == "BAD" {
            return Err(EngineError::Page {
                index,
                detail: "damaged page object".into(),
            });
        }
        Ok(format!("{}\n{}", MOCK_HEADER, line).into_bytes())
    }
}

fn parse_doc(bytes: &[u8]) -> Result<Vec<String>, EngineError> {
    let text = std::str::from_utf8(bytes).map_err(|e| EngineError::Parse(e.to_string()))?;
    let mut lines = text.lines();
    if lines.next() != Some(MOCK_HEADER) {
        return Err(EngineError::Parse("missing %PDF-MOCK header".into()));
    }
    Ok(lines.map(str::to_string).collect())
}

impl PdfEngine for MockEngine {
    fn with_source(
        &self,
        source: &[u8],
        visit: &mut dyn FnMut(&dyn PageSource) -> Result<(), EngineError>,
    ) -> Result<(), EngineError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let source = MockSource {
            lines: parse_doc(source)?,
        };
        visit(&source)
    }

    fn rasterize(&self, page: &[u8], scale: f32) -> Result<RgbImage, EngineError> {
        self.rasterizations.fetch_add(1, Ordering::SeqCst);
        let lines = parse_doc(page)?;
        let [line] = lines.as_slice() else {
            return Err(EngineError::Raster(format!(
                "expected a single page, found {}",
                lines.len()
            )));
        };
        let (w, h) = line
            .split_once('x')
            .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)))
            .ok_or_else(|| EngineError::Raster(format!("bad page geometry '{}'", line)))?;
        let width = (w as f32 * scale).round() as u32;
        let height = (h as f32 * scale).round() as u32;
        Ok(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])))
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

/// A [`MemoryStore`] that counts calls, can fail chosen uploads and can
/// scramble each listing page.
#[derive(Default)]
pub struct TestStore {
    pub inner: MemoryStore,
    pub puts: AtomicUsize,
    pub gets: AtomicUsize,
    pub exists_calls: AtomicUsize,
    pub lists: AtomicUsize,
    pub list_sizes: Mutex<Vec<usize>>,
    fail_put_ordinals: HashSet<u32>,
    missing_get_ordinals: HashSet<u32>,
    shuffle_listing: bool,
    io_delay: Option<Duration>,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl TestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `put` for page keys with these ordinals.
    pub fn failing_puts(mut self, ordinals: &[u32]) -> Self {
        self.fail_put_ordinals = ordinals.iter().copied().collect();
        self
    }

    /// Answer `get` for page keys with these ordinals with `NotFound`, as if
    /// the object vanished between listing and fetching.
    pub fn missing_on_get(mut self, ordinals: &[u32]) -> Self {
        self.missing_get_ordinals = ordinals.iter().copied().collect();
        self
    }

    /// Return every listing page in scrambled order.
    pub fn shuffled(mut self) -> Self {
        self.shuffle_listing = true;
        self
    }

    /// Sleep inside `put`/`get` so concurrent calls overlap.
    pub fn with_io_delay(mut self, delay: Duration) -> Self {
        self.io_delay = Some(delay);
        self
    }

    pub fn total_calls(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
            + self.gets.load(Ordering::SeqCst)
            + self.exists_calls.load(Ordering::SeqCst)
            + self.lists.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn simulate_io(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.io_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for TestStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.simulate_io().await;
        if let Some(ordinal) = pdfpages::keys::parse_ordinal(key) {
            if self.fail_put_ordinals.contains(&ordinal) {
                return Err(StoreError::Backend {
                    op: StoreOp::Put,
                    key: key.to_string(),
                    detail: "injected failure".into(),
                });
            }
        }
        self.inner.put(key, bytes, content_type).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.simulate_io().await;
        if let Some(ordinal) = pdfpages::keys::parse_ordinal(key) {
            if self.missing_get_ordinals.contains(&ordinal) {
                return Err(StoreError::NotFound {
                    key: key.to_string(),
                });
            }
        }
        self.inner.get(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.exists(key).await
    }

    async fn list(
        &self,
        prefix: &str,
        page_size: usize,
        continuation_token: &str,
    ) -> Result<ListPage, StoreError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        let mut page = self.inner.list(prefix, page_size, continuation_token).await?;
        if self.shuffle_listing && page.keys.len() > 1 {
            page.keys.reverse();
            let mid = page.keys.len() / 2;
            page.keys.rotate_left(mid);
        }
        self.list_sizes.lock().unwrap().push(page.keys.len());
        Ok(page)
    }
}

// ── Progress ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingProgress {
    pub started_with: AtomicUsize,
    pub uploaded: Mutex<Vec<u32>>,
    pub failed: Mutex<Vec<u32>>,
    pub completed: Mutex<Option<(usize, usize)>>,
}

impl SplitProgressCallback for RecordingProgress {
    fn on_split_start(&self, total_pages: usize) {
        self.started_with.store(total_pages, Ordering::SeqCst);
    }

    fn on_page_uploaded(&self, ordinal: u32, _total_pages: usize) {
        self.uploaded.lock().unwrap().push(ordinal);
    }

    fn on_page_failed(&self, ordinal: u32, _total_pages: usize, _error: &str) {
        self.failed.lock().unwrap().push(ordinal);
    }

    fn on_split_complete(&self, total_pages: usize, uploaded: usize) {
        *self.completed.lock().unwrap() = Some((total_pages, uploaded));
    }
}
