//! Pipeline stages shared by the split and render operations.
//!
//! ## Data Flow
//!
//! ```text
//! split:  input ──▶ extract ──▶ schedule(put × N, K=5)
//!         (URL/path) (pdfium)    (object store)
//!
//! render: list/get ──▶ render ──▶ encode
//!         (store)      (pdfium)   (PNG, base64)
//! ```
//!
//! 1. [`input`]: load a path or URL into memory and check the PDF magic
//! 2. [`extract`]: copy each page into its own document, sequentially, on a
//!    blocking thread
//! 3. [`schedule`]: bounded settle-all concurrency for store I/O batches
//! 4. [`render`]: rasterise one page at `dpi / 72` in `spawn_blocking`
//! 5. [`encode`]: PNG-encode and base64-wrap rasters

pub mod encode;
pub mod extract;
pub mod input;
pub mod render;
pub mod schedule;
