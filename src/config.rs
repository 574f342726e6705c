//! Configuration for the page service.
//!
//! Every knob lives in [`PageServiceConfig`], built via
//! [`PageServiceConfigBuilder`]. Defaults match the production deployment:
//! five concurrent uploads, twenty concurrent thumbnail renders, 70 DPI
//! previews and 220 DPI detection images.

use crate::error::PageStoreError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Configuration for split and render operations.
///
/// # Example
/// ```rust
/// use pdfpages::PageServiceConfig;
///
/// let config = PageServiceConfig::builder()
///     .upload_concurrency(8)
///     .thumbnail_dpi(40)
///     .build()
///     .unwrap();
/// assert_eq!(config.preview_dpi, 70);
/// ```
#[derive(Clone)]
pub struct PageServiceConfig {
    /// Page uploads in flight during a split. Default: 5.
    pub upload_concurrency: usize,

    /// Fetch+render tasks in flight per thumbnail batch. Default: 20.
    pub thumbnail_concurrency: usize,

    /// The only DPI accepted by preview renders. Default: 70.
    pub preview_dpi: u32,

    /// DPI of cached high-resolution rasters. Default: 220.
    pub high_res_dpi: u32,

    /// DPI used when a thumbnail request names none. Default: 30.
    pub thumbnail_dpi: u32,

    /// Keys listed per thumbnail batch when the request names no size. Default: 20.
    pub thumbnail_page_size: usize,

    /// Upper bound for any requested DPI. Default: 600.
    ///
    /// A 600 DPI render of a Letter page is 5100 × 6600 px (~100 MB of RGB).
    pub max_dpi: u32,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress callback for split events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PageServiceConfig {
    fn default() -> Self {
        Self {
            upload_concurrency: 5,
            thumbnail_concurrency: 20,
            preview_dpi: 70,
            high_res_dpi: 220,
            thumbnail_dpi: 30,
            thumbnail_page_size: 20,
            max_dpi: 600,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PageServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageServiceConfig")
            .field("upload_concurrency", &self.upload_concurrency)
            .field("thumbnail_concurrency", &self.thumbnail_concurrency)
            .field("preview_dpi", &self.preview_dpi)
            .field("high_res_dpi", &self.high_res_dpi)
            .field("thumbnail_dpi", &self.thumbnail_dpi)
            .field("thumbnail_page_size", &self.thumbnail_page_size)
            .field("max_dpi", &self.max_dpi)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn SplitProgressCallback>"),
            )
            .finish()
    }
}

impl PageServiceConfig {
    /// Create a new builder for `PageServiceConfig`.
    pub fn builder() -> PageServiceConfigBuilder {
        PageServiceConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PageServiceConfig`].
#[derive(Debug)]
pub struct PageServiceConfigBuilder {
    config: PageServiceConfig,
}

impl PageServiceConfigBuilder {
    pub fn upload_concurrency(mut self, n: usize) -> Self {
        self.config.upload_concurrency = n;
        self
    }

    pub fn thumbnail_concurrency(mut self, n: usize) -> Self {
        self.config.thumbnail_concurrency = n;
        self
    }

    pub fn preview_dpi(mut self, dpi: u32) -> Self {
        self.config.preview_dpi = dpi;
        self
    }

    pub fn high_res_dpi(mut self, dpi: u32) -> Self {
        self.config.high_res_dpi = dpi;
        self
    }

    pub fn thumbnail_dpi(mut self, dpi: u32) -> Self {
        self.config.thumbnail_dpi = dpi;
        self
    }

    pub fn thumbnail_page_size(mut self, n: usize) -> Self {
        self.config.thumbnail_page_size = n;
        self
    }

    pub fn max_dpi(mut self, dpi: u32) -> Self {
        self.config.max_dpi = dpi;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PageServiceConfig, PageStoreError> {
        let c = &self.config;
        if c.upload_concurrency == 0 {
            return Err(PageStoreError::InvalidConfig(
                "Upload concurrency must be ≥ 1".into(),
            ));
        }
        if c.thumbnail_concurrency == 0 {
            return Err(PageStoreError::InvalidConfig(
                "Thumbnail concurrency must be ≥ 1".into(),
            ));
        }
        if c.thumbnail_page_size == 0 {
            return Err(PageStoreError::InvalidConfig(
                "Thumbnail page size must be ≥ 1".into(),
            ));
        }
        if c.max_dpi == 0 {
            return Err(PageStoreError::InvalidConfig("Max DPI must be ≥ 1".into()));
        }
        for (name, dpi) in [
            ("preview", c.preview_dpi),
            ("high-res", c.high_res_dpi),
            ("thumbnail", c.thumbnail_dpi),
        ] {
            if dpi == 0 || dpi > c.max_dpi {
                return Err(PageStoreError::InvalidConfig(format!(
                    "{} DPI must be 1–{}, got {}",
                    name, c.max_dpi, dpi
                )));
            }
        }
        Ok(self.config)
    }
}
