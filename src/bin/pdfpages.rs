//! CLI binary for pdfpages.
//!
//! A thin shim over the library crate: maps flags to `PageServiceConfig`,
//! uses a directory as the object store and prints results.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdfpages::keys::parse_page_ref;
use pdfpages::{
    DocumentId, FsStore, HighResOutcome, ObjectStore, PageService, PageServiceConfig, PdfiumEngine,
    ProgressCallback, SplitProgressCallback, ThumbnailPage,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Upload progress bar. Pages finish out of order, so the bar only counts.
struct CliProgressCallback {
    bar: ProgressBar,
    failures: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_split_start` reports the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(SPINNER_TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Extracting");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            failures: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(SPINNER_TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Uploading");
    }
}

impl SplitProgressCallback for CliProgressCallback {
    fn on_split_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Uploading {total_pages} pages…"))
        ));
    }

    fn on_page_uploaded(&self, _ordinal: u32, _total: usize) {
        self.bar.inc(1);
    }

    fn on_page_failed(&self, ordinal: u32, total: usize, error: &str) {
        self.failures.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>4}/{:<4}  {}",
            red("✗"),
            ordinal,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_split_complete(&self, total_pages: usize, uploaded: usize) {
        self.bar.finish_and_clear();
        let failed = total_pages.saturating_sub(uploaded);
        if failed == 0 {
            eprintln!(
                "{} {} pages stored",
                green("✔"),
                bold(&uploaded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages stored  ({} failed)",
                red("✘"),
                bold(&uploaded.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Split a local PDF into ./pdfpages-store/pdf/<id>/page_XXXXXXXX.pdf
  pdfpages split report.pdf --document-id report-2024

  # Split a PDF from a URL, id generated
  pdfpages split https://arxiv.org/pdf/1706.03762 --json

  # First batch of 20 thumbnails at 30 DPI, as JSON
  pdfpages thumbnails report-2024

  # Every batch, written out as PNG files
  pdfpages thumbnails report-2024 --all --out-dir thumbs/

  # Preview of page 21 (70 DPI)
  pdfpages preview report-2024 21 -o page21.png

  # Cache the 220 DPI raster of a page under base/<id>/
  pdfpages render-hd report-2024 page_00000021.pdf

ENVIRONMENT VARIABLES:
  PDFPAGES_STORE          Store root directory
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Override the log filter
"#;

/// Split PDFs into per-page objects and render stored pages on demand.
#[derive(Parser, Debug)]
#[command(
    name = "pdfpages",
    version,
    about = "Split PDFs into per-page objects and render stored pages on demand",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Root directory of the object store.
    #[arg(long, global = true, env = "PDFPAGES_STORE", default_value = "./pdfpages-store")]
    store: PathBuf,

    /// Path to the pdfium library (file or directory).
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium: Option<PathBuf>,

    /// Page uploads in flight during a split.
    #[arg(long, global = true, env = "PDFPAGES_UPLOAD_CONCURRENCY", default_value_t = 5)]
    upload_concurrency: usize,

    /// Fetch+render tasks in flight per thumbnail batch.
    #[arg(long, global = true, env = "PDFPAGES_THUMBNAIL_CONCURRENCY", default_value_t = 20)]
    thumbnail_concurrency: usize,

    /// HTTP download timeout in seconds.
    #[arg(long, global = true, env = "PDFPAGES_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print results as JSON.
    #[arg(long, global = true, env = "PDFPAGES_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "PDFPAGES_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFPAGES_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDFPAGES_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a PDF (path or http(s) URL) into single-page objects.
    Split {
        input: String,

        /// Document id; a random UUID when omitted.
        #[arg(long)]
        document_id: Option<String>,
    },

    /// Render one batch of thumbnails (or every batch with --all).
    Thumbnails {
        document_id: String,

        /// Continuation token returned by the previous batch.
        #[arg(long, default_value = "")]
        cursor: String,

        /// Pages per batch.
        #[arg(long)]
        page_size: Option<usize>,

        /// Thumbnail resolution.
        #[arg(long)]
        dpi: Option<u32>,

        /// Follow continuation tokens until the listing is exhausted.
        #[arg(long)]
        all: bool,

        /// Write PNG files here instead of printing base64.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Render the selection preview of one page.
    Preview {
        document_id: String,

        /// Page ordinal (21) or file name (page_00000021.pdf).
        page: String,

        /// Must equal the preview DPI (70).
        #[arg(long)]
        dpi: Option<u32>,

        /// Write the PNG here instead of printing JSON.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create the cached high-resolution raster of one page, if missing.
    RenderHd {
        document_id: String,

        /// Page ordinal (21) or file name (page_00000021.pdf).
        page: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress =
        !cli.quiet && !cli.no_progress && !cli.json && matches!(cli.command, Command::Split { .. });
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── PDF engine ───────────────────────────────────────────────────────
    let engine = match cli.pdfium {
        Some(ref path) => PdfiumEngine::with_library_path(path),
        None => PdfiumEngine::new(),
    };
    let probe = engine.clone();
    tokio::task::spawn_blocking(move || probe.probe())
        .await
        .context("PDF engine probe panicked")?
        .context("PDF engine unavailable; set PDFIUM_LIB_PATH=/path/to/libpdfium")?;

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn SplitProgressCallback>)
    } else {
        None
    };

    let mut builder = PageServiceConfig::builder()
        .upload_concurrency(cli.upload_concurrency)
        .thumbnail_concurrency(cli.thumbnail_concurrency)
        .download_timeout_secs(cli.download_timeout);
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    let store: Arc<dyn ObjectStore> = Arc::new(FsStore::new(&cli.store));
    let service = PageService::new(store, Arc::new(engine), config);

    match cli.command {
        Command::Split {
            ref input,
            ref document_id,
        } => run_split(&service, &cli, input, document_id.as_deref()).await,
        Command::Thumbnails {
            ref document_id,
            ref cursor,
            page_size,
            dpi,
            all,
            ref out_dir,
        } => {
            let id = parse_document_id(document_id)?;
            run_thumbnails(
                &service,
                &cli,
                &id,
                cursor,
                page_size,
                dpi,
                all,
                out_dir.as_deref(),
            )
            .await
        }
        Command::Preview {
            ref document_id,
            ref page,
            dpi,
            ref output,
        } => {
            let id = parse_document_id(document_id)?;
            run_preview(&service, &cli, &id, page, dpi, output.as_deref()).await
        }
        Command::RenderHd {
            ref document_id,
            ref page,
        } => {
            let id = parse_document_id(document_id)?;
            run_render_hd(&service, &cli, &id, page).await
        }
    }
}

fn parse_document_id(raw: &str) -> Result<DocumentId> {
    DocumentId::new(raw).context("Invalid document id")
}

async fn run_split(
    service: &PageService,
    cli: &Cli,
    input: &str,
    document_id: Option<&str>,
) -> Result<()> {
    let id = match document_id {
        Some(raw) => parse_document_id(raw)?,
        None => parse_document_id(&uuid::Uuid::new_v4().to_string())?,
    };

    let summary = service
        .split_from(&id, input)
        .await
        .with_context(|| format!("Failed to split '{}'", input))?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        println!("{}", summary.document_id);
        eprintln!(
            "{}  {} pages  {}ms  →  {}",
            green("✔"),
            summary.total_pages,
            summary.duration_ms,
            bold(&cli.store.join("pdf").join(id.as_str()).display().to_string()),
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_thumbnails(
    service: &PageService,
    cli: &Cli,
    id: &DocumentId,
    cursor: &str,
    page_size: Option<usize>,
    dpi: Option<u32>,
    all: bool,
    out_dir: Option<&Path>,
) -> Result<()> {
    if let Some(dir) = out_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let mut cursor = cursor.to_string();
    let mut batches: Vec<ThumbnailPage> = Vec::new();
    loop {
        let batch = service
            .thumbnails(id, &cursor, page_size, dpi)
            .await
            .context("Thumbnail batch failed")?;

        if let Some(dir) = out_dir {
            for thumb in &batch.images {
                let png = STANDARD
                    .decode(&thumb.b64)
                    .context("Renderer produced invalid base64")?;
                let path = dir.join(format!("{}.png", pdfpages::keys::base_name(&thumb.file_name)));
                tokio::fs::write(&path, png)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                if !cli.quiet {
                    eprintln!(
                        "  {} {}  {}",
                        green("✓"),
                        thumb.file_name,
                        dim(&format!("{}x{}", thumb.width, thumb.height))
                    );
                }
            }
        }

        let done = !all || batch.is_last();
        cursor = batch.continuation_token.clone();
        batches.push(batch);
        if done {
            break;
        }
    }

    if out_dir.is_none() || cli.json {
        let json = if batches.len() == 1 {
            serde_json::to_string_pretty(&batches[0])
        } else {
            serde_json::to_string_pretty(&batches)
        }
        .context("Failed to serialise thumbnails")?;
        println!("{json}");
    } else if !cli.quiet && !cursor.is_empty() {
        eprintln!("next cursor: {}", cursor);
    }
    Ok(())
}

async fn run_preview(
    service: &PageService,
    cli: &Cli,
    id: &DocumentId,
    page: &str,
    dpi: Option<u32>,
    output: Option<&Path>,
) -> Result<()> {
    let ordinal = parse_page_ref(page)?;
    let preview = service
        .preview(id, ordinal, dpi)
        .await
        .with_context(|| format!("Failed to render preview of {}", page))?;

    match output {
        Some(path) => {
            let png = STANDARD
                .decode(&preview.b64)
                .context("Renderer produced invalid base64")?;
            tokio::fs::write(path, png)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                eprintln!(
                    "{}  {}  {}x{}  →  {}",
                    green("✔"),
                    preview.file_name,
                    preview.width,
                    preview.height,
                    bold(&path.display().to_string())
                );
            }
        }
        None => println!(
            "{}",
            serde_json::to_string_pretty(&preview).context("Failed to serialise preview")?
        ),
    }
    Ok(())
}

async fn run_render_hd(service: &PageService, cli: &Cli, id: &DocumentId, page: &str) -> Result<()> {
    let ordinal = parse_page_ref(page)?;
    let outcome = service
        .ensure_high_res(id, ordinal)
        .await
        .with_context(|| format!("Failed to create high-resolution image of {}", page))?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialise outcome")?
        );
    } else if !cli.quiet {
        match outcome {
            HighResOutcome::AlreadyExists { key } => {
                eprintln!("{}  {} already exists", cyan("◆"), key)
            }
            HighResOutcome::Created {
                key,
                width,
                height,
                bytes,
            } => eprintln!(
                "{}  {}  {}",
                green("✔"),
                key,
                dim(&format!("{width}x{height}, {bytes} bytes"))
            ),
        }
    }
    Ok(())
}
