//! Command-line entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use page_capture::capture::load_dir;
use page_capture::pdf::write_pdf;
use page_capture::{
    Advance, Browser, By, CaptureSession, CdpPageDriver, Color, DumpConfig, Error, ImageFormat,
    Key, Orientation, PageDumper, PageGeometry, PaperFormat, Result, RunConfig, RunOutcome, Unit,
};

// ============================================================================
// CLI
// ============================================================================

/// Capture a paginated document viewer from a running browser.
#[derive(Parser, Debug)]
#[command(name = "page-capture", version, about)]
struct Cli {
    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture pages in order and export a PDF
    Capture(CaptureArgs),

    /// Save each page element as <index>.png
    Dump(DumpArgs),

    /// Build a PDF from a directory of page images
    Assemble(AssembleArgs),
}

#[derive(Args, Debug)]
struct CaptureArgs {
    /// DevTools endpoint
    #[arg(long, default_value = "http://localhost:9222")]
    endpoint: String,

    /// Substring of the viewer tab URL
    #[arg(long)]
    tab: String,

    /// JSON run configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of pages to capture
    #[arg(long)]
    pages: Option<u32>,

    /// Wait before each capture (ms)
    #[arg(long)]
    settle_ms: Option<u64>,

    /// Wait after each advance (ms)
    #[arg(long)]
    nav_ms: Option<u64>,

    /// CSS selector of the element to capture
    #[arg(long)]
    target: Option<String>,

    /// Device scale of the capture
    #[arg(long)]
    scale: Option<f64>,

    /// Background colour, #rrggbb
    #[arg(long)]
    background: Option<Color>,

    /// Image encoding
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// JPEG quality (1-100); applies whenever the output is JPEG
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Key used to advance (ArrowDown, PageDown, ...)
    #[arg(long)]
    key: Option<Key>,

    /// Send the key through the browser input pipeline instead of page events
    #[arg(long)]
    native_key: bool,

    /// CSS selector of a "next page" control to click instead of a key
    #[arg(long, conflicts_with_all = ["key", "native_key"])]
    click: Option<String>,

    /// Directory for the exported PDF
    #[arg(long, default_value = ".")]
    output: PathBuf,

    #[command(flatten)]
    pdf: PdfArgs,
}

#[derive(Args, Debug)]
struct DumpArgs {
    /// DevTools endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Substring of the viewer tab URL
    #[arg(long)]
    tab: Option<String>,

    /// JSON dump configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of pages
    #[arg(long)]
    pages: Option<u32>,

    /// Index of the first page
    #[arg(long)]
    start: Option<u32>,

    /// Page selector template containing {index}
    #[arg(long)]
    page_selector: Option<String>,

    /// Selector of the "page down" control
    #[arg(long)]
    page_down: Option<String>,

    /// Pause after each page (ms)
    #[arg(long)]
    step_ms: Option<u64>,
}

#[derive(Args, Debug)]
struct AssembleArgs {
    /// Directory of numbered .png/.jpg page images
    input: PathBuf,

    /// Directory for the PDF
    #[arg(long, default_value = ".")]
    output: PathBuf,

    #[command(flatten)]
    pdf: PdfArgs,
}

#[derive(Args, Debug)]
struct PdfArgs {
    /// Paper size (a3, a4, a5, letter, legal or WxH)
    #[arg(long)]
    paper: Option<PaperFormat>,

    /// Page orientation (portrait or landscape)
    #[arg(long)]
    orientation: Option<Orientation>,

    /// Unit for paper size and margin (pt, mm, cm, in, px)
    #[arg(long)]
    unit: Option<Unit>,

    /// Margin on every side
    #[arg(long)]
    margin: Option<f64>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Jpeg,
}

impl PdfArgs {
    fn apply(&self, mut geometry: PageGeometry) -> PageGeometry {
        if let Some(paper) = self.paper {
            geometry = geometry.with_format(paper);
        }
        if let Some(orientation) = self.orientation {
            geometry = geometry.with_orientation(orientation);
        }
        if let Some(unit) = self.unit {
            geometry = geometry.with_unit(unit);
        }
        if let Some(margin) = self.margin {
            geometry = geometry.with_margin(margin);
        }
        geometry
    }
}

// ============================================================================
// Entry
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("page_capture={level}"))),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Capture(args) => capture(args).await,
        Commands::Dump(args) => dump(args).await,
        Commands::Assemble(args) => assemble(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

fn run_config(args: &CaptureArgs) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(pages) = args.pages {
        config = config.with_total_pages(pages);
    }
    if let Some(ms) = args.settle_ms {
        config = config.with_settle_delay(Duration::from_millis(ms));
    }
    if let Some(ms) = args.nav_ms {
        config = config.with_navigation_delay(Duration::from_millis(ms));
    }
    if let Some(target) = &args.target {
        config = config.with_target(By::css(target.clone()));
    }
    if let Some(scale) = args.scale {
        config = config.with_scale(scale);
    }
    if let Some(background) = args.background {
        config = config.with_background(background);
    }
    match args.format {
        Some(FormatArg::Png) => config = config.with_format(ImageFormat::Png),
        Some(FormatArg::Jpeg) if config.format == ImageFormat::Png => {
            config = config.with_format(ImageFormat::jpeg(100));
        }
        Some(FormatArg::Jpeg) | None => {}
    }
    if let Some(quality) = args.quality {
        if matches!(config.format, ImageFormat::Jpeg(_)) {
            config = config.with_format(ImageFormat::jpeg(quality));
        } else {
            warn!(quality, "Ignoring --quality for PNG output");
        }
    }

    if let Some(selector) = &args.click {
        config = config.with_advance(Advance::Click(By::css(selector.clone())));
    } else if args.native_key || args.key.is_some() {
        let key = args.key.unwrap_or(Key::ArrowDown);
        let advance = if args.native_key {
            Advance::NativeKey(key)
        } else {
            Advance::KeyEvents(key)
        };
        config = config.with_advance(advance);
    }

    let pdf = args.pdf.apply(config.pdf);
    Ok(config.with_pdf(pdf))
}

async fn capture(args: CaptureArgs) -> Result<()> {
    let config = run_config(&args)?;

    let browser = Browser::connect(&args.endpoint).await?;
    let result = capture_with(&browser, &args, config).await;
    browser.disconnect().await;
    result
}

async fn capture_with(browser: &Browser, args: &CaptureArgs, config: RunConfig) -> Result<()> {
    let tab = browser.find_tab(&args.tab).await?;
    browser.activate(&tab).await?;
    info!(url = tab.url(), "Attached");

    let session = CaptureSession::new(Arc::new(CdpPageDriver::new(tab)), config)?;

    let mut progress = session.subscribe();
    let reporter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let current = progress.borrow_and_update().clone();
            info!("{current}");
        }
    });

    let outcome = tokio::select! {
        outcome = session.start() => Some(outcome),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted");
            None
        }
    };
    reporter.abort();

    finish_capture(&session, outcome.transpose()?, &args.output)
}

/// Exports what a run produced.
///
/// `None` means the run was interrupted. Interrupted and failed runs export
/// any records they hold and still return an error.
fn finish_capture(
    session: &CaptureSession,
    outcome: Option<RunOutcome>,
    output: &Path,
) -> Result<()> {
    match outcome {
        Some(RunOutcome::Completed { captured }) => {
            let path = session.export_to(output)?;
            info!(pages = captured, path = %path.display(), "Exported");
            Ok(())
        }
        Some(RunOutcome::Failed { error, .. }) => {
            export_partial(session, output)?;
            Err(error)
        }
        Some(RunOutcome::AlreadyRunning) => Ok(()),
        None => {
            export_partial(session, output)?;
            Err(Error::Interrupted)
        }
    }
}

fn export_partial(session: &CaptureSession, output: &Path) -> Result<()> {
    let pages = session.record_count();
    if pages > 0 {
        let path = session.export_to(output)?;
        warn!(pages, path = %path.display(), "Exported partial capture");
    }
    Ok(())
}

fn dump_config(args: &DumpArgs) -> Result<DumpConfig> {
    let mut config = match &args.config {
        Some(path) => DumpConfig::from_file(path)?,
        None => DumpConfig::default(),
    };

    if let Some(endpoint) = &args.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }
    if let Some(tab) = &args.tab {
        config.url_pattern = tab.clone();
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(pages) = args.pages {
        config.page_count = pages;
    }
    if let Some(start) = args.start {
        config = config.with_start_index(start);
    }
    if let Some(template) = &args.page_selector {
        config = config.with_page_selector(template.clone());
    }
    if let Some(selector) = &args.page_down {
        config = config.with_page_down_selector(selector.clone());
    }
    if let Some(ms) = args.step_ms {
        config = config.with_step_delay(Duration::from_millis(ms));
    }
    Ok(config)
}

async fn dump(args: DumpArgs) -> Result<()> {
    let dumper = PageDumper::new(dump_config(&args)?)?;
    let report = dumper.run().await?;
    info!(
        pages = report.files.len(),
        dir = %dumper.config().output_dir.display(),
        "Dump complete"
    );
    Ok(())
}

fn assemble(args: &AssembleArgs) -> Result<()> {
    let records = load_dir(&args.input)?;
    let geometry = args.pdf.apply(PageGeometry::default());
    let path = write_pdf(&records, &geometry, Path::new(&args.output))?;
    info!(pages = records.len(), path = %path.display(), "Assembled");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
    use page_capture::{CaptureRecord, PageDriver};

    fn capture_args(extra: &[&str]) -> CaptureArgs {
        let argv = ["page-capture", "capture", "--tab", "etextbook"]
            .into_iter()
            .chain(extra.iter().copied());
        match Cli::try_parse_from(argv).expect("parse").command {
            Commands::Capture(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    /// Viewer whose every page is a small grey square.
    struct StaticViewer;

    #[async_trait]
    impl PageDriver for StaticViewer {
        async fn locate_target(&self, _target: &By) -> Result<bool> {
            Ok(true)
        }

        async fn wait_until(&self, _expr: &str, _interval: Duration, _timeout: Duration) -> Result<()> {
            Ok(())
        }

        async fn capture(&self, _config: &RunConfig) -> Result<CaptureRecord> {
            let img = RgbImage::from_pixel(4, 6, Rgb([128, 128, 128]));
            let mut buf = Vec::new();
            PngEncoder::new(&mut buf)
                .write_image(img.as_raw(), 4, 6, ExtendedColorType::Rgb8)
                .expect("encode");
            Ok(CaptureRecord::new(buf, ImageFormat::Png, 4, 6))
        }

        async fn advance(&self, _advance: &Advance) -> Result<()> {
            Ok(())
        }
    }

    fn static_session(total_pages: u32) -> CaptureSession {
        let config = RunConfig::default()
            .with_total_pages(total_pages)
            .with_settle_delay(Duration::ZERO)
            .with_navigation_delay(Duration::ZERO);
        CaptureSession::new(Arc::new(StaticViewer), config).expect("session")
    }

    fn pdf_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).expect("read dir").count()
    }

    #[test]
    fn test_quality_applies_to_default_jpeg() {
        let config = run_config(&capture_args(&["--quality", "80"])).expect("config");
        assert_eq!(config.format, ImageFormat::Jpeg(80));
    }

    #[test]
    fn test_quality_with_explicit_jpeg() {
        let args = capture_args(&["--format", "jpeg", "--quality", "55"]);
        assert_eq!(run_config(&args).expect("config").format, ImageFormat::Jpeg(55));
    }

    #[test]
    fn test_png_ignores_quality() {
        let args = capture_args(&["--format", "png", "--quality", "80"]);
        assert_eq!(run_config(&args).expect("config").format, ImageFormat::Png);
    }

    #[test]
    fn test_quality_out_of_range_rejected() {
        let argv = ["page-capture", "capture", "--tab", "x", "--quality", "0"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[tokio::test]
    async fn test_interrupted_run_exports_partial_and_fails() {
        let session = static_session(2);
        session.start().await.expect("start");
        let dir = tempfile::tempdir().expect("tempdir");

        let err = finish_capture(&session, None, dir.path()).unwrap_err();
        assert!(matches!(err, Error::Interrupted));
        assert_eq!(pdf_count(dir.path()), 1);
    }

    #[test]
    fn test_interrupted_before_any_page_writes_nothing() {
        let session = static_session(2);
        let dir = tempfile::tempdir().expect("tempdir");

        let err = finish_capture(&session, None, dir.path()).unwrap_err();
        assert!(matches!(err, Error::Interrupted));
        assert_eq!(pdf_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_failed_run_exports_partial_and_fails() {
        let session = static_session(1);
        session.start().await.expect("start");
        let dir = tempfile::tempdir().expect("tempdir");

        let outcome = RunOutcome::Failed {
            captured: 1,
            error: Error::render("tainted canvas"),
        };
        let err = finish_capture(&session, Some(outcome), dir.path()).unwrap_err();
        assert!(matches!(err, Error::Render { .. }));
        assert_eq!(pdf_count(dir.path()), 1);
    }
}
