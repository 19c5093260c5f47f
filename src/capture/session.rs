//! Capture session: the run loop, its state and progress reporting.
//!
//! A [`CaptureSession`] owns the captured records and exposes the three
//! user actions (start, export, clear) plus the live status text and page
//! counter.
//!
//! # Example
//!
//! ```ignore
//! let driver = Arc::new(CdpPageDriver::new(tab));
//! let session = CaptureSession::new(driver, RunConfig::default().with_total_pages(12))?;
//!
//! let mut progress = session.subscribe();
//! tokio::spawn(async move {
//!     while progress.changed().await.is_ok() {
//!         let p = progress.borrow().clone();
//!         println!("[{}] {} {}", p.page_counter(), p.status, p.detail);
//!     }
//! });
//!
//! session.start().await?;
//! let pdf = session.export_to("./out")?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::pdf;

use super::config::{Readiness, RunConfig};
use super::driver::PageDriver;
use super::record::CaptureRecord;

// ============================================================================
// Types
// ============================================================================

/// Lifecycle of the capture loop.
///
/// A failed run passes back to `Idle`; its message stays available from
/// [`CaptureSession::last_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// No run in flight.
    #[default]
    Idle,
    /// A run is in flight.
    Running,
}

impl RunState {
    /// Returns `true` while a run is in flight.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Result of [`CaptureSession::start`].
#[derive(Debug)]
pub enum RunOutcome {
    /// Every page was captured.
    Completed {
        /// Records captured by this run.
        captured: usize,
    },
    /// The run stopped early. Records captured so far are kept.
    Failed {
        /// Records captured by this run before the error.
        captured: usize,
        /// The error that stopped the run.
        error: Error,
    },
    /// Another run was in flight; nothing was done.
    AlreadyRunning,
}

/// Status text and page counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Headline status.
    pub status: String,
    /// Detail line.
    pub detail: String,
    /// Records held by the session.
    pub captured: usize,
    /// Configured page count.
    pub total: u32,
}

impl Progress {
    /// Counter text, `"<captured>/<total>"`.
    #[must_use]
    pub fn page_counter(&self) -> String {
        format!("{}/{}", self.captured, self.total)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.page_counter(), self.status)?;
        if !self.detail.is_empty() {
            write!(f, " ({})", self.detail)?;
        }
        Ok(())
    }
}

struct SessionState {
    run_state: RunState,
    last_error: Option<String>,
    records: Vec<CaptureRecord>,
}

// ============================================================================
// CaptureSession
// ============================================================================

/// Controller for capture runs against one page.
pub struct CaptureSession {
    driver: Arc<dyn PageDriver>,
    config: RunConfig,
    state: Mutex<SessionState>,
    progress: watch::Sender<Progress>,
}

impl fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CaptureSession")
            .field("run_state", &state.run_state)
            .field("last_error", &state.last_error)
            .field("records", &state.records.len())
            .field("total_pages", &self.config.total_pages)
            .finish_non_exhaustive()
    }
}

impl CaptureSession {
    /// Creates a session.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `config` is invalid
    pub fn new(driver: Arc<dyn PageDriver>, config: RunConfig) -> Result<Self> {
        config.validate()?;

        let (progress, _) = watch::channel(Progress {
            status: "Ready".to_string(),
            detail: String::new(),
            captured: 0,
            total: config.total_pages,
        });

        Ok(Self {
            driver,
            config,
            state: Mutex::new(SessionState {
                run_state: RunState::Idle,
                last_error: None,
                records: Vec::new(),
            }),
            progress,
        })
    }

    /// Returns the run configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }
}

// ============================================================================
// CaptureSession - Observation
// ============================================================================

impl CaptureSession {
    /// Returns the current run state.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state.lock().run_state
    }

    /// Returns the message of the error that ended the last run, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    /// Returns the current progress.
    #[must_use]
    pub fn progress(&self) -> Progress {
        self.progress.borrow().clone()
    }

    /// Returns the headline status text.
    #[must_use]
    pub fn status(&self) -> String {
        self.progress.borrow().status.clone()
    }

    /// Returns the `"<captured>/<total>"` counter text.
    #[must_use]
    pub fn page_counter(&self) -> String {
        self.progress.borrow().page_counter()
    }

    /// Subscribes to progress updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Returns the number of captured records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.state.lock().records.len()
    }

    /// Returns a copy of the captured records, in capture order.
    #[must_use]
    pub fn records(&self) -> Vec<CaptureRecord> {
        self.state.lock().records.clone()
    }
}

// ============================================================================
// CaptureSession - Actions
// ============================================================================

impl CaptureSession {
    /// Runs the capture loop.
    ///
    /// Returns [`RunOutcome::AlreadyRunning`] without doing anything if a
    /// run is in flight. Errors during the loop end the run with
    /// [`RunOutcome::Failed`]; captured records are kept.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingTarget`] if the target element is absent at start
    pub async fn start(&self) -> Result<RunOutcome> {
        {
            let mut state = self.state.lock();
            if state.run_state.is_running() {
                debug!("Capture already running");
                return Ok(RunOutcome::AlreadyRunning);
            }
            state.run_state = RunState::Running;
            state.last_error = None;
        }
        let guard = RunGuard { session: self };

        let located = self.driver.locate_target(&self.config.target).await;
        match located {
            Ok(true) => {}
            Ok(false) => {
                let err = Error::missing_target(self.config.target.to_string());
                warn!(error = %err, "Capture target not found");
                return Err(err);
            }
            Err(e) => return Err(e),
        }

        info!(total_pages = self.config.total_pages, "Starting capture");

        let mut captured = 0;
        let result = self.run_loop(&mut captured).await;
        guard.finish(&result);

        match result {
            Ok(()) => {
                info!(captured, "Capture complete");
                self.set_progress("✅ Complete!", "Ready to export PDF");
                Ok(RunOutcome::Completed { captured })
            }
            Err(error) => {
                error!(captured, error = %error, "Capture failed");
                self.set_progress("❌ Error", error.to_string());
                Ok(RunOutcome::Failed { captured, error })
            }
        }
    }

    /// Builds a PDF of the captured records.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyInput`] if nothing has been captured
    pub fn export(&self) -> Result<Vec<u8>> {
        let records = self.records();
        pdf::build_pdf(&records, &self.config.pdf)
    }

    /// Writes `capture_<timestamp>.pdf` into `dir` and returns its path.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyInput`] if nothing has been captured; no file is written
    pub fn export_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let records = self.records();
        pdf::write_pdf(&records, &self.config.pdf, dir)
    }

    /// Drops every captured record.
    ///
    /// # Errors
    ///
    /// - [`Error::Busy`] while a run is in flight
    pub fn clear(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.run_state.is_running() {
                return Err(Error::Busy);
            }
            state.records.clear();
            state.last_error = None;
        }

        info!("Cleared screenshots");
        self.set_progress("Ready", "Cleared screenshots");
        Ok(())
    }
}

// ============================================================================
// CaptureSession - Internal
// ============================================================================

impl CaptureSession {
    async fn run_loop(&self, captured: &mut usize) -> Result<()> {
        let total = self.config.total_pages;

        self.driver.prepare(&self.config).await?;

        for i in 0..total {
            let page = i + 1;
            let capturing = format!("Capturing page {page}/{total}…");

            self.set_progress(&capturing, self.wait_detail());
            self.wait_ready().await?;

            self.set_progress(&capturing, "Rendering…");
            let record = self.driver.capture(&self.config).await?;
            debug!(page, ?record, "Captured page");
            self.state.lock().records.push(record);
            *captured += 1;

            info!(page, total, "Captured page");
            self.set_progress(format!("Captured {page}/{total}"), "✓ Captured");

            if page < total {
                self.set_progress(
                    "Navigating to next page…",
                    format!(
                        "{} then wait {}ms…",
                        self.config.advance.describe(),
                        self.config.navigation_delay_ms
                    ),
                );
                self.driver.advance(&self.config.advance).await?;
                sleep(self.config.navigation_delay()).await;
            }
        }

        Ok(())
    }

    async fn wait_ready(&self) -> Result<()> {
        match &self.config.readiness {
            Readiness::Fixed => {
                sleep(self.config.settle_delay()).await;
                Ok(())
            }
            Readiness::Poll {
                expression,
                interval_ms,
                timeout_ms,
            } => {
                self.driver
                    .wait_until(
                        expression,
                        Duration::from_millis(*interval_ms),
                        Duration::from_millis(*timeout_ms),
                    )
                    .await
            }
        }
    }

    fn wait_detail(&self) -> String {
        match &self.config.readiness {
            Readiness::Fixed => format!("Waiting {}ms…", self.config.settle_delay_ms),
            Readiness::Poll { timeout_ms, .. } => {
                format!("Waiting for page (up to {timeout_ms}ms)…")
            }
        }
    }

    fn set_progress(&self, status: impl Into<String>, detail: impl Into<String>) {
        let progress = Progress {
            status: status.into(),
            detail: detail.into(),
            captured: self.record_count(),
            total: self.config.total_pages,
        };
        debug!(status = %progress.status, detail = %progress.detail, counter = %progress.page_counter(), "Progress");
        self.progress.send_replace(progress);
    }
}

async fn sleep(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

// ============================================================================
// RunGuard
// ============================================================================

/// Releases the running flag when a run ends or its future is dropped.
struct RunGuard<'a> {
    session: &'a CaptureSession,
}

impl RunGuard<'_> {
    fn finish(self, result: &Result<()>) {
        if let Err(e) = result {
            self.session.state.lock().last_error = Some(e.to_string());
        }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.session.state.lock().run_state = RunState::Idle;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::browser::{By, ImageFormat};
    use crate::capture::config::Advance;

    #[derive(Default)]
    struct MockDriver {
        target_missing: bool,
        fail_at: Option<usize>,
        gate: Option<Arc<Notify>>,
        captures: AtomicUsize,
        advances: AtomicUsize,
        polls: AtomicUsize,
    }

    #[async_trait]
    impl PageDriver for MockDriver {
        async fn locate_target(&self, _target: &By) -> Result<bool> {
            Ok(!self.target_missing)
        }

        async fn wait_until(&self, _expr: &str, _interval: Duration, _timeout: Duration) -> Result<()> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn capture(&self, _config: &RunConfig) -> Result<CaptureRecord> {
            let index = self.captures.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail_at == Some(index) {
                return Err(Error::render("tainted canvas"));
            }
            Ok(CaptureRecord::new(
                vec![index as u8],
                ImageFormat::Png,
                100 + index as u32,
                200,
            ))
        }

        async fn advance(&self, _advance: &Advance) -> Result<()> {
            self.advances.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn fast_config(total_pages: u32) -> RunConfig {
        RunConfig::default()
            .with_total_pages(total_pages)
            .with_settle_delay(Duration::ZERO)
            .with_navigation_delay(Duration::ZERO)
    }

    fn new_session(driver: MockDriver, total_pages: u32) -> (Arc<MockDriver>, CaptureSession) {
        let driver = Arc::new(driver);
        let session =
            CaptureSession::new(driver.clone(), fast_config(total_pages)).expect("session");
        (driver, session)
    }

    #[tokio::test]
    async fn test_successful_run_captures_in_order() {
        let (driver, session) = new_session(MockDriver::default(), 3);

        let outcome = session.start().await.expect("start");
        assert!(matches!(outcome, RunOutcome::Completed { captured: 3 }));

        let records = session.records();
        let widths: Vec<u32> = records.iter().map(CaptureRecord::width_px).collect();
        assert_eq!(widths, vec![100, 101, 102]);
        assert_eq!(driver.advances.load(Ordering::SeqCst), 2);

        assert_eq!(session.page_counter(), "3/3");
        assert_eq!(session.status(), "✅ Complete!");
        assert_eq!(session.progress().detail, "Ready to export PDF");
        assert_eq!(session.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_zero_pages_captures_nothing() {
        let (driver, session) = new_session(MockDriver::default(), 0);

        let outcome = session.start().await.expect("start");
        assert!(matches!(outcome, RunOutcome::Completed { captured: 0 }));
        assert_eq!(session.record_count(), 0);
        assert_eq!(driver.captures.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_export_three_pages() {
        let driver = Arc::new(MockDriver::default());
        let session = CaptureSession::new(driver, fast_config(3)).expect("session");
        session.start().await.expect("start");

        // Mock records are not decodable images, so assemble real ones.
        let real: Vec<CaptureRecord> = session
            .records()
            .iter()
            .map(|r| {
                let img = image::RgbImage::new(r.width_px(), r.height_px());
                let mut buf = Vec::new();
                image::ImageEncoder::write_image(
                    image::codecs::png::PngEncoder::new(&mut buf),
                    img.as_raw(),
                    r.width_px(),
                    r.height_px(),
                    image::ExtendedColorType::Rgb8,
                )
                .expect("encode");
                CaptureRecord::new(buf, ImageFormat::Png, r.width_px(), r.height_px())
            })
            .collect();

        let bytes = pdf::build_pdf(&real, &session.config().pdf).expect("pdf");
        let doc = lopdf::Document::load_mem(&bytes).expect("load");
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_target_aborts_before_start() {
        let (driver, session) = new_session(
            MockDriver {
                target_missing: true,
                ..Default::default()
            },
            3,
        );

        let err = session.start().await.unwrap_err();
        assert!(matches!(err, Error::MissingTarget { .. }));
        assert_eq!(session.state(), RunState::Idle);
        assert_eq!(session.record_count(), 0);
        assert_eq!(driver.captures.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_keeps_partial_records_and_allows_retry() {
        let (_driver, session) = new_session(
            MockDriver {
                fail_at: Some(2),
                ..Default::default()
            },
            5,
        );

        let outcome = session.start().await.expect("start");
        match outcome {
            RunOutcome::Failed { captured, error } => {
                assert_eq!(captured, 2);
                assert!(matches!(error, Error::Render { .. }));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        assert_eq!(session.record_count(), 2);
        assert_eq!(session.status(), "❌ Error");
        assert_eq!(session.progress().detail, "Render failed: tainted canvas");
        assert_eq!(session.state(), RunState::Idle);
        assert_eq!(
            session.last_error().as_deref(),
            Some("Render failed: tainted canvas")
        );

        // The next start runs again and clears the error.
        let retry = session.start().await.expect("retry");
        assert!(matches!(retry, RunOutcome::Completed { captured: 5 }));
        assert_eq!(session.state(), RunState::Idle);
        assert_eq!(session.last_error(), None);
    }

    #[tokio::test]
    async fn test_start_while_running_is_noop() {
        let gate = Arc::new(Notify::new());
        let (driver, session) = new_session(
            MockDriver {
                gate: Some(gate.clone()),
                ..Default::default()
            },
            1,
        );

        let second = async {
            while !session.state().is_running() {
                tokio::task::yield_now().await;
            }
            let outcome = session.start().await.expect("second start");
            let cleared = session.clear();
            gate.notify_one();
            (outcome, cleared)
        };

        let (first, (second, cleared)) = tokio::join!(session.start(), second);

        assert!(matches!(first.expect("first"), RunOutcome::Completed { captured: 1 }));
        assert!(matches!(second, RunOutcome::AlreadyRunning));
        assert!(matches!(cleared, Err(Error::Busy)));
        assert_eq!(session.record_count(), 1);
        assert_eq!(driver.captures.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clear_resets_records_and_status() {
        let (_driver, session) = new_session(MockDriver::default(), 2);
        session.start().await.expect("start");

        session.clear().expect("clear");
        assert_eq!(session.record_count(), 0);
        assert_eq!(session.status(), "Ready");
        assert_eq!(session.progress().detail, "Cleared screenshots");
        assert_eq!(session.page_counter(), "0/2");
    }

    #[tokio::test]
    async fn test_clear_forgets_last_error() {
        let (_driver, session) = new_session(
            MockDriver {
                fail_at: Some(1),
                ..Default::default()
            },
            3,
        );
        session.start().await.expect("start");
        assert!(session.last_error().is_some());

        session.clear().expect("clear");
        assert_eq!(session.last_error(), None);
        assert_eq!(session.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_export_empty_is_error() {
        let (_driver, session) = new_session(MockDriver::default(), 2);
        let dir = tempfile::tempdir().expect("tempdir");

        assert!(matches!(session.export(), Err(Error::EmptyInput)));
        assert!(matches!(session.export_to(dir.path()), Err(Error::EmptyInput)));
        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[tokio::test]
    async fn test_poll_readiness_uses_driver() {
        let driver = Arc::new(MockDriver::default());
        let config = fast_config(2).with_readiness(Readiness::Poll {
            expression: "window.pageReady".into(),
            interval_ms: 10,
            timeout_ms: 1000,
        });
        let session = CaptureSession::new(driver.clone(), config).expect("session");

        session.start().await.expect("start");
        assert_eq!(driver.polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let (_driver, session) = new_session(MockDriver::default(), 1);
        let mut rx = session.subscribe();

        session.start().await.expect("start");
        assert!(rx.has_changed().expect("sender alive"));
        assert_eq!(rx.borrow_and_update().status, "✅ Complete!");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let driver = Arc::new(MockDriver::default());
        let config = RunConfig::default().with_scale(-1.0);
        assert!(matches!(
            CaptureSession::new(driver, config),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_progress_display() {
        let progress = Progress {
            status: "Captured 1/3".into(),
            detail: "✓ Captured".into(),
            captured: 1,
            total: 3,
        };
        assert_eq!(progress.to_string(), "[1/3] Captured 1/3 (✓ Captured)");
    }
}
