//! Page Capture - capture a virtualized document viewer page by page.
//!
//! This library attaches to an already-running Chromium-family browser over
//! the DevTools protocol, steps through a paginated viewer one page at a
//! time, captures each page element as an image, and assembles the images
//! into a PDF.
//!
//! # Architecture
//!
//! - **Transport**: one WebSocket to the browser, flat per-tab sessions
//! - **Browser**: [`Browser`], [`Tab`] and [`Element`] wrap CDP commands
//! - **Capture**: [`CaptureSession`] runs the wait, capture, advance loop
//!   through a [`PageDriver`]
//! - **PDF**: [`pdf::build_pdf`] places one image per page, fitted and
//!   centred
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use page_capture::{Browser, CaptureSession, CdpPageDriver, Result, RunConfig, RunOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let browser = Browser::connect("http://localhost:9222").await?;
//!     let tab = browser.find_tab("etextbook").await?;
//!
//!     let session = CaptureSession::new(
//!         Arc::new(CdpPageDriver::new(tab)),
//!         RunConfig::default().with_total_pages(50),
//!     )?;
//!
//!     if let RunOutcome::Completed { captured } = session.start().await? {
//!         let path = session.export_to(".")?;
//!         println!("{captured} pages -> {}", path.display());
//!     }
//!
//!     browser.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`browser`] | Browser entities: [`Browser`], [`Tab`], [`Element`] |
//! | [`capture`] | Capture session, configuration and page driver |
//! | [`dump`] | Remote per-page PNG dump |
//! | [`pdf`] | Page geometry, image fitting and PDF assembly |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | CDP message types (internal) |
//! | [`transport`] | WebSocket transport layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Browser entities: Browser, Tab, Element.
///
/// - [`Browser`] - Connection to a running browser
/// - [`Tab`] - Attached page target
/// - [`Element`] - Remote DOM element handle
pub mod browser;

/// Capture session and its page driver.
pub mod capture;

/// Remote per-page screenshot dump.
pub mod dump;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for protocol entities.
pub mod identifiers;

/// PDF assembly.
pub mod pdf;

/// CDP message types.
///
/// Internal module defining command/response/event structures.
pub mod protocol;

/// WebSocket transport layer.
///
/// Internal module handling endpoint discovery and the connection.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Browser types
pub use browser::{BoundingBox, Browser, By, Element, ImageFormat, Key, Tab, WaitOptions};

// Capture types
pub use capture::{
    Advance, CaptureRecord, CaptureSession, CdpPageDriver, Color, PageDriver, Progress,
    Readiness, RunConfig, RunOutcome, RunState,
};

// Dump types
pub use dump::{DumpConfig, DumpReport, PageDumper};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ObjectId, RequestId, SessionId, TargetId};

// PDF types
pub use pdf::{Orientation, PageGeometry, PaperFormat, Unit};
