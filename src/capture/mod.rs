//! Page-by-page capture of a document viewer.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `config` | Run configuration, advance and readiness strategies |
//! | `record` | Captured page images |
//! | `raster` | Background flattening and re-encoding |
//! | `driver` | Page operations behind the [`PageDriver`] trait |
//! | `session` | Run loop, busy guard, progress, export and clear |
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use page_capture::{Browser, CaptureSession, CdpPageDriver, Result, RunConfig};
//!
//! # async fn example() -> Result<()> {
//! let browser = Browser::connect("http://localhost:9222").await?;
//! let tab = browser.find_tab("etextbook").await?;
//!
//! let config = RunConfig::default().with_total_pages(20);
//! let session = CaptureSession::new(Arc::new(CdpPageDriver::new(tab)), config)?;
//!
//! session.start().await?;
//! let path = session.export_to(".")?;
//! println!("wrote {}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod raster;
pub mod record;
pub mod session;

pub use config::{Advance, Color, Readiness, RunConfig};
pub use driver::{CdpPageDriver, PageDriver};
pub use raster::encode_capture;
pub use record::{CaptureRecord, load_dir};
pub use session::{CaptureSession, Progress, RunOutcome, RunState};
