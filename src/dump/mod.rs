//! Remote per-page screenshot dump.
//!
//! Attaches to a browser started with `--remote-debugging-port`, finds the
//! viewer tab by URL, and for each page waits for the page element, scrolls
//! it into view, writes `<output_dir>/<index>.png`, then clicks the
//! "page down" control.
//!
//! ```ignore
//! use page_capture::dump::{DumpConfig, PageDumper};
//!
//! let config = DumpConfig::new("aud_etextbook_url", "aud", 662);
//! let report = PageDumper::new(config)?.run().await?;
//! ```

mod config;
mod dumper;

pub use config::{
    DEFAULT_ENDPOINT, DEFAULT_PAGE_DOWN_SELECTOR, DEFAULT_PAGE_SELECTOR, DumpConfig,
    INDEX_PLACEHOLDER,
};
pub use dumper::{DumpReport, PageDumper};
