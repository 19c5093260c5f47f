//! Per-page screenshot dump configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::By;
use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default DevTools HTTP endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:9222";

/// Placeholder replaced by the page index in [`DumpConfig::page_selector`].
pub const INDEX_PLACEHOLDER: &str = "{index}";

/// Default page element selector template.
pub const DEFAULT_PAGE_SELECTOR: &str = "#div-lecture-{index}.lecture-page.ng-star-inserted";

/// Default "page down" control selector.
pub const DEFAULT_PAGE_DOWN_SELECTOR: &str = r#"i[title="Page Down"].fal.fa-arrow-down.ml-3"#;

// ============================================================================
// DumpConfig
// ============================================================================

/// Configuration for [`PageDumper`](super::PageDumper).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    /// DevTools endpoint (`http://host:port` or `ws://...`).
    pub endpoint: String,
    /// Substring of the tab URL to attach to.
    pub url_pattern: String,
    /// Directory receiving `<index>.png` files.
    pub output_dir: PathBuf,
    /// Number of pages to capture.
    pub page_count: u32,
    /// Index of the first page.
    pub start_index: u32,
    /// CSS selector template for a page element; `{index}` is substituted.
    pub page_selector: String,
    /// CSS selector of the control that advances one page.
    pub page_down_selector: String,
    /// Pause after each advance (milliseconds).
    pub step_delay_ms: u64,
    /// Maximum wait for an element (milliseconds).
    pub wait_timeout_ms: u64,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            url_pattern: String::new(),
            output_dir: PathBuf::from("pages"),
            page_count: 0,
            start_index: 0,
            page_selector: DEFAULT_PAGE_SELECTOR.to_string(),
            page_down_selector: DEFAULT_PAGE_DOWN_SELECTOR.to_string(),
            step_delay_ms: 100,
            wait_timeout_ms: 30_000,
        }
    }
}

impl DumpConfig {
    /// Creates a configuration for the tab matching `url_pattern`.
    #[must_use]
    pub fn new(
        url_pattern: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        page_count: u32,
    ) -> Self {
        Self {
            url_pattern: url_pattern.into(),
            output_dir: output_dir.into(),
            page_count,
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Sets the endpoint.
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the first page index.
    #[inline]
    #[must_use]
    pub fn with_start_index(mut self, start_index: u32) -> Self {
        self.start_index = start_index;
        self
    }

    /// Sets the page selector template.
    #[inline]
    #[must_use]
    pub fn with_page_selector(mut self, template: impl Into<String>) -> Self {
        self.page_selector = template.into();
        self
    }

    /// Sets the page-down selector.
    #[inline]
    #[must_use]
    pub fn with_page_down_selector(mut self, selector: impl Into<String>) -> Self {
        self.page_down_selector = selector.into();
        self
    }

    /// Sets the step delay.
    #[inline]
    #[must_use]
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Sets the element wait timeout.
    #[inline]
    #[must_use]
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Locator for the page element with `index`.
    #[must_use]
    pub fn page_locator(&self, index: u32) -> By {
        By::css(
            self.page_selector
                .replace(INDEX_PLACEHOLDER, &index.to_string()),
        )
    }

    /// Locator for the page-down control.
    #[must_use]
    pub fn page_down_locator(&self) -> By {
        By::css(self.page_down_selector.clone())
    }

    /// Output file for the page with `index`.
    #[must_use]
    pub fn page_path(&self, index: u32) -> PathBuf {
        self.output_dir.join(format!("{index}.png"))
    }

    /// One past the last page index, or `None` on overflow.
    #[inline]
    #[must_use]
    pub fn end_index(&self) -> Option<u32> {
        self.start_index.checked_add(self.page_count)
    }

    /// Pause after each advance.
    #[inline]
    #[must_use]
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// Maximum wait for an element.
    #[inline]
    #[must_use]
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.url_pattern.is_empty() {
            return Err(Error::config("Tab URL pattern is required"));
        }
        if !self.page_selector.contains(INDEX_PLACEHOLDER) {
            return Err(Error::config(format!(
                "Page selector '{}' must contain {INDEX_PLACEHOLDER}",
                self.page_selector
            )));
        }
        if self.page_down_selector.trim().is_empty() {
            return Err(Error::config("Page-down selector is required"));
        }
        if self.wait_timeout_ms == 0 {
            return Err(Error::config("Wait timeout must be non-zero"));
        }
        if self.end_index().is_none() {
            return Err(Error::config(format!(
                "Page range {} + {} exceeds the index range",
                self.start_index, self.page_count
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DumpConfig::default();
        assert_eq!(config.endpoint, "http://localhost:9222");
        assert_eq!(config.step_delay(), Duration::from_millis(100));
        assert_eq!(config.wait_timeout(), Duration::from_secs(30));
        assert_eq!(
            config.page_down_locator(),
            By::css(r#"i[title="Page Down"].fal.fa-arrow-down.ml-3"#)
        );
    }

    #[test]
    fn test_page_locator_substitutes_index() {
        let config = DumpConfig::new("aud", "aud", 662);
        assert_eq!(
            config.page_locator(41),
            By::css("#div-lecture-41.lecture-page.ng-star-inserted")
        );
        assert_eq!(config.page_path(41), PathBuf::from("aud/41.png"));
    }

    #[test]
    fn test_validate() {
        assert!(DumpConfig::new("aud", "out", 3).validate().is_ok());
        assert!(DumpConfig::default().validate().is_err());
        assert!(
            DumpConfig::new("aud", "out", 3)
                .with_page_selector("#page")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_validate_rejects_overflowing_range() {
        let config = DumpConfig::new("aud", "out", 2).with_start_index(u32::MAX);
        assert_eq!(config.end_index(), None);
        assert!(matches!(config.validate(), Err(Error::Config { .. })));

        let last = DumpConfig::new("aud", "out", 1).with_start_index(u32::MAX - 1);
        assert_eq!(last.end_index(), Some(u32::MAX));
        assert!(last.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: DumpConfig = serde_json::from_str(
            r#"{"url_pattern": "far_etextbook", "output_dir": "far", "page_count": 528}"#,
        )
        .expect("parse");
        assert_eq!(config.page_count, 528);
        assert_eq!(config.page_selector, DEFAULT_PAGE_SELECTOR);
    }
}
