//! Element search and wait methods.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::browser::Element;
use crate::browser::selector::By;
use crate::error::{Error, Result};

use super::Tab;

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for wait_for_element (30 seconds).
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval between lookups while waiting.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// WaitOptions
// ============================================================================

/// Options for [`Tab::wait_for_element`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Require the element to be visible, not merely attached.
    pub visible: bool,
    /// Give up after this long.
    pub timeout: Duration,
    /// Delay between lookups.
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            visible: false,
            timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitOptions {
    /// Requires visibility.
    #[inline]
    #[must_use]
    pub fn visible(mut self) -> Self {
        self.visible = true;
        self
    }

    /// Sets the timeout.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the poll interval.
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

// ============================================================================
// Tab - Element Search
// ============================================================================

impl Tab {
    /// Finds a single element, or `None` if nothing matches.
    pub async fn query_element(&self, by: &By) -> Result<Option<Element>> {
        let handle = self.evaluate_handle(&by.to_js()).await?;
        Ok(handle.map(|object_id| Element::new(object_id, by.to_string(), self.clone())))
    }

    /// Finds a single element using a locator strategy.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use page_capture::By;
    ///
    /// let body = tab.find_element(&By::shadow("wc-", "virtualListBody")).await?;
    /// ```
    ///
    /// # Errors
    ///
    /// - [`Error::ElementNotFound`] if nothing matches
    pub async fn find_element(&self, by: &By) -> Result<Element> {
        self.query_element(by)
            .await?
            .ok_or_else(|| Error::element_not_found(by.to_string()))
    }
}

// ============================================================================
// Tab - Element Waiting
// ============================================================================

impl Tab {
    /// Waits for an element to appear (and, optionally, become visible).
    ///
    /// Lookups repeat every `poll_interval` until `timeout`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let page = tab
    ///     .wait_for_element(&By::css("#div-lecture-4"), WaitOptions::default().visible())
    ///     .await?;
    /// ```
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if the element does not show up in time
    pub async fn wait_for_element(&self, by: &By, options: WaitOptions) -> Result<Element> {
        debug!(
            session_id = %self.inner.session_id,
            strategy = by.strategy(),
            locator = %by,
            visible = options.visible,
            timeout_ms = options.timeout.as_millis() as u64,
            "Waiting for element"
        );

        let expression = if options.visible {
            by.to_js_visible()
        } else {
            by.to_js()
        };

        let started = Instant::now();
        loop {
            if let Some(object_id) = self.evaluate_handle(&expression).await? {
                return Ok(Element::new(object_id, by.to_string(), self.clone()));
            }

            if started.elapsed() >= options.timeout {
                return Err(Error::timeout(
                    format!("wait_for({by})"),
                    options.timeout.as_millis() as u64,
                ));
            }

            tokio::time::sleep(options.poll_interval).await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
