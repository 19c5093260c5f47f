//! Page-level operations a capture run needs from a viewer.
//!
//! [`CdpPageDriver`] performs them on an attached tab. The session only
//! talks to the [`PageDriver`] trait.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::browser::{By, ImageFormat, Tab};
use crate::error::{Error, Result};

use super::config::{Advance, RunConfig};
use super::raster::encode_capture;
use super::record::CaptureRecord;

// ============================================================================
// PageDriver
// ============================================================================

/// Operations on the page being captured.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Returns `true` if the capture target currently exists.
    async fn locate_target(&self, target: &By) -> Result<bool>;

    /// One-time setup before the first page.
    async fn prepare(&self, _config: &RunConfig) -> Result<()> {
        Ok(())
    }

    /// Polls `expression` until truthy.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if it does not become truthy within `timeout`
    async fn wait_until(&self, expression: &str, interval: Duration, timeout: Duration)
    -> Result<()>;

    /// Renders the current page's target element.
    async fn capture(&self, config: &RunConfig) -> Result<CaptureRecord>;

    /// Moves the viewer to the next page.
    async fn advance(&self, advance: &Advance) -> Result<()>;
}

// ============================================================================
// CdpPageDriver
// ============================================================================

/// [`PageDriver`] backed by an attached browser tab.
#[derive(Debug, Clone)]
pub struct CdpPageDriver {
    tab: Tab,
}

impl CdpPageDriver {
    /// Creates a driver for `tab`.
    #[inline]
    #[must_use]
    pub fn new(tab: Tab) -> Self {
        Self { tab }
    }

    /// Returns the underlying tab.
    #[inline]
    #[must_use]
    pub fn tab(&self) -> &Tab {
        &self.tab
    }
}

#[async_trait]
impl PageDriver for CdpPageDriver {
    async fn locate_target(&self, target: &By) -> Result<bool> {
        match self.tab.query_element(target).await? {
            Some(element) => {
                if let Err(e) = element.release().await {
                    trace!(error = %e, "Failed to release locator handle");
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn prepare(&self, config: &RunConfig) -> Result<()> {
        self.tab
            .set_default_background(Some(config.background.to_rgba()))
            .await
    }

    async fn wait_until(
        &self,
        expression: &str,
        interval: Duration,
        timeout: Duration,
    ) -> Result<()> {
        self.tab.wait_for_truthy(expression, interval, timeout).await
    }

    async fn capture(&self, config: &RunConfig) -> Result<CaptureRecord> {
        let element = self
            .tab
            .query_element(&config.target)
            .await?
            .ok_or_else(|| Error::missing_target(config.target.to_string()))?;

        let png = element
            .screenshot(ImageFormat::Png, config.scale)
            .await
            .map_err(|e| match e {
                Error::Cdp { message, .. } => Error::render(message),
                other => other,
            });

        if let Err(e) = element.release().await {
            trace!(error = %e, "Failed to release target handle");
        }

        let record = encode_capture(&png?, config.background, config.format)?;
        debug!(
            width_px = record.width_px(),
            height_px = record.height_px(),
            bytes = record.data().len(),
            "Encoded capture"
        );
        Ok(record)
    }

    async fn advance(&self, advance: &Advance) -> Result<()> {
        match advance {
            Advance::KeyEvents(key) => self.tab.dispatch_synthetic_key(*key).await,
            Advance::NativeKey(key) => self.tab.press_key(*key).await,
            Advance::Click(by) => self.tab.find_element(by).await?.click().await,
            Advance::Script(expression) => {
                self.tab.evaluate(expression).await?;
                Ok(())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
