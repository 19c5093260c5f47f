//! Browser entities module.
//!
//! This module provides the browser automation types:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Browser`] | DevTools connection to a running browser |
//! | [`Tab`] | Attached page target (flat session) |
//! | [`Element`] | DOM element reference |
//! | [`By`] | Element locator |
//! | [`Key`] | Navigation key |
//!
//! # Example
//!
//! ```no_run
//! use page_capture::{Browser, By, Result};
//!
//! # async fn example() -> Result<()> {
//! let browser = Browser::connect("http://localhost:9222").await?;
//! let tab = browser.find_tab("etextbook").await?;
//!
//! let body = tab.find_element(&By::shadow("wc-", "virtualListBody")).await?;
//! let png = body.screenshot(page_capture::ImageFormat::Png, 2.0).await?;
//! std::fs::write("body.png", png)?;
//!
//! browser.disconnect().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// DOM element interaction.
pub mod element;

/// Browser connection and tab discovery.
pub mod instance;

/// Navigation keys.
pub mod keyboard;

/// Element locators.
pub mod selector;

/// Attached tab automation.
pub mod tab;

// ============================================================================
// Re-exports
// ============================================================================

pub use element::{BoundingBox, Element};
pub use instance::Browser;
pub use keyboard::Key;
pub use selector::By;
pub use tab::{ImageFormat, ScreenshotBuilder, Tab, TargetInfo, WaitOptions};
