//! Attached browser tab automation.
//!
//! Each [`Tab`] wraps one flat CDP session on a page target.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Tab struct, target info and accessors |
//! | `script` | JavaScript evaluation and polling |
//! | `elements` | Element search and waiting |
//! | `input` | Native and synthetic key presses, mouse clicks |
//! | `screenshot` | Viewport and clipped screenshots, background override |
//!
//! # Example
//!
//! ```ignore
//! let tab = browser.find_tab("etextbook").await?;
//!
//! let page = tab
//!     .wait_for_element(&By::css("#div-lecture-0"), WaitOptions::default().visible())
//!     .await?;
//! let png = page.screenshot(ImageFormat::Png, 1.0).await?;
//!
//! tab.press_key(Key::PageDown).await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod core;
mod elements;
mod input;
mod screenshot;
mod script;

// ============================================================================
// Re-exports
// ============================================================================

pub use core::{Tab, TargetInfo};
pub use elements::WaitOptions;
pub use screenshot::{ImageFormat, ScreenshotBuilder};
