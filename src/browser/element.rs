//! DOM element handles.
//!
//! Elements are remote object references (`Runtime.RemoteObjectId`) owned
//! by the tab's session. They stay valid until released or until the node's
//! execution context goes away.
//!
//! # Example
//!
//! ```ignore
//! let page = tab.find_element(&By::css("#div-lecture-2")).await?;
//!
//! page.scroll_into_view().await?;
//! let png = page.screenshot(ImageFormat::Png, 2.0).await?;
//!
//! let next = tab.find_element(&By::css(r#"i[title="Page Down"]"#)).await?;
//! next.click().await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::ObjectId;
use crate::protocol::Viewport;

use super::tab::{ImageFormat, Tab};

// ============================================================================
// Constants
// ============================================================================

const BOUNDING_BOX_FN: &str = r#"function() {
    const r = this.getBoundingClientRect();
    return { x: r.x, y: r.y, width: r.width, height: r.height };
}"#;

const PAGE_RECT_FN: &str = r#"function() {
    const r = this.getBoundingClientRect();
    return { x: r.x + window.scrollX, y: r.y + window.scrollY, width: r.width, height: r.height };
}"#;

const SCROLL_INTO_VIEW_FN: &str = r#"function() {
    this.scrollIntoView({ block: "center", inline: "center", behavior: "instant" });
}"#;

// ============================================================================
// Types
// ============================================================================

/// Rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl BoundingBox {
    /// Returns the centre point.
    #[inline]
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Returns `true` if the box has no area.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Internal shared state for an element.
pub(crate) struct ElementInner {
    /// Remote object handle.
    pub object_id: ObjectId,

    /// Locator the element was found with, for messages.
    pub locator: String,

    /// Owning tab.
    pub tab: Tab,
}

// ============================================================================
// Element
// ============================================================================

/// A handle to a DOM element in a browser tab.
#[derive(Clone)]
pub struct Element {
    pub(crate) inner: Arc<ElementInner>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("object_id", &self.inner.object_id)
            .field("locator", &self.inner.locator)
            .finish_non_exhaustive()
    }
}

impl Element {
    /// Creates a new element handle.
    pub(crate) fn new(object_id: ObjectId, locator: String, tab: Tab) -> Self {
        Self {
            inner: Arc::new(ElementInner {
                object_id,
                locator,
                tab,
            }),
        }
    }

    /// Returns the remote object ID.
    #[inline]
    #[must_use]
    pub fn object_id(&self) -> &ObjectId {
        &self.inner.object_id
    }

    /// Returns the locator this element was found with.
    #[inline]
    #[must_use]
    pub fn locator(&self) -> &str {
        &self.inner.locator
    }

    /// Calls a function with `this` bound to the element.
    pub async fn call(&self, function_declaration: &str, args: Vec<Value>) -> Result<Value> {
        self.inner
            .tab
            .call_function_on(&self.inner.object_id, function_declaration, args)
            .await
    }
}

// ============================================================================
// Element - Geometry
// ============================================================================

impl Element {
    /// Returns the element's box in viewport coordinates.
    pub async fn bounding_box(&self) -> Result<BoundingBox> {
        let value = self.call(BOUNDING_BOX_FN, Vec::new()).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Returns the element's box in page coordinates as a screenshot clip.
    ///
    /// # Errors
    ///
    /// - [`Error::Render`] if the element has no area
    pub async fn page_clip(&self, scale: f64) -> Result<Viewport> {
        let value = self.call(PAGE_RECT_FN, Vec::new()).await?;
        let rect: BoundingBox = serde_json::from_value(value)?;

        if rect.is_empty() {
            return Err(Error::render(format!(
                "{} has an empty bounding box ({}x{})",
                self.inner.locator, rect.width, rect.height
            )));
        }

        Ok(Viewport {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            scale,
        })
    }

    /// Scrolls the element to the centre of the viewport.
    pub async fn scroll_into_view(&self) -> Result<()> {
        self.call(SCROLL_INTO_VIEW_FN, Vec::new()).await?;
        Ok(())
    }
}

// ============================================================================
// Element - Interaction
// ============================================================================

impl Element {
    /// Clicks the centre of the element.
    ///
    /// Scrolls it into view first so the click lands on it.
    pub async fn click(&self) -> Result<()> {
        debug!(locator = %self.inner.locator, "Clicking element");

        self.scroll_into_view().await?;
        let rect = self.bounding_box().await?;
        if rect.is_empty() {
            return Err(Error::element_not_found(format!(
                "{} (not visible)",
                self.inner.locator
            )));
        }

        let (x, y) = rect.center();
        self.inner.tab.click_at(x, y).await
    }
}

// ============================================================================
// Element - Screenshot
// ============================================================================

impl Element {
    /// Renders the element's box at `scale` device pixels per CSS pixel.
    ///
    /// The capture extends past the viewport when the element is taller
    /// than it.
    pub async fn screenshot(&self, format: ImageFormat, scale: f64) -> Result<Vec<u8>> {
        let clip = self.page_clip(scale).await?;
        debug!(locator = %self.inner.locator, ?clip, "Capturing element");

        self.inner
            .tab
            .screenshot()
            .format(format)
            .clip(clip)
            .capture_bytes()
            .await
    }

    /// Releases the remote handle.
    pub async fn release(&self) -> Result<()> {
        self.inner.tab.release_object(&self.inner.object_id).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_is_clone_and_debug() {
        fn assert_traits<T: Clone + fmt::Debug>() {}
        assert_traits::<Element>();
    }

    #[test]
    fn test_bounding_box_center() {
        let rect = BoundingBox {
            x: 10.0,
            y: 20.0,
            width: 100.0,
            height: 40.0,
        };
        assert_eq!(rect.center(), (60.0, 40.0));
        assert!(!rect.is_empty());
    }

    #[test]
    fn test_bounding_box_empty() {
        let rect: BoundingBox =
            serde_json::from_str(r#"{"x": 0, "y": 0, "width": 0, "height": 12.5}"#).unwrap();
        assert!(rect.is_empty());
    }

    #[test]
    fn test_page_rect_adds_scroll_offsets() {
        assert!(PAGE_RECT_FN.contains("window.scrollY"));
        assert!(PAGE_RECT_FN.contains("window.scrollX"));
    }
}
