//! Element locator strategies.
//!
//! Provides `By` selectors that compile to a page-side JavaScript
//! expression evaluating to an element or `null`.
//!
//! # Example
//!
//! ```ignore
//! use page_capture::By;
//!
//! // CSS selector
//! let page = tab.wait_for_element(By::css("#div-lecture-0.lecture-page"), opts).await?;
//!
//! // Element inside an open shadow root
//! let body = tab.find_element(&By::shadow("wc-", "virtualListBody")).await?;
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// By Enum
// ============================================================================

/// Element locator strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "value")]
pub enum By {
    /// CSS selector, resolved with `document.querySelector`.
    ///
    /// # Example
    /// ```ignore
    /// By::Css("i[title=\"Page Down\"].fal.fa-arrow-down".into())
    /// ```
    #[serde(rename = "css")]
    Css(String),

    /// Element id, resolved with `document.getElementById`.
    #[serde(rename = "id")]
    Id(String),

    /// XPath expression; the first matching node is used.
    #[serde(rename = "xpath")]
    XPath(String),

    /// Element id looked up inside the open shadow root of a host element.
    ///
    /// Hosts that render their viewer inside a web component need this; the
    /// host id and inner id are specific to that site.
    #[serde(rename = "shadow")]
    Shadow {
        /// Id of the shadow host element.
        host: String,
        /// Id of the element inside the host's shadow root.
        inner: String,
    },
}

impl By {
    /// Creates a CSS selector locator.
    #[inline]
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Creates an element id locator.
    #[inline]
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Creates an XPath locator.
    #[inline]
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    /// Creates a shadow-root locator.
    #[inline]
    #[must_use]
    pub fn shadow(host: impl Into<String>, inner: impl Into<String>) -> Self {
        Self::Shadow {
            host: host.into(),
            inner: inner.into(),
        }
    }

    /// Returns the strategy name.
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Css(_) => "css",
            Self::Id(_) => "id",
            Self::XPath(_) => "xpath",
            Self::Shadow { .. } => "shadow",
        }
    }

    /// Returns a JavaScript expression yielding the element or `null`.
    #[must_use]
    pub fn to_js(&self) -> String {
        match self {
            Self::Css(selector) => {
                format!("document.querySelector({})", js_string(selector))
            }
            Self::Id(id) => format!("document.getElementById({})", js_string(id)),
            Self::XPath(expression) => format!(
                "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_string(expression)
            ),
            Self::Shadow { host, inner } => format!(
                "(document.getElementById({})?.shadowRoot?.getElementById({}) ?? null)",
                js_string(host),
                js_string(inner)
            ),
        }
    }

    /// Returns an expression yielding the element only once it is visible.
    ///
    /// Visible means attached, not `visibility: hidden`, and with a non-empty
    /// bounding box.
    #[must_use]
    pub fn to_js_visible(&self) -> String {
        format!(
            r#"(() => {{
    const el = {};
    if (!el || !el.isConnected) return null;
    const style = getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    return style.visibility !== "hidden" && rect.width > 0 && rect.height > 0 ? el : null;
}})()"#,
            self.to_js()
        )
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(value) | Self::Id(value) | Self::XPath(value) => {
                write!(f, "{}:{}", self.strategy(), value)
            }
            Self::Shadow { host, inner } => write!(f, "shadow:#{host} >> #{inner}"),
        }
    }
}

/// Quotes a string as a JavaScript string literal.
pub(crate) fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_expression_escapes_quotes() {
        let by = By::css(r#"i[title="Page Down"].fal"#);
        assert_eq!(
            by.to_js(),
            r#"document.querySelector("i[title=\"Page Down\"].fal")"#
        );
    }

    #[test]
    fn test_shadow_expression() {
        let by = By::shadow("wc-", "virtualListBody");
        let js = by.to_js();
        assert!(js.contains(r#"getElementById("wc-")?.shadowRoot"#));
        assert!(js.contains(r#"getElementById("virtualListBody")"#));
    }

    #[test]
    fn test_visible_wraps_locator() {
        let js = By::id("page-3").to_js_visible();
        assert!(js.contains(r#"document.getElementById("page-3")"#));
        assert!(js.contains("rect.width > 0"));
    }

    #[test]
    fn test_display() {
        assert_eq!(By::css("#a").to_string(), "css:#a");
        assert_eq!(By::shadow("h", "i").to_string(), "shadow:#h >> #i");
    }

    #[test]
    fn test_deserialize_tagged() {
        let by: By = serde_json::from_str(
            r#"{"strategy": "shadow", "value": {"host": "wc-", "inner": "virtualListBody"}}"#,
        )
        .expect("parse");
        assert_eq!(by, By::shadow("wc-", "virtualListBody"));

        let by: By =
            serde_json::from_str(r##"{"strategy": "css", "value": "#x"}"##).expect("parse");
        assert_eq!(by, By::css("#x"));
    }
}
