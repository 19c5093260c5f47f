//! Error types for page-capture.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use page_capture::{Result, Error};
//!
//! async fn example(session: &CaptureSession) -> Result<()> {
//!     match session.export_to("./out") {
//!         Err(Error::EmptyInput) => println!("nothing captured yet"),
//!         other => { other?; }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::Http`] |
//! | Protocol | [`Error::Protocol`], [`Error::Cdp`] |
//! | Lookup | [`Error::TabNotFound`], [`Error::ElementNotFound`], [`Error::MissingTarget`] |
//! | Capture | [`Error::Render`], [`Error::EmptyInput`], [`Error::Busy`], [`Error::Interrupted`] |
//! | Execution | [`Error::Script`], [`Error::Timeout`], [`Error::RequestTimeout`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Image`], [`Error::Pdf`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::RequestId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when run, dump or page geometry configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Connection to the debugging endpoint failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// WebSocket connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    /// HTTP discovery request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected response shape.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// The browser answered a command with an error object.
    #[error("CDP error {code} in {method}: {message}")]
    Cdp {
        /// Method that failed.
        method: String,
        /// CDP error code.
        code: i64,
        /// CDP error message.
        message: String,
    },

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// No open tab matched the URL pattern.
    #[error("No tab with URL containing: {pattern}")]
    TabNotFound {
        /// URL substring that was searched for.
        pattern: String,
    },

    /// Element not found by locator.
    #[error("Element not found: {locator}")]
    ElementNotFound {
        /// Locator used.
        locator: String,
    },

    /// The capture target could not be located before a run.
    ///
    /// The run is aborted before any page is captured.
    #[error("Capture target not found: {locator}")]
    MissingTarget {
        /// Locator used.
        locator: String,
    },

    // ========================================================================
    // Capture Errors
    // ========================================================================
    /// Rasterizing a page failed.
    ///
    /// Fatal to the run; records captured before the failure are kept.
    #[error("Render failed: {message}")]
    Render {
        /// Description of the render failure.
        message: String,
    },

    /// Export was requested with no captured pages.
    #[error("No screenshots captured yet")]
    EmptyInput,

    /// A capture run is in progress.
    #[error("A capture run is already in progress")]
    Busy,

    /// The run was cancelled before it finished.
    #[error("Capture interrupted")]
    Interrupted,

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// JavaScript evaluation threw in the page.
    #[error("Script error: {message}")]
    Script {
        /// Exception text from the page.
        message: String,
    },

    /// Operation timeout.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Command request timeout.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Image decode or encode error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// PDF construction error.
    #[error("PDF error: {message}")]
    Pdf {
        /// Description of the PDF error.
        message: String,
    },

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Self::pdf(err.to_string())
    }
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a CDP error for a failed method.
    #[inline]
    pub fn cdp(method: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self::Cdp {
            method: method.into(),
            code,
            message: message.into(),
        }
    }

    /// Creates a tab not found error.
    #[inline]
    pub fn tab_not_found(pattern: impl Into<String>) -> Self {
        Self::TabNotFound {
            pattern: pattern.into(),
        }
    }

    /// Creates an element not found error.
    #[inline]
    pub fn element_not_found(locator: impl Into<String>) -> Self {
        Self::ElementNotFound {
            locator: locator.into(),
        }
    }

    /// Creates a missing capture target error.
    #[inline]
    pub fn missing_target(locator: impl Into<String>) -> Self {
        Self::MissingTarget {
            locator: locator.into(),
        }
    }

    /// Creates a render error.
    #[inline]
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Creates a script error.
    #[inline]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// Creates a PDF error.
    #[inline]
    pub fn pdf(message: impl Into<String>) -> Self {
        Self::Pdf {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::RequestTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_) | Self::Http(_)
        )
    }

    /// Returns `true` if this error belongs to the capture pipeline's
    /// user-facing taxonomy (missing target, render failure, empty export).
    #[inline]
    #[must_use]
    pub fn is_capture_error(&self) -> bool {
        matches!(
            self,
            Self::MissingTarget { .. } | Self::Render { .. } | Self::EmptyInput
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_cdp_error_display() {
        let err = Error::cdp("DOM.getBoxModel", -32000, "Could not compute box model.");
        assert_eq!(
            err.to_string(),
            "CDP error -32000 in DOM.getBoxModel: Could not compute box model."
        );
    }

    #[test]
    fn test_empty_input_display() {
        assert_eq!(Error::EmptyInput.to_string(), "No screenshots captured yet");
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::timeout("wait_for(#page-1)", 30_000);
        let other_err = Error::connection("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::config("test").is_connection_error());
    }

    #[test]
    fn test_is_capture_error() {
        assert!(Error::missing_target("#virtualListBody").is_capture_error());
        assert!(Error::render("tainted canvas").is_capture_error());
        assert!(Error::EmptyInput.is_capture_error());
        assert!(!Error::Busy.is_capture_error());
        assert!(!Error::Interrupted.is_capture_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_ws_error() {
        let err: Error = WsError::ConnectionClosed.into();
        assert!(err.is_connection_error());
    }
}
