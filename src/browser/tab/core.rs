//! Core Tab struct and accessors.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::{SessionId, TargetId};
use crate::protocol::Command;
use crate::transport::Connection;

// ============================================================================
// Types
// ============================================================================

/// Information about a browser target, as listed by `Target.getTargets`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TargetInfo {
    /// Target ID.
    #[serde(rename = "targetId")]
    pub target_id: TargetId,
    /// Target type (`page`, `iframe`, `service_worker`, ...).
    #[serde(rename = "type")]
    pub target_type: String,
    /// Document title.
    #[serde(default)]
    pub title: String,
    /// Document URL.
    #[serde(default)]
    pub url: String,
    /// Whether some client is already attached.
    #[serde(default)]
    pub attached: bool,
}

impl TargetInfo {
    /// Returns `true` for top-level page targets (tabs).
    #[inline]
    #[must_use]
    pub fn is_page(&self) -> bool {
        self.target_type == "page"
    }
}

/// Internal shared state for a tab.
pub(crate) struct TabInner {
    /// Target this tab is attached to.
    pub target: TargetInfo,
    /// Flat session routing commands to the target.
    pub session_id: SessionId,
    /// Browser connection shared with the owning [`Browser`](crate::Browser).
    pub connection: Connection,
}

// ============================================================================
// Tab
// ============================================================================

/// A handle to an attached browser tab.
///
/// Tabs provide methods for scripting, element lookup, input and screenshots.
#[derive(Clone)]
pub struct Tab {
    pub(crate) inner: Arc<TabInner>,
}

impl fmt::Debug for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tab")
            .field("target_id", &self.inner.target.target_id)
            .field("session_id", &self.inner.session_id)
            .field("url", &self.inner.target.url)
            .finish_non_exhaustive()
    }
}

impl Tab {
    /// Creates a new tab handle.
    pub(crate) fn new(target: TargetInfo, session_id: SessionId, connection: Connection) -> Self {
        Self {
            inner: Arc::new(TabInner {
                target,
                session_id,
                connection,
            }),
        }
    }
}

// ============================================================================
// Tab - Accessors
// ============================================================================

impl Tab {
    /// Returns the target ID.
    #[inline]
    #[must_use]
    pub fn target_id(&self) -> &TargetId {
        &self.inner.target.target_id
    }

    /// Returns the session ID.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    /// Returns the URL the tab had when it was attached.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.target.url
    }

    /// Returns the title the tab had when it was attached.
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.inner.target.title
    }
}

// ============================================================================
// Tab - Internal
// ============================================================================

impl Tab {
    /// Sends a command on this tab's session and returns the result value.
    pub(crate) async fn send_command(&self, command: Command) -> Result<Value> {
        self.inner
            .connection
            .execute(Some(&self.inner.session_id), command)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<Tab>();
    }

    #[test]
    fn test_tab_is_debug() {
        fn assert_debug<T: std::fmt::Debug>() {}
        assert_debug::<Tab>();
    }

    #[test]
    fn test_target_info_parse() {
        let info: TargetInfo = serde_json::from_str(
            r#"{
                "targetId": "8D1C",
                "type": "page",
                "title": "Lecture",
                "url": "https://example.com/etextbook/aud",
                "attached": false,
                "canAccessOpener": false,
                "browserContextId": "B1"
            }"#,
        )
        .expect("parse");
        assert!(info.is_page());
        assert_eq!(info.target_id.as_str(), "8D1C");
    }
}
