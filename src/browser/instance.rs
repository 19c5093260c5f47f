//! Connection to a running browser's DevTools endpoint.
//!
//! A [`Browser`] owns the single WebSocket to the browser target. Tabs
//! attached through it share that socket, each on its own flat session.
//!
//! # Example
//!
//! ```ignore
//! use page_capture::Browser;
//!
//! let browser = Browser::connect("http://localhost:9222").await?;
//! for target in browser.tabs().await? {
//!     println!("{} {}", target.target_id, target.url);
//! }
//!
//! let tab = browser.find_tab("etextbook").await?;
//! // ...
//! browser.disconnect().await;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::protocol::{Command, Event, PageCommand, ParsedEvent, TargetCommand};
use crate::transport::{Connection, resolve_ws_url};

use super::tab::{Tab, TargetInfo};

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a browser connection.
pub(crate) struct BrowserInner {
    /// Resolved WebSocket URL.
    pub ws_url: String,

    /// Browser-level connection.
    pub connection: Connection,

    /// Sessions attached through this handle, detached on disconnect.
    pub sessions: Mutex<Vec<SessionId>>,
}

// ============================================================================
// Browser
// ============================================================================

/// A connected browser.
#[derive(Clone)]
pub struct Browser {
    pub(crate) inner: Arc<BrowserInner>,
}

impl fmt::Debug for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Browser")
            .field("ws_url", &self.inner.ws_url)
            .field("sessions", &self.inner.sessions.lock().len())
            .finish()
    }
}

impl Browser {
    /// Connects to a browser.
    ///
    /// `endpoint` is either the HTTP debugging address
    /// (`http://localhost:9222`) or a `ws://` DevTools URL.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the endpoint is not a valid URL
    /// - [`Error::Http`] if the version endpoint cannot be read
    /// - [`Error::Connection`] if the WebSocket handshake fails
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let ws_url = resolve_ws_url(endpoint).await?;
        let connection = Connection::connect(&ws_url).await?;
        connection.set_event_handler(Box::new(log_target_event));

        info!(endpoint, ws_url = %ws_url, "Connected to browser");

        Ok(Self {
            inner: Arc::new(BrowserInner {
                ws_url,
                connection,
                sessions: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Returns the resolved WebSocket URL.
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> &str {
        &self.inner.ws_url
    }
}

// ============================================================================
// Browser - Targets
// ============================================================================

impl Browser {
    /// Lists every target the browser knows about.
    pub async fn targets(&self) -> Result<Vec<TargetInfo>> {
        let result = self
            .inner
            .connection
            .execute(None, Command::Target(TargetCommand::GetTargets))
            .await?;

        let infos = result
            .get("targetInfos")
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));
        Ok(serde_json::from_value(infos)?)
    }

    /// Lists page targets (tabs) only.
    pub async fn tabs(&self) -> Result<Vec<TargetInfo>> {
        let mut targets = self.targets().await?;
        targets.retain(TargetInfo::is_page);
        Ok(targets)
    }

    /// Attaches to the first tab whose URL contains `pattern`.
    ///
    /// # Errors
    ///
    /// - [`Error::TabNotFound`] if no page URL matches
    pub async fn find_tab(&self, pattern: &str) -> Result<Tab> {
        let target = self
            .tabs()
            .await?
            .into_iter()
            .find(|t| t.url.contains(pattern))
            .ok_or_else(|| Error::tab_not_found(pattern))?;

        debug!(target_id = %target.target_id, url = %target.url, "Matched tab");
        self.attach(target).await
    }

    /// Attaches a flat session to `target` and returns a tab handle.
    pub async fn attach(&self, target: TargetInfo) -> Result<Tab> {
        let result = self
            .inner
            .connection
            .execute(
                None,
                Command::Target(TargetCommand::AttachToTarget {
                    target_id: target.target_id.clone(),
                    flatten: true,
                }),
            )
            .await?;

        let session_id = result
            .get("sessionId")
            .and_then(Value::as_str)
            .map(SessionId::new)
            .ok_or_else(|| Error::protocol("attachToTarget response missing sessionId"))?;

        self.inner.sessions.lock().push(session_id.clone());

        let tab = Tab::new(target, session_id, self.inner.connection.clone());
        tab.send_command(Command::Page(PageCommand::Enable)).await?;

        info!(target_id = %tab.target_id(), session_id = %tab.session_id(), "Attached to tab");
        Ok(tab)
    }

    /// Brings a tab to the foreground.
    ///
    /// Background tabs may throttle rendering.
    pub async fn activate(&self, tab: &Tab) -> Result<()> {
        self.inner
            .connection
            .execute(
                None,
                Command::Target(TargetCommand::ActivateTarget {
                    target_id: tab.target_id().clone(),
                }),
            )
            .await?;
        Ok(())
    }
}

// ============================================================================
// Browser - Lifecycle
// ============================================================================

impl Browser {
    /// Detaches every attached session and closes the socket.
    ///
    /// The browser itself keeps running.
    pub async fn disconnect(&self) {
        let sessions = std::mem::take(&mut *self.inner.sessions.lock());

        for session_id in sessions {
            let command = Command::Target(TargetCommand::DetachFromTarget {
                session_id: session_id.clone(),
            });
            if let Err(e) = self.inner.connection.execute(None, command).await {
                warn!(%session_id, error = %e, "Failed to detach session");
            }
        }

        self.inner.connection.clear_event_handler();
        self.inner.connection.shutdown();
        info!("Disconnected from browser");
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Logs target lifecycle events.
fn log_target_event(event: Event) {
    match event.parse() {
        ParsedEvent::TargetCrashed { target_id, status } => {
            warn!(%target_id, %status, "Target crashed");
        }
        ParsedEvent::TargetDetached {
            session_id,
            target_id,
        } => {
            debug!(%session_id, %target_id, "Session detached");
        }
        ParsedEvent::TargetDestroyed { target_id } => {
            debug!(%target_id, "Target destroyed");
        }
        ParsedEvent::InspectorDetached { reason } => {
            warn!(%reason, "Inspector detached");
        }
        ParsedEvent::Unknown { .. } => {}
    }
}

// ============================================================================
// Tests
// ============================================================================
