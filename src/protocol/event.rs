//! Event message types.
//!
//! Events are notifications pushed by the browser without a request id.
//!
//! # Event Types
//!
//! | Domain | Events handled |
//! |--------|----------------|
//! | `Target` | `detachedFromTarget`, `targetCrashed`, `targetDestroyed` |
//! | `Inspector` | `detached` |
//!
//! Everything else parses to [`ParsedEvent::Unknown`].

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::identifiers::{SessionId, TargetId};

// ============================================================================
// Event
// ============================================================================

/// An event notification from the browser.
///
/// # Format
///
/// ```json
/// {
///   "method": "Domain.eventName",
///   "params": { ... },
///   "sessionId": "..."
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Event name in `Domain.eventName` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,

    /// Session the event was emitted on, if any.
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<SessionId>,
}

impl Event {
    /// Returns the domain name from the method.
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Parses the event into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        let str_param = |key: &str| {
            self.params
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        match self.method.as_str() {
            "Target.detachedFromTarget" => ParsedEvent::TargetDetached {
                session_id: SessionId::new(str_param("sessionId")),
                target_id: TargetId::new(str_param("targetId")),
            },
            "Target.targetCrashed" => ParsedEvent::TargetCrashed {
                target_id: TargetId::new(str_param("targetId")),
                status: str_param("status"),
            },
            "Target.targetDestroyed" => ParsedEvent::TargetDestroyed {
                target_id: TargetId::new(str_param("targetId")),
            },
            "Inspector.detached" => ParsedEvent::InspectorDetached {
                reason: str_param("reason"),
            },
            _ => ParsedEvent::Unknown {
                method: self.method.clone(),
            },
        }
    }
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Typed view of the events this crate reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEvent {
    /// A flat session was detached (tab closed, or detach requested).
    TargetDetached {
        /// Detached session.
        session_id: SessionId,
        /// Target the session belonged to.
        target_id: TargetId,
    },

    /// A target's renderer crashed.
    TargetCrashed {
        /// Crashed target.
        target_id: TargetId,
        /// Termination status.
        status: String,
    },

    /// A target went away.
    TargetDestroyed {
        /// Destroyed target.
        target_id: TargetId,
    },

    /// The inspector connection was dropped by the browser.
    InspectorDetached {
        /// Reason given by the browser.
        reason: String,
    },

    /// Any other event.
    Unknown {
        /// Event method.
        method: String,
    },
}

// ============================================================================
// Tests
// ============================================================================
