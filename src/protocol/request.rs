//! Request and Response message types.
//!
//! Defines the DevTools message format for command requests and responses.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{RequestId, SessionId};

use super::Command;

// ============================================================================
// Request
// ============================================================================

/// A command request sent to the browser.
///
/// # Format
///
/// ```json
/// {
///   "id": 12,
///   "method": "Domain.method",
///   "params": { ... },
///   "sessionId": "..."
/// }
/// ```
///
/// `sessionId` is omitted for browser-level commands.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Identifier for request/response correlation.
    pub id: RequestId,

    /// Target session (flat mode), `None` for the browser target.
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,

    /// Command with method and params.
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    /// Creates a new request.
    #[inline]
    #[must_use]
    pub fn new(id: RequestId, session_id: Option<SessionId>, command: Command) -> Self {
        Self {
            id,
            session_id,
            command,
        }
    }

    /// Returns the command's `Domain.method` name.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &'static str {
        self.command.method()
    }
}

// ============================================================================
// Response
// ============================================================================

/// A response from the browser.
///
/// # Format
///
/// Success:
/// ```json
/// { "id": 12, "result": { ... } }
/// ```
///
/// Error:
/// ```json
/// { "id": 12, "error": { "code": -32000, "message": "..." } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Matches the command `id`.
    pub id: RequestId,

    /// Session the response belongs to.
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<SessionId>,

    /// Result data (if success).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error object (if error).
    #[serde(default)]
    pub error: Option<ResponseError>,
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseError {
    /// CDP error code.
    pub code: i64,
    /// Human readable message.
    pub message: String,
    /// Optional extra detail.
    #[serde(default)]
    pub data: Option<String>,
}

impl Response {
    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Extracts the result value, returning error if response was error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cdp`] tagged with `method` if the response was an error.
    pub fn into_result(self, method: &str) -> Result<Value> {
        match self.error {
            None => Ok(self.result.unwrap_or(Value::Null)),
            Some(err) => {
                let message = match err.data {
                    Some(data) => format!("{} ({data})", err.message),
                    None => err.message,
                };
                Err(Error::cdp(method, err.code, message))
            }
        }
    }

    /// Gets a string value from the result.
    ///
    /// Returns empty string if key not found or not a string.
    #[inline]
    #[must_use]
    pub fn get_string(&self, key: &str) -> String {
        self.result
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{PageCommand, TargetCommand};

    #[test]
    fn test_request_serialization() {
        let request = Request::new(
            RequestId::new(3),
            Some(SessionId::new("S1")),
            Command::Page(PageCommand::Enable),
        );
        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(json["id"], 3);
        assert_eq!(json["method"], "Page.enable");
        assert_eq!(json["sessionId"], "S1");
    }

    #[test]
    fn test_browser_request_has_no_session() {
        let request = Request::new(
            RequestId::new(1),
            None,
            Command::Target(TargetCommand::GetTargets),
        );
        let json = serde_json::to_string(&request).expect("serialize");
        assert!(!json.contains("sessionId"));
        assert_eq!(request.method(), "Target.getTargets");
    }

    #[test]
    fn test_success_response() {
        let response: Response =
            serde_json::from_str(r#"{"id": 4, "result": {"data": "iVBORw0"}}"#).expect("parse");
        assert!(response.is_success());
        assert_eq!(response.get_string("data"), "iVBORw0");
        assert_eq!(response.get_string("missing"), "");
    }

    #[test]
    fn test_into_result_error() {
        let response: Response = serde_json::from_str(
            r#"{"id": 5, "error": {"code": -32000, "message": "No node with given id found"}}"#,
        )
        .expect("parse");
        assert!(!response.is_success());

        let err = response.into_result("DOM.getBoxModel").unwrap_err();
        assert!(matches!(err, Error::Cdp { code: -32000, .. }));
    }

    #[test]
    fn test_into_result_empty_success_is_null() {
        let response: Response = serde_json::from_str(r#"{"id": 6}"#).expect("parse");
        assert_eq!(response.into_result("Page.enable").expect("ok"), Value::Null);
    }

    #[test]
    fn test_event_is_not_a_response() {
        let parsed = serde_json::from_str::<Response>(
            r#"{"method": "Target.detachedFromTarget", "params": {}}"#,
        );
        assert!(parsed.is_err());
    }
}
