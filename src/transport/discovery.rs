//! DevTools endpoint discovery.
//!
//! A browser started with `--remote-debugging-port=9222` serves a small
//! HTTP API next to its WebSocket. `GET /json/version` returns the
//! browser-level WebSocket URL that [`Connection::connect`] needs.
//!
//! [`Connection::connect`]: super::Connection::connect

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for the discovery HTTP request.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// BrowserVersion
// ============================================================================

/// Response body of `GET /json/version`.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    /// Product string, e.g. `Chrome/126.0.6478.126`.
    #[serde(rename = "Browser", default)]
    pub browser: String,

    /// DevTools protocol version.
    #[serde(rename = "Protocol-Version", default)]
    pub protocol_version: String,

    /// Browser-level WebSocket URL.
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

// ============================================================================
// Endpoint Resolution
// ============================================================================

/// Resolves a user-supplied endpoint to a browser WebSocket URL.
///
/// `ws://` and `wss://` URLs are returned as-is; `http://` and `https://`
/// endpoints are queried at `/json/version`.
///
/// # Errors
///
/// - [`Error::Config`] if the endpoint is not a URL or has another scheme
/// - [`Error::Http`] if the discovery request fails
pub async fn resolve_ws_url(endpoint: &str) -> Result<String> {
    let url = Url::parse(endpoint)
        .map_err(|e| Error::config(format!("Invalid endpoint '{endpoint}': {e}")))?;

    match url.scheme() {
        "ws" | "wss" => Ok(url.into()),
        "http" | "https" => {
            let version = fetch_version(&url).await?;
            debug!(
                browser = %version.browser,
                protocol = %version.protocol_version,
                "Discovered browser"
            );
            Ok(version.web_socket_debugger_url)
        }
        other => Err(Error::config(format!(
            "Unsupported endpoint scheme '{other}' (expected http, https, ws or wss)"
        ))),
    }
}

/// Fetches `/json/version` from an HTTP endpoint.
pub async fn fetch_version(endpoint: &Url) -> Result<BrowserVersion> {
    let version_url = version_url(endpoint)?;
    debug!(url = %version_url, "Fetching browser version");

    let client = reqwest::Client::builder()
        .timeout(DISCOVERY_TIMEOUT)
        .build()?;

    let version = client
        .get(version_url)
        .send()
        .await
        .map_err(|e| Error::connection(format!("{endpoint}: {e}")))?
        .error_for_status()?
        .json::<BrowserVersion>()
        .await?;

    Ok(version)
}

/// Builds the `/json/version` URL for an endpoint, ignoring any path.
fn version_url(endpoint: &Url) -> Result<Url> {
    endpoint
        .join("/json/version")
        .map_err(|e| Error::config(format!("Invalid endpoint '{endpoint}': {e}")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ws_endpoint_passes_through() {
        let url = resolve_ws_url("ws://127.0.0.1:9222/devtools/browser/abc")
            .await
            .expect("resolve");
        assert_eq!(url, "ws://127.0.0.1:9222/devtools/browser/abc");
    }

    #[tokio::test]
    async fn test_rejects_unknown_scheme() {
        let err = resolve_ws_url("ftp://localhost:9222").await.unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_rejects_garbage() {
        let err = resolve_ws_url("localhost 9222").await.unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_version_url_drops_path() {
        let endpoint = Url::parse("http://localhost:9222/some/path").expect("url");
        assert_eq!(
            version_url(&endpoint).expect("join").as_str(),
            "http://localhost:9222/json/version"
        );
    }

    #[test]
    fn test_parse_version_body() {
        let body = r#"{
            "Browser": "Chrome/126.0.6478.126",
            "Protocol-Version": "1.3",
            "User-Agent": "Mozilla/5.0",
            "V8-Version": "12.6.228.21",
            "WebKit-Version": "537.36",
            "webSocketDebuggerUrl": "ws://localhost:9222/devtools/browser/4b0f"
        }"#;
        let version: BrowserVersion = serde_json::from_str(body).expect("parse");
        assert_eq!(version.protocol_version, "1.3");
        assert_eq!(
            version.web_socket_debugger_url,
            "ws://localhost:9222/devtools/browser/4b0f"
        );
    }
}
