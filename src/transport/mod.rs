//! WebSocket transport layer.
//!
//! This module handles communication with an already-running browser over
//! its remote debugging endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   GET /json/version    ┌─────────────────┐
//! │  page-capture   │───────────────────────►│  Browser        │
//! │                 │                        │  (remote debug  │
//! │  Connection     │◄──────────────────────►│   port 9222)    │
//! │                 │   WebSocket (CDP)      │                 │
//! └─────────────────┘                        └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `discovery::resolve_ws_url` - Turn `http://host:port` into a WebSocket URL
//! 2. `Connection::connect` - Open the socket and spawn the event loop
//! 3. `Connection::execute` - Send commands, receive responses/events
//! 4. `Connection::shutdown` - Close the socket (the browser keeps running)
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |
//! | `discovery` | HTTP endpoint discovery |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// DevTools HTTP endpoint discovery.
pub mod discovery;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, EventHandler};
pub use discovery::{BrowserVersion, resolve_ws_url};
