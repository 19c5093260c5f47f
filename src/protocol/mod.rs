//! DevTools protocol message types.
//!
//! This module defines the JSON messages exchanged with the browser over
//! the debugging WebSocket.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Browser | Command request |
//! | `Response` | Browser → Local | Command response (same `id`) |
//! | `Event` | Browser → Local | Notification (no `id`) |
//!
//! # Command Naming
//!
//! Commands follow `Domain.method` format:
//!
//! - `Target.attachToTarget`
//! - `Page.captureScreenshot`
//! - `Runtime.evaluate`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command definitions by domain |
//! | `event` | Event types |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions organized by domain.
pub mod command;

/// Event message types.
pub mod event;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{
    Command, EmulationCommand, InputCommand, KeyEventType, MouseButton, MouseEventType,
    PageCommand, RgbaColor, RuntimeCommand, TargetCommand, Viewport,
};
pub use event::{Event, ParsedEvent};
pub use request::{Request, Response, ResponseError};
