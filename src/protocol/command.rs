//! Command definitions organized by CDP domain.
//!
//! Commands follow the DevTools `Domain.method` format.
//!
//! # Command Domains
//!
//! | Domain | Commands |
//! |--------|----------|
//! | `Target` | Target listing, attach, detach |
//! | `Page` | Domain enable, screenshots |
//! | `Runtime` | JavaScript evaluation, remote objects |
//! | `Input` | Keyboard and mouse |
//! | `Emulation` | Background colour override |

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use crate::identifiers::{ObjectId, SessionId, TargetId};

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by domain.
///
/// This enum wraps domain-specific command enums for unified serialization.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Command {
    /// Target domain commands.
    Target(TargetCommand),
    /// Page domain commands.
    Page(PageCommand),
    /// Runtime domain commands.
    Runtime(RuntimeCommand),
    /// Input domain commands.
    Input(InputCommand),
    /// Emulation domain commands.
    Emulation(EmulationCommand),
}

impl Command {
    /// Returns the `Domain.method` name of this command.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Target(cmd) => match cmd {
                TargetCommand::GetTargets => "Target.getTargets",
                TargetCommand::AttachToTarget { .. } => "Target.attachToTarget",
                TargetCommand::DetachFromTarget { .. } => "Target.detachFromTarget",
                TargetCommand::ActivateTarget { .. } => "Target.activateTarget",
            },
            Self::Page(cmd) => match cmd {
                PageCommand::Enable => "Page.enable",
                PageCommand::CaptureScreenshot { .. } => "Page.captureScreenshot",
            },
            Self::Runtime(cmd) => match cmd {
                RuntimeCommand::Evaluate { .. } => "Runtime.evaluate",
                RuntimeCommand::CallFunctionOn { .. } => "Runtime.callFunctionOn",
                RuntimeCommand::ReleaseObject { .. } => "Runtime.releaseObject",
            },
            Self::Input(cmd) => match cmd {
                InputCommand::DispatchKeyEvent { .. } => "Input.dispatchKeyEvent",
                InputCommand::DispatchMouseEvent { .. } => "Input.dispatchMouseEvent",
            },
            Self::Emulation(cmd) => match cmd {
                EmulationCommand::SetDefaultBackgroundColorOverride { .. } => {
                    "Emulation.setDefaultBackgroundColorOverride"
                }
            },
        }
    }
}

// ============================================================================
// Target Commands
// ============================================================================

/// Target domain commands for tab discovery and session management.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum TargetCommand {
    /// List all targets known to the browser.
    #[serde(rename = "Target.getTargets")]
    GetTargets,

    /// Attach to a target, producing a session id.
    #[serde(rename = "Target.attachToTarget")]
    AttachToTarget {
        /// Target to attach to.
        #[serde(rename = "targetId")]
        target_id: TargetId,
        /// Use flat session mode (messages carry `sessionId`).
        flatten: bool,
    },

    /// Detach a previously attached session.
    #[serde(rename = "Target.detachFromTarget")]
    DetachFromTarget {
        /// Session to detach.
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },

    /// Bring a target's tab to the foreground.
    #[serde(rename = "Target.activateTarget")]
    ActivateTarget {
        /// Target to activate.
        #[serde(rename = "targetId")]
        target_id: TargetId,
    },
}

// ============================================================================
// Page Commands
// ============================================================================

/// Page domain commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum PageCommand {
    /// Enable page domain notifications.
    #[serde(rename = "Page.enable")]
    Enable,

    /// Capture a screenshot of the page or a clip of it.
    #[serde(rename = "Page.captureScreenshot")]
    CaptureScreenshot {
        /// `png` or `jpeg`.
        format: String,
        /// JPEG quality (0-100).
        #[serde(skip_serializing_if = "Option::is_none")]
        quality: Option<u8>,
        /// Region to capture, in CSS pixels of the document.
        #[serde(skip_serializing_if = "Option::is_none")]
        clip: Option<Viewport>,
        /// Capture content outside the visible viewport.
        #[serde(rename = "captureBeyondViewport")]
        capture_beyond_viewport: bool,
    },
}

/// Screenshot clip rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    /// X offset in CSS pixels.
    pub x: f64,
    /// Y offset in CSS pixels.
    pub y: f64,
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
    /// Device scale factor applied to the capture.
    pub scale: f64,
}

// ============================================================================
// Runtime Commands
// ============================================================================

/// Runtime domain commands for JavaScript execution.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum RuntimeCommand {
    /// Evaluate an expression in the page's main world.
    #[serde(rename = "Runtime.evaluate")]
    Evaluate {
        /// Expression to evaluate.
        expression: String,
        /// Return the value serialized instead of a remote object.
        #[serde(rename = "returnByValue")]
        return_by_value: bool,
        /// Await the result if it is a Promise.
        #[serde(rename = "awaitPromise")]
        await_promise: bool,
        /// Treat the evaluation as initiated by a user gesture.
        #[serde(rename = "userGesture")]
        user_gesture: bool,
    },

    /// Call a function with `this` bound to a remote object.
    #[serde(rename = "Runtime.callFunctionOn")]
    CallFunctionOn {
        /// Function source, e.g. `function() { return this.id; }`.
        #[serde(rename = "functionDeclaration")]
        function_declaration: String,
        /// Object bound to `this`.
        #[serde(rename = "objectId")]
        object_id: ObjectId,
        /// Call arguments as `CallArgument` objects.
        arguments: Vec<Value>,
        /// Return the value serialized instead of a remote object.
        #[serde(rename = "returnByValue")]
        return_by_value: bool,
        /// Await the result if it is a Promise.
        #[serde(rename = "awaitPromise")]
        await_promise: bool,
    },

    /// Release a remote object handle.
    #[serde(rename = "Runtime.releaseObject")]
    ReleaseObject {
        /// Handle to release.
        #[serde(rename = "objectId")]
        object_id: ObjectId,
    },
}

// ============================================================================
// Input Commands
// ============================================================================

/// Input domain commands for keyboard and mouse.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum InputCommand {
    /// Dispatch a key event through the browser's input pipeline.
    #[serde(rename = "Input.dispatchKeyEvent")]
    DispatchKeyEvent {
        /// Event type.
        #[serde(rename = "type")]
        event_type: KeyEventType,
        /// DOM `key` value.
        key: String,
        /// DOM `code` value.
        code: String,
        /// Legacy key code.
        #[serde(rename = "windowsVirtualKeyCode")]
        windows_virtual_key_code: u32,
        /// Platform key code.
        #[serde(rename = "nativeVirtualKeyCode")]
        native_virtual_key_code: u32,
        /// Text produced by the key, for printable keys.
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },

    /// Dispatch a mouse event at viewport coordinates.
    #[serde(rename = "Input.dispatchMouseEvent")]
    DispatchMouseEvent {
        /// Event type.
        #[serde(rename = "type")]
        event_type: MouseEventType,
        /// X in CSS pixels relative to the viewport.
        x: f64,
        /// Y in CSS pixels relative to the viewport.
        y: f64,
        /// Mouse button.
        button: MouseButton,
        /// Click count for press/release.
        #[serde(rename = "clickCount")]
        click_count: u32,
    },
}

/// `Input.dispatchKeyEvent` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyEventType {
    /// Key pressed, generating text if printable.
    KeyDown,
    /// Key pressed without text generation.
    RawKeyDown,
    /// Character input.
    Char,
    /// Key released.
    KeyUp,
}

/// `Input.dispatchMouseEvent` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MouseEventType {
    /// Button pressed.
    MousePressed,
    /// Button released.
    MouseReleased,
    /// Pointer moved.
    MouseMoved,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MouseButton {
    /// No button.
    None,
    /// Primary button.
    Left,
}

// ============================================================================
// Emulation Commands
// ============================================================================

/// Emulation domain commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum EmulationCommand {
    /// Override the default (transparent) page background.
    ///
    /// `None` restores the page's own background.
    #[serde(rename = "Emulation.setDefaultBackgroundColorOverride")]
    SetDefaultBackgroundColorOverride {
        /// Replacement colour.
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<RgbaColor>,
    },
}

/// CDP `DOM.RGBA` colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RgbaColor {
    /// Red (0-255).
    pub r: u8,
    /// Green (0-255).
    pub g: u8,
    /// Blue (0-255).
    pub b: u8,
    /// Alpha (0.0-1.0).
    pub a: f64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_command_serializes_method_only() {
        let json = serde_json::to_value(Command::Target(TargetCommand::GetTargets))
            .expect("serialize");
        assert_eq!(json["method"], "Target.getTargets");
        assert!(json.get("params").is_none());
    }

    #[test]
    fn test_attach_params_are_camel_case() {
        let command = Command::Target(TargetCommand::AttachToTarget {
            target_id: TargetId::new("T1"),
            flatten: true,
        });
        let json = serde_json::to_value(&command).expect("serialize");
        assert_eq!(json["method"], "Target.attachToTarget");
        assert_eq!(json["params"]["targetId"], "T1");
        assert_eq!(json["params"]["flatten"], true);
        assert_eq!(command.method(), "Target.attachToTarget");
    }

    #[test]
    fn test_screenshot_omits_quality_for_png() {
        let command = Command::Page(PageCommand::CaptureScreenshot {
            format: "png".to_string(),
            quality: None,
            clip: Some(Viewport {
                x: 0.0,
                y: 10.0,
                width: 100.0,
                height: 50.0,
                scale: 2.0,
            }),
            capture_beyond_viewport: true,
        });
        let json = serde_json::to_value(&command).expect("serialize");
        assert!(json["params"].get("quality").is_none());
        assert_eq!(json["params"]["clip"]["scale"], 2.0);
        assert_eq!(json["params"]["captureBeyondViewport"], true);
    }

    #[test]
    fn test_key_event_type_names() {
        let command = Command::Input(InputCommand::DispatchKeyEvent {
            event_type: KeyEventType::RawKeyDown,
            key: "ArrowDown".to_string(),
            code: "ArrowDown".to_string(),
            windows_virtual_key_code: 40,
            native_virtual_key_code: 40,
            text: None,
        });
        let json = serde_json::to_value(&command).expect("serialize");
        assert_eq!(json["params"]["type"], "rawKeyDown");
        assert_eq!(json["params"]["windowsVirtualKeyCode"], 40);
    }

    #[test]
    fn test_every_method_matches_serialized_tag() {
        let commands = [
            Command::Page(PageCommand::Enable),
            Command::Runtime(RuntimeCommand::ReleaseObject {
                object_id: ObjectId::new("1.2.3"),
            }),
            Command::Emulation(EmulationCommand::SetDefaultBackgroundColorOverride {
                color: None,
            }),
        ];
        for command in commands {
            let json = serde_json::to_value(&command).expect("serialize");
            assert_eq!(json["method"], command.method());
        }
    }
}
