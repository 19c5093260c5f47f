//! Keyboard key definitions and key event construction.
//!
//! Provides key constants for the navigation keys a paginated viewer
//! listens for, and builds both dispatch forms:
//!
//! - native events through `Input.dispatchKeyEvent`
//! - synthetic `KeyboardEvent`s dispatched on `document` by page script
//!
//! # Example
//!
//! ```ignore
//! use page_capture::Key;
//!
//! tab.press_key(Key::ArrowDown).await?;
//! tab.dispatch_synthetic_key(Key::PageDown).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::protocol::{Command, InputCommand, KeyEventType};

// ============================================================================
// Key Enum
// ============================================================================

/// Keys used to advance or scroll a document viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    // ========================================================================
    // Control
    // ========================================================================
    /// Enter/Return key
    Enter,
    /// Space bar
    Space,

    // ========================================================================
    // Arrow Keys
    // ========================================================================
    /// Arrow Up
    ArrowUp,
    /// Arrow Down
    ArrowDown,
    /// Arrow Left
    ArrowLeft,
    /// Arrow Right
    ArrowRight,

    // ========================================================================
    // Page Navigation
    // ========================================================================
    /// Home key
    Home,
    /// End key
    End,
    /// Page Up key
    PageUp,
    /// Page Down key
    PageDown,
}

impl Key {
    /// Returns the key properties: (key, code, keyCode, printable).
    #[must_use]
    pub fn properties(self) -> (&'static str, &'static str, u32, bool) {
        match self {
            Key::Enter => ("Enter", "Enter", 13, false),
            Key::Space => (" ", "Space", 32, true),
            Key::ArrowUp => ("ArrowUp", "ArrowUp", 38, false),
            Key::ArrowDown => ("ArrowDown", "ArrowDown", 40, false),
            Key::ArrowLeft => ("ArrowLeft", "ArrowLeft", 37, false),
            Key::ArrowRight => ("ArrowRight", "ArrowRight", 39, false),
            Key::Home => ("Home", "Home", 36, false),
            Key::End => ("End", "End", 35, false),
            Key::PageUp => ("PageUp", "PageUp", 33, false),
            Key::PageDown => ("PageDown", "PageDown", 34, false),
        }
    }

    /// Returns the key value string.
    #[inline]
    #[must_use]
    pub fn key(self) -> &'static str {
        self.properties().0
    }

    /// Returns the code string.
    #[inline]
    #[must_use]
    pub fn code(self) -> &'static str {
        self.properties().1
    }

    /// Returns the legacy keyCode.
    #[inline]
    #[must_use]
    pub fn key_code(self) -> u32 {
        self.properties().2
    }

    /// Returns whether this key produces printable output.
    #[inline]
    #[must_use]
    pub fn is_printable(self) -> bool {
        self.properties().3
    }
}

// ============================================================================
// Event Construction
// ============================================================================

impl Key {
    /// Builds the `Input.dispatchKeyEvent` pair (down, up) for this key.
    #[must_use]
    pub fn native_events(self) -> [Command; 2] {
        let (key, code, key_code, printable) = self.properties();
        let event = |event_type, text: Option<String>| {
            Command::Input(InputCommand::DispatchKeyEvent {
                event_type,
                key: key.to_string(),
                code: code.to_string(),
                windows_virtual_key_code: key_code,
                native_virtual_key_code: key_code,
                text,
            })
        };

        let down = if printable {
            event(KeyEventType::KeyDown, Some(key.to_string()))
        } else {
            event(KeyEventType::RawKeyDown, None)
        };
        [down, event(KeyEventType::KeyUp, None)]
    }

    /// Builds a script dispatching `keydown`, `keypress` and `keyup`
    /// `KeyboardEvent`s on `document`.
    ///
    /// Viewers that bind their own key listeners react to these even though
    /// they are untrusted events.
    #[must_use]
    pub fn synthetic_event_script(self) -> String {
        let (key, code, key_code, _) = self.properties();
        format!(
            r#"(() => {{
    for (const type of ["keydown", "keypress", "keyup"]) {{
        document.dispatchEvent(new KeyboardEvent(type, {{
            key: {key:?},
            code: {code:?},
            keyCode: {key_code},
            which: {key_code},
            bubbles: true,
            cancelable: true
        }}));
    }}
}})()"#
        )
    }
}

// ============================================================================
// Parsing & Display
// ============================================================================

impl FromStr for Key {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "enter" | "return" => Ok(Key::Enter),
            "space" => Ok(Key::Space),
            "arrowup" | "up" => Ok(Key::ArrowUp),
            "arrowdown" | "down" => Ok(Key::ArrowDown),
            "arrowleft" | "left" => Ok(Key::ArrowLeft),
            "arrowright" | "right" => Ok(Key::ArrowRight),
            "home" => Ok(Key::Home),
            "end" => Ok(Key::End),
            "pageup" => Ok(Key::PageUp),
            "pagedown" => Ok(Key::PageDown),
            _ => Err(Error::config(format!("Unknown key '{s}'"))),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_properties() {
        let (key, code, key_code, printable) = Key::ArrowDown.properties();
        assert_eq!(key, "ArrowDown");
        assert_eq!(code, "ArrowDown");
        assert_eq!(key_code, 40);
        assert!(!printable);
    }

    #[test]
    fn test_space_is_printable() {
        assert!(Key::Space.is_printable());
        assert!(!Key::Enter.is_printable());
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("ArrowDown".parse::<Key>().expect("parse"), Key::ArrowDown);
        assert_eq!("page-down".parse::<Key>().expect("parse"), Key::PageDown);
        assert_eq!("down".parse::<Key>().expect("parse"), Key::ArrowDown);
        assert!("F13".parse::<Key>().is_err());
    }

    #[test]
    fn test_native_events_are_down_then_up() {
        let [down, up] = Key::ArrowDown.native_events();
        let down = serde_json::to_value(&down).expect("serialize");
        let up = serde_json::to_value(&up).expect("serialize");
        assert_eq!(down["params"]["type"], "rawKeyDown");
        assert_eq!(up["params"]["type"], "keyUp");
        assert_eq!(down["params"]["windowsVirtualKeyCode"], 40);
    }

    #[test]
    fn test_printable_key_carries_text() {
        let [down, _] = Key::Space.native_events();
        let down = serde_json::to_value(&down).expect("serialize");
        assert_eq!(down["params"]["type"], "keyDown");
        assert_eq!(down["params"]["text"], " ");
    }

    #[test]
    fn test_synthetic_script_dispatches_three_events() {
        let script = Key::ArrowDown.synthetic_event_script();
        assert!(script.contains(r#"["keydown", "keypress", "keyup"]"#));
        assert!(script.contains(r#"key: "ArrowDown""#));
        assert!(script.contains("keyCode: 40"));
        assert!(script.contains("which: 40"));
    }
}
