//! Keyboard and mouse input methods.

use tracing::debug;

use crate::browser::keyboard::Key;
use crate::error::Result;
use crate::protocol::{Command, InputCommand, MouseButton, MouseEventType};

use super::Tab;

// ============================================================================
// Tab - Keyboard
// ============================================================================

impl Tab {
    /// Presses and releases a key through the browser's input pipeline.
    ///
    /// The events go to whatever element has focus, as a real key press would.
    pub async fn press_key(&self, key: Key) -> Result<()> {
        debug!(session_id = %self.inner.session_id, %key, "Pressing key");

        for command in key.native_events() {
            self.send_command(command).await?;
        }
        Ok(())
    }

    /// Dispatches synthetic `keydown`/`keypress`/`keyup` events on `document`.
    ///
    /// Compatibility path for viewers whose key listeners live on the
    /// document and ignore focus.
    pub async fn dispatch_synthetic_key(&self, key: Key) -> Result<()> {
        debug!(session_id = %self.inner.session_id, %key, "Dispatching synthetic key events");

        self.evaluate(&key.synthetic_event_script()).await?;
        Ok(())
    }
}

// ============================================================================
// Tab - Mouse
// ============================================================================

impl Tab {
    /// Clicks at viewport coordinates with the left button.
    pub async fn click_at(&self, x: f64, y: f64) -> Result<()> {
        debug!(session_id = %self.inner.session_id, x, y, "Clicking");

        let events = [
            (MouseEventType::MouseMoved, MouseButton::None, 0),
            (MouseEventType::MousePressed, MouseButton::Left, 1),
            (MouseEventType::MouseReleased, MouseButton::Left, 1),
        ];

        for (event_type, button, click_count) in events {
            self.send_command(Command::Input(InputCommand::DispatchMouseEvent {
                event_type,
                x,
                y,
                button,
                click_count,
            }))
            .await?;
        }
        Ok(())
    }
}
