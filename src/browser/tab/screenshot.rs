//! Screenshot capture methods.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Command, EmulationCommand, PageCommand, RgbaColor, Viewport};

use super::Tab;

// ============================================================================
// Types
// ============================================================================

/// Image format for screenshots.
///
/// Serializes as `"png"` or `{"jpeg": <quality>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless, larger file size).
    #[default]
    Png,
    /// JPEG format with quality (0-100).
    Jpeg(u8),
}

impl ImageFormat {
    /// Creates PNG format.
    #[inline]
    #[must_use]
    pub fn png() -> Self {
        Self::Png
    }

    /// Creates JPEG format with quality (0-100).
    #[inline]
    #[must_use]
    pub fn jpeg(quality: u8) -> Self {
        Self::Jpeg(quality.min(100))
    }

    /// Returns the format string for the protocol.
    fn format_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg(_) => "jpeg",
        }
    }

    /// Returns the quality value if JPEG.
    #[must_use]
    pub fn quality(&self) -> Option<u8> {
        match self {
            Self::Png => None,
            Self::Jpeg(q) => Some(*q),
        }
    }
}

// ============================================================================
// ScreenshotBuilder
// ============================================================================

/// Builder for configuring and capturing screenshots.
///
/// Without a clip the visible viewport is captured. With a clip the
/// rectangle is in page coordinates and may extend past the viewport.
///
/// # Example
///
/// ```ignore
/// // Capture as PNG base64
/// let png_data = tab.screenshot().png().capture().await?;
///
/// // Capture a region at twice the device scale
/// let bytes = tab.screenshot().clip(element.page_clip(2.0).await?).capture_bytes().await?;
/// ```
pub struct ScreenshotBuilder<'a> {
    tab: &'a Tab,
    format: ImageFormat,
    clip: Option<Viewport>,
}

impl<'a> ScreenshotBuilder<'a> {
    /// Creates a new screenshot builder.
    pub(crate) fn new(tab: &'a Tab) -> Self {
        Self {
            tab,
            format: ImageFormat::Png,
            clip: None,
        }
    }

    /// Sets PNG format (default).
    #[must_use]
    pub fn png(mut self) -> Self {
        self.format = ImageFormat::Png;
        self
    }

    /// Sets JPEG format with quality (0-100).
    #[must_use]
    pub fn jpeg(mut self, quality: u8) -> Self {
        self.format = ImageFormat::jpeg(quality);
        self
    }

    /// Sets the image format.
    #[must_use]
    pub fn format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Restricts the capture to a page-coordinate rectangle.
    #[must_use]
    pub fn clip(mut self, clip: Viewport) -> Self {
        self.clip = Some(clip);
        self
    }

    /// Captures the screenshot and returns base64-encoded data.
    pub async fn capture(&self) -> Result<String> {
        debug!(
            session_id = %self.tab.inner.session_id,
            format = ?self.format,
            clip = ?self.clip,
            "Capturing screenshot"
        );

        let command = Command::Page(PageCommand::CaptureScreenshot {
            format: self.format.format_str().to_string(),
            quality: self.format.quality(),
            clip: self.clip,
            capture_beyond_viewport: self.clip.is_some(),
        });

        let result = self.tab.send_command(command).await?;

        let data = result
            .get("data")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                Error::protocol(format!(
                    "Screenshot response missing data field. Got: {}",
                    result
                ))
            })?;

        Ok(data.to_string())
    }

    /// Captures the screenshot and returns raw bytes.
    pub async fn capture_bytes(&self) -> Result<Vec<u8>> {
        let base64_data = self.capture().await?;
        Base64Standard
            .decode(&base64_data)
            .map_err(|e| Error::protocol(format!("Failed to decode base64: {}", e)))
    }
}

// ============================================================================
// Tab - Screenshot
// ============================================================================

impl Tab {
    /// Creates a screenshot builder.
    #[must_use]
    pub fn screenshot(&self) -> ScreenshotBuilder<'_> {
        ScreenshotBuilder::new(self)
    }

    /// Overrides the page's default background, or resets it with `None`.
    ///
    /// Applies to areas the document leaves transparent, which otherwise
    /// come out transparent in PNG captures.
    pub async fn set_default_background(&self, color: Option<RgbaColor>) -> Result<()> {
        debug!(session_id = %self.inner.session_id, ?color, "Setting default background");

        self.send_command(Command::Emulation(
            EmulationCommand::SetDefaultBackgroundColorOverride { color },
        ))
        .await?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
