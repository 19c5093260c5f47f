//! Capture run configuration.
//!
//! A [`RunConfig`] is fixed when a run starts and never changes during it.
//! Every field has a default, so a JSON file only needs the values that
//! differ:
//!
//! ```json
//! {
//!   "total_pages": 42,
//!   "format": "png",
//!   "advance": { "kind": "click", "value": { "strategy": "css", "value": "button.next" } },
//!   "pdf": { "format": "letter", "unit": "in", "margin": 0.25 }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::{By, ImageFormat, Key};
use crate::error::{Error, Result};
use crate::pdf::PageGeometry;
use crate::protocol::RgbaColor;

// ============================================================================
// Constants
// ============================================================================

/// Default number of pages to capture.
pub const DEFAULT_TOTAL_PAGES: u32 = 100;

/// Default wait before each capture (milliseconds).
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;

/// Default wait after each advance (milliseconds).
pub const DEFAULT_NAVIGATION_DELAY_MS: u64 = 500;

/// Default device scale factor for captures.
pub const DEFAULT_SCALE: f64 = 2.0;

// ============================================================================
// Color
// ============================================================================

/// Opaque RGB colour, written as `#rrggbb` or `#rgb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Color {
    /// White.
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
    };

    /// Returns the colour as a protocol RGBA value.
    #[inline]
    #[must_use]
    pub fn to_rgba(self) -> RgbaColor {
        RgbaColor {
            r: self.r,
            g: self.g,
            b: self.b,
            a: 1.0,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::config(format!("Invalid colour '{s}', expected #rrggbb"));

        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.is_ascii() {
            return Err(invalid());
        }

        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());

        match hex.len() {
            6 => Ok(Self {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
            }),
            3 => {
                let short = |i: usize| channel(&hex[i..=i]).map(|v| v * 17);
                Ok(Self {
                    r: short(0)?,
                    g: short(1)?,
                    b: short(2)?,
                })
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// ============================================================================
// Advance
// ============================================================================

/// How the viewer is moved to the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Advance {
    /// Synthetic `keydown`/`keypress`/`keyup` events dispatched on `document`.
    KeyEvents(Key),
    /// A real key press through the browser's input pipeline.
    NativeKey(Key),
    /// A click on a paginator control.
    Click(By),
    /// A page expression that advances the viewer itself.
    Script(String),
}

impl Default for Advance {
    fn default() -> Self {
        Self::KeyEvents(Key::ArrowDown)
    }
}

impl Advance {
    /// Short label used in progress messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::KeyEvents(key) => key.key().to_string(),
            Self::NativeKey(key) => format!("Press {}", key.key()),
            Self::Click(by) => format!("Click {by}"),
            Self::Script(_) => "Advance script".to_string(),
        }
    }
}

// ============================================================================
// Readiness
// ============================================================================

/// How to decide a page has finished rendering before capture.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Readiness {
    /// Sleep the settle delay.
    #[default]
    Fixed,
    /// Poll a page expression until it is truthy.
    Poll {
        /// Expression to evaluate.
        expression: String,
        /// Delay between polls (milliseconds).
        interval_ms: u64,
        /// Give up after this long (milliseconds).
        timeout_ms: u64,
    },
}

// ============================================================================
// RunConfig
// ============================================================================

/// Configuration for one capture run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of pages to capture.
    pub total_pages: u32,
    /// Wait before each capture (milliseconds).
    pub settle_delay_ms: u64,
    /// Wait after each advance (milliseconds).
    pub navigation_delay_ms: u64,
    /// Element whose box is captured.
    pub target: By,
    /// Device pixels per CSS pixel.
    pub scale: f64,
    /// Fill behind transparent content.
    pub background: Color,
    /// Encoding of captured pages.
    pub format: ImageFormat,
    /// Page-advance strategy.
    pub advance: Advance,
    /// Readiness strategy.
    pub readiness: Readiness,
    /// PDF page layout.
    pub pdf: PageGeometry,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            total_pages: DEFAULT_TOTAL_PAGES,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            navigation_delay_ms: DEFAULT_NAVIGATION_DELAY_MS,
            target: By::shadow("wc-", "virtualListBody"),
            scale: DEFAULT_SCALE,
            background: Color::WHITE,
            format: ImageFormat::Jpeg(100),
            advance: Advance::default(),
            readiness: Readiness::Fixed,
            pdf: PageGeometry::default(),
        }
    }
}

impl RunConfig {
    /// Creates a configuration with defaults.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be read
    /// - [`Error::Json`] if it is not a valid configuration
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Sets the page count.
    #[inline]
    #[must_use]
    pub fn with_total_pages(mut self, total_pages: u32) -> Self {
        self.total_pages = total_pages;
        self
    }

    /// Sets the settle delay.
    #[inline]
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Sets the navigation delay.
    #[inline]
    #[must_use]
    pub fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Sets the capture target.
    #[inline]
    #[must_use]
    pub fn with_target(mut self, target: By) -> Self {
        self.target = target;
        self
    }

    /// Sets the scale factor.
    #[inline]
    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the background colour.
    #[inline]
    #[must_use]
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    /// Sets the image encoding.
    #[inline]
    #[must_use]
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the advance strategy.
    #[inline]
    #[must_use]
    pub fn with_advance(mut self, advance: Advance) -> Self {
        self.advance = advance;
        self
    }

    /// Sets the readiness strategy.
    #[inline]
    #[must_use]
    pub fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }

    /// Sets the PDF layout.
    #[inline]
    #[must_use]
    pub fn with_pdf(mut self, pdf: PageGeometry) -> Self {
        self.pdf = pdf;
        self
    }

    /// Wait before each capture.
    #[inline]
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Wait after each advance.
    #[inline]
    #[must_use]
    pub fn navigation_delay(&self) -> Duration {
        Duration::from_millis(self.navigation_delay_ms)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !(self.scale > 0.0 && self.scale.is_finite()) {
            return Err(Error::config(format!(
                "Scale must be a positive number, got {}",
                self.scale
            )));
        }

        if let ImageFormat::Jpeg(quality) = self.format
            && quality > 100
        {
            return Err(Error::config(format!(
                "JPEG quality must be 0-100, got {quality}"
            )));
        }

        if let Readiness::Poll {
            expression,
            interval_ms,
            ..
        } = &self.readiness
        {
            if expression.trim().is_empty() {
                return Err(Error::config("Readiness expression must not be empty"));
            }
            if *interval_ms == 0 {
                return Err(Error::config("Readiness poll interval must be non-zero"));
            }
        }

        if let Advance::Script(expression) = &self.advance
            && expression.trim().is_empty()
        {
            return Err(Error::config("Advance script must not be empty"));
        }

        self.pdf.validate()
    }
}

// ============================================================================
// Tests
// ============================================================================
