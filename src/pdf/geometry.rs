//! Page geometry: paper formats, units and orientation.
//!
//! Paper sizes are the usual document-library values in points.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Smallest usable width or height, in points, that still fits an image.
const MIN_USABLE_POINTS: f64 = 1.0;

// ============================================================================
// Orientation
// ============================================================================

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Taller than wide.
    #[default]
    Portrait,
    /// Wider than tall.
    Landscape,
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "p" | "portrait" => Ok(Self::Portrait),
            "l" | "landscape" => Ok(Self::Landscape),
            _ => Err(Error::config(format!("Unknown orientation '{s}'"))),
        }
    }
}

// ============================================================================
// Unit
// ============================================================================

/// Measurement unit for page sizes, margins and placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// PostScript point (1/72 in).
    Pt,
    /// Millimetre.
    #[default]
    Mm,
    /// Centimetre.
    Cm,
    /// Inch.
    In,
    /// CSS pixel at 96 dpi.
    Px,
}

impl Unit {
    /// Points per one of this unit.
    #[must_use]
    pub fn points(self) -> f64 {
        match self {
            Self::Pt => 1.0,
            Self::Mm => 72.0 / 25.4,
            Self::Cm => 72.0 / 2.54,
            Self::In => 72.0,
            Self::Px => 72.0 / 96.0,
        }
    }

    /// Converts a length in this unit to points.
    #[inline]
    #[must_use]
    pub fn to_points(self, value: f64) -> f64 {
        value * self.points()
    }

    /// Converts a length in points to this unit.
    #[inline]
    #[must_use]
    pub fn from_points(self, points: f64) -> f64 {
        points / self.points()
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pt" => Ok(Self::Pt),
            "mm" => Ok(Self::Mm),
            "cm" => Ok(Self::Cm),
            "in" => Ok(Self::In),
            "px" => Ok(Self::Px),
            _ => Err(Error::config(format!("Unknown unit '{s}'"))),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pt => "pt",
            Self::Mm => "mm",
            Self::Cm => "cm",
            Self::In => "in",
            Self::Px => "px",
        })
    }
}

// ============================================================================
// PaperFormat
// ============================================================================

/// Paper size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperFormat {
    /// ISO A3.
    A3,
    /// ISO A4.
    #[default]
    A4,
    /// ISO A5.
    A5,
    /// US Letter.
    Letter,
    /// US Legal.
    Legal,
    /// Custom portrait size, in the geometry's unit.
    Custom {
        /// Width.
        width: f64,
        /// Height.
        height: f64,
    },
}

impl PaperFormat {
    /// Portrait size in points.
    #[must_use]
    pub fn size_points(self, unit: Unit) -> (f64, f64) {
        match self {
            Self::A3 => (841.89, 1190.55),
            Self::A4 => (595.28, 841.89),
            Self::A5 => (419.53, 595.28),
            Self::Letter => (612.0, 792.0),
            Self::Legal => (612.0, 1008.0),
            Self::Custom { width, height } => (unit.to_points(width), unit.to_points(height)),
        }
    }
}

impl FromStr for PaperFormat {
    type Err = Error;

    /// Parses a named format, or `<width>x<height>` for a custom size.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "a3" => Ok(Self::A3),
            "a4" => Ok(Self::A4),
            "a5" => Ok(Self::A5),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            other => {
                let parsed = other
                    .split_once('x')
                    .and_then(|(w, h)| Some((w.trim().parse().ok()?, h.trim().parse().ok()?)));
                match parsed {
                    Some((width, height)) => Ok(Self::Custom { width, height }),
                    None => Err(Error::config(format!("Unknown paper format '{s}'"))),
                }
            }
        }
    }
}

// ============================================================================
// PageGeometry
// ============================================================================

/// Output page layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    /// Page orientation.
    pub orientation: Orientation,
    /// Unit for the margin and custom sizes.
    pub unit: Unit,
    /// Paper size.
    pub format: PaperFormat,
    /// Margin on every side.
    pub margin: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            orientation: Orientation::Portrait,
            unit: Unit::Mm,
            format: PaperFormat::A4,
            margin: 0.0,
        }
    }
}

impl PageGeometry {
    /// Sets the orientation.
    #[inline]
    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Sets the unit.
    #[inline]
    #[must_use]
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    /// Sets the paper format.
    #[inline]
    #[must_use]
    pub fn with_format(mut self, format: PaperFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the margin.
    #[inline]
    #[must_use]
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Page size in the geometry's unit, orientation applied.
    #[must_use]
    pub fn page_size(&self) -> (f64, f64) {
        let (w, h) = self.page_size_points();
        (self.unit.from_points(w), self.unit.from_points(h))
    }

    /// Page size in points, orientation applied.
    #[must_use]
    pub fn page_size_points(&self) -> (f64, f64) {
        let (w, h) = self.format.size_points(self.unit);
        let (short, long) = if w <= h { (w, h) } else { (h, w) };
        match self.orientation {
            Orientation::Portrait => (short, long),
            Orientation::Landscape => (long, short),
        }
    }

    /// Page area inside the margins, in the geometry's unit.
    #[must_use]
    pub fn usable_size(&self) -> (f64, f64) {
        let (w, h) = self.page_size();
        (w - 2.0 * self.margin, h - 2.0 * self.margin)
    }

    /// Validates the geometry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for non-positive sizes, a negative margin,
    /// or margins that leave no usable area.
    pub fn validate(&self) -> Result<()> {
        if let PaperFormat::Custom { width, height } = self.format
            && !(width > 0.0 && height > 0.0)
        {
            return Err(Error::config(format!(
                "Custom paper size must be positive, got {width}x{height}"
            )));
        }

        if self.margin.is_nan() || self.margin < 0.0 {
            return Err(Error::config("Margin must not be negative"));
        }

        let (usable_w, usable_h) = self.usable_size();
        if self.unit.to_points(usable_w) < MIN_USABLE_POINTS
            || self.unit.to_points(usable_h) < MIN_USABLE_POINTS
        {
            return Err(Error::config(format!(
                "Margin {}{} leaves no usable page area",
                self.margin, self.unit
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
