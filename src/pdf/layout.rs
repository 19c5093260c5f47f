//! Image placement on a page.

// ============================================================================
// Placement
// ============================================================================

/// Where an image is drawn, in page units with `y` measured from the top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge.
    pub x: f64,
    /// Top edge, from the top of the page.
    pub y: f64,
    /// Drawn width.
    pub width: f64,
    /// Drawn height.
    pub height: f64,
}

/// Fits a `image_w`×`image_h` pixel image into a page.
///
/// Width is fitted to the usable width first; if that makes the image too
/// tall, height is fitted instead. The result is centred in the usable area.
#[must_use]
pub fn fit_image(image_w: u32, image_h: u32, page_w: f64, page_h: f64, margin: f64) -> Placement {
    let usable_w = page_w - 2.0 * margin;
    let usable_h = page_h - 2.0 * margin;
    let (img_w, img_h) = (f64::from(image_w), f64::from(image_h));

    let mut width = usable_w;
    let mut height = img_h * width / img_w;
    if height > usable_h {
        height = usable_h;
        width = img_w * height / img_h;
    }

    Placement {
        x: margin + (usable_w - width) / 2.0,
        y: margin + (usable_h - height) / 2.0,
        width,
        height,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_wide_image_fits_width() {
        let p = fit_image(2000, 1000, 210.0, 297.0, 0.0);
        assert_eq!(p.width, 210.0);
        assert_eq!(p.height, 105.0);
        assert_eq!(p.x, 0.0);
        assert!((p.y - 96.0).abs() < EPS);
    }

    #[test]
    fn test_tall_image_fits_height() {
        let p = fit_image(1000, 4000, 210.0, 297.0, 10.0);
        assert!((p.height - 277.0).abs() < EPS);
        assert!((p.width - 69.25).abs() < EPS);
        assert!((p.y - 10.0).abs() < EPS);
        assert!((p.x - (10.0 + (190.0 - 69.25) / 2.0)).abs() < EPS);
    }

    proptest! {
        #[test]
        fn prop_fits_preserves_aspect_and_centres(
            image_w in 1u32..10_000,
            image_h in 1u32..10_000,
            page_w in 50.0f64..2000.0,
            page_h in 50.0f64..2000.0,
            margin in 0.0f64..20.0,
        ) {
            let p = fit_image(image_w, image_h, page_w, page_h, margin);
            let usable_w = page_w - 2.0 * margin;
            let usable_h = page_h - 2.0 * margin;

            prop_assert!(p.width <= usable_w + EPS);
            prop_assert!(p.height <= usable_h + EPS);

            let image_aspect = f64::from(image_w) / f64::from(image_h);
            let drawn_aspect = p.width / p.height;
            prop_assert!((image_aspect - drawn_aspect).abs() <= image_aspect * 1e-9);

            let left = p.x - margin;
            let right = margin + usable_w - (p.x + p.width);
            let top = p.y - margin;
            let bottom = margin + usable_h - (p.y + p.height);
            prop_assert!((left - right).abs() < 1e-6 * page_w.max(1.0));
            prop_assert!((top - bottom).abs() < 1e-6 * page_h.max(1.0));
        }
    }
}
