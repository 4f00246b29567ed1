//! Pure calculation functions for variant dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::config::SizeSpec;

fn scaled(value: u32, ratio: f64) -> u32 {
    ((value as f64 * ratio).round() as u32).max(1)
}

/// Fit `original` inside a `max_w x max_h` box, preserving aspect ratio.
///
/// A zero bound leaves that side unconstrained. Never upscales: the result
/// is at most `original` on both sides.
pub fn constrain_dimensions(original: (u32, u32), max_w: u32, max_h: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    if orig_w == 0 || orig_h == 0 {
        return original;
    }

    let ratio_w = if max_w > 0 && max_w < orig_w {
        max_w as f64 / orig_w as f64
    } else {
        1.0
    };
    let ratio_h = if max_h > 0 && max_h < orig_h {
        max_h as f64 / orig_h as f64
    } else {
        1.0
    };
    let ratio = ratio_w.min(ratio_h);

    (scaled(orig_w, ratio), scaled(orig_h, ratio))
}

/// Output dimensions for one registered size, or `None` when the size is
/// skipped for this image.
///
/// - Fit (`crop = false`): the image fitted inside the box. Skipped when the
///   result is not smaller than the original.
/// - Crop (`crop = true`): `min(width, original)` by `min(height, original)`,
///   with a zero side derived from the original aspect ratio. Skipped when it
///   equals the original.
///
/// # Examples
/// ```
/// # use regen_thumbs::config::SizeSpec;
/// # use regen_thumbs::imaging::plan_size;
/// // 1200x800 fitted in 300x300 → 300x200
/// assert_eq!(plan_size((1200, 800), &SizeSpec::fit(300, 300)), Some((300, 200)));
///
/// // 1200x800 cropped to 150x150
/// assert_eq!(plan_size((1200, 800), &SizeSpec::cropped(150, 150)), Some((150, 150)));
///
/// // Never upscaled
/// assert_eq!(plan_size((100, 80), &SizeSpec::fit(300, 300)), None);
/// ```
pub fn plan_size(original: (u32, u32), spec: &SizeSpec) -> Option<(u32, u32)> {
    let (orig_w, orig_h) = original;
    if orig_w == 0 || orig_h == 0 || (spec.width == 0 && spec.height == 0) {
        return None;
    }

    let planned = if spec.crop {
        let aspect = orig_w as f64 / orig_h as f64;
        let mut w = spec.width.min(orig_w);
        let mut h = spec.height.min(orig_h);
        if w == 0 {
            w = scaled(h, aspect).min(orig_w);
        }
        if h == 0 {
            h = scaled(w, 1.0 / aspect).min(orig_h);
        }
        (w, h)
    } else {
        constrain_dimensions(original, spec.width, spec.height)
    };

    if spec.crop {
        (planned != original).then_some(planned)
    } else {
        (planned.0 < orig_w || planned.1 < orig_h).then_some(planned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // constrain_dimensions
    // =========================================================================

    #[test]
    fn constrain_landscape_into_square_box() {
        assert_eq!(constrain_dimensions((1200, 800), 300, 300), (300, 200));
    }

    #[test]
    fn constrain_portrait_into_square_box() {
        assert_eq!(constrain_dimensions((800, 1200), 300, 300), (200, 300));
    }

    #[test]
    fn constrain_with_unbounded_height() {
        assert_eq!(constrain_dimensions((2000, 1000), 500, 0), (500, 250));
    }

    #[test]
    fn constrain_with_unbounded_width() {
        assert_eq!(constrain_dimensions((2000, 1000), 0, 100), (200, 100));
    }

    #[test]
    fn constrain_never_upscales() {
        assert_eq!(constrain_dimensions((200, 100), 1000, 1000), (200, 100));
    }

    #[test]
    fn constrain_extreme_aspect_keeps_one_pixel() {
        assert_eq!(constrain_dimensions((10000, 10), 100, 100), (100, 1));
    }

    // =========================================================================
    // plan_size: fit
    // =========================================================================

    #[test]
    fn fit_plans_smaller_box() {
        assert_eq!(
            plan_size((1200, 800), &SizeSpec::fit(1024, 1024)),
            Some((1024, 683))
        );
    }

    #[test]
    fn fit_skips_when_original_already_fits() {
        assert_eq!(plan_size((300, 200), &SizeSpec::fit(300, 300)), None);
        assert_eq!(plan_size((640, 480), &SizeSpec::fit(1024, 1024)), None);
    }

    #[test]
    fn fit_shrinks_when_one_side_exceeds() {
        assert_eq!(plan_size((400, 200), &SizeSpec::fit(300, 300)), Some((300, 150)));
    }

    // =========================================================================
    // plan_size: crop
    // =========================================================================

    #[test]
    fn crop_plans_exact_box() {
        assert_eq!(
            plan_size((1200, 800), &SizeSpec::cropped(150, 150)),
            Some((150, 150))
        );
    }

    #[test]
    fn crop_limited_by_small_side() {
        // 400x100 source, 150x150 crop → 150x100 (height can't grow)
        assert_eq!(
            plan_size((400, 100), &SizeSpec::cropped(150, 150)),
            Some((150, 100))
        );
    }

    #[test]
    fn crop_skips_when_equal_to_original() {
        assert_eq!(plan_size((150, 150), &SizeSpec::cropped(150, 150)), None);
        assert_eq!(plan_size((100, 100), &SizeSpec::cropped(150, 150)), None);
    }

    #[test]
    fn crop_with_zero_height_derives_from_aspect() {
        assert_eq!(
            plan_size((1000, 500), &SizeSpec::cropped(200, 0)),
            Some((200, 100))
        );
    }

    #[test]
    fn zero_dimension_source_is_skipped() {
        assert_eq!(plan_size((0, 100), &SizeSpec::fit(10, 10)), None);
    }
}
