//! Pure calculation functions for image display dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::config::Scaling;

/// Scale `length` by `numerator / denominator`, rounding half away from zero.
///
/// Computed in 128-bit integers so results are exact for every `u32` input:
/// `round(a / b) = (2a + b) / (2b)` for non-negative `a` and positive `b`.
/// Saturates at `u32::MAX`.
fn scale_rounded(length: u32, numerator: u32, denominator: u32) -> u32 {
    let a = u128::from(length) * u128::from(numerator);
    let b = u128::from(denominator);
    let rounded = (2 * a + b) / (2 * b);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Calculate the display size of an image rendered at a target width.
///
/// # Arguments
/// * `intrinsic` - Original image dimensions (width, height), both positive
/// * `target_width` - Configured display width, positive
/// * `scaling` - Whether the target is always used or only caps wider images
///
/// # Returns
/// * `(width, height)` - Display dimensions, both at least 1
///
/// # Examples
/// ```
/// # use md2storage::config::Scaling;
/// # use md2storage::imaging::calculate_display_dimensions;
/// // 1200x800 at 700px wide → 700x467 (466.67 rounds up)
/// assert_eq!(
///     calculate_display_dimensions((1200, 800), 700, Scaling::Fixed),
///     (700, 467)
/// );
/// ```
pub fn calculate_display_dimensions(
    intrinsic: (u32, u32),
    target_width: u32,
    scaling: Scaling,
) -> (u32, u32) {
    let (src_w, src_h) = intrinsic;
    debug_assert!(src_w > 0 && src_h > 0 && target_width > 0);

    let width = match scaling {
        Scaling::Fixed => target_width,
        Scaling::ShrinkOnly => target_width.min(src_w),
    }
    .max(1);

    // Very wide, short images would otherwise round down to zero
    let height = scale_rounded(width, src_h, src_w.max(1)).max(1);

    (width, height)
}
