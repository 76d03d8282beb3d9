//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale `source` down so its longer edge is at most `max_edge`, keeping
/// the aspect ratio. Images already within bounds are returned unchanged:
/// this never upscales.
///
/// ```text
/// fit_within((1440, 960), 720) == (720, 480)
/// fit_within((500, 2000), 720) == (180, 720)
/// fit_within((300, 200),  720) == (300, 200)
/// ```
///
/// The shorter edge is rounded and never drops below 1 pixel.
pub fn fit_within(source: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (width, height) = source;
    let longer = width.max(height);
    if longer <= max_edge || longer == 0 {
        return source;
    }

    let scale = max_edge as f64 / longer as f64;
    let shrink = |edge: u32| ((edge as f64 * scale).round() as u32).max(1);

    if width >= height {
        (max_edge, shrink(height))
    } else {
        (shrink(width), max_edge)
    }
}
