use super::{DisplayRect, SelectionRect, SelectionSet};
use serde::{Deserialize, Serialize};

/// Rendered size of the video surface alongside the source resolution.
///
/// Zero means "not known yet" (metadata still loading).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayGeometry {
    pub displayed_width: f64,
    pub displayed_height: f64,
    pub native_width: u32,
    pub native_height: u32,
}

impl DisplayGeometry {
    pub fn new(displayed_width: f64, displayed_height: f64, native_width: u32, native_height: u32) -> Self {
        Self {
            displayed_width,
            displayed_height,
            native_width,
            native_height,
        }
    }

    /// Per-axis display→native factors, or `None` when any dimension is unknown
    pub fn scale(&self) -> Option<(f64, f64)> {
        let known = self.displayed_width > 0.0
            && self.displayed_height > 0.0
            && self.native_width > 0
            && self.native_height > 0;
        if !known {
            return None;
        }

        Some((
            self.native_width as f64 / self.displayed_width,
            self.native_height as f64 / self.displayed_height,
        ))
    }
}

/// Rescale one displayed rectangle into native video pixels.
///
/// With unknown dimensions the scale is 1, but values are still rounded and
/// clamped, so the output equals the input only for integral display coordinates.
pub fn to_native(rect: &DisplayRect, geometry: &DisplayGeometry) -> SelectionRect {
    let (scale_x, scale_y) = geometry.scale().unwrap_or((1.0, 1.0));

    SelectionRect {
        id: rect.id.clone(),
        x: scaled(rect.x, scale_x, 0),
        y: scaled(rect.y, scale_y, 0),
        width: scaled(rect.width, scale_x, 1),
        height: scaled(rect.height, scale_y, 1),
        timestamp: rect.timestamp.max(0.0),
    }
}

pub fn to_native_set(rects: &[DisplayRect], geometry: &DisplayGeometry) -> SelectionSet {
    if geometry.scale().is_none() {
        tracing::warn!("Video dimensions unknown, sending selections unscaled");
    }
    SelectionSet::new(rects.iter().map(|rect| to_native(rect, geometry)).collect())
}

fn scaled(value: f64, scale: f64, floor: u32) -> u32 {
    let rounded = (value * scale).round();
    if !rounded.is_finite() || rounded <= floor as f64 {
        return floor;
    }
    if rounded >= u32::MAX as f64 {
        return u32::MAX;
    }
    rounded as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, width: f64, height: f64) -> DisplayRect {
        DisplayRect {
            id: "r".to_string(),
            x,
            y,
            width,
            height,
            timestamp: 2.0,
        }
    }

    #[test]
    fn scales_preview_rect_to_native_resolution() {
        let geometry = DisplayGeometry::new(400.0, 300.0, 1920, 1440);
        let native = to_native(&rect(10.0, 10.0, 110.0, 150.0), &geometry);

        assert_eq!((native.x, native.y, native.width, native.height), (48, 48, 528, 720));
        assert_eq!(native.timestamp, 2.0);
    }

    #[test]
    fn axes_scale_independently() {
        let geometry = DisplayGeometry::new(640.0, 360.0, 1280, 1080);
        let native = to_native(&rect(100.0, 100.0, 20.0, 20.0), &geometry);

        assert_eq!((native.x, native.y, native.width, native.height), (200, 300, 40, 60));
    }

    #[test]
    fn unknown_native_size_passes_through() {
        let geometry = DisplayGeometry::new(400.0, 300.0, 0, 0);
        let native = to_native(&rect(12.0, 34.0, 56.0, 78.0), &geometry);

        assert_eq!((native.x, native.y, native.width, native.height), (12, 34, 56, 78));
    }

    #[test]
    fn unknown_displayed_size_passes_through() {
        let native = to_native(&rect(5.0, 6.0, 15.0, 16.0), &DisplayGeometry::default());
        assert_eq!((native.x, native.y, native.width, native.height), (5, 6, 15, 16));
    }

    #[test]
    fn unknown_displayed_size_still_rounds_and_clamps() {
        let native = to_native(&rect(-3.0, 6.4, 15.6, 0.2), &DisplayGeometry::default());
        assert_eq!((native.x, native.y, native.width, native.height), (0, 6, 16, 1));
    }

    #[test]
    fn downscaled_sizes_never_collapse_to_zero() {
        let geometry = DisplayGeometry::new(1000.0, 1000.0, 10, 10);
        let native = to_native(&rect(0.0, 0.0, 11.0, 11.0), &geometry);

        assert_eq!(native.width, 1);
        assert_eq!(native.height, 1);
    }

    #[test]
    fn negative_origin_clamps_to_zero() {
        let geometry = DisplayGeometry::new(100.0, 100.0, 200, 200);
        let native = to_native(&rect(-3.0, -0.2, 20.0, 20.0), &geometry);

        assert_eq!((native.x, native.y), (0, 0));
    }

    #[test]
    fn rounding_matches_formula_for_fractional_scale() {
        let geometry = DisplayGeometry::new(600.0, 338.0, 1920, 1080);
        let source = rect(123.0, 45.0, 77.0, 31.0);
        let native = to_native(&source, &geometry);

        let sx = 1920.0 / 600.0;
        let sy = 1080.0 / 338.0;
        assert_eq!(native.x, (123.0f64 * sx).round() as u32);
        assert_eq!(native.y, (45.0f64 * sy).round() as u32);
        assert_eq!(native.width, (77.0f64 * sx).round().max(1.0) as u32);
        assert_eq!(native.height, (31.0f64 * sy).round().max(1.0) as u32);
    }
}
