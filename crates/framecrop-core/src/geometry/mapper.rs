//! Conversions between screen space and content space.
//!
//! The gesture coordinator and the crop resolver both go through these
//! functions, so the live preview and the final crop share one mapping.
//!
//! ```text
//! screen = center + translate + content * scale
//! content = (screen - center - translate) / scale
//! ```

use super::Point;
use crate::transform::Transform;

/// Map a screen-space point into content space (relative to the image's
/// unscaled center).
#[inline]
pub fn to_content_point(screen: Point, transform: &Transform, center: Point) -> Point {
    (screen - center - transform.translation()) / transform.scale
}

/// Map a content-space point back onto the screen.
#[inline]
pub fn to_screen_point(content: Point, transform: &Transform, center: Point) -> Point {
    center + transform.translation() + content * transform.scale
}

/// Combined natural-to-screen scale factor.
#[inline]
pub fn total_scale(transform: &Transform, fitted_scale: f64) -> f64 {
    fitted_scale * transform.scale
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: screen -> content -> screen is the identity.
        #[test]
        fn prop_mapping_round_trips(
            sx in -1000.0f64..1000.0,
            sy in -1000.0f64..1000.0,
            scale in 0.1f64..10.0,
            tx in -500.0f64..500.0,
            ty in -500.0f64..500.0,
        ) {
            let center = Point::new(160.0, 240.0);
            let t = Transform::new(scale, tx, ty);
            let screen = Point::new(sx, sy);
            let back = to_screen_point(to_content_point(screen, &t, center), &t, center);
            prop_assert!((back.x - sx).abs() < 1e-6);
            prop_assert!((back.y - sy).abs() < 1e-6);
        }
    }
}
