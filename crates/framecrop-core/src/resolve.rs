//! Commit-time inversion of the live transform into image pixels.
//!
//! # Algorithm
//!
//! The crop frame is centered in the container and the scaled display image
//! is centered at `center + translate`. Relative to the frame's top-left
//! corner the image's top-left corner sits at:
//!
//! ```text
//! image_left = (frame_w - display_w * scale) / 2 + translate_x
//! image_top  = (frame_h - display_h * scale) / 2 + translate_y
//! ```
//!
//! Dividing by the total scale (`fitted_scale * scale`) converts frame-space
//! distances into natural pixels. Restoring a descriptor solves the same two
//! equations for the translation.

use crate::error::{EngineError, EngineResult};
use crate::frame::CropFrameController;
use crate::geometry::{total_scale, FittedDisplay, ImageMetadata};
use crate::transform::{clamped, ScaleBounds, Transform};
use serde::{Deserialize, Serialize};

/// The selected pixel rectangle of the original image, plus the zoom used.
///
/// `x`, `y` is the top-left corner in natural pixels. Always satisfies
/// `0 <= x`, `0 <= y`, `x + width <= natural_width`,
/// `y + height <= natural_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropDescriptor {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub zoom: f64,
    pub natural_width: f64,
    pub natural_height: f64,
}

/// Integer pixel rectangle handed to the raster primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropDescriptor {
    fn is_finite(&self) -> bool {
        [
            self.x,
            self.y,
            self.width,
            self.height,
            self.zoom,
            self.natural_width,
            self.natural_height,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Round to whole pixels inside the image.
    ///
    /// The origin is floored and the far edge rounded, so the rectangle never
    /// reaches outside `natural_width x natural_height` and is at least 1x1.
    pub fn pixel_rect(&self) -> EngineResult<PixelRect> {
        if !self.is_finite() || self.width <= 0.0 || self.height <= 0.0 {
            return Err(EngineError::InvalidCropGeometry(format!(
                "cannot rasterize {}x{} at ({}, {})",
                self.width, self.height, self.x, self.y
            )));
        }
        let image_w = self.natural_width.round().max(1.0) as u32;
        let image_h = self.natural_height.round().max(1.0) as u32;

        let x = (self.x.max(0.0).floor() as u32).min(image_w - 1);
        let y = (self.y.max(0.0).floor() as u32).min(image_h - 1);
        let right = ((self.x + self.width).round().max(0.0) as u32).min(image_w);
        let bottom = ((self.y + self.height).round().max(0.0) as u32).min(image_h);

        Ok(PixelRect {
            x,
            y,
            width: right.saturating_sub(x).max(1),
            height: bottom.saturating_sub(y).max(1),
        })
    }
}

/// Invert the live transform and frame geometry into a crop descriptor.
///
/// # Arguments
///
/// * `transform` - The live scale/translate transform
/// * `frame` - The crop frame; its size and minimums bound the crop
/// * `display` - Cover-fitted display size of the image in this container
/// * `image` - Natural pixel size of the image
///
/// # Returns
///
/// The crop rectangle in natural pixels with the zoom it was taken at. The
/// origin is clamped to `[0, natural]` and the size to what is left of the
/// image past the origin, so the rectangle never leaves the image.
///
/// # Errors
///
/// `InvalidCropGeometry` when the result is empty or any operand is not
/// finite. No raster operation should follow a failure.
///
/// # Example
///
/// ```ignore
/// let descriptor = resolve(&session.transform(), session.frame_controller(),
///     session.display(), session.image())?;
/// let rect = descriptor.pixel_rect()?;
/// ```
pub fn resolve(
    transform: &Transform,
    frame: &CropFrameController,
    display: &FittedDisplay,
    image: &ImageMetadata,
) -> EngineResult<CropDescriptor> {
    let f = frame.frame();
    let (nw, nh) = (image.natural_width, image.natural_height);

    let total = total_scale(transform, display.fitted_scale);
    let scaled_w = display.display_width * transform.scale;
    let scaled_h = display.display_height * transform.scale;
    let image_left = (f.width - scaled_w) * 0.5 + transform.translate_x;
    let image_top = (f.height - scaled_h) * 0.5 + transform.translate_y;

    // `+ 0.0` folds a -0.0 origin into 0.0
    let origin_x = (-image_left / total).max(0.0).min(nw) + 0.0;
    let origin_y = (-image_top / total).max(0.0).min(nh) + 0.0;

    let crop_w = (f.width / total)
        .max(frame.min_width() / total)
        .min(nw)
        .min(nw - origin_x);
    let crop_h = (f.height / total)
        .max(frame.min_height() / total)
        .min(nh)
        .min(nh - origin_y);

    let descriptor = CropDescriptor {
        x: origin_x,
        y: origin_y,
        width: crop_w,
        height: crop_h,
        zoom: transform.scale,
        natural_width: nw,
        natural_height: nh,
    };

    if !(descriptor.is_finite() && total.is_finite() && total > 0.0) {
        return Err(EngineError::InvalidCropGeometry(format!(
            "non-finite crop from transform {transform:?}"
        )));
    }
    if crop_w <= 0.0 || crop_h <= 0.0 {
        return Err(EngineError::InvalidCropGeometry(format!(
            "empty crop {crop_w}x{crop_h} at ({origin_x}, {origin_y})"
        )));
    }
    Ok(descriptor)
}

/// Rebuild the transform (and frame size) that produced `descriptor`.
///
/// # Arguments
///
/// * `descriptor` - A crop previously produced by [`resolve`]
/// * `frame` - The crop frame; it is resized to show the crop
/// * `display` - Cover-fitted display size of the image in this container
/// * `image` - Natural pixel size of the image being edited
/// * `min_scale` - Lower zoom limit from the engine configuration
/// * `max_scale` - Upper zoom limit from the engine configuration
///
/// # Returns
///
/// The clamped transform that puts the crop's center under the frame's
/// center. Resolving it against the resized frame gives the same rectangle
/// back.
///
/// # Behavior
///
/// - A descriptor recorded against a different resolution of the same image
///   is rescaled to this image's natural size first.
/// - The descriptor's zoom is kept when the crop's frame at that zoom fits
///   the container and meets the frame minimums. Otherwise the zoom moves
///   to the nearest value that does.
/// - When the container is too small to show the crop even at `min_scale`,
///   the crop shrinks around its center and keeps its aspect ratio. A crop
///   too small for the minimums at `max_scale` grows the same way.
///
/// # Example
///
/// ```ignore
/// let transform = restore(&saved, &mut frame, &display, &image, 1.0, 5.0)?;
/// assert_eq!(resolve(&transform, &frame, &display, &image)?.x, saved.x);
/// ```
pub fn restore(
    descriptor: &CropDescriptor,
    frame: &mut CropFrameController,
    display: &FittedDisplay,
    image: &ImageMetadata,
    min_scale: f64,
    max_scale: f64,
) -> EngineResult<Transform> {
    if !descriptor.is_finite()
        || descriptor.width <= 0.0
        || descriptor.height <= 0.0
        || descriptor.zoom <= 0.0
        || descriptor.natural_width <= 0.0
        || descriptor.natural_height <= 0.0
    {
        return Err(EngineError::InvalidCropGeometry(format!(
            "cannot restore descriptor {descriptor:?}"
        )));
    }

    let sx = image.natural_width / descriptor.natural_width;
    let sy = image.natural_height / descriptor.natural_height;
    let (w, h) = (descriptor.width * sx, descriptor.height * sy);
    let center_x = descriptor.x * sx + w * 0.5;
    let center_y = descriptor.y * sy + h * 0.5;

    // Zoom range in which the crop's frame fits the container and meets
    // the frame minimums
    let fitted = display.fitted_scale;
    let container = frame.container();
    let fits_up_to = (container.container_width / (w * fitted))
        .min(container.container_height / (h * fitted));
    let needs_at_least =
        (frame.min_width() / (w * fitted)).max(frame.min_height() / (h * fitted));

    let zoom = descriptor
        .zoom
        .min(fits_up_to)
        .max(needs_at_least)
        .max(min_scale)
        .min(max_scale);
    let resize = (needs_at_least / zoom).max(1.0).min(fits_up_to / zoom);
    let total = fitted * zoom;
    frame.set_size(w * resize * total, h * resize * total);

    let f = frame.frame();
    let bounds = ScaleBounds::new(min_scale, max_scale, &f, display);
    let zoom = bounds.clamp(zoom);
    let total = fitted * zoom;

    // Put the crop center under the frame center
    let tx = total * (image.natural_width * 0.5 - center_x);
    let ty = total * (image.natural_height * 0.5 - center_y);
    let restored = clamped(zoom, tx, ty, &bounds, &f, display);
    if !restored.is_finite() {
        return Err(EngineError::InvalidCropGeometry(format!(
            "non-finite transform restoring {descriptor:?}"
        )));
    }
    Ok(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::geometry::ContainerGeometry;

    const EPSILON: f64 = 1e-6;

    struct Scene {
        image: ImageMetadata,
        display: FittedDisplay,
        frame: CropFrameController,
    }

    /// 2000x1000 image in a 300x300 container with the default square frame.
    fn scene() -> Scene {
        let image = ImageMetadata::new(2000.0, 1000.0).unwrap();
        let container = ContainerGeometry::new(300.0, 300.0).unwrap();
        Scene {
            image,
            display: FittedDisplay::cover(&image, &container),
            frame: CropFrameController::new(container, &EngineConfig::default()),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_center_crop_at_base_scale() {
        let s = scene();
        let d = resolve(&Transform::identity(), &s.frame, &s.display, &s.image).unwrap();

        assert!(close(d.x, 500.0), "x = {}", d.x);
        assert!(close(d.y, 0.0));
        assert!(close(d.width, 1000.0));
        assert!(close(d.height, 1000.0));
        assert_eq!(d.zoom, 1.0);
        assert_eq!(d.natural_width, 2000.0);
        assert_eq!(d.natural_height, 1000.0);
    }

    #[test]
    fn test_zoom_two_halves_crop_and_keeps_center() {
        let s = scene();
        let base = resolve(&Transform::identity(), &s.frame, &s.display, &s.image).unwrap();
        let zoomed =
            resolve(&Transform::new(2.0, 0.0, 0.0), &s.frame, &s.display, &s.image).unwrap();

        assert!(close(zoomed.width, base.width / 2.0));
        assert!(close(zoomed.height, base.height / 2.0));
        assert!(close(zoomed.x + zoomed.width / 2.0, base.x + base.width / 2.0));
        assert!(close(zoomed.y + zoomed.height / 2.0, base.y + base.height / 2.0));
        assert_eq!(zoomed.zoom, 2.0);
    }

    #[test]
    fn test_translation_shifts_origin() {
        let s = scene();
        // Moving the image right by 30 screen px reveals content 100 px to the left
        let d = resolve(&Transform::new(1.0, 30.0, 0.0), &s.frame, &s.display, &s.image).unwrap();
        assert!(close(d.x, 400.0));
    }

    #[test]
    fn test_origin_never_negative() {
        let s = scene();
        // Over-translated (unclamped) transform still yields an in-bounds crop
        let d = resolve(
            &Transform::new(3.0, 5000.0, 5000.0),
            &s.frame,
            &s.display,
            &s.image,
        )
        .unwrap();
        assert_eq!(d.x, 0.0);
        assert_eq!(d.y, 0.0);
        assert!(d.x.is_sign_positive() && d.y.is_sign_positive());
        assert!(d.x + d.width <= d.natural_width);
        assert!(d.y + d.height <= d.natural_height);
    }

    #[test]
    fn test_far_edge_is_clamped() {
        let s = scene();
        let err = resolve(
            &Transform::new(1.0, -5000.0, 0.0),
            &s.frame,
            &s.display,
            &s.image,
        )
        .unwrap_err();
        // Origin pinned to the right edge leaves nothing to crop
        assert!(matches!(err, EngineError::InvalidCropGeometry(_)));
    }

    #[test]
    fn test_non_finite_transform_fails() {
        let s = scene();
        let result = resolve(
            &Transform::new(f64::NAN, 0.0, 0.0),
            &s.frame,
            &s.display,
            &s.image,
        );
        assert!(matches!(result, Err(EngineError::InvalidCropGeometry(_))));

        let result = resolve(
            &Transform::new(0.0, 0.0, 0.0),
            &s.frame,
            &s.display,
            &s.image,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let s = scene();
        let t = Transform::new(2.3, -41.0, 17.5);
        let a = resolve(&t, &s.frame, &s.display, &s.image).unwrap();
        let b = resolve(&t, &s.frame, &s.display, &s.image).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_restore_round_trip() {
        let mut s = scene();
        let t = Transform::new(2.5, -120.0, 60.0);
        let d = resolve(&t, &s.frame, &s.display, &s.image).unwrap();

        let restored = restore(&d, &mut s.frame, &s.display, &s.image, 1.0, 5.0).unwrap();
        assert!(restored.max_delta(&t) < EPSILON);

        let again = resolve(&restored, &s.frame, &s.display, &s.image).unwrap();
        assert!(close(again.x, d.x) && close(again.y, d.y));
        assert!(close(again.width, d.width) && close(again.height, d.height));
    }

    #[test]
    fn test_restore_sets_frame_size() {
        let mut s = scene();
        let d = CropDescriptor {
            x: 600.0,
            y: 200.0,
            width: 400.0,
            height: 500.0,
            zoom: 2.0,
            natural_width: 2000.0,
            natural_height: 1000.0,
        };
        restore(&d, &mut s.frame, &s.display, &s.image, 1.0, 5.0).unwrap();
        // total scale 0.6
        assert!(close(s.frame.frame().width, 240.0));
        assert!(close(s.frame.frame().height, 300.0));
    }

    #[test]
    fn test_restore_rescales_other_resolution() {
        let mut s = scene();
        let t = Transform::new(2.0, 80.0, -40.0);
        let d = resolve(&t, &s.frame, &s.display, &s.image).unwrap();

        // Same crop recorded against a half-resolution copy
        let half = CropDescriptor {
            x: d.x / 2.0,
            y: d.y / 2.0,
            width: d.width / 2.0,
            height: d.height / 2.0,
            natural_width: 1000.0,
            natural_height: 500.0,
            ..d
        };
        let restored = restore(&half, &mut s.frame, &s.display, &s.image, 1.0, 5.0).unwrap();
        assert!(restored.max_delta(&t) < EPSILON);
    }

    #[test]
    fn test_restore_shrinks_crop_that_cannot_fit() {
        let mut s = scene();
        // Whole image height at zoom 1 would need a 600x300 frame
        let d = CropDescriptor {
            x: 0.0,
            y: 0.0,
            width: 2000.0,
            height: 1000.0,
            zoom: 1.0,
            natural_width: 2000.0,
            natural_height: 1000.0,
        };
        let t = restore(&d, &mut s.frame, &s.display, &s.image, 1.0, 5.0).unwrap();
        assert_eq!(t.scale, 1.0);
        assert!(close(s.frame.frame().width, 300.0));
        assert!(close(s.frame.frame().height, 150.0));

        let again = resolve(&t, &s.frame, &s.display, &s.image).unwrap();
        assert!(close(again.width / again.height, 2.0));
        assert!(close(again.x + again.width / 2.0, 1000.0));
        assert!(close(again.y + again.height / 2.0, 500.0));
    }

    #[test]
    fn test_restore_zooms_in_on_small_crop() {
        let mut s = scene();
        // At zoom 1 this crop would need a 60x60 frame, below the 105 minimum
        let d = CropDescriptor {
            x: 900.0,
            y: 400.0,
            width: 200.0,
            height: 200.0,
            zoom: 1.0,
            natural_width: 2000.0,
            natural_height: 1000.0,
        };
        let t = restore(&d, &mut s.frame, &s.display, &s.image, 1.0, 5.0).unwrap();
        assert!(close(t.scale, 1.75), "scale = {}", t.scale);
        assert!(close(s.frame.frame().width, 105.0));
        assert!(close(s.frame.frame().height, 105.0));

        let again = resolve(&t, &s.frame, &s.display, &s.image).unwrap();
        assert!(close(again.x, 900.0) && close(again.y, 400.0));
        assert!(close(again.width, 200.0) && close(again.height, 200.0));
    }

    #[test]
    fn test_restore_grows_crop_below_max_zoom_minimum() {
        let mut s = scene();
        // Even at zoom 5 a 20 px crop is a 30 px frame
        let d = CropDescriptor {
            x: 990.0,
            y: 490.0,
            width: 20.0,
            height: 20.0,
            zoom: 5.0,
            natural_width: 2000.0,
            natural_height: 1000.0,
        };
        let t = restore(&d, &mut s.frame, &s.display, &s.image, 1.0, 5.0).unwrap();
        assert_eq!(t.scale, 5.0);
        assert!(close(s.frame.frame().width, 105.0));

        let again = resolve(&t, &s.frame, &s.display, &s.image).unwrap();
        assert!(close(again.width, 70.0) && close(again.height, 70.0));
        assert!(close(again.x + again.width / 2.0, 1000.0));
        assert!(close(again.y + again.height / 2.0, 500.0));
    }

    #[test]
    fn test_corner_origin_is_positive_zero() {
        let s = scene();
        // Fully clamped to the top-left corner at 3x
        let d = resolve(
            &Transform::new(3.0, 750.0, 300.0),
            &s.frame,
            &s.display,
            &s.image,
        )
        .unwrap();
        assert_eq!(d.x, 0.0);
        assert_eq!(d.y, 0.0);
        assert!(d.x.is_sign_positive());
        assert!(d.y.is_sign_positive());
    }

    #[test]
    fn test_restore_rejects_garbage() {
        let mut s = scene();
        let bad = CropDescriptor {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 100.0,
            zoom: 1.0,
            natural_width: 2000.0,
            natural_height: 1000.0,
        };
        assert!(restore(&bad, &mut s.frame, &s.display, &s.image, 1.0, 5.0).is_err());
    }

    #[test]
    fn test_pixel_rect_rounding() {
        let d = CropDescriptor {
            x: 583.4,
            y: 0.2,
            width: 833.3,
            height: 999.9,
            zoom: 1.2,
            natural_width: 2000.0,
            natural_height: 1000.0,
        };
        let rect = d.pixel_rect().unwrap();
        assert_eq!(rect.x, 583);
        assert_eq!(rect.y, 0);
        assert_eq!(rect.width, 1417 - 583);
        assert_eq!(rect.height, 1000);
    }

    #[test]
    fn test_pixel_rect_stays_inside() {
        let d = CropDescriptor {
            x: 1999.9,
            y: 999.9,
            width: 0.05,
            height: 0.05,
            zoom: 5.0,
            natural_width: 2000.0,
            natural_height: 1000.0,
        };
        let rect = d.pixel_rect().unwrap();
        assert_eq!(rect, PixelRect { x: 1999, y: 999, width: 1, height: 1 });
    }

    #[test]
    fn test_descriptor_serializes_camel_case() {
        let d = CropDescriptor {
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
            zoom: 1.0,
            natural_width: 10.0,
            natural_height: 20.0,
        };
        let json = serde_json::to_value(d).unwrap();
        assert_eq!(json["naturalWidth"], 10.0);
        assert_eq!(json["naturalHeight"], 20.0);

        let back: CropDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }
}
