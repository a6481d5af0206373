//! The live transform and its bounds.
//!
//! The transform is applied to the fitted display image relative to the
//! container center. Translation is always clamped so that the scaled image
//! covers the crop frame: no gap may appear at a frame edge.

use crate::frame::CropFrame;
use crate::geometry::{FittedDisplay, Point};
use serde::{Deserialize, Serialize};

/// Scale and translation applied to the fitted display image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn new(scale: f64, translate_x: f64, translate_y: f64) -> Self {
        Self {
            scale,
            translate_x,
            translate_y,
        }
    }

    /// Scale 1, no translation.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    #[inline]
    pub fn translation(&self) -> Point {
        Point::new(self.translate_x, self.translate_y)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.scale.is_finite() && self.translate_x.is_finite() && self.translate_y.is_finite()
    }

    /// Largest absolute difference between any two components.
    pub fn max_delta(&self, other: &Transform) -> f64 {
        (self.scale - other.scale)
            .abs()
            .max((self.translate_x - other.translate_x).abs())
            .max((self.translate_y - other.translate_y).abs())
    }
}

/// Smallest scale at which the display image still covers the frame.
#[inline]
pub fn min_cover_scale(frame: &CropFrame, display: &FittedDisplay) -> f64 {
    (frame.width / display.display_width).max(frame.height / display.display_height)
}

/// Clamp a translation so the scaled image fully covers the frame.
///
/// `max_t = max((display * scale - frame) / 2, 0)` on each axis.
#[inline]
pub fn clamp_translate(
    tx: f64,
    ty: f64,
    scale: f64,
    frame: &CropFrame,
    display: &FittedDisplay,
) -> (f64, f64) {
    let max_tx = ((display.display_width * scale - frame.width) * 0.5).max(0.0);
    let max_ty = ((display.display_height * scale - frame.height) * 0.5).max(0.0);
    (tx.max(-max_tx).min(max_tx), ty.max(-max_ty).min(max_ty))
}

/// Inclusive scale range for one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleBounds {
    pub min: f64,
    pub max: f64,
}

impl ScaleBounds {
    /// Bounds from the configured range, raised so the image always covers
    /// the frame.
    pub fn new(min_scale: f64, max_scale: f64, frame: &CropFrame, display: &FittedDisplay) -> Self {
        let min = min_scale.max(min_cover_scale(frame, display));
        Self {
            min,
            max: max_scale.max(min),
        }
    }

    #[inline]
    pub fn clamp(&self, scale: f64) -> f64 {
        scale.max(self.min).min(self.max)
    }
}

/// Build a clamped transform from raw values.
pub fn clamped(
    scale: f64,
    tx: f64,
    ty: f64,
    bounds: &ScaleBounds,
    frame: &CropFrame,
    display: &FittedDisplay,
) -> Transform {
    let scale = bounds.clamp(scale);
    let (tx, ty) = clamp_translate(tx, ty, scale, frame, display);
    Transform::new(scale, tx, ty)
}

/// Transform shared by the pinch and pan recognizers.
///
/// Every write bumps `version`, so a recognizer can tell that another one
/// wrote since its own last write and re-sync its baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedTransform {
    current: Transform,
    version: u64,
}

impl Default for SharedTransform {
    fn default() -> Self {
        Self::new(Transform::identity())
    }
}

impl SharedTransform {
    pub fn new(current: Transform) -> Self {
        Self {
            current,
            version: 0,
        }
    }

    #[inline]
    pub fn get(&self) -> Transform {
        self.current
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Store a new transform and return its version.
    pub fn write(&mut self, next: Transform) -> u64 {
        self.current = next;
        self.version = self.version.wrapping_add(1);
        self.version
    }
}
