//! Translation from platform pan gestures.
//!
//! The platform reports a cumulative translation since the pan began. The
//! recognizer keeps its own baseline (`start + translation == live`) and
//! re-syncs it whenever the shared transform was written by someone else,
//! so a simultaneous pinch never fights a stale pan baseline.

use super::GestureContext;
use crate::error::{EngineError, EngineResult};
use crate::geometry::Point;
use crate::transform::{clamp_translate, SharedTransform, Transform};

/// Scale above which the image counts as zoomed in.
const ZOOMED_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
struct PanSession {
    start: Point,
    synced_version: u64,
}

/// Pan recognizer over the shared transform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanRecognizer {
    session: Option<PanSession>,
}

impl PanRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn begin(&mut self, shared: &SharedTransform) {
        self.session = Some(PanSession {
            start: shared.get().translation(),
            synced_version: shared.version(),
        });
    }

    /// Apply a cumulative pan translation.
    ///
    /// Returns `Ok(None)` when the frame only re-synced the baseline or
    /// panning is not allowed at the current scale.
    pub fn update(
        &mut self,
        translation: Point,
        shared: &mut SharedTransform,
        ctx: &GestureContext,
    ) -> EngineResult<Option<Transform>> {
        if !translation.is_finite() {
            return Err(EngineError::DegenerateGesture("non-finite pan translation"));
        }
        let current = shared.get();
        let resync = PanSession {
            start: current.translation() - translation,
            synced_version: shared.version(),
        };

        let session = match self.session {
            Some(session) if session.synced_version == shared.version() => session,
            _ => {
                self.session = Some(resync);
                return Ok(None);
            }
        };

        let zoomed = current.scale > 1.0 + ZOOMED_EPSILON;
        if !(zoomed || ctx.pan_at_base_scale) {
            self.session = Some(resync);
            return Ok(None);
        }

        let raw = session.start + translation;
        let (tx, ty) = clamp_translate(raw.x, raw.y, current.scale, &ctx.frame, &ctx.display);
        let next = Transform::new(current.scale, tx, ty);
        let synced_version = shared.write(next);
        self.session = Some(PanSession {
            start: session.start,
            synced_version,
        });
        Ok(Some(next))
    }

    pub fn end(&mut self) {
        self.session = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::CropFrame;
    use crate::geometry::FittedDisplay;
    use crate::transform::ScaleBounds;

    fn context(pan_at_base_scale: bool) -> GestureContext {
        let display = FittedDisplay {
            display_width: 600.0,
            display_height: 300.0,
            fitted_scale: 0.3,
        };
        let frame = CropFrame::new(300.0, 300.0);
        GestureContext {
            center: Point::new(150.0, 150.0),
            frame,
            display,
            bounds: ScaleBounds::new(1.0, 5.0, &frame, &display),
            pan_at_base_scale,
        }
    }

    #[test]
    fn test_pan_moves_and_clamps() {
        let ctx = context(true);
        let mut shared = SharedTransform::default();
        let mut pan = PanRecognizer::new();
        pan.begin(&shared);

        let t = pan
            .update(Point::new(40.0, 25.0), &mut shared, &ctx)
            .unwrap()
            .unwrap();
        assert_eq!(t.translate_x, 40.0);
        // No vertical slack at base scale
        assert_eq!(t.translate_y, 0.0);

        let t = pan
            .update(Point::new(400.0, 0.0), &mut shared, &ctx)
            .unwrap()
            .unwrap();
        assert_eq!(t.translate_x, 150.0);
    }

    #[test]
    fn test_pan_requires_zoom_in_viewer_mode() {
        let ctx = context(false);
        let mut shared = SharedTransform::default();
        let mut pan = PanRecognizer::new();
        pan.begin(&shared);

        assert_eq!(pan.update(Point::new(40.0, 0.0), &mut shared, &ctx).unwrap(), None);
        assert_eq!(shared.get(), Transform::identity());

        shared.write(Transform::new(2.0, 0.0, 0.0));
        // First frame after a foreign write only re-syncs
        assert_eq!(pan.update(Point::new(50.0, 0.0), &mut shared, &ctx).unwrap(), None);
        let t = pan
            .update(Point::new(60.0, 0.0), &mut shared, &ctx)
            .unwrap()
            .unwrap();
        assert_eq!(t.translate_x, 10.0);
    }

    #[test]
    fn test_resync_after_foreign_write() {
        let ctx = context(true);
        let mut shared = SharedTransform::default();
        let mut pan = PanRecognizer::new();
        pan.begin(&shared);
        pan.update(Point::new(10.0, 0.0), &mut shared, &ctx).unwrap();

        // A pinch writes a new transform
        shared.write(Transform::new(2.0, -30.0, 5.0));
        assert_eq!(pan.update(Point::new(12.0, 0.0), &mut shared, &ctx).unwrap(), None);

        // Continues from the pinch result, not from the stale pan start
        let t = pan
            .update(Point::new(20.0, 0.0), &mut shared, &ctx)
            .unwrap()
            .unwrap();
        assert_eq!(t.translate_x, -22.0);
        assert_eq!(t.translate_y, 5.0);
    }

    #[test]
    fn test_non_finite_translation() {
        let ctx = context(true);
        let mut shared = SharedTransform::default();
        let mut pan = PanRecognizer::new();
        pan.begin(&shared);
        assert!(pan
            .update(Point::new(f64::NAN, 0.0), &mut shared, &ctx)
            .is_err());
    }
}
