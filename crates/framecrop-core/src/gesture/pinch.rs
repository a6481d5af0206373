//! Focal-point anchored pinch zoom.
//!
//! At pinch start the content point under the focal point is recorded as
//! `origin`. Each update solves `F = center + translate + origin * scale`
//! for the translation, so that content point stays under the fingers while
//! the scale changes:
//!
//! ```text
//! new_scale = clamp(saved_scale * m)
//! new_t     = F - center - origin * new_scale
//! ```
//!
//! When the pointer count changes mid-gesture, or another recognizer wrote
//! the transform since our last write, the anchor is re-taken from the
//! current transform and the new focal point. The re-anchored formula
//! reproduces the current transform exactly, so the handoff cannot jump.

use super::GestureContext;
use crate::error::{EngineError, EngineResult};
use crate::geometry::{to_content_point, Point};
use crate::transform::{clamp_translate, SharedTransform, Transform};

/// Scratch state of one pinch gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PinchSession {
    saved: Transform,
    base_multiplier: f64,
    origin: Point,
    pointer_count: u8,
    focal: Point,
    multiplier: f64,
    synced_version: u64,
}

impl PinchSession {
    fn anchor(
        focal: Point,
        multiplier: f64,
        pointer_count: u8,
        shared: &SharedTransform,
        center: Point,
    ) -> Self {
        let current = shared.get();
        Self {
            saved: current,
            base_multiplier: multiplier,
            origin: to_content_point(focal, &current, center),
            pointer_count,
            focal,
            multiplier,
            synced_version: shared.version(),
        }
    }
}

/// Pinch recognizer over the shared transform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PinchRecognizer {
    session: Option<PinchSession>,
}

impl PinchRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Content point anchored under the focal point, if pinching.
    pub fn origin(&self) -> Option<Point> {
        self.session.map(|s| s.origin)
    }

    /// Last valid focal point, if pinching.
    pub fn focal(&self) -> Option<Point> {
        self.session.map(|s| s.focal)
    }

    /// Last valid cumulative multiplier, if pinching.
    pub fn multiplier(&self) -> Option<f64> {
        self.session.map(|s| s.multiplier)
    }

    /// Start a pinch at `focal` with a cumulative multiplier of 1.
    pub fn begin(
        &mut self,
        focal: Point,
        pointer_count: u8,
        shared: &SharedTransform,
        ctx: &GestureContext,
    ) -> EngineResult<()> {
        if !focal.is_finite() {
            return Err(EngineError::DegenerateGesture("non-finite pinch focal point"));
        }
        self.session = Some(PinchSession::anchor(
            focal,
            1.0,
            pointer_count,
            shared,
            ctx.center,
        ));
        Ok(())
    }

    /// Apply one pinch frame.
    ///
    /// `multiplier` is cumulative since the gesture began. A non-finite
    /// focal point falls back to the previous one. With `translate_allowed`
    /// false the frame only refreshes the anchor and leaves the transform
    /// untouched (one-finger drag at base scale in a viewer).
    pub fn update(
        &mut self,
        multiplier: f64,
        focal: Point,
        pointer_count: u8,
        translate_allowed: bool,
        shared: &mut SharedTransform,
        ctx: &GestureContext,
    ) -> EngineResult<Transform> {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(EngineError::DegenerateGesture("non-positive pinch multiplier"));
        }

        let mut session = match self.session {
            Some(session) => session,
            None => PinchSession::anchor(focal, multiplier, pointer_count, shared, ctx.center),
        };
        let focal = if focal.is_finite() { focal } else { session.focal };

        if session.pointer_count != pointer_count || session.synced_version != shared.version() {
            session = PinchSession::anchor(focal, multiplier, pointer_count, shared, ctx.center);
        }

        if !translate_allowed {
            session = PinchSession::anchor(focal, multiplier, pointer_count, shared, ctx.center);
            self.session = Some(session);
            return Ok(shared.get());
        }

        let scale = ctx
            .bounds
            .clamp(session.saved.scale * multiplier / session.base_multiplier);
        let raw = focal - ctx.center - session.origin * scale;
        let (tx, ty) = clamp_translate(raw.x, raw.y, scale, &ctx.frame, &ctx.display);
        let next = Transform::new(scale, tx, ty);
        if !next.is_finite() {
            return Err(EngineError::DegenerateGesture("non-finite pinch transform"));
        }

        session.synced_version = shared.write(next);
        session.focal = focal;
        session.multiplier = multiplier;
        self.session = Some(session);
        Ok(next)
    }

    pub fn end(&mut self) {
        self.session = None;
    }
}
