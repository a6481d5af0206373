//! Touch-driven transform updates.
//!
//! The coordinator accepts two kinds of input:
//!
//! - **Raw pointer frames**: 0-2 container-local pointers per frame. The
//!   coordinator groups them itself: two pointers pinch about their midpoint
//!   with `m = distance / start_distance`, one pointer pans anchored under
//!   the finger.
//! - **Recognized phases**: pinch and pan phases from a platform gesture
//!   recognizer that already grouped the touches. Pinch and pan run
//!   simultaneously over the shared transform.
//!
//! # States
//!
//! ```text
//! Idle -> Pinching | Panning
//! Pinching <-> Panning   (pointer count changes)
//! *        -> Idle       (all touches released)
//! ```
//!
//! Every update is allocation-free and touches only `Copy` state.

mod pan;
mod pinch;

pub use pan::PanRecognizer;
pub use pinch::PinchRecognizer;

use crate::error::EngineResult;
use crate::frame::CropFrame;
use crate::geometry::{FittedDisplay, Point};
use crate::transform::{ScaleBounds, SharedTransform, Transform};
use serde::{Deserialize, Serialize};

/// Pointer spread below which a two-finger frame is treated as degenerate.
const MIN_SPREAD: f64 = 1e-6;

/// Geometry the recognizers need for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureContext {
    /// Container center in screen space.
    pub center: Point,
    pub frame: CropFrame,
    pub display: FittedDisplay,
    pub bounds: ScaleBounds,
    pub pan_at_base_scale: bool,
}

/// Up to two active pointers, stored inline.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pointers {
    points: [Point; 2],
    len: u8,
}

impl Pointers {
    pub const NONE: Pointers = Pointers {
        points: [Point::ZERO; 2],
        len: 0,
    };

    pub fn one(p: Point) -> Self {
        Self {
            points: [p, Point::ZERO],
            len: 1,
        }
    }

    pub fn two(a: Point, b: Point) -> Self {
        Self {
            points: [a, b],
            len: 2,
        }
    }

    /// Take the first two pointers of a slice; extra fingers are ignored.
    pub fn from_slice(points: &[Point]) -> Self {
        match points {
            [] => Self::NONE,
            [p] => Self::one(*p),
            [a, b, ..] => Self::two(*a, *b),
        }
    }

    #[inline]
    pub fn len(&self) -> u8 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Centroid of the active pointers.
    pub fn focal(&self) -> Option<Point> {
        match self.len {
            1 => Some(self.points[0]),
            2 => Some(self.points[0].midpoint(self.points[1])),
            _ => None,
        }
    }

    /// Distance between two pointers, if two are active.
    pub fn spread(&self) -> Option<f64> {
        (self.len == 2).then(|| self.points[0].distance(self.points[1]))
    }
}

/// Pinch phase from a platform recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PinchPhase {
    Began { focal: Point, pointers: u8 },
    /// `scale` is cumulative since the pinch began.
    Changed { scale: f64, focal: Point, pointers: u8 },
    Ended,
}

/// Pan phase from a platform recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PanPhase {
    Began,
    /// `translation` is cumulative since the pan began.
    Changed { translation: Point },
    Ended,
}

/// One frame of gesture input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureInput {
    Touches(Pointers),
    Pinch(PinchPhase),
    Pan(PanPhase),
}

impl GestureInput {
    /// Whether this input lifts fingers rather than starting or moving them.
    pub fn is_release(&self) -> bool {
        matches!(
            self,
            GestureInput::Touches(Pointers { len: 0, .. })
                | GestureInput::Pinch(PinchPhase::Ended)
                | GestureInput::Pan(PanPhase::Ended)
        )
    }
}

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GestureState {
    #[default]
    Idle,
    Pinching,
    Panning,
}

/// Result of one coordinator frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureStep {
    /// Live transform to render.
    pub transform: Transform,
    /// All touches were released on this frame.
    pub released: bool,
}

/// Raw-pointer grouping state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct RawTouches {
    count: u8,
    base_spread: f64,
    multiplier: f64,
}

/// Routes gesture input to the pinch and pan recognizers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureCoordinator {
    pinch: PinchRecognizer,
    pan: PanRecognizer,
    raw: RawTouches,
    state: GestureState,
}

impl GestureCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> GestureState {
        self.state
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state == GestureState::Idle
    }

    pub fn pinch(&self) -> &PinchRecognizer {
        &self.pinch
    }

    /// Drop all gesture state without touching the transform.
    pub fn cancel(&mut self) {
        self.pinch.end();
        self.pan.end();
        self.raw = RawTouches::default();
        self.state = GestureState::Idle;
    }

    /// Process one frame of input.
    ///
    /// Degenerate frames are dropped here: the last valid transform is kept
    /// and the error is only traced.
    pub fn handle(
        &mut self,
        input: GestureInput,
        shared: &mut SharedTransform,
        ctx: &GestureContext,
    ) -> GestureStep {
        let was_idle = self.is_idle();
        let result = match input {
            GestureInput::Touches(pointers) => self.touches(pointers, shared, ctx),
            GestureInput::Pinch(phase) => self.pinch_phase(phase, shared, ctx),
            GestureInput::Pan(phase) => self.pan_phase(phase, shared, ctx),
        };
        if let Err(err) = result {
            tracing::trace!(%err, "gesture frame ignored");
        }
        self.refresh_state();

        GestureStep {
            transform: shared.get(),
            released: !was_idle && self.is_idle(),
        }
    }

    fn refresh_state(&mut self) {
        self.state = if self.pinch.is_active() && self.raw.count != 1 {
            GestureState::Pinching
        } else if self.pinch.is_active() || self.pan.is_active() {
            GestureState::Panning
        } else {
            GestureState::Idle
        };
    }

    fn touches(
        &mut self,
        pointers: Pointers,
        shared: &mut SharedTransform,
        ctx: &GestureContext,
    ) -> EngineResult<()> {
        let count = pointers.len();
        let Some(focal) = pointers.focal() else {
            self.pinch.end();
            self.raw = RawTouches::default();
            return Ok(());
        };

        let spread = pointers.spread();
        let degenerate = spread.is_some_and(|d| !(d.is_finite() && d > MIN_SPREAD));

        if self.raw.count == 0 || !self.pinch.is_active() {
            self.raw = RawTouches {
                count,
                base_spread: spread.unwrap_or(0.0),
                multiplier: 1.0,
            };
            if degenerate {
                self.raw.base_spread = 0.0;
            }
            return self.pinch.begin(focal, count, shared, ctx);
        }

        if count != self.raw.count {
            // New grouping: the spread restarts, the multiplier continues
            self.raw.count = count;
            self.raw.base_spread = spread.unwrap_or(0.0) / self.raw.multiplier;
        }

        let focal = if degenerate {
            self.pinch.focal().unwrap_or(focal)
        } else {
            focal
        };

        let multiplier = match spread {
            Some(d) if !degenerate && self.raw.base_spread > MIN_SPREAD => {
                d / self.raw.base_spread
            }
            Some(d) if !degenerate => {
                // Pinch began degenerate: take this spread as the baseline
                self.raw.base_spread = d / self.raw.multiplier;
                self.raw.multiplier
            }
            _ => self.raw.multiplier,
        };

        let scale = shared.get().scale;
        let translate_allowed = count == 2 || ctx.pan_at_base_scale || scale > 1.0 + 1e-6;
        self.pinch
            .update(multiplier, focal, count, translate_allowed, shared, ctx)?;
        self.raw.multiplier = multiplier;
        Ok(())
    }

    fn pinch_phase(
        &mut self,
        phase: PinchPhase,
        shared: &mut SharedTransform,
        ctx: &GestureContext,
    ) -> EngineResult<()> {
        match phase {
            PinchPhase::Began { focal, pointers } => {
                self.pinch.begin(focal, pointers, shared, ctx)
            }
            PinchPhase::Changed {
                scale,
                focal,
                pointers,
            } => self
                .pinch
                .update(scale, focal, pointers, true, shared, ctx)
                .map(|_| ()),
            PinchPhase::Ended => {
                self.pinch.end();
                Ok(())
            }
        }
    }

    fn pan_phase(
        &mut self,
        phase: PanPhase,
        shared: &mut SharedTransform,
        ctx: &GestureContext,
    ) -> EngineResult<()> {
        match phase {
            PanPhase::Began => {
                self.pan.begin(shared);
                Ok(())
            }
            PanPhase::Changed { translation } => {
                self.pan.update(translation, shared, ctx).map(|_| ())
            }
            PanPhase::Ended => {
                self.pan.end();
                Ok(())
            }
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::geometry::to_screen_point;
    use proptest::prelude::*;

    fn context(frame: CropFrame) -> GestureContext {
        let display = FittedDisplay {
            display_width: 600.0,
            display_height: 300.0,
            fitted_scale: 0.3,
        };
        GestureContext {
            center: Point::new(150.0, 150.0),
            frame,
            display,
            bounds: ScaleBounds::new(1.0, 5.0, &frame, &display),
            pan_at_base_scale: true,
        }
    }

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-50.0f64..350.0, -50.0f64..350.0).prop_map(|(x, y)| Point::new(x, y))
    }

    fn input_strategy() -> impl Strategy<Value = GestureInput> {
        prop_oneof![
            proptest::collection::vec(point_strategy(), 0..3)
                .prop_map(|points| GestureInput::Touches(Pointers::from_slice(&points))),
            (point_strategy(), 1u8..=2).prop_map(|(focal, pointers)| {
                GestureInput::Pinch(PinchPhase::Began { focal, pointers })
            }),
            (0.2f64..6.0, point_strategy(), 1u8..=2).prop_map(|(scale, focal, pointers)| {
                GestureInput::Pinch(PinchPhase::Changed {
                    scale,
                    focal,
                    pointers,
                })
            }),
            Just(GestureInput::Pinch(PinchPhase::Ended)),
            Just(GestureInput::Pan(PanPhase::Began)),
            point_strategy().prop_map(|translation| {
                GestureInput::Pan(PanPhase::Changed { translation })
            }),
            Just(GestureInput::Pan(PanPhase::Ended)),
        ]
    }

    proptest! {
        /// Property: whatever the gesture sequence, the image covers the frame.
        #[test]
        fn prop_bounds_invariant(
            fw in 105.0f64..=300.0,
            fh in 105.0f64..=300.0,
            inputs in proptest::collection::vec(input_strategy(), 1..60),
        ) {
            let ctx = context(CropFrame::new(fw, fh));
            let mut shared = SharedTransform::default();
            let mut coord = GestureCoordinator::new();

            for input in inputs {
                let t = coord.handle(input, &mut shared, &ctx).transform;
                prop_assert!(t.is_finite());
                prop_assert!(t.scale >= 1.0 - 1e-12 && t.scale <= 5.0 + 1e-12);
                let half_w = ctx.display.display_width * t.scale * 0.5;
                let half_h = ctx.display.display_height * t.scale * 0.5;
                prop_assert!(t.translate_x.abs() <= half_w - fw * 0.5 + 1e-9);
                prop_assert!(t.translate_y.abs() <= half_h - fh * 0.5 + 1e-9);
            }
        }

        /// Property: the anchored content point tracks the focal point.
        #[test]
        fn prop_focal_invariance(
            sx in -20.0f64..20.0,
            sy in -20.0f64..20.0,
            samples in proptest::collection::vec(
                (-20.0f64..20.0, -20.0f64..20.0, 0.5f64..6.0),
                1..30,
            ),
        ) {
            let ctx = context(CropFrame::new(100.0, 100.0));
            let mut shared = SharedTransform::default();
            let mut coord = GestureCoordinator::new();
            let start = Point::new(150.0 + sx, 150.0 + sy);

            coord.handle(
                GestureInput::Pinch(PinchPhase::Began { focal: start, pointers: 2 }),
                &mut shared,
                &ctx,
            );
            let origin = coord.pinch().origin().unwrap();

            for (dx, dy, scale) in samples {
                let focal = Point::new(150.0 + dx, 150.0 + dy);
                let t = coord
                    .handle(
                        GestureInput::Pinch(PinchPhase::Changed { scale, focal, pointers: 2 }),
                        &mut shared,
                        &ctx,
                    )
                    .transform;
                let on_screen = to_screen_point(origin, &t, ctx.center);
                prop_assert!((on_screen.x - focal.x).abs() < 1e-6);
                prop_assert!((on_screen.y - focal.y).abs() < 1e-6);
            }
        }

        /// Property: lifting a finger never moves the image.
        #[test]
        fn prop_handoff_continuity(
            a in point_strategy(),
            b in point_strategy(),
            moves in proptest::collection::vec((-30.0f64..30.0, -30.0f64..30.0), 1..10),
        ) {
            let ctx = context(CropFrame::new(200.0, 200.0));
            let mut shared = SharedTransform::default();
            let mut coord = GestureCoordinator::new();
            let (mut a, mut b) = (a, b);

            coord.handle(GestureInput::Touches(Pointers::two(a, b)), &mut shared, &ctx);
            for (dx, dy) in moves {
                a = Point::new(a.x - dx, a.y - dy);
                b = Point::new(b.x + dx, b.y + dy);
                coord.handle(GestureInput::Touches(Pointers::two(a, b)), &mut shared, &ctx);
            }
            let last_two = shared.get();
            let first_one = coord
                .handle(GestureInput::Touches(Pointers::one(a)), &mut shared, &ctx)
                .transform;
            prop_assert!(last_two.max_delta(&first_one) < 1e-6);
        }
    }
}
