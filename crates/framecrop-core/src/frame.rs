//! Crop frame sizing.
//!
//! The crop frame is centered in the container. Its size is bounded by
//! `[min_width, container_width] x [min_height, container_height]`, and when
//! an aspect ratio is locked `width / height == ratio` holds after every
//! resize.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::geometry::ContainerGeometry;
use serde::{Deserialize, Serialize};

/// Tolerance for bound checks on derived dimensions.
const BOUND_EPSILON: f64 = 1e-9;

/// Size of the crop frame in screen units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropFrame {
    pub width: f64,
    pub height: f64,
}

impl CropFrame {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// Frame edge grabbed by an edge-drag resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    /// Signed size change for a drag delta along this edge's axis.
    ///
    /// Dragging the right or bottom edge outward (positive delta) grows the
    /// frame; the left and top edges grow it with a negative delta.
    #[inline]
    fn signed(self, delta: f64) -> f64 {
        match self {
            Edge::Top | Edge::Left => -delta,
            Edge::Bottom | Edge::Right => delta,
        }
    }

    #[inline]
    fn is_horizontal(self) -> bool {
        matches!(self, Edge::Left | Edge::Right)
    }
}

impl TryFrom<&str> for Edge {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "top" => Ok(Edge::Top),
            "bottom" => Ok(Edge::Bottom),
            "left" => Ok(Edge::Left),
            "right" => Ok(Edge::Right),
            _ => Err(EngineError::InvalidConfig(format!("unknown edge: {value}"))),
        }
    }
}

/// Largest centered rectangle of `ratio` that fits the container.
fn largest_fit(ratio: f64, container: &ContainerGeometry) -> CropFrame {
    let (cw, ch) = (container.container_width, container.container_height);
    if cw / ch > ratio {
        CropFrame::new(ch * ratio, ch)
    } else {
        CropFrame::new(cw, cw / ratio)
    }
}

/// Owns the crop frame size, its minimums and the optional aspect lock.
#[derive(Debug, Clone, PartialEq)]
pub struct CropFrameController {
    frame: CropFrame,
    container: ContainerGeometry,
    min_width: f64,
    min_height: f64,
    locked_ratio: Option<f64>,
    free_min_fraction: f64,
    locked_min_fraction: f64,
}

impl CropFrameController {
    /// Create a controller with the default frame for `container`: the full
    /// container, or the largest centered rectangle of the locked ratio.
    pub fn new(container: ContainerGeometry, config: &EngineConfig) -> Self {
        let mut controller = Self {
            frame: CropFrame::new(container.container_width, container.container_height),
            container,
            min_width: 0.0,
            min_height: 0.0,
            locked_ratio: config.aspect_ratio,
            free_min_fraction: config.min_frame_fraction,
            locked_min_fraction: config.locked_min_fraction,
        };
        controller.reset_frame();
        controller
    }

    #[inline]
    pub fn frame(&self) -> CropFrame {
        self.frame
    }

    #[inline]
    pub fn container(&self) -> ContainerGeometry {
        self.container
    }

    #[inline]
    pub fn min_width(&self) -> f64 {
        self.min_width
    }

    #[inline]
    pub fn min_height(&self) -> f64 {
        self.min_height
    }

    #[inline]
    pub fn locked_ratio(&self) -> Option<f64> {
        self.locked_ratio
    }

    fn derive_minimums(&mut self) {
        match self.locked_ratio {
            Some(ratio) => {
                let reference = largest_fit(ratio, &self.container);
                self.min_width = reference.width * self.locked_min_fraction;
                self.min_height = reference.height * self.locked_min_fraction;
            }
            None => {
                let min = self.container.shorter_side() * self.free_min_fraction;
                self.min_width = min;
                self.min_height = min;
            }
        }
    }

    fn reset_frame(&mut self) {
        self.derive_minimums();
        self.frame = match self.locked_ratio {
            Some(ratio) => largest_fit(ratio, &self.container),
            None => CropFrame::new(
                self.container.container_width,
                self.container.container_height,
            ),
        };
    }

    #[inline]
    fn width_in_bounds(&self, width: f64) -> bool {
        width >= self.min_width - BOUND_EPSILON
            && width <= self.container.container_width + BOUND_EPSILON
    }

    #[inline]
    fn height_in_bounds(&self, height: f64) -> bool {
        height >= self.min_height - BOUND_EPSILON
            && height <= self.container.container_height + BOUND_EPSILON
    }

    #[inline]
    fn clamp_width(&self, width: f64) -> f64 {
        width
            .max(self.min_width)
            .min(self.container.container_width)
    }

    #[inline]
    fn clamp_height(&self, height: f64) -> f64 {
        height
            .max(self.min_height)
            .min(self.container.container_height)
    }

    /// Resize the frame by dragging one edge.
    ///
    /// The frame stays centered in the container; the dragged axis changes
    /// by `delta` and both of its edges move by half of it.
    ///
    /// # Arguments
    ///
    /// * `edge` - The edge being dragged
    /// * `delta` - Drag distance in container pixels since the last tick.
    ///   Positive grows the frame through `Right`/`Bottom` and shrinks it
    ///   through `Left`/`Top`.
    ///
    /// # Returns
    ///
    /// `true` when the frame changed. Free axes are clamped to
    /// `[min, container]`. With a locked aspect ratio the other axis follows
    /// the ratio, and the tick is rejected (returning `false`) when the
    /// derived dimension would leave its bounds. Zero and non-finite deltas
    /// are ignored.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // Pull the right edge 20 px inward
    /// assert!(ctl.resize_edge(Edge::Right, -20.0));
    /// assert_eq!(ctl.frame().width, 280.0);
    /// ```
    pub fn resize_edge(&mut self, edge: Edge, delta: f64) -> bool {
        if !delta.is_finite() || delta == 0.0 {
            return false;
        }
        let change = edge.signed(delta);

        let next = match (self.locked_ratio, edge.is_horizontal()) {
            (None, true) => CropFrame::new(
                self.clamp_width(self.frame.width + change),
                self.frame.height,
            ),
            (None, false) => CropFrame::new(
                self.frame.width,
                self.clamp_height(self.frame.height + change),
            ),
            (Some(ratio), true) => {
                let width = self.clamp_width(self.frame.width + change);
                let height = width / ratio;
                if !self.height_in_bounds(height) {
                    tracing::trace!(?edge, height, "locked resize rejected");
                    return false;
                }
                CropFrame::new(width, height)
            }
            (Some(ratio), false) => {
                let height = self.clamp_height(self.frame.height + change);
                let width = height * ratio;
                if !self.width_in_bounds(width) {
                    tracing::trace!(?edge, width, "locked resize rejected");
                    return false;
                }
                CropFrame::new(width, height)
            }
        };

        let changed = next != self.frame;
        self.frame = next;
        changed
    }

    /// Set the frame size directly, clamping to bounds and honoring the lock.
    pub fn set_size(&mut self, width: f64, height: f64) {
        if !(width.is_finite() && height.is_finite()) {
            return;
        }
        self.frame = match self.locked_ratio {
            Some(ratio) => {
                let w = self.clamp_width(width);
                let h = w / ratio;
                if self.height_in_bounds(h) {
                    CropFrame::new(w, h)
                } else {
                    let h = self.clamp_height(height);
                    CropFrame::new(h * ratio, h)
                }
            }
            None => CropFrame::new(self.clamp_width(width), self.clamp_height(height)),
        };
    }

    /// Lock the frame to `ratio`, keeping the current width when possible.
    pub fn lock_aspect(&mut self, ratio: f64) -> EngineResult<()> {
        if !(ratio.is_finite() && ratio > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "aspect_ratio must be positive, got {ratio}"
            )));
        }
        self.locked_ratio = Some(ratio);
        self.derive_minimums();

        let from_width = CropFrame::new(self.frame.width, self.frame.width / ratio);
        let from_height = CropFrame::new(self.frame.height * ratio, self.frame.height);
        self.frame = [from_width, from_height]
            .into_iter()
            .find(|f| self.width_in_bounds(f.width) && self.height_in_bounds(f.height))
            .unwrap_or_else(|| largest_fit(ratio, &self.container));
        Ok(())
    }

    /// Release the aspect lock. The frame keeps its size.
    pub fn unlock_aspect(&mut self) {
        self.locked_ratio = None;
        self.derive_minimums();
        self.frame = CropFrame::new(
            self.clamp_width(self.frame.width),
            self.clamp_height(self.frame.height),
        );
    }

    /// Re-fit to a new container (e.g. rotation).
    ///
    /// Minimums are re-derived for the new container; the aspect lock is
    /// kept and the frame returns to its default.
    pub fn refit(&mut self, container: ContainerGeometry) {
        self.container = container;
        self.reset_frame();
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn edge_strategy() -> impl Strategy<Value = Edge> {
        prop_oneof![
            Just(Edge::Top),
            Just(Edge::Bottom),
            Just(Edge::Left),
            Just(Edge::Right),
        ]
    }

    proptest! {
        /// Property: a locked frame keeps its ratio through any drag sequence.
        #[test]
        fn prop_aspect_lock_holds(
            ratio in 0.3f64..3.0,
            drags in proptest::collection::vec((edge_strategy(), -200.0f64..200.0), 1..40),
        ) {
            let config = EngineConfig {
                aspect_ratio: Some(ratio),
                ..EngineConfig::default()
            };
            let mut ctl = CropFrameController::new(
                ContainerGeometry::new(360.0, 480.0).unwrap(),
                &config,
            );
            for (edge, delta) in drags {
                ctl.resize_edge(edge, delta);
                prop_assert!((ctl.frame().ratio() - ratio).abs() < 1e-6);
            }
        }

        /// Property: frame size never leaves its bounds.
        #[test]
        fn prop_frame_within_bounds(
            drags in proptest::collection::vec((edge_strategy(), -300.0f64..300.0), 1..40),
        ) {
            let mut ctl = CropFrameController::new(
                ContainerGeometry::new(360.0, 480.0).unwrap(),
                &EngineConfig::default(),
            );
            for (edge, delta) in drags {
                ctl.resize_edge(edge, delta);
                let f = ctl.frame();
                prop_assert!(f.width >= ctl.min_width() - 1e-9 && f.width <= 360.0 + 1e-9);
                prop_assert!(f.height >= ctl.min_height() - 1e-9 && f.height <= 480.0 + 1e-9);
            }
        }
    }
}
