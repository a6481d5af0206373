//! Engine configuration.
//!
//! The host passes configuration once per edit session. Every field has a
//! default, so a partial object coming from JavaScript deserializes cleanly.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Configuration for one edit session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Lower zoom bound (relative to the cover fit).
    pub min_scale: f64,
    /// Upper zoom bound (relative to the cover fit).
    pub max_scale: f64,
    /// Allow one-finger panning while the image sits at its base scale.
    /// The crop editor needs this to choose a region of a cover-fitted
    /// image; media viewers only pan once zoomed in.
    pub pan_at_base_scale: bool,
    /// Animate back to identity when all touches are released.
    pub auto_reset: bool,
    /// Lock the crop frame to this width/height ratio.
    pub aspect_ratio: Option<f64>,
    /// Minimum crop frame size as a fraction of the container's shorter side
    /// when the aspect ratio is free.
    pub min_frame_fraction: f64,
    /// Minimum crop frame size as a fraction of the locked frame's
    /// dimensions when the aspect ratio is locked.
    pub locked_min_fraction: f64,
    /// Reset spring stiffness.
    pub spring_stiffness: f64,
    /// Reset spring damping. `None` selects critical damping.
    pub spring_damping: Option<f64>,
    /// Minimum time between scale notifications to the host, in milliseconds.
    pub notify_interval_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::crop_editor()
    }
}

impl EngineConfig {
    /// Settings for the crop modal: pannable at base scale, no reset.
    pub fn crop_editor() -> Self {
        Self {
            min_scale: 1.0,
            max_scale: 5.0,
            pan_at_base_scale: true,
            auto_reset: false,
            aspect_ratio: None,
            min_frame_fraction: 0.35,
            locked_min_fraction: 0.5,
            spring_stiffness: 170.0,
            spring_damping: None,
            notify_interval_ms: 32.0,
        }
    }

    /// Settings for pinch/pan media viewers: pan only when zoomed, spring
    /// back to identity on release.
    pub fn viewer() -> Self {
        Self {
            pan_at_base_scale: false,
            auto_reset: true,
            ..Self::crop_editor()
        }
    }

    /// Check that the configuration is internally consistent.
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "min_scale must be positive, got {}",
                self.min_scale
            )));
        }
        if !(self.max_scale.is_finite() && self.max_scale >= self.min_scale) {
            return Err(EngineError::InvalidConfig(format!(
                "max_scale {} must be at least min_scale {}",
                self.max_scale, self.min_scale
            )));
        }
        if let Some(ratio) = self.aspect_ratio {
            if !(ratio.is_finite() && ratio > 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "aspect_ratio must be positive, got {ratio}"
                )));
            }
        }
        for (name, value) in [
            ("min_frame_fraction", self.min_frame_fraction),
            ("locked_min_fraction", self.locked_min_fraction),
        ] {
            if !(value.is_finite() && value > 0.0 && value <= 1.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        if !(self.spring_stiffness.is_finite() && self.spring_stiffness > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "spring_stiffness must be positive, got {}",
                self.spring_stiffness
            )));
        }
        if let Some(damping) = self.spring_damping {
            if !(damping.is_finite() && damping >= 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "spring_damping must be non-negative, got {damping}"
                )));
            }
        }
        if !(self.notify_interval_ms.is_finite() && self.notify_interval_ms >= 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "notify_interval_ms must be non-negative, got {}",
                self.notify_interval_ms
            )));
        }
        Ok(())
    }
}
