//! Spring animation back to the identity transform.
//!
//! Viewers reset the zoom when the last finger lifts. Each transform
//! component gets its own damped spring toward its identity value. A gesture
//! that starts while the spring runs interrupts it and takes over from the
//! instantaneous values.

use crate::config::EngineConfig;
use crate::transform::Transform;
use serde::{Deserialize, Serialize};

/// Largest integration step, in seconds.
const MAX_SUBSTEP: f64 = 1.0 / 240.0;
/// Frames longer than this (backgrounded tab) are truncated.
const MAX_FRAME: f64 = 0.25;
/// Distance and speed below which a spring counts as settled.
const SETTLE_EPSILON: f64 = 1e-3;

/// Damped harmonic spring with unit mass.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spring {
    position: f64,
    target: f64,
    velocity: f64,
    stiffness: f64,
    damping: f64,
}

impl Spring {
    fn new(position: f64, target: f64, stiffness: f64, damping: f64) -> Self {
        Self {
            position,
            target,
            velocity: 0.0,
            stiffness: stiffness.max(0.0001),
            damping: damping.max(0.0),
        }
    }

    fn critical_damping(stiffness: f64) -> f64 {
        2.0 * stiffness.max(0.0001).sqrt()
    }

    /// Semi-implicit Euler step.
    fn tick(&mut self, dt: f64) {
        let acceleration =
            self.stiffness * (self.target - self.position) - self.damping * self.velocity;
        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
    }

    fn is_settled(&self) -> bool {
        (self.target - self.position).abs() < SETTLE_EPSILON
            && self.velocity.abs() < SETTLE_EPSILON
    }
}

/// Lifecycle of the reset animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimatorState {
    #[default]
    Idle,
    Animating,
    /// A gesture took over before the spring settled.
    Interrupted,
}

/// Spring-driven reset of scale and translation to identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ResetAnimator {
    state: AnimatorState,
    springs: [Spring; 3],
    stiffness: f64,
    damping: f64,
}

impl ResetAnimator {
    pub fn new(config: &EngineConfig) -> Self {
        let stiffness = config.spring_stiffness;
        let damping = config
            .spring_damping
            .unwrap_or_else(|| Spring::critical_damping(stiffness));
        let identity = Transform::identity();
        Self {
            state: AnimatorState::Idle,
            springs: Self::springs_between(&identity, &identity, stiffness, damping),
            stiffness,
            damping,
        }
    }

    fn springs_between(
        from: &Transform,
        to: &Transform,
        stiffness: f64,
        damping: f64,
    ) -> [Spring; 3] {
        [
            Spring::new(from.scale, to.scale, stiffness, damping),
            Spring::new(from.translate_x, to.translate_x, stiffness, damping),
            Spring::new(from.translate_y, to.translate_y, stiffness, damping),
        ]
    }

    #[inline]
    pub fn state(&self) -> AnimatorState {
        self.state
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.state == AnimatorState::Animating
    }

    /// Instantaneous animated transform.
    pub fn current(&self) -> Transform {
        let [s, x, y] = self.springs;
        Transform::new(s.position, x.position, y.position)
    }

    /// Start animating from `from` toward identity.
    ///
    /// Returns `false` (and stays idle) when `from` is already identity.
    pub fn start(&mut self, from: Transform) -> bool {
        let identity = Transform::identity();
        if from.max_delta(&identity) < SETTLE_EPSILON || !from.is_finite() {
            self.state = AnimatorState::Idle;
            return false;
        }
        self.springs = Self::springs_between(&from, &identity, self.stiffness, self.damping);
        self.state = AnimatorState::Animating;
        true
    }

    /// Advance by `dt` seconds.
    ///
    /// Returns the new transform while animating; the final step snaps to
    /// identity and returns the animator to `Idle`. Returns `None` when not
    /// animating.
    pub fn step(&mut self, dt: f64) -> Option<Transform> {
        if self.state != AnimatorState::Animating {
            return None;
        }
        let mut remaining = if dt.is_finite() { dt.max(0.0).min(MAX_FRAME) } else { 0.0 };
        while remaining > 0.0 {
            let h = remaining.min(MAX_SUBSTEP);
            for spring in &mut self.springs {
                spring.tick(h);
            }
            remaining -= h;
        }

        if self.springs.iter().all(Spring::is_settled) {
            self.state = AnimatorState::Idle;
            return Some(Transform::identity());
        }
        Some(self.current())
    }

    /// Stop a running animation, leaving its instantaneous values in place.
    ///
    /// Returns those values when an animation was running.
    pub fn interrupt(&mut self) -> Option<Transform> {
        if self.state != AnimatorState::Animating {
            return None;
        }
        self.state = AnimatorState::Interrupted;
        Some(self.current())
    }
}
