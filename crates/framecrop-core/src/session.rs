//! One crop/zoom edit session.
//!
//! [`EditSession`] is the single owner of all per-session state: geometry,
//! the shared transform, the gesture coordinator, the crop frame, the reset
//! animation and the scale throttle. Hosts drive it with gesture frames,
//! edge drags and animation ticks, and commit it into a [`CropDescriptor`].

use crate::animate::{AnimatorState, ResetAnimator};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::frame::{CropFrame, CropFrameController, Edge};
use crate::geometry::{ContainerGeometry, FittedDisplay, ImageMetadata};
use crate::gesture::{GestureContext, GestureCoordinator, GestureInput, GestureState};
use crate::raster::{crop_to_descriptor, RasterCrop};
use crate::resolve::{self, CropDescriptor};
use crate::throttle::ScaleThrottle;
use crate::transform::{clamped, ScaleBounds, SharedTransform, Transform};
use std::fmt;

/// Receives throttled scale updates.
pub trait ScaleObserver {
    fn scale_changed(&mut self, scale: f64);
}

impl<F: FnMut(f64)> ScaleObserver for F {
    fn scale_changed(&mut self, scale: f64) {
        self(scale)
    }
}

/// Interactive crop/zoom state for one image.
pub struct EditSession {
    config: EngineConfig,
    image: ImageMetadata,
    display: FittedDisplay,
    frame: CropFrameController,
    shared: SharedTransform,
    gestures: GestureCoordinator,
    animator: ResetAnimator,
    throttle: ScaleThrottle,
    observer: Option<Box<dyn ScaleObserver>>,
    committing: bool,
    last_now_ms: f64,
}

impl fmt::Debug for EditSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("image", &self.image)
            .field("container", &self.frame.container())
            .field("frame", &self.frame.frame())
            .field("transform", &self.shared.get())
            .field("gesture_state", &self.gestures.state())
            .field("animator_state", &self.animator.state())
            .field("committing", &self.committing)
            .finish()
    }
}

impl EditSession {
    /// Start a session with the default frame and the identity transform.
    ///
    /// # Arguments
    ///
    /// * `image` - Natural pixel size of the image being edited
    /// * `container` - Size of the view the image is shown in
    /// * `config` - Scale limits, frame minimums, aspect lock, reset and
    ///   notification settings
    ///
    /// # Returns
    ///
    /// A session whose image covers the container at scale 1 with the frame
    /// filling the container (or the largest rectangle of the locked ratio).
    ///
    /// # Errors
    ///
    /// `InvalidContainerGeometry` when the image or container has a zero,
    /// negative or non-finite dimension, and `InvalidConfig` when the
    /// configuration is inconsistent.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut session = EditSession::new(
    ///     ImageMetadata::new(4000.0, 3000.0)?,
    ///     ContainerGeometry::new(390.0, 600.0)?,
    ///     EngineConfig::crop_editor(),
    /// )?;
    /// session.handle(input, now_ms);
    /// let descriptor = session.begin_commit()?;
    /// ```
    pub fn new(
        image: ImageMetadata,
        container: ContainerGeometry,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        config.validate()?;
        // Re-validate: the fields are public and may have been built by hand
        let image = ImageMetadata::new(image.natural_width, image.natural_height)?;
        let container =
            ContainerGeometry::new(container.container_width, container.container_height)?;

        let display = FittedDisplay::cover(&image, &container);
        let frame = CropFrameController::new(container, &config);
        let fitted_scale = display.fitted_scale;
        tracing::info!(
            width = image.natural_width,
            height = image.natural_height,
            fitted_scale,
            "edit session started"
        );

        Ok(Self {
            animator: ResetAnimator::new(&config),
            throttle: ScaleThrottle::new(config.notify_interval_ms),
            config,
            image,
            display,
            frame,
            shared: SharedTransform::default(),
            gestures: GestureCoordinator::new(),
            observer: None,
            committing: false,
            last_now_ms: 0.0,
        })
    }

    /// Start from a previously committed crop.
    pub fn with_descriptor(mut self, descriptor: &CropDescriptor) -> EngineResult<Self> {
        self.restore(descriptor)?;
        Ok(self)
    }

    pub fn set_scale_observer(&mut self, observer: Box<dyn ScaleObserver>) {
        self.observer = Some(observer);
    }

    pub fn clear_scale_observer(&mut self) {
        self.observer = None;
    }

    #[inline]
    pub fn transform(&self) -> Transform {
        self.shared.get()
    }

    #[inline]
    pub fn frame(&self) -> CropFrame {
        self.frame.frame()
    }

    pub fn frame_controller(&self) -> &CropFrameController {
        &self.frame
    }

    #[inline]
    pub fn display(&self) -> FittedDisplay {
        self.display
    }

    #[inline]
    pub fn image(&self) -> ImageMetadata {
        self.image
    }

    #[inline]
    pub fn container(&self) -> ContainerGeometry {
        self.frame.container()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn gesture_state(&self) -> GestureState {
        self.gestures.state()
    }

    #[inline]
    pub fn animator_state(&self) -> AnimatorState {
        self.animator.state()
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    #[inline]
    pub fn is_committing(&self) -> bool {
        self.committing
    }

    fn bounds(&self) -> ScaleBounds {
        ScaleBounds::new(
            self.config.min_scale,
            self.config.max_scale,
            &self.frame.frame(),
            &self.display,
        )
    }

    fn context(&self) -> GestureContext {
        GestureContext {
            center: self.frame.container().center(),
            frame: self.frame.frame(),
            display: self.display,
            bounds: self.bounds(),
            pan_at_base_scale: self.config.pan_at_base_scale,
        }
    }

    /// Pass the latest scale through the throttle to the observer.
    fn notify(&mut self, now_ms: f64, force: bool) {
        self.throttle.record(self.shared.get().scale);
        let scale = if force {
            self.throttle.flush(now_ms)
        } else {
            self.throttle.poll(now_ms)
        };
        if let (Some(scale), Some(observer)) = (scale, self.observer.as_mut()) {
            observer.scale_changed(scale);
        }
    }

    /// Re-apply bounds after the frame or scale limits changed.
    fn reclamp(&mut self) {
        let current = self.shared.get();
        let next = clamped(
            current.scale,
            current.translate_x,
            current.translate_y,
            &self.bounds(),
            &self.frame.frame(),
            &self.display,
        );
        if next != current {
            self.shared.write(next);
        }
    }

    /// Process one frame of gesture input at host time `now_ms`.
    ///
    /// Input is ignored while a commit is in progress. Any touch preempts a
    /// running reset animation; releasing all touches starts one when
    /// `auto_reset` is on.
    pub fn handle(&mut self, input: GestureInput, now_ms: f64) -> Transform {
        self.last_now_ms = now_ms;
        if self.committing {
            tracing::trace!("gesture ignored during commit");
            return self.shared.get();
        }
        if !input.is_release() && self.animator.interrupt().is_some() {
            tracing::debug!("reset animation interrupted");
        }

        let ctx = self.context();
        let step = self.gestures.handle(input, &mut self.shared, &ctx);

        if step.released {
            if self.config.auto_reset && self.animator.start(step.transform) {
                tracing::debug!(scale = step.transform.scale, "reset animation started");
            }
            self.notify(now_ms, true);
        } else {
            self.notify(now_ms, false);
        }
        self.shared.get()
    }

    /// Advance the reset animation by `dt` seconds.
    ///
    /// Returns the animated transform, or `None` when nothing is animating.
    pub fn step_animation(&mut self, dt: f64, now_ms: f64) -> Option<Transform> {
        self.last_now_ms = now_ms;
        let animated = self.animator.step(dt)?;
        let next = clamped(
            animated.scale,
            animated.translate_x,
            animated.translate_y,
            &self.bounds(),
            &self.frame.frame(),
            &self.display,
        );
        self.shared.write(next);
        let settled = !self.animator.is_animating();
        self.notify(now_ms, settled);
        Some(next)
    }

    /// Drag one frame edge by `delta` container pixels.
    ///
    /// Returns `true` when the frame changed.
    pub fn resize_edge(&mut self, edge: Edge, delta: f64) -> bool {
        if self.committing {
            return false;
        }
        let changed = self.frame.resize_edge(edge, delta);
        if changed {
            self.reclamp();
        }
        changed
    }

    fn ensure_not_committing(&self) -> EngineResult<()> {
        if self.committing {
            return Err(EngineError::CommitInProgress);
        }
        Ok(())
    }

    pub fn lock_aspect(&mut self, ratio: f64) -> EngineResult<()> {
        self.ensure_not_committing()?;
        self.frame.lock_aspect(ratio)?;
        self.reclamp();
        Ok(())
    }

    pub fn unlock_aspect(&mut self) -> EngineResult<()> {
        self.ensure_not_committing()?;
        self.frame.unlock_aspect();
        self.reclamp();
        Ok(())
    }

    /// Replace the live crop with `descriptor`.
    pub fn restore(&mut self, descriptor: &CropDescriptor) -> EngineResult<Transform> {
        self.ensure_not_committing()?;
        self.animator.interrupt();
        self.gestures.cancel();
        let restored = resolve::restore(
            descriptor,
            &mut self.frame,
            &self.display,
            &self.image,
            self.config.min_scale,
            self.config.max_scale,
        )?;
        self.shared.write(restored);
        self.notify(self.last_now_ms, true);
        tracing::debug!(?restored, "crop restored");
        Ok(restored)
    }

    /// Re-fit to a new container size (e.g. device rotation).
    ///
    /// The current crop is carried over: minimums are re-derived for the new
    /// container, the aspect lock is kept and the same image region is
    /// restored as closely as the new container allows.
    pub fn resize_container(&mut self, container: ContainerGeometry) -> EngineResult<()> {
        self.ensure_not_committing()?;
        let container =
            ContainerGeometry::new(container.container_width, container.container_height)?;
        let carried = resolve::resolve(&self.shared.get(), &self.frame, &self.display, &self.image);

        self.animator.interrupt();
        self.gestures.cancel();
        self.frame.refit(container);
        self.display = FittedDisplay::cover(&self.image, &container);
        tracing::info!(
            width = container.container_width,
            height = container.container_height,
            "container re-fit"
        );

        match carried {
            Ok(descriptor) => {
                self.restore(&descriptor)?;
            }
            Err(err) => {
                tracing::debug!(%err, "crop not carried over re-fit");
                self.shared.write(Transform::identity());
                self.notify(self.last_now_ms, true);
            }
        }
        Ok(())
    }

    /// Resolve the current crop and suspend gesture input.
    ///
    /// On failure the session stays interactive and nothing should be
    /// rasterized.
    pub fn begin_commit(&mut self) -> EngineResult<CropDescriptor> {
        self.ensure_not_committing()?;
        self.animator.interrupt();
        self.gestures.cancel();
        let descriptor =
            resolve::resolve(&self.shared.get(), &self.frame, &self.display, &self.image)?;
        self.committing = true;
        tracing::info!(
            x = descriptor.x,
            y = descriptor.y,
            width = descriptor.width,
            height = descriptor.height,
            zoom = descriptor.zoom,
            "crop committed"
        );
        Ok(descriptor)
    }

    /// Resume gesture input after a commit.
    pub fn end_commit(&mut self) {
        self.committing = false;
    }

    /// Commit and crop `raster` in one go.
    ///
    /// Gestures are suspended for the duration of the raster call and
    /// resumed afterwards, whether or not it succeeded.
    pub fn commit_with<R: RasterCrop>(
        &mut self,
        raster: &R,
    ) -> EngineResult<(CropDescriptor, R::Output)> {
        let descriptor = self.begin_commit()?;
        let cropped = crop_to_descriptor(raster, &descriptor);
        self.end_commit();
        Ok((descriptor, cropped?))
    }
}
