//! WASM bindings for the interactive crop session.
//!
//! `CropSession` wraps the core `EditSession`. The host forwards pointer
//! frames (or recognized pinch/pan phases), edge drags and animation ticks,
//! reads the live transform through getters and renders it.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! const session = new CropSession(img.naturalWidth, img.naturalHeight, 360, 360, { aspectRatio: 1 });
//! session.set_scale_listener((scale) => badge.textContent = `${scale.toFixed(1)}x`);
//!
//! el.addEventListener('touchmove', (e) => {
//!   session.touches(Float64Array.from(localPoints(e.touches)), e.timeStamp);
//!   render(session.scale, session.translate_x, session.translate_y);
//! });
//!
//! const descriptor = session.begin_commit();
//! const cropped = apply_crop_descriptor(original, descriptor);
//! session.end_commit();
//! ```

use crate::types::JsCropDescriptor;
use framecrop_core::{
    ContainerGeometry, Edge, EditSession, EngineConfig, EngineResult, GestureInput, ImageMetadata,
    PanPhase, PinchPhase, Point, Pointers, ScaleObserver,
};
use wasm_bindgen::prelude::*;

/// Forwards throttled scale updates to a JavaScript callback.
struct JsScaleListener {
    callback: js_sys::Function,
}

impl ScaleObserver for JsScaleListener {
    fn scale_changed(&mut self, scale: f64) {
        if let Err(err) = self.callback.call1(&JsValue::NULL, &JsValue::from_f64(scale)) {
            web_sys::console::warn_2(&JsValue::from_str("scale listener threw:"), &err);
        }
    }
}

/// Decode a flat `[x0, y0, x1, y1]` coordinate list into pointers.
///
/// Odd trailing values are ignored; more than two pointers keep the first two.
fn pointers_from_coords(coords: &[f64]) -> Pointers {
    let mut points = [Point::ZERO; 2];
    let mut len = 0;
    for (slot, pair) in points.iter_mut().zip(coords.chunks_exact(2)) {
        *slot = Point::new(pair[0], pair[1]);
        len += 1;
    }
    Pointers::from_slice(&points[..len])
}

/// Interactive crop/zoom session for one image.
#[wasm_bindgen]
pub struct CropSession {
    inner: EditSession,
}

#[wasm_bindgen]
impl CropSession {
    /// Create a session for an image shown in a container.
    ///
    /// `config` is an optional plain object with any of the `EngineConfig`
    /// fields in camelCase (e.g. `{ maxScale: 8, aspectRatio: 1.5 }`).
    #[wasm_bindgen(constructor)]
    pub fn new(
        natural_width: f64,
        natural_height: f64,
        container_width: f64,
        container_height: f64,
        config: JsValue,
    ) -> Result<CropSession, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            EngineConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };
        Self::with_config(
            natural_width,
            natural_height,
            container_width,
            container_height,
            config,
        )
        .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Register a callback receiving the zoom scale, rate-limited.
    pub fn set_scale_listener(&mut self, listener: js_sys::Function) {
        self.inner
            .set_scale_observer(Box::new(JsScaleListener { callback: listener }));
    }

    pub fn clear_scale_listener(&mut self) {
        self.inner.clear_scale_observer();
    }

    /// Raw pointer frame: container-local coordinates as `[x0, y0, x1, y1]`.
    /// An empty array means all fingers lifted.
    pub fn touches(&mut self, coords: &[f64], now_ms: f64) {
        self.inner
            .handle(GestureInput::Touches(pointers_from_coords(coords)), now_ms);
    }

    pub fn pinch_began(&mut self, focal_x: f64, focal_y: f64, pointers: u8, now_ms: f64) {
        let focal = Point::new(focal_x, focal_y);
        self.inner
            .handle(GestureInput::Pinch(PinchPhase::Began { focal, pointers }), now_ms);
    }

    /// `scale` is cumulative since `pinch_began`.
    pub fn pinch_changed(
        &mut self,
        scale: f64,
        focal_x: f64,
        focal_y: f64,
        pointers: u8,
        now_ms: f64,
    ) {
        let focal = Point::new(focal_x, focal_y);
        self.inner.handle(
            GestureInput::Pinch(PinchPhase::Changed {
                scale,
                focal,
                pointers,
            }),
            now_ms,
        );
    }

    pub fn pinch_ended(&mut self, now_ms: f64) {
        self.inner
            .handle(GestureInput::Pinch(PinchPhase::Ended), now_ms);
    }

    pub fn pan_began(&mut self, now_ms: f64) {
        self.inner.handle(GestureInput::Pan(PanPhase::Began), now_ms);
    }

    /// Translation is cumulative since `pan_began`.
    pub fn pan_changed(&mut self, translation_x: f64, translation_y: f64, now_ms: f64) {
        let translation = Point::new(translation_x, translation_y);
        self.inner
            .handle(GestureInput::Pan(PanPhase::Changed { translation }), now_ms);
    }

    pub fn pan_ended(&mut self, now_ms: f64) {
        self.inner.handle(GestureInput::Pan(PanPhase::Ended), now_ms);
    }

    /// Drag a frame edge (`"top"`, `"bottom"`, `"left"` or `"right"`).
    /// Returns whether the frame changed.
    pub fn resize_edge(&mut self, edge: &str, delta: f64) -> Result<bool, JsValue> {
        let edge = Edge::try_from(edge).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(self.inner.resize_edge(edge, delta))
    }

    pub fn lock_aspect(&mut self, ratio: f64) -> Result<(), JsValue> {
        self.inner
            .lock_aspect(ratio)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn unlock_aspect(&mut self) -> Result<(), JsValue> {
        self.inner
            .unlock_aspect()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Advance the reset animation by `dt` seconds. Returns `true` while
    /// the animation produced a frame.
    pub fn step(&mut self, dt: f64, now_ms: f64) -> bool {
        self.inner.step_animation(dt, now_ms).is_some()
    }

    pub fn resize_container(&mut self, width: f64, height: f64) -> Result<(), JsValue> {
        ContainerGeometry::new(width, height)
            .and_then(|container| self.inner.resize_container(container))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn restore(&mut self, descriptor: &JsCropDescriptor) -> Result<(), JsValue> {
        self.inner
            .restore(&descriptor.descriptor())
            .map(|_| ())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Restore from a plain object produced by `JsCropDescriptor.to_object()`.
    pub fn restore_object(&mut self, value: JsValue) -> Result<(), JsValue> {
        let descriptor = JsCropDescriptor::from_object(value)?;
        self.restore(&descriptor)
    }

    /// Resolve the crop and suspend gestures until `end_commit()`.
    pub fn begin_commit(&mut self) -> Result<JsCropDescriptor, JsValue> {
        self.inner
            .begin_commit()
            .map(JsCropDescriptor::from_descriptor)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn end_commit(&mut self) {
        self.inner.end_commit();
    }

    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> f64 {
        self.inner.transform().scale
    }

    #[wasm_bindgen(getter)]
    pub fn translate_x(&self) -> f64 {
        self.inner.transform().translate_x
    }

    #[wasm_bindgen(getter)]
    pub fn translate_y(&self) -> f64 {
        self.inner.transform().translate_y
    }

    #[wasm_bindgen(getter)]
    pub fn frame_width(&self) -> f64 {
        self.inner.frame().width
    }

    #[wasm_bindgen(getter)]
    pub fn frame_height(&self) -> f64 {
        self.inner.frame().height
    }

    /// Width of the cover-fitted image before zoom.
    #[wasm_bindgen(getter)]
    pub fn display_width(&self) -> f64 {
        self.inner.display().display_width
    }

    #[wasm_bindgen(getter)]
    pub fn display_height(&self) -> f64 {
        self.inner.display().display_height
    }

    #[wasm_bindgen(getter)]
    pub fn is_animating(&self) -> bool {
        self.inner.is_animating()
    }
}

impl CropSession {
    pub(crate) fn with_config(
        natural_width: f64,
        natural_height: f64,
        container_width: f64,
        container_height: f64,
        config: EngineConfig,
    ) -> EngineResult<CropSession> {
        let image = ImageMetadata::new(natural_width, natural_height)?;
        let container = ContainerGeometry::new(container_width, container_height)?;
        Ok(CropSession {
            inner: EditSession::new(image, container, config)?,
        })
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_constructor_reads_config_object() {
        let config = js_sys::Object::new();
        js_sys::Reflect::set(&config, &"aspectRatio".into(), &JsValue::from_f64(1.0)).unwrap();
        let s = CropSession::new(2000.0, 1000.0, 300.0, 200.0, config.into()).unwrap();
        assert_eq!(s.frame_width(), s.frame_height());
    }

    #[wasm_bindgen_test]
    fn test_constructor_rejects_bad_geometry() {
        assert!(CropSession::new(0.0, 1000.0, 300.0, 300.0, JsValue::UNDEFINED).is_err());
    }

    #[wasm_bindgen_test]
    fn test_scale_listener_is_called() {
        let mut s = CropSession::new(2000.0, 1000.0, 300.0, 300.0, JsValue::UNDEFINED).unwrap();
        let seen = js_sys::Array::new();
        let push = js_sys::Function::new_with_args("scale", "this.push(scale)").bind(&seen);
        s.set_scale_listener(push);
        s.pinch_began(150.0, 150.0, 2, 0.0);
        s.pinch_changed(2.0, 150.0, 150.0, 2, 100.0);
        s.pinch_ended(200.0);
        assert_eq!(seen.get(seen.length() - 1).as_f64(), Some(2.0));
    }

    #[wasm_bindgen_test]
    fn test_unknown_edge_is_an_error() {
        let mut s = CropSession::new(2000.0, 1000.0, 300.0, 300.0, JsValue::NULL).unwrap();
        assert!(s.resize_edge("middle", 10.0).is_err());
    }
}
