//! WASM-compatible wrapper types for image data and crop results.
//!
//! These types wrap the core framecrop types and handle the conversion
//! between Rust and JavaScript data representations.

use framecrop_core::{CropDescriptor, EngineResult, RgbPixels};
use wasm_bindgen::prelude::*;

/// A decoded RGB image handed over from JavaScript.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. `pixels()` copies it out to a
/// `Uint8Array`; keep the image on the WASM side when you can.
#[wasm_bindgen]
pub struct JsDecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsDecodedImage {
    /// Create a new image from dimensions and RGB pixel data
    /// (3 bytes per pixel, row-major order).
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsDecodedImage {
        JsDecodedImage {
            width,
            height,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 3)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGB pixel data as Uint8Array. This copies the buffer.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory. Optional; the finalizer also does it.
    pub fn free(self) {}
}

impl JsDecodedImage {
    /// Copy into the core pixel type, checking the buffer length.
    pub(crate) fn to_pixels(&self) -> EngineResult<RgbPixels> {
        RgbPixels::new(self.width, self.height, self.pixels.clone())
    }

    pub(crate) fn from_pixels(img: RgbPixels) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }
}

/// Committed crop region in natural image pixels.
///
/// Persist it with `to_object()` and bring it back with
/// `CropSession.restore_object()`, or keep the instance around and pass it
/// to `CropSession.restore()` / `apply_crop_descriptor()` directly.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsCropDescriptor {
    inner: CropDescriptor,
}

#[wasm_bindgen]
impl JsCropDescriptor {
    #[wasm_bindgen(constructor)]
    pub fn new(
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        zoom: f64,
        natural_width: f64,
        natural_height: f64,
    ) -> JsCropDescriptor {
        JsCropDescriptor {
            inner: CropDescriptor {
                x,
                y,
                width,
                height,
                zoom,
                natural_width,
                natural_height,
            },
        }
    }

    #[wasm_bindgen(getter)]
    pub fn x(&self) -> f64 {
        self.inner.x
    }

    #[wasm_bindgen(getter)]
    pub fn y(&self) -> f64 {
        self.inner.y
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> f64 {
        self.inner.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> f64 {
        self.inner.height
    }

    #[wasm_bindgen(getter)]
    pub fn zoom(&self) -> f64 {
        self.inner.zoom
    }

    #[wasm_bindgen(getter)]
    pub fn natural_width(&self) -> f64 {
        self.inner.natural_width
    }

    #[wasm_bindgen(getter)]
    pub fn natural_height(&self) -> f64 {
        self.inner.natural_height
    }

    /// Plain `{ x, y, width, height, zoom, naturalWidth, naturalHeight }`
    /// object, suitable for JSON persistence.
    pub fn to_object(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner)
            .map_err(|e| JsValue::from_str(&format!("Invalid crop descriptor: {}", e)))
    }

    /// Parse a plain object produced by `to_object()`.
    pub fn from_object(value: JsValue) -> Result<JsCropDescriptor, JsValue> {
        let inner: CropDescriptor = serde_wasm_bindgen::from_value(value)
            .map_err(|e| JsValue::from_str(&format!("Invalid crop descriptor: {}", e)))?;
        Ok(JsCropDescriptor { inner })
    }
}

impl JsCropDescriptor {
    pub(crate) fn from_descriptor(inner: CropDescriptor) -> Self {
        Self { inner }
    }

    pub(crate) fn descriptor(&self) -> CropDescriptor {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_decoded_image_creation() {
        let img = JsDecodedImage::new(100, 50, vec![0u8; 100 * 50 * 3]);
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 50);
        assert_eq!(img.byte_length(), 15000);
    }

    #[test]
    fn test_pixels_round_trip_through_core() {
        let pixels = vec![255u8, 128, 64, 32, 16, 8];
        let img = JsDecodedImage::new(2, 1, pixels.clone());
        let core = img.to_pixels().unwrap();
        assert_eq!(core.pixels, pixels);

        let back = JsDecodedImage::from_pixels(core);
        assert_eq!(back.pixels(), pixels);
    }

    #[test]
    fn test_to_pixels_checks_length() {
        let img = JsDecodedImage::new(4, 4, vec![0u8; 10]);
        assert!(img.to_pixels().is_err());
    }

    #[test]
    fn test_descriptor_getters() {
        let d = JsCropDescriptor::new(500.0, 0.0, 1000.0, 1000.0, 1.0, 2000.0, 1000.0);
        assert_eq!(d.x(), 500.0);
        assert_eq!(d.y(), 0.0);
        assert_eq!(d.width(), 1000.0);
        assert_eq!(d.height(), 1000.0);
        assert_eq!(d.zoom(), 1.0);
        assert_eq!(d.natural_width(), 2000.0);
        assert_eq!(d.natural_height(), 1000.0);
        assert_eq!(JsCropDescriptor::from_descriptor(d.descriptor()), d);
    }
}
