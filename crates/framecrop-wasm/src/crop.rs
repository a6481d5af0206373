//! WASM binding for applying a committed crop to pixel data.

use crate::types::{JsCropDescriptor, JsDecodedImage};
use framecrop_core::crop_to_descriptor;
use wasm_bindgen::prelude::*;

/// Crop an image to a committed crop descriptor.
///
/// The descriptor may have been resolved against a different resolution of
/// the same image (e.g. a preview); it is rescaled to `image`'s size.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const descriptor = session.begin_commit();
/// const cropped = apply_crop_descriptor(fullSizeImage, descriptor);
/// session.end_commit();
/// ```
#[wasm_bindgen]
pub fn apply_crop_descriptor(
    image: &JsDecodedImage,
    descriptor: &JsCropDescriptor,
) -> Result<JsDecodedImage, JsValue> {
    let src = image
        .to_pixels()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    crop_to_descriptor(&src, &descriptor.descriptor())
        .map(JsDecodedImage::from_pixels)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
