//! Framecrop WASM - WebAssembly bindings for Framecrop
//!
//! This crate exposes the framecrop-core crop/zoom engine to
//! JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `session` - Interactive crop session (gestures, frame, commit)
//! - `types` - WASM-compatible wrapper types for image data and crop results
//! - `crop` - Applying a committed crop to pixel data
//!
//! # Usage
//!
//! ```typescript
//! import init, { CropSession, apply_crop_descriptor } from '@framecrop/wasm';
//!
//! await init();
//!
//! const session = new CropSession(4032, 3024, 360, 360);
//! // ... forward touches ...
//! const descriptor = session.begin_commit();
//! ```

use wasm_bindgen::prelude::*;

mod crop;
mod session;
mod types;

// Re-export public types
pub use crop::apply_crop_descriptor;
pub use session::CropSession;
pub use types::{JsCropDescriptor, JsDecodedImage};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
