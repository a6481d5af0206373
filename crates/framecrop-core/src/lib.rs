//! Framecrop Core - Crop/zoom transform engine
//!
//! This crate turns multi-touch gestures into a bounded scale/translate
//! transform over a cover-fitted image, manages a resizable crop frame, and
//! resolves the final frame into a pixel rectangle of the original image.
//! Pixel work is delegated to the host through [`RasterCrop`].
//!
//! # Module Structure
//!
//! - `geometry` - Points, image/container sizes, cover fit, screen/content mapping
//! - `transform` - The live transform, bounds clamping, versioned shared state
//! - `gesture` - Pinch/pan recognizers and the coordinator that routes input
//! - `frame` - Crop frame sizing, minimums and aspect lock
//! - `resolve` - Transform to crop descriptor and back
//! - `animate` - Spring reset to identity
//! - `throttle` - Rate-limited scale notifications
//! - `raster` - Delegated pixel crop
//! - `session` - One edit session owning all of the above

pub mod animate;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod gesture;
pub mod raster;
pub mod resolve;
pub mod session;
pub mod throttle;
pub mod transform;

pub use animate::{AnimatorState, ResetAnimator};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use frame::{CropFrame, CropFrameController, Edge};
pub use geometry::{ContainerGeometry, FittedDisplay, ImageMetadata, Point};
pub use gesture::{
    GestureCoordinator, GestureInput, GestureState, PanPhase, PinchPhase, Pointers,
};
pub use raster::{crop_to_descriptor, RasterCrop, RgbPixels};
pub use resolve::{resolve, restore, CropDescriptor, PixelRect};
pub use session::{EditSession, ScaleObserver};
pub use throttle::ScaleThrottle;
pub use transform::{ScaleBounds, SharedTransform, Transform};
