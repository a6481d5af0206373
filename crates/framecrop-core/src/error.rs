//! Error types for the crop engine.

use thiserror::Error;

/// Errors reported by the crop engine.
///
/// Clamping is never an error: scale, translate and frame bounds are
/// enforced silently on the normal path. Only inputs or final states that
/// cannot be repaired are reported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A gesture frame produced an unusable value (zero-distance pinch,
    /// non-finite multiplier or focal point). The frame is ignored and the
    /// last valid transform is kept.
    #[error("Degenerate gesture input: {0}")]
    DegenerateGesture(&'static str),

    /// The image or the container has a zero, negative or non-finite
    /// dimension. The session refuses to initialize.
    #[error("Invalid {subject} geometry: {width}x{height}")]
    InvalidContainerGeometry {
        subject: &'static str,
        width: f64,
        height: f64,
    },

    /// The resolved crop rectangle is empty or not finite. No raster
    /// operation is issued.
    #[error("Invalid crop geometry: {0}")]
    InvalidCropGeometry(String),

    /// A commit is in progress; the crop cannot change until it ends.
    #[error("Commit in progress")]
    CommitInProgress,

    /// The engine configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The delegated raster crop failed.
    #[error("Raster crop failed: {0}")]
    Raster(String),
}

/// Result type alias using EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
