use thiserror::Error;

/// A specialized `Result` type for screen and pointer operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Failures reported by the capture and pointer collaborators.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("No monitor available for screen capture")]
    NoMonitor,

    #[error("Screen capture failed: {description}")]
    CaptureFailed { description: String },

    #[error("Screen capture returned an empty {width}x{height} image")]
    EmptyCapture { width: u32, height: u32 },

    #[error("Pointer device unavailable: {description}")]
    PointerUnavailable { description: String },

    #[error("Click at ({x}, {y}) failed: {description}")]
    PointerFailed { x: i32, y: i32, description: String },
}
