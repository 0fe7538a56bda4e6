use thiserror::Error;

/// Capture subsystem errors.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to open device {index}: {reason}")]
    OpenFailed { index: u32, reason: String },

    #[error("device {index} negotiated an unusable resolution {width}x{height}")]
    InvalidResolution { index: u32, width: u32, height: u32 },

    #[error("frame read failed: {0}")]
    ReadFailed(String),

    #[error("control write failed: {0}")]
    ControlWrite(String),
}

impl CaptureError {
    /// Errors that no amount of reopening will fix.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CaptureError::InvalidResolution { .. })
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CaptureError>;
