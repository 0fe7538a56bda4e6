//! Device capture: backend traits, the streaming session, enumeration, and
//! the hardware-free test pattern backend.

mod backend;
mod enumerate;
mod error;
mod session;
mod test_pattern;

pub use backend::{CaptureBackend, CaptureControl, CaptureDevice, Frame};
pub use enumerate::{
    list_cameras, parse_device_list, parse_format_list, probe_capabilities, CameraCapabilities,
    CameraInfo, DeviceDirectory, StaticDirectory, SystemDirectory, MIN_FPS,
};
pub use error::{CaptureError, Result};
pub use session::{CaptureSession, RetryPolicy};
pub use test_pattern::TestPatternBackend;
