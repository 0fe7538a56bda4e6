use std::time::Duration;

use tracing::{info, warn};

use crate::capture::backend::{CaptureBackend, CaptureControl, CaptureDevice, Frame};
use crate::capture::error::Result;

/// Timing for the reopen loop after a device failure.
///
/// Injectable so lifecycle tests run in milliseconds instead of waiting out
/// real backoffs.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Pause between releasing a broken device and trying to reopen it.
    pub backoff: Duration,
    /// Consecutive failed reopens tolerated before giving up.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(2),
            max_attempts: 5,
        }
    }
}

/// An open streaming session on one device.
///
/// Thin ownership wrapper over the device handle. Sessions are disposable:
/// on a read failure the engine drops the whole session, backs off, and
/// opens a fresh one, so no state here needs to survive recovery.
pub struct CaptureSession {
    index: u32,
    width: u32,
    height: u32,
    device: Box<dyn CaptureDevice>,
}

impl CaptureSession {
    /// Open device `index`, requesting `width`x`height`.
    ///
    /// Records whatever resolution the device actually negotiated.
    pub fn open(
        backend: &dyn CaptureBackend,
        index: u32,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let device = backend.open(index, width, height)?;
        let (width, height) = device.dimensions();
        info!(index, width, height, "capture session opened");
        Ok(Self {
            index,
            width,
            height,
            device,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// The negotiated resolution.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn read_frame(&mut self) -> Result<Frame> {
        self.device.read_frame()
    }

    /// Forward a control write; failures are logged and reported but never
    /// tear down the session.
    pub fn set_control(&mut self, control: CaptureControl, value: i32) -> Result<()> {
        if let Err(err) = self.device.set_control(control, value) {
            warn!(index = self.index, %err, "control write rejected");
            return Err(err);
        }
        Ok(())
    }
}
