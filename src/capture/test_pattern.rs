use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::capture::backend::{CaptureBackend, CaptureControl, CaptureDevice, Frame};
use crate::capture::error::{CaptureError, Result};

/// A fake capture backend for running without real hardware.
///
/// Generates a gradient test pattern at whatever resolution is requested and
/// remembers control writes in memory. Lifecycle tests can script open and
/// read failures; clones share one script, so tests can keep a handle after
/// handing the backend to the engine.
#[derive(Clone)]
pub struct TestPatternBackend {
    script: Arc<Mutex<Script>>,
}

#[derive(Default)]
struct Script {
    /// Outcomes for upcoming `open` calls; once drained, opens succeed.
    opens: VecDeque<OpenOutcome>,
    /// Number of `read_frame` calls that fail before frames flow again.
    /// Shared by every device the backend hands out.
    failing_reads: u32,
    open_count: u32,
}

enum OpenOutcome {
    Fail(String),
    /// Negotiate the given resolution regardless of what was asked for.
    Negotiate(u32, u32),
}

impl TestPatternBackend {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    /// Queue a failure for the next `open` call.
    pub fn fail_next_open(&self, reason: &str) {
        self.script
            .lock()
            .opens
            .push_back(OpenOutcome::Fail(reason.to_string()));
    }

    /// Make the next `open` call negotiate a different resolution than
    /// requested.
    pub fn negotiate_next_open(&self, width: u32, height: u32) {
        self.script
            .lock()
            .opens
            .push_back(OpenOutcome::Negotiate(width, height));
    }

    /// Fail the next `count` frame reads across all open devices.
    pub fn fail_reads(&self, count: u32) {
        self.script.lock().failing_reads = count;
    }

    /// How many times `open` has been called.
    pub fn open_count(&self) -> u32 {
        self.script.lock().open_count
    }
}

impl Default for TestPatternBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for TestPatternBackend {
    fn open(&self, index: u32, width: u32, height: u32) -> Result<Box<dyn CaptureDevice>> {
        let mut script = self.script.lock();
        script.open_count += 1;
        let (width, height) = match script.opens.pop_front() {
            Some(OpenOutcome::Fail(reason)) => {
                return Err(CaptureError::OpenFailed { index, reason });
            }
            Some(OpenOutcome::Negotiate(w, h)) => (w, h),
            None => (width, height),
        };
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidResolution {
                index,
                width,
                height,
            });
        }
        Ok(Box::new(TestPatternDevice {
            width,
            height,
            frame_counter: 0,
            controls: HashMap::new(),
            script: Arc::clone(&self.script),
        }))
    }
}

struct TestPatternDevice {
    width: u32,
    height: u32,
    frame_counter: u32,
    controls: HashMap<&'static str, i32>,
    script: Arc<Mutex<Script>>,
}

impl CaptureDevice for TestPatternDevice {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_frame(&mut self) -> Result<Frame> {
        {
            let mut script = self.script.lock();
            if script.failing_reads > 0 {
                script.failing_reads -= 1;
                return Err(CaptureError::ReadFailed("simulated stall".to_string()));
            }
        }
        self.frame_counter = self.frame_counter.wrapping_add(1);
        Ok(gradient_frame(self.width, self.height, self.frame_counter))
    }

    fn set_control(&mut self, control: CaptureControl, value: i32) -> Result<()> {
        let name = match control {
            CaptureControl::Brightness => "brightness",
            CaptureControl::Contrast => "contrast",
        };
        self.controls.insert(name, value);
        Ok(())
    }
}

/// Horizontal red / vertical green gradient with a blue phase that advances
/// each frame, so successive frames are visibly different.
fn gradient_frame(width: u32, height: u32, counter: u32) -> Frame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    let blue = (counter % 256) as u8;
    for y in 0..height {
        let g = ((y * 255) / height.max(1)) as u8;
        for x in 0..width {
            let r = ((x * 255) / width.max(1)) as u8;
            data.push(r);
            data.push(g);
            data.push(blue);
        }
    }
    Frame::new(width, height, data)
}
