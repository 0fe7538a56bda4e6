use crate::capture::Frame;
use crate::input::PointerEvent;

/// Keyboard shortcuts the render loop acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Undo,
    Redo,
    Quit,
}

/// Everything the video window can report back per tick.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    Pointer(PointerEvent),
    Key(KeyCommand),
    CloseRequested,
}

/// The presenter for the annotated feed.
///
/// The engine is agnostic about how frames reach a screen; swapping this
/// trait out lets the whole loop run in tests and on headless machines.
pub trait VideoWindow: Send {
    /// Show one frame under the given window title.
    fn present(&mut self, title: &str, frame: &Frame);

    /// Drain whatever input arrived since the last call.
    fn poll_events(&mut self) -> Vec<WindowEvent>;
}

/// A window that displays nothing and reports no input.
///
/// Presenting sleeps for one frame interval so the engine loop runs at
/// roughly camera speed instead of spinning.
pub struct HeadlessWindow;

const FRAME_INTERVAL: std::time::Duration = std::time::Duration::from_millis(33);

impl VideoWindow for HeadlessWindow {
    fn present(&mut self, _title: &str, _frame: &Frame) {
        std::thread::sleep(FRAME_INTERVAL);
    }

    fn poll_events(&mut self) -> Vec<WindowEvent> {
        Vec::new()
    }
}
