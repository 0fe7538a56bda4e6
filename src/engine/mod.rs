//! The capture engine: owns the device, the per-device annotation state and
//! the view transform, and runs the frame loop on its own thread.

pub mod render;
pub mod window;

use std::collections::HashMap;
use std::thread;

use tracing::{error, info, warn};

use crate::capture::{
    CaptureBackend, CaptureControl, CaptureError, CaptureSession, DeviceDirectory, RetryPolicy,
};
use crate::input::{DispatchContext, Dispatcher, InputEffect};
use crate::marker::{DeviceState, MarkerStyle};
use crate::protocol::{Command, EngineHandle, Update};
use crate::view::ViewState;
use window::{KeyCommand, VideoWindow, WindowEvent};

/// Startup parameters for [`CaptureEngine`].
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub device_index: u32,
    pub width: u32,
    pub height: u32,
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: 1920,
            height: 1080,
            retry: RetryPolicy::default(),
        }
    }
}

/// The engine-side half of the application.
///
/// Single-threaded by construction: one `tick` handles at most one command,
/// reads one frame (or runs one recovery attempt), renders, and drains the
/// window's input queue. All annotation state lives here; the surface only
/// ever sees snapshots.
pub struct CaptureEngine {
    backend: Box<dyn CaptureBackend>,
    directory: Box<dyn DeviceDirectory>,
    window: Box<dyn VideoWindow>,
    handle: EngineHandle,

    devices: HashMap<u32, DeviceState>,
    active_index: u32,
    width: u32,
    height: u32,
    view: ViewState,
    style: MarkerStyle,
    dispatcher: Dispatcher,

    session: Option<CaptureSession>,
    camera_name: String,
    title: String,
    /// Failed reopen attempts since the last working session. Lives here
    /// rather than on the session because sessions are dropped and rebuilt
    /// across recovery.
    consecutive_failures: u32,
    retry: RetryPolicy,
}

impl CaptureEngine {
    pub fn new(
        backend: Box<dyn CaptureBackend>,
        directory: Box<dyn DeviceDirectory>,
        window: Box<dyn VideoWindow>,
        handle: EngineHandle,
        config: EngineConfig,
    ) -> Self {
        Self {
            backend,
            directory,
            window,
            handle,
            devices: HashMap::new(),
            active_index: config.device_index,
            width: config.width,
            height: config.height,
            view: ViewState::new(),
            style: MarkerStyle::default(),
            dispatcher: Dispatcher::new(),
            session: None,
            camera_name: String::new(),
            title: String::new(),
            consecutive_failures: 0,
            retry: config.retry,
        }
    }

    /// Run the frame loop until an exit command, a window close, or a fatal
    /// device failure.
    pub fn run(&mut self) {
        if let Err(err) = self.open_session(self.width, self.height) {
            error!(%err, index = self.active_index, "could not open initial device");
            self.handle.send(Update::ExitGui);
            return;
        }
        while self.tick() {}
        info!("capture engine stopped");
    }

    /// One loop iteration. Returns `false` when the engine should stop.
    fn tick(&mut self) -> bool {
        if !self.handle_command() {
            return false;
        }

        let frame = match self.session.as_mut().map(|s| s.read_frame()) {
            Some(Ok(frame)) => frame,
            Some(Err(err)) => {
                warn!(%err, "frame read failed");
                self.session = None;
                return self.recover();
            }
            None => return self.recover(),
        };
        self.consecutive_failures = 0;

        let mut frame = frame;
        render::rotate_180(&mut frame);
        render::draw_markers(&mut frame, self.state().markers());
        let display = render::apply_view(frame, &self.view);
        self.window.present(&self.title, &display);

        for event in self.window.poll_events() {
            match event {
                WindowEvent::Pointer(pointer) => {
                    let mut ctx = DispatchContext {
                        view: &mut self.view,
                        state: self.devices.entry(self.active_index).or_default(),
                        style: &self.style,
                        frame_width: self.width,
                        frame_height: self.height,
                    };
                    let effects = self.dispatcher.dispatch(pointer, &mut ctx);
                    for effect in effects {
                        self.emit_effect(effect);
                    }
                }
                WindowEvent::Key(KeyCommand::Undo) => {
                    if self.state_mut().undo() {
                        self.sync_markers();
                    }
                }
                WindowEvent::Key(KeyCommand::Redo) => {
                    if self.state_mut().redo() {
                        self.sync_markers();
                    }
                }
                WindowEvent::Key(KeyCommand::Quit) | WindowEvent::CloseRequested => {
                    self.handle.send(Update::ExitGui);
                    return false;
                }
            }
        }
        true
    }

    /// One recovery attempt: back off, then rebuild the session at the
    /// current resolution.
    fn recover(&mut self) -> bool {
        thread::sleep(self.retry.backoff);
        match self.open_session(self.width, self.height) {
            Ok(()) => {
                info!(index = self.active_index, "device recovered");
                self.consecutive_failures = 0;
                true
            }
            Err(err) if err.is_fatal() => {
                error!(%err, "unrecoverable device failure");
                self.handle.send(Update::ExitGui);
                false
            }
            Err(err) => {
                self.consecutive_failures += 1;
                warn!(
                    %err,
                    attempt = self.consecutive_failures,
                    max = self.retry.max_attempts,
                    "device reopen failed"
                );
                if self.consecutive_failures >= self.retry.max_attempts {
                    error!("giving up on device after repeated reopen failures");
                    self.handle.send(Update::ExitGui);
                    false
                } else {
                    true
                }
            }
        }
    }

    /// Open the active device, adopt its negotiated resolution, and announce
    /// the new status. On failure the engine is left without a session and
    /// the frame loop falls into recovery.
    fn open_session(&mut self, width: u32, height: u32) -> Result<(), CaptureError> {
        self.session = None;
        self.camera_name = self.directory.name_of(self.active_index);
        let session = CaptureSession::open(self.backend.as_ref(), self.active_index, width, height)?;
        let (w, h) = session.dimensions();
        self.width = w;
        self.height = h;
        // A smaller negotiated frame can strand the pan outside the new
        // bounds; the render crop assumes the pan invariant holds.
        self.view.clamp_pan(w, h);
        self.title = format!("{} - {}x{}", self.camera_name, w, h);
        self.session = Some(session);
        self.handle.send(Update::StatusUpdate {
            name: self.camera_name.clone(),
            index: self.active_index,
            resolution: (w, h),
        });
        Ok(())
    }

    /// Handle at most one pending command. Returns `false` on `exit`.
    fn handle_command(&mut self) -> bool {
        let Some(command) = self.handle.try_command() else {
            return true;
        };
        match command {
            Command::Exit => return false,
            Command::SwitchCamera { index } => {
                self.active_index = index;
                self.reopen(self.width, self.height);
                self.sync_markers();
            }
            Command::RestartCamera => {
                self.reopen(self.width, self.height);
            }
            Command::DeleteMarkerConfirmed { index } => {
                if self.state_mut().delete(index) {
                    self.sync_markers();
                }
            }
            Command::UpdateMarker { index, marker } => {
                if self.state_mut().modify(index, marker) {
                    self.sync_markers();
                }
            }
            Command::SetResolution { width, height } => {
                self.reopen(width, height);
            }
            Command::SetProperty { name, value } => match CaptureControl::from_name(&name) {
                Some(control) => {
                    if let Some(session) = self.session.as_mut() {
                        // Already logged inside; a rejected control never
                        // stops the feed.
                        let _ = session.set_control(control, value);
                    }
                }
                None => warn!(%name, "unknown device property"),
            },
            Command::ClearMarkers => {
                self.state_mut().clear();
                self.sync_markers();
            }
            Command::LoadFile { session } => {
                self.active_index = session.camera_index;
                self.state_mut().replace_all(session.markers);
                let (w, h) = session.resolution;
                self.reopen(w, h);
                self.sync_markers();
            }
            Command::SetMarkerShape { shape } => self.style.shape = shape,
            Command::SetMarkerColor { color } => self.style.color = color,
            Command::SetMarkerSize { size } => self.style.size = size,
            Command::GetCurrentMarkers => self.sync_markers(),
        }
        true
    }

    /// Reopen for a command. Non-fatal failures leave the session closed for
    /// the recovery path to pick up; fatality is decided there too.
    fn reopen(&mut self, width: u32, height: u32) {
        if let Err(err) = self.open_session(width, height) {
            warn!(%err, index = self.active_index, "device open failed");
        }
    }

    fn state(&mut self) -> &DeviceState {
        self.devices.entry(self.active_index).or_default()
    }

    fn state_mut(&mut self) -> &mut DeviceState {
        self.devices.entry(self.active_index).or_default()
    }

    fn sync_markers(&mut self) {
        let markers = self.state().markers().to_vec();
        self.handle.send(Update::SyncMarkers { markers });
    }

    fn emit_effect(&mut self, effect: InputEffect) {
        match effect {
            InputEffect::MarkersChanged => self.sync_markers(),
            InputEffect::ConfirmDelete { index, marker } => {
                self.handle.send(Update::ConfirmDeleteMarker { index, marker });
            }
            InputEffect::DescribeMarker { index } => {
                self.handle.send(Update::ShowDescriptionDialogForMarker { index });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;

    use crate::capture::{CameraInfo, Frame, StaticDirectory, TestPatternBackend};
    use crate::input::{PointerButton, PointerEvent};
    use crate::marker::{Marker, MarkerShape, MarkerStyle, Rgb};
    use crate::protocol::{channel_pair, SurfaceHandle};
    use crate::session::SessionFile;

    /// Window scripted with one batch of events per tick. Records every
    /// presented title so tests can assert on it.
    struct ScriptedWindow {
        batches: Arc<Mutex<VecDeque<Vec<WindowEvent>>>>,
        titles: Arc<Mutex<Vec<String>>>,
    }

    impl VideoWindow for ScriptedWindow {
        fn present(&mut self, title: &str, _frame: &Frame) {
            self.titles.lock().push(title.to_string());
        }

        fn poll_events(&mut self) -> Vec<WindowEvent> {
            self.batches.lock().pop_front().unwrap_or_default()
        }
    }

    struct Harness {
        engine: CaptureEngine,
        surface: SurfaceHandle,
        backend: TestPatternBackend,
        batches: Arc<Mutex<VecDeque<Vec<WindowEvent>>>>,
        titles: Arc<Mutex<Vec<String>>>,
    }

    impl Harness {
        fn new() -> Self {
            let backend = TestPatternBackend::new();
            let batches: Arc<Mutex<VecDeque<Vec<WindowEvent>>>> =
                Arc::new(Mutex::new(VecDeque::new()));
            let titles = Arc::new(Mutex::new(Vec::new()));
            let window = ScriptedWindow {
                batches: Arc::clone(&batches),
                titles: Arc::clone(&titles),
            };
            let (surface, handle) = channel_pair();
            let directory = StaticDirectory::new(vec![CameraInfo {
                index: 0,
                name: "Bench Camera".to_string(),
            }]);
            let config = EngineConfig {
                width: 64,
                height: 48,
                retry: RetryPolicy {
                    backoff: Duration::from_millis(1),
                    max_attempts: 2,
                },
                ..EngineConfig::default()
            };
            let engine = CaptureEngine::new(
                Box::new(backend.clone()),
                Box::new(directory),
                Box::new(window),
                handle,
                config,
            );
            Self {
                engine,
                surface,
                backend,
                batches,
                titles,
            }
        }

        fn start(&mut self) {
            self.engine
                .open_session(self.engine.width, self.engine.height)
                .unwrap();
        }

        fn queue_events(&self, events: Vec<WindowEvent>) {
            self.batches.lock().push_back(events);
        }

        fn drain_updates(&self) -> Vec<Update> {
            let mut updates = Vec::new();
            while let Some(update) = self.surface.try_update() {
                updates.push(update);
            }
            updates
        }
    }

    fn left_click(x: i32, y: i32) -> WindowEvent {
        WindowEvent::Pointer(PointerEvent::ButtonDown {
            button: PointerButton::Left,
            x,
            y,
            shift: false,
        })
    }

    #[test]
    fn startup_failure_reports_exit() {
        let mut harness = Harness::new();
        harness.backend.fail_next_open("unplugged");
        harness.engine.run();
        assert_eq!(harness.drain_updates(), vec![Update::ExitGui]);
    }

    #[test]
    fn open_announces_name_and_negotiated_resolution() {
        let mut harness = Harness::new();
        harness.backend.negotiate_next_open(32, 24);
        harness.start();
        assert_eq!(
            harness.drain_updates(),
            vec![Update::StatusUpdate {
                name: "Bench Camera".to_string(),
                index: 0,
                resolution: (32, 24),
            }]
        );
        assert!(harness.engine.tick());
        assert_eq!(harness.titles.lock()[0], "Bench Camera - 32x24");
    }

    #[test]
    fn click_places_marker_and_syncs() {
        let mut harness = Harness::new();
        harness.start();
        harness.drain_updates();

        harness.queue_events(vec![left_click(10, 10)]);
        assert!(harness.engine.tick());

        match &harness.drain_updates()[..] {
            [Update::SyncMarkers { markers }] => {
                assert_eq!(markers.len(), 1);
                // 64x48 frame, reflected click
                assert_eq!(markers[0].pos, (53, 37));
            }
            other => panic!("unexpected updates: {other:?}"),
        }
    }

    #[test]
    fn exit_command_stops_the_loop() {
        let mut harness = Harness::new();
        harness.start();
        harness.surface.send(Command::Exit);
        assert!(!harness.engine.tick());
    }

    #[test]
    fn close_request_emits_exit_gui() {
        let mut harness = Harness::new();
        harness.start();
        harness.drain_updates();
        harness.queue_events(vec![WindowEvent::CloseRequested]);
        assert!(!harness.engine.tick());
        assert_eq!(harness.drain_updates(), vec![Update::ExitGui]);
    }

    #[test]
    fn quit_key_emits_exit_gui() {
        let mut harness = Harness::new();
        harness.start();
        harness.drain_updates();
        harness.queue_events(vec![WindowEvent::Key(KeyCommand::Quit)]);
        assert!(!harness.engine.tick());
        assert_eq!(harness.drain_updates(), vec![Update::ExitGui]);
    }

    #[test]
    fn undo_key_reverts_last_marker() {
        let mut harness = Harness::new();
        harness.start();
        harness.queue_events(vec![left_click(10, 10)]);
        assert!(harness.engine.tick());
        harness.drain_updates();

        harness.queue_events(vec![WindowEvent::Key(KeyCommand::Undo)]);
        assert!(harness.engine.tick());
        match &harness.drain_updates()[..] {
            [Update::SyncMarkers { markers }] => assert!(markers.is_empty()),
            other => panic!("unexpected updates: {other:?}"),
        }

        harness.queue_events(vec![WindowEvent::Key(KeyCommand::Redo)]);
        assert!(harness.engine.tick());
        match &harness.drain_updates()[..] {
            [Update::SyncMarkers { markers }] => assert_eq!(markers.len(), 1),
            other => panic!("unexpected updates: {other:?}"),
        }
    }

    #[test]
    fn read_failure_recovers_and_reannounces_status() {
        let mut harness = Harness::new();
        harness.start();
        harness.drain_updates();

        harness.backend.fail_reads(1);
        // Failed read tick: recovery reopens immediately.
        assert!(harness.engine.tick());
        let updates = harness.drain_updates();
        assert!(matches!(updates[..], [Update::StatusUpdate { .. }]));

        // Frames flow again.
        assert!(harness.engine.tick());
        assert_eq!(harness.engine.consecutive_failures, 0);
    }

    #[test]
    fn repeated_reopen_failures_exit_fatally() {
        let mut harness = Harness::new();
        harness.start();
        harness.drain_updates();

        harness.backend.fail_reads(1);
        harness.backend.fail_next_open("gone");
        harness.backend.fail_next_open("still gone");

        assert!(harness.engine.tick()); // read fails, reopen 1 fails
        assert!(!harness.engine.tick()); // reopen 2 fails, max_attempts = 2
        assert_eq!(harness.drain_updates(), vec![Update::ExitGui]);
    }

    #[test]
    fn successful_reopen_resets_the_failure_counter() {
        let mut harness = Harness::new();
        harness.start();
        harness.drain_updates();

        harness.backend.fail_reads(1);
        harness.backend.fail_next_open("flaky");
        assert!(harness.engine.tick()); // reopen fails once
        assert_eq!(harness.engine.consecutive_failures, 1);
        assert!(harness.engine.tick()); // reopen succeeds
        assert_eq!(harness.engine.consecutive_failures, 0);
    }

    #[test]
    fn invalid_resolution_during_recovery_is_immediately_fatal() {
        let mut harness = Harness::new();
        harness.start();
        harness.drain_updates();

        harness.backend.fail_reads(1);
        harness.backend.negotiate_next_open(0, 48);
        assert!(!harness.engine.tick());
        assert_eq!(harness.drain_updates(), vec![Update::ExitGui]);
    }

    #[test]
    fn switch_camera_keeps_resolution_and_isolates_markers() {
        let mut harness = Harness::new();
        harness.start();
        harness.queue_events(vec![left_click(10, 10)]);
        assert!(harness.engine.tick());
        harness.drain_updates();

        harness.surface.send(Command::SwitchCamera { index: 1 });
        assert!(harness.engine.tick());

        let updates = harness.drain_updates();
        match &updates[..] {
            [Update::StatusUpdate {
                name,
                index,
                resolution,
            }, Update::SyncMarkers { markers }] => {
                // Unknown to the directory, so the generic name.
                assert_eq!(name, "Camera 1");
                assert_eq!(*index, 1);
                assert_eq!(*resolution, (64, 48));
                assert!(markers.is_empty());
            }
            other => panic!("unexpected updates: {other:?}"),
        }

        // Switching back restores the first device's markers.
        harness.surface.send(Command::SwitchCamera { index: 0 });
        assert!(harness.engine.tick());
        let updates = harness.drain_updates();
        match updates.last() {
            Some(Update::SyncMarkers { markers }) => assert_eq!(markers.len(), 1),
            other => panic!("unexpected update: {other:?}"),
        }
    }

    #[test]
    fn set_resolution_reopens_at_requested_size() {
        let mut harness = Harness::new();
        harness.start();
        harness.drain_updates();

        harness.surface.send(Command::SetResolution {
            width: 128,
            height: 96,
        });
        assert!(harness.engine.tick());
        let updates = harness.drain_updates();
        assert!(matches!(
            updates[..],
            [Update::StatusUpdate {
                resolution: (128, 96),
                ..
            }]
        ));
    }

    #[test]
    fn resolution_shrink_reclamps_a_zoomed_pan() {
        let mut harness = Harness::new();
        harness.start();
        harness.drain_updates();

        // Zoom toward the far corner so the pan sits near its maximum.
        harness
            .engine
            .view
            .set_zoom_anchored(63.0, 47.0, 2.0, 64, 48);
        assert_eq!(harness.engine.view.pan(), (32, 24));

        harness.surface.send(Command::SetResolution {
            width: 16,
            height: 12,
        });
        assert!(harness.engine.tick());

        // The pan fits the new frame again and the crop renders.
        let (px, py) = harness.engine.view.pan();
        let (vw, vh) = harness.engine.view.view_size(16, 12);
        assert!(px >= 0 && px <= (16 - vw) as i32);
        assert!(py >= 0 && py <= (12 - vh) as i32);
        assert!(harness.engine.tick());
        assert_eq!(harness.titles.lock().last().unwrap(), "Bench Camera - 16x12");
    }

    #[test]
    fn delete_confirmed_removes_marker_and_ignores_stale_index() {
        let mut harness = Harness::new();
        harness.start();
        harness.queue_events(vec![left_click(10, 10)]);
        assert!(harness.engine.tick());
        harness.drain_updates();

        harness
            .surface
            .send(Command::DeleteMarkerConfirmed { index: 5 });
        assert!(harness.engine.tick());
        assert!(harness.drain_updates().is_empty());

        harness
            .surface
            .send(Command::DeleteMarkerConfirmed { index: 0 });
        assert!(harness.engine.tick());
        match &harness.drain_updates()[..] {
            [Update::SyncMarkers { markers }] => assert!(markers.is_empty()),
            other => panic!("unexpected updates: {other:?}"),
        }
    }

    #[test]
    fn update_marker_replaces_record() {
        let mut harness = Harness::new();
        harness.start();
        harness.queue_events(vec![left_click(10, 10)]);
        assert!(harness.engine.tick());
        harness.drain_updates();

        let replacement = Marker {
            pos: (1, 2),
            shape: MarkerShape::Circle,
            color: Rgb::GREEN,
            size: 9,
            desc: "C3".to_string(),
        };
        harness.surface.send(Command::UpdateMarker {
            index: 0,
            marker: replacement.clone(),
        });
        assert!(harness.engine.tick());
        match &harness.drain_updates()[..] {
            [Update::SyncMarkers { markers }] => assert_eq!(markers[0], replacement),
            other => panic!("unexpected updates: {other:?}"),
        }
    }

    #[test]
    fn style_commands_shape_subsequent_markers() {
        let mut harness = Harness::new();
        harness.start();
        harness.drain_updates();

        harness.surface.send(Command::SetMarkerShape {
            shape: MarkerShape::Square,
        });
        assert!(harness.engine.tick());
        harness.surface.send(Command::SetMarkerColor {
            color: Rgb::YELLOW,
        });
        assert!(harness.engine.tick());
        harness.surface.send(Command::SetMarkerSize { size: 25 });
        harness.queue_events(vec![left_click(10, 10)]);
        assert!(harness.engine.tick());

        match harness.drain_updates().last() {
            Some(Update::SyncMarkers { markers }) => {
                assert_eq!(markers[0].shape, MarkerShape::Square);
                assert_eq!(markers[0].color, Rgb::YELLOW);
                assert_eq!(markers[0].size, 25);
            }
            other => panic!("unexpected update: {other:?}"),
        }
    }

    #[test]
    fn load_file_adopts_device_markers_and_resolution() {
        let mut harness = Harness::new();
        harness.start();
        harness.drain_updates();

        let style = MarkerStyle::default();
        harness.surface.send(Command::LoadFile {
            session: SessionFile {
                camera_name: "Bench Camera".to_string(),
                camera_index: 2,
                resolution: (32, 24),
                markers: vec![Marker::new((3, 4), &style), Marker::new((5, 6), &style)],
            },
        });
        assert!(harness.engine.tick());

        let updates = harness.drain_updates();
        match &updates[..] {
            [Update::StatusUpdate {
                index, resolution, ..
            }, Update::SyncMarkers { markers }] => {
                assert_eq!(*index, 2);
                assert_eq!(*resolution, (32, 24));
                assert_eq!(markers.len(), 2);
            }
            other => panic!("unexpected updates: {other:?}"),
        }
    }

    #[test]
    fn clear_markers_resets_history_too() {
        let mut harness = Harness::new();
        harness.start();
        harness.queue_events(vec![left_click(10, 10)]);
        assert!(harness.engine.tick());
        harness.drain_updates();

        harness.surface.send(Command::ClearMarkers);
        assert!(harness.engine.tick());
        match &harness.drain_updates()[..] {
            [Update::SyncMarkers { markers }] => assert!(markers.is_empty()),
            other => panic!("unexpected updates: {other:?}"),
        }

        // Nothing left to undo.
        harness.queue_events(vec![WindowEvent::Key(KeyCommand::Undo)]);
        assert!(harness.engine.tick());
        assert!(harness.drain_updates().is_empty());
    }

    #[test]
    fn unknown_property_is_ignored() {
        let mut harness = Harness::new();
        harness.start();
        harness.drain_updates();
        harness.surface.send(Command::SetProperty {
            name: "saturation".to_string(),
            value: 50,
        });
        assert!(harness.engine.tick());
        assert!(harness.drain_updates().is_empty());
    }

    #[test]
    fn get_current_markers_resyncs_on_demand() {
        let mut harness = Harness::new();
        harness.start();
        harness.drain_updates();
        harness.surface.send(Command::GetCurrentMarkers);
        assert!(harness.engine.tick());
        match &harness.drain_updates()[..] {
            [Update::SyncMarkers { markers }] => assert!(markers.is_empty()),
            other => panic!("unexpected updates: {other:?}"),
        }
    }
}
