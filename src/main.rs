use std::io::BufRead;
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pcbcam::capture::{self, SystemDirectory, TestPatternBackend, MIN_FPS};
use pcbcam::engine::window::HeadlessWindow;
use pcbcam::session;
use pcbcam::{channel_pair, CaptureEngine, Command, EngineConfig, SurfaceEvent, SurfaceMirror};

/// Interval at which the surface polls the update channel.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match std::env::args().nth(1).as_deref() {
        Some("devices") => print_json(&capture::list_cameras()),
        Some("caps") => print_json(&capture::probe_capabilities(MIN_FPS)),
        Some("run") | None => run_feed(),
        Some(other) => {
            eprintln!("unknown subcommand '{other}'; expected devices, caps or run");
            std::process::exit(2);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => error!(%err, "serialisation failed"),
    }
}

/// Run the engine against the test-pattern backend with a line-oriented
/// control surface on stdin.
fn run_feed() {
    let (surface, engine_handle) = channel_pair();
    let mut engine = CaptureEngine::new(
        Box::new(TestPatternBackend::new()),
        Box::new(SystemDirectory::new()),
        Box::new(HeadlessWindow),
        engine_handle,
        EngineConfig::default(),
    );
    let engine_thread = thread::spawn(move || engine.run());

    let lines = spawn_stdin_reader();
    let mut mirror = SurfaceMirror::new();

    info!("surface ready; commands: markers, save <path>, load <path>, delete <i>, switch <i>, clear, exit");
    'outer: loop {
        while let Some(update) = surface.try_update() {
            match mirror.apply(update) {
                Some(SurfaceEvent::Exit) => break 'outer,
                Some(SurfaceEvent::RefreshTable) => {}
                Some(SurfaceEvent::ConfirmDelete { index, marker }) => {
                    println!("delete marker {index} at {:?}? run: delete {index}", marker.pos);
                }
                Some(SurfaceEvent::EditMarker { index }) => {
                    println!("edit requested for marker {index}");
                }
                None => {}
            }
        }

        while let Ok(line) = lines.try_recv() {
            if !handle_line(line.trim(), &surface, &mirror) {
                break 'outer;
            }
        }

        thread::sleep(POLL_INTERVAL);
    }

    surface.send(Command::Exit);
    if engine_thread.join().is_err() {
        error!("engine thread panicked");
    }
}

/// One stdin command. Returns `false` on `exit`.
fn handle_line(line: &str, surface: &pcbcam::SurfaceHandle, mirror: &SurfaceMirror) -> bool {
    let mut words = line.split_whitespace();
    match (words.next(), words.next()) {
        (Some("exit"), _) => return false,
        (Some("markers"), _) => print_json(&mirror.markers()),
        (Some("clear"), _) => surface.send(Command::ClearMarkers),
        (Some("switch"), Some(arg)) => match arg.parse() {
            Ok(index) => surface.send(Command::SwitchCamera { index }),
            Err(_) => warn!(arg, "switch expects a device index"),
        },
        (Some("delete"), Some(arg)) => match arg.parse() {
            Ok(index) => surface.send(Command::DeleteMarkerConfirmed { index }),
            Err(_) => warn!(arg, "delete expects a marker index"),
        },
        (Some("save"), Some(path)) => {
            let path = session::conventional_path(Path::new(path));
            if let Err(err) = session::save(&path, &mirror.session_file()) {
                error!(%err, "save failed");
            }
        }
        (Some("load"), Some(path)) => match session::load(Path::new(path)) {
            Ok(file) => surface.send(Command::LoadFile { session: file }),
            Err(err) => error!(%err, "load failed"),
        },
        (Some(cmd), _) => warn!(cmd, "unknown command"),
        (None, _) => {}
    }
    true
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
