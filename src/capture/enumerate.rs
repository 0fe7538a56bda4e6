use std::process::Command;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;

/// One enumerated camera: V4L2 device index plus the driver-reported name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraInfo {
    pub index: u32,
    pub name: String,
}

/// Capabilities probed for one camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraCapabilities {
    pub index: u32,
    pub name: String,
    /// MJPEG resolutions meeting the fps floor, sorted by pixel count.
    pub resolutions: Vec<(u32, u32)>,
}

/// Minimum frame rate a resolution must sustain to be reported.
pub const MIN_FPS: f64 = 30.0;

/// Parses `v4l2-ctl --list-devices` output.
///
/// The format is a device name line followed by tab-indented `/dev/video*`
/// paths. Multi-function devices expose several nodes; only the first node
/// per name is kept. Results are sorted by index.
pub fn parse_device_list(output: &str) -> Vec<CameraInfo> {
    let mut devices: Vec<CameraInfo> = Vec::new();
    let mut current_name: Option<String> = None;
    for line in output.lines() {
        if !line.starts_with('\t') {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            // "HD Pro Webcam C920 (usb-0000:00:14.0-1):" -> keep the name part
            let name = trimmed.split(" (").next().unwrap_or(trimmed);
            current_name = Some(name.trim_end_matches(':').to_string());
        } else if let Some(name) = &current_name {
            let path = line.trim();
            if let Some(index) = path
                .strip_prefix("/dev/video")
                .and_then(|n| n.parse::<u32>().ok())
            {
                if !devices.iter().any(|d| &d.name == name) {
                    devices.push(CameraInfo {
                        index,
                        name: name.clone(),
                    });
                }
            }
        }
    }
    devices.sort_by_key(|d| d.index);
    devices
}

/// Parses `ffmpeg -list_formats all -f v4l2 -i /dev/videoN` output.
///
/// Collects resolutions from MJPEG format blocks whose advertised frame rate
/// meets `min_fps`, deduplicated and sorted by pixel count.
pub fn parse_format_list(output: &str, min_fps: f64) -> Vec<(u32, u32)> {
    let mut found: Vec<(u32, u32)> = Vec::new();
    let mut in_mjpeg_block = false;
    for raw in output.lines() {
        let line = raw.trim();
        if line.starts_with('[') && line.contains(']') {
            in_mjpeg_block = line.contains("'MJPG'") || line.contains("(Motion-JPEG)");
        }
        if !in_mjpeg_block || !line.starts_with("Size:") {
            continue;
        }
        let resolution = line.split_whitespace().find_map(parse_resolution);
        let fps = parse_fps(line);
        if let (Some(res), Some(fps)) = (resolution, fps) {
            if fps >= min_fps && !found.contains(&res) {
                found.push(res);
            }
        }
    }
    found.sort_by_key(|&(w, h)| u64::from(w) * u64::from(h));
    found
}

fn parse_resolution(word: &str) -> Option<(u32, u32)> {
    let (w, h) = word.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

/// Finds the first `<float> fps` annotation on the line.
fn parse_fps(line: &str) -> Option<f64> {
    let words: Vec<&str> = line
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .filter(|w| !w.is_empty())
        .collect();
    words
        .windows(2)
        .find(|pair| pair[1].starts_with("fps"))
        .and_then(|pair| pair[0].parse().ok())
}

/// Enumerates cameras via `v4l2-ctl`. Degrades to an empty list if the tool
/// is missing, exits non-zero, or prints something unparseable.
pub fn list_cameras() -> Vec<CameraInfo> {
    match Command::new("v4l2-ctl").arg("--list-devices").output() {
        Ok(out) if out.status.success() => {
            parse_device_list(&String::from_utf8_lossy(&out.stdout))
        }
        Ok(out) => {
            warn!(status = %out.status, "v4l2-ctl exited abnormally");
            Vec::new()
        }
        Err(err) => {
            warn!(%err, "could not run v4l2-ctl");
            Vec::new()
        }
    }
}

/// Probes MJPEG resolutions for every enumerated camera via `ffmpeg`.
///
/// ffmpeg prints format listings to stderr and exits non-zero, so both
/// streams are parsed and the exit status is ignored.
pub fn probe_capabilities(min_fps: f64) -> Vec<CameraCapabilities> {
    list_cameras()
        .into_iter()
        .map(|camera| {
            let path = format!("/dev/video{}", camera.index);
            let resolutions = match Command::new("ffmpeg")
                .args(["-list_formats", "all", "-f", "v4l2", "-i", &path])
                .output()
            {
                Ok(out) => {
                    let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
                    text.push_str(&String::from_utf8_lossy(&out.stderr));
                    parse_format_list(&text, min_fps)
                }
                Err(err) => {
                    warn!(%err, %path, "could not run ffmpeg");
                    Vec::new()
                }
            };
            CameraCapabilities {
                index: camera.index,
                name: camera.name,
                resolutions,
            }
        })
        .collect()
}

/// Resolves a device index to a display name.
pub trait DeviceDirectory: Send {
    /// Never fails; unknown indices get a generic placeholder.
    fn name_of(&self, index: u32) -> String;
}

fn fallback_name(index: u32) -> String {
    format!("Camera {index}")
}

/// Directory backed by one cached `v4l2-ctl` enumeration pass.
pub struct SystemDirectory {
    cache: Mutex<Option<Vec<CameraInfo>>>,
}

impl SystemDirectory {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(None),
        }
    }
}

impl Default for SystemDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceDirectory for SystemDirectory {
    fn name_of(&self, index: u32) -> String {
        let mut cache = self.cache.lock();
        let cameras = cache.get_or_insert_with(list_cameras);
        cameras
            .iter()
            .find(|c| c.index == index)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| fallback_name(index))
    }
}

/// Fixed directory for tests and headless runs.
pub struct StaticDirectory {
    cameras: Vec<CameraInfo>,
}

impl StaticDirectory {
    pub fn new(cameras: Vec<CameraInfo>) -> Self {
        Self { cameras }
    }
}

impl DeviceDirectory for StaticDirectory {
    fn name_of(&self, index: u32) -> String {
        self.cameras
            .iter()
            .find(|c| c.index == index)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| fallback_name(index))
    }
}
