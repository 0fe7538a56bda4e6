use serde::{Deserialize, Serialize};

use crate::marker::Marker;

fn default_resolution() -> (u32, u32) {
    (1920, 1080)
}

/// The persisted session document: which camera was in use, at what
/// resolution, and the full marker list.
///
/// All fields are defaulted on load so older or hand-edited files still
/// open; the marker list itself is the only payload that matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFile {
    #[serde(default)]
    pub camera_name: String,
    #[serde(default)]
    pub camera_index: u32,
    #[serde(default = "default_resolution")]
    pub resolution: (u32, u32),
    #[serde(default)]
    pub markers: Vec<Marker>,
}

impl Default for SessionFile {
    fn default() -> Self {
        Self {
            camera_name: String::new(),
            camera_index: 0,
            resolution: default_resolution(),
            markers: Vec::new(),
        }
    }
}
