//! Control-surface state: a read-only mirror of the engine's annotation
//! state, rebuilt from Update snapshots.
//!
//! The surface never edits this mirror directly; it issues commands and
//! waits for the engine to confirm with a fresh snapshot.

use std::collections::HashMap;

use crate::marker::Marker;
use crate::protocol::Update;
use crate::session::SessionFile;

/// What the widget layer should do in response to one applied update.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// The marker table or status bar is stale; redraw it.
    RefreshTable,
    /// Prompt the operator to confirm the deletion, then send
    /// `delete_marker_confirmed` if they agree.
    ConfirmDelete { index: usize, marker: Marker },
    /// Open the marker property editor for this index.
    EditMarker { index: usize },
    /// The engine is gone; tear the window down.
    Exit,
}

/// Mirrored engine state, one marker list per device index.
pub struct SurfaceMirror {
    devices: HashMap<u32, Vec<Marker>>,
    active_index: u32,
    camera_name: String,
    resolution: (u32, u32),
}

impl Default for SurfaceMirror {
    fn default() -> Self {
        Self {
            devices: HashMap::new(),
            active_index: 0,
            camera_name: "Default".to_string(),
            resolution: (1920, 1080),
        }
    }
}

impl SurfaceMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers of the active device, as last synced.
    pub fn markers(&self) -> &[Marker] {
        self.devices
            .get(&self.active_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn active_index(&self) -> u32 {
        self.active_index
    }

    pub fn camera_name(&self) -> &str {
        &self.camera_name
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// Fold one update into the mirror.
    ///
    /// A status update switches the active mirror first; the marker sync
    /// that follows a camera switch then lands on the new device's list.
    pub fn apply(&mut self, update: Update) -> Option<SurfaceEvent> {
        match update {
            Update::SyncMarkers { markers } => {
                self.devices.insert(self.active_index, markers);
                Some(SurfaceEvent::RefreshTable)
            }
            Update::StatusUpdate {
                name,
                index,
                resolution,
            } => {
                self.camera_name = name;
                self.active_index = index;
                self.resolution = resolution;
                Some(SurfaceEvent::RefreshTable)
            }
            Update::ConfirmDeleteMarker { index, marker } => {
                Some(SurfaceEvent::ConfirmDelete { index, marker })
            }
            Update::ShowDescriptionDialogForMarker { index } => {
                Some(SurfaceEvent::EditMarker { index })
            }
            Update::ExitGui => Some(SurfaceEvent::Exit),
        }
    }

    /// Snapshot the active mirror as a saveable session document.
    pub fn session_file(&self) -> SessionFile {
        SessionFile {
            camera_name: self.camera_name.clone(),
            camera_index: self.active_index,
            resolution: self.resolution,
            markers: self.markers().to_vec(),
        }
    }
}
