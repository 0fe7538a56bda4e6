use serde::{Deserialize, Serialize};

use crate::marker::Marker;

/// Messages flowing Capture Engine → Control Surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Update {
    /// Full replacement of the mirrored marker list. Sent after every
    /// successful mutation so the surface resynchronises instead of
    /// applying diffs.
    SyncMarkers { markers: Vec<Marker> },
    /// The active capture session changed (device, name or resolution).
    StatusUpdate {
        name: String,
        index: u32,
        resolution: (u32, u32),
    },
    /// Ask the operator to confirm deleting this marker.
    ConfirmDeleteMarker { index: usize, marker: Marker },
    /// Ask the surface to open the property editor for this marker.
    ShowDescriptionDialogForMarker { index: usize },
    /// The engine hit a fatal condition or was asked to quit; the surface
    /// should shut down.
    ExitGui,
}
