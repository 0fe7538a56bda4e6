use serde::{Deserialize, Serialize};

use crate::marker::{Marker, MarkerShape, Rgb};
use crate::session::SessionFile;

/// Messages flowing Control Surface → Capture Engine.
///
/// The surface never mutates engine state directly; every change is
/// requested through one of these commands and confirmed by an
/// [`Update`](crate::protocol::Update) snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Exit,
    SwitchCamera { index: u32 },
    RestartCamera,
    /// The operator confirmed the deletion previously proposed via
    /// `confirm_delete_marker`. A stale index is silently ignored.
    DeleteMarkerConfirmed { index: usize },
    UpdateMarker { index: usize, marker: Marker },
    SetResolution { width: u32, height: u32 },
    SetProperty { name: String, value: i32 },
    ClearMarkers,
    LoadFile { session: SessionFile },
    SetMarkerShape { shape: MarkerShape },
    SetMarkerColor { color: Rgb },
    SetMarkerSize { size: u32 },
    GetCurrentMarkers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_serialise_with_snake_case_tags() {
        let json = serde_json::to_value(Command::SwitchCamera { index: 2 }).unwrap();
        assert_eq!(json["type"], "switch_camera");
        assert_eq!(json["index"], 2);

        let json = serde_json::to_value(Command::Exit).unwrap();
        assert_eq!(json["type"], "exit");
    }

    #[test]
    fn set_property_carries_name_and_value() {
        let cmd = Command::SetProperty {
            name: "brightness".to_string(),
            value: 180,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let restored: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(cmd, restored);
    }

    #[test]
    fn load_file_round_trips_with_payload() {
        let cmd = Command::LoadFile {
            session: SessionFile {
                camera_name: "USB Camera".to_string(),
                camera_index: 1,
                resolution: (1600, 1200),
                markers: vec![],
            },
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let restored: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(cmd, restored);
    }
}
