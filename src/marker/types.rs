use serde::{Deserialize, Serialize};

/// An RGB colour triple. Serialises as a three-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const GREEN: Rgb = Rgb(0, 255, 0);
    pub const BLUE: Rgb = Rgb(0, 0, 255);
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
}

/// Shape used when drawing a marker onto the frame.
///
/// Serialised capitalised (`"Cross"`) to match the persisted session file
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerShape {
    Cross,
    Circle,
    Square,
}

/// An operator-placed point annotation.
///
/// `pos` is in sensor space — the coordinate system of the raw, un-rotated
/// frame as delivered by the device. Markers are immutable once constructed;
/// edits replace the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub pos: (i32, i32),
    pub shape: MarkerShape,
    pub color: Rgb,
    pub size: u32,
    #[serde(default)]
    pub desc: String,
}

impl Marker {
    /// Construct a marker with an empty description.
    pub fn new(pos: (i32, i32), style: &MarkerStyle) -> Self {
        Self {
            pos,
            shape: style.shape,
            color: style.color,
            size: style.size,
            desc: String::new(),
        }
    }
}

impl Default for Marker {
    fn default() -> Self {
        Marker::new((0, 0), &MarkerStyle::default())
    }
}

/// Style applied to newly placed markers. Adjusted via the
/// `set_marker_shape` / `set_marker_color` / `set_marker_size` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStyle {
    pub shape: MarkerShape,
    pub color: Rgb,
    pub size: u32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            shape: MarkerShape::Cross,
            color: Rgb::RED,
            size: 15,
        }
    }
}
