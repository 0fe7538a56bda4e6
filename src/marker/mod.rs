// Marker domain — annotation records and the per-device undo/redo store.

pub mod store;
pub mod types;

pub use store::{Action, DeviceState};
pub use types::{Marker, MarkerShape, MarkerStyle, Rgb};
