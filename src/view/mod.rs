// View domain — the zoom/pan transform between window and sensor space.

pub mod transform;

pub use transform::{ViewState, ZoomDirection, MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};
