/// Zoom bounds and step factor for wheel input.
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 10.0;
pub const ZOOM_STEP: f64 = 1.2;

/// Wheel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Zoom/pan model for the displayed feed.
///
/// The frame is rotated 180° before display, so window space and sensor
/// space are related by a reflection (`W-1-x`, `H-1-y`) in addition to the
/// pan offset and zoom scale. Invariants: `zoom` stays within
/// [`MIN_ZOOM`, `MAX_ZOOM`]; the view window never extends past the sensor
/// bounds; `zoom == 1.0` implies zero pan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    zoom: f64,
    pan_x: i32,
    pan_y: i32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: MIN_ZOOM,
            pan_x: 0,
            pan_y: 0,
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> (i32, i32) {
        (self.pan_x, self.pan_y)
    }

    /// Map a window-space point to an integer sensor-space position,
    /// undoing pan, zoom and the 180° rotation.
    pub fn window_to_sensor(&self, x: f64, y: f64, width: u32, height: u32) -> (i32, i32) {
        let (rx, ry) = self.window_to_rotated(x, y);
        let sensor_x = f64::from(width) - 1.0 - rx;
        let sensor_y = f64::from(height) - 1.0 - ry;
        (sensor_x.round() as i32, sensor_y.round() as i32)
    }

    /// Map a window-space point to sensor space without rounding. Used for
    /// nearest-marker distance comparisons.
    pub fn window_to_sensor_f64(&self, x: f64, y: f64, width: u32, height: u32) -> (f64, f64) {
        let (rx, ry) = self.window_to_rotated(x, y);
        (
            f64::from(width) - 1.0 - rx,
            f64::from(height) - 1.0 - ry,
        )
    }

    /// Point on the rotated (but unzoomed) frame under the given window
    /// pixel.
    fn window_to_rotated(&self, x: f64, y: f64) -> (f64, f64) {
        (
            f64::from(self.pan_x) + x / self.zoom,
            f64::from(self.pan_y) + y / self.zoom,
        )
    }

    /// Where a sensor-space position lands on the rotated frame, before the
    /// view crop/resize. Markers are drawn here.
    pub fn sensor_to_draw(pos: (i32, i32), width: u32, height: u32) -> (i32, i32) {
        (width as i32 - 1 - pos.0, height as i32 - 1 - pos.1)
    }

    /// Apply one wheel step anchored at window point `(x, y)`: the sensor
    /// point under the cursor stays under the cursor across the zoom change.
    pub fn zoom_at(&mut self, x: f64, y: f64, dir: ZoomDirection, width: u32, height: u32) {
        let target = match dir {
            ZoomDirection::In => (self.zoom * ZOOM_STEP).min(MAX_ZOOM),
            ZoomDirection::Out => (self.zoom / ZOOM_STEP).max(MIN_ZOOM),
        };
        self.set_zoom_anchored(x, y, target, width, height);
    }

    /// Set an absolute zoom level while keeping the point under `(x, y)`
    /// fixed. Zoom at or below 1.0 resets the pan.
    pub fn set_zoom_anchored(&mut self, x: f64, y: f64, zoom: f64, width: u32, height: u32) {
        let (img_x, img_y) = self.window_to_rotated(x, y);
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);

        if self.zoom <= MIN_ZOOM {
            self.pan_x = 0;
            self.pan_y = 0;
        } else {
            self.pan_x = (img_x - x / self.zoom).round() as i32;
            self.pan_y = (img_y - y / self.zoom).round() as i32;
        }
        self.clamp_pan(width, height);
    }

    /// Shift the view by a pointer drag delta measured in window pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64, width: u32, height: u32) {
        self.pan_x -= (dx / self.zoom).round() as i32;
        self.pan_y -= (dy / self.zoom).round() as i32;
        self.clamp_pan(width, height);
    }

    /// Re-establish the pan invariant after any zoom or pan change.
    pub fn clamp_pan(&mut self, width: u32, height: u32) {
        let (view_w, view_h) = self.view_size(width, height);
        self.pan_x = self.pan_x.clamp(0, width as i32 - view_w as i32);
        self.pan_y = self.pan_y.clamp(0, height as i32 - view_h as i32);
    }

    /// Size of the visible sensor-space rectangle, truncated like the view
    /// crop itself and never smaller than a pixel.
    pub fn view_size(&self, width: u32, height: u32) -> (u32, u32) {
        let view_w = ((f64::from(width) / self.zoom) as u32).max(1);
        let view_h = ((f64::from(height) / self.zoom) as u32).max(1);
        (view_w.min(width), view_h.min(height))
    }

    /// The visible rectangle on the rotated frame: `(x, y, w, h)`.
    pub fn view_rect(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let (view_w, view_h) = self.view_size(width, height);
        (self.pan_x as u32, self.pan_y as u32, view_w, view_h)
    }

    #[cfg(test)]
    pub(crate) fn with(zoom: f64, pan_x: i32, pan_y: i32) -> Self {
        Self { zoom, pan_x, pan_y }
    }
}
