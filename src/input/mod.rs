//! Pointer-event state machine.
//!
//! Classifies raw pointer events forwarded by the video window into semantic
//! actions — marker placement, undo, delete/describe requests, pan gestures
//! and zoom — and applies them to the view transform and the active device
//! state. The window toolkit itself never interprets gestures.

use crate::marker::{DeviceState, Marker, MarkerStyle};
use crate::view::{ViewState, ZoomDirection};

/// Squared displacement (window pixels) separating a right-click from the
/// start of a pan drag.
pub const DRAG_THRESHOLD_SQ: i64 = 5 * 5;

/// Pointer buttons as reported by the video window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

/// A raw pointer event in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    ButtonDown {
        button: PointerButton,
        x: i32,
        y: i32,
        shift: bool,
    },
    ButtonUp {
        button: PointerButton,
        x: i32,
        y: i32,
    },
    Moved {
        x: i32,
        y: i32,
    },
    Wheel {
        x: i32,
        y: i32,
        direction: ZoomDirection,
    },
}

/// Side effect of dispatching one pointer event, to be translated into
/// Update messages by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEffect {
    /// The marker list changed; emit a full snapshot.
    MarkersChanged,
    /// Ask the operator to confirm deleting this marker. Nothing is mutated
    /// until the confirmation command arrives.
    ConfirmDelete { index: usize, marker: Marker },
    /// Ask the operator to edit this marker's properties.
    DescribeMarker { index: usize },
}

/// Right-button gesture progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    Idle,
    /// Button down, displacement still within [`DRAG_THRESHOLD_SQ`].
    Pressed { start: (i32, i32) },
    Panning { last: (i32, i32) },
}

/// Everything a pointer event may touch.
pub struct DispatchContext<'a> {
    pub view: &'a mut ViewState,
    pub state: &'a mut DeviceState,
    pub style: &'a MarkerStyle,
    pub frame_width: u32,
    pub frame_height: u32,
}

/// The pointer-event state machine.
#[derive(Debug, Default)]
pub struct Dispatcher {
    drag: DragState,
}

impl Default for DragState {
    fn default() -> Self {
        DragState::Idle
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw pointer event through the state machine.
    pub fn dispatch(&mut self, event: PointerEvent, ctx: &mut DispatchContext<'_>) -> Vec<InputEffect> {
        let (w, h) = (ctx.frame_width, ctx.frame_height);
        let mut effects = Vec::new();

        match event {
            PointerEvent::ButtonDown {
                button: PointerButton::Left,
                x,
                y,
                ..
            } => {
                let pos = ctx.view.window_to_sensor(f64::from(x), f64::from(y), w, h);
                ctx.state.add(Marker::new(pos, ctx.style));
                effects.push(InputEffect::MarkersChanged);
            }
            PointerEvent::ButtonDown {
                button: PointerButton::Middle,
                x,
                y,
                shift,
            } => {
                if shift {
                    if let Some(effect) = self.nearest_request(ctx, x, y, RequestKind::Delete) {
                        effects.push(effect);
                    }
                } else if ctx.state.undo() {
                    effects.push(InputEffect::MarkersChanged);
                }
            }
            PointerEvent::ButtonDown {
                button: PointerButton::Right,
                x,
                y,
                ..
            } => {
                // Panning only makes sense when zoomed in.
                if ctx.view.zoom() > 1.0 {
                    self.drag = DragState::Pressed { start: (x, y) };
                }
            }
            PointerEvent::Moved { x, y } => {
                if let DragState::Pressed { start } = self.drag {
                    let dx = i64::from(x - start.0);
                    let dy = i64::from(y - start.1);
                    if dx * dx + dy * dy > DRAG_THRESHOLD_SQ {
                        // The first panning delta is measured from the press
                        // point, not from this move event.
                        self.drag = DragState::Panning { last: start };
                    }
                }
                if let DragState::Panning { last } = &mut self.drag {
                    let (dx, dy) = (f64::from(x - last.0), f64::from(y - last.1));
                    ctx.view.pan_by(dx, dy, w, h);
                    *last = (x, y);
                }
            }
            PointerEvent::ButtonUp {
                button: PointerButton::Right,
                x,
                y,
            } => {
                if matches!(self.drag, DragState::Pressed { .. }) {
                    if let Some(effect) = self.nearest_request(ctx, x, y, RequestKind::Describe) {
                        effects.push(effect);
                    }
                }
                self.drag = DragState::Idle;
            }
            PointerEvent::Wheel { x, y, direction } => {
                ctx.view
                    .zoom_at(f64::from(x), f64::from(y), direction, w, h);
            }
            PointerEvent::ButtonUp { .. } => {}
        }

        ctx.view.clamp_pan(w, h);
        effects
    }

    /// Whether a pan gesture is currently active.
    pub fn is_panning(&self) -> bool {
        matches!(self.drag, DragState::Panning { .. })
    }

    fn nearest_request(
        &self,
        ctx: &mut DispatchContext<'_>,
        x: i32,
        y: i32,
        kind: RequestKind,
    ) -> Option<InputEffect> {
        let target = ctx.view.window_to_sensor_f64(
            f64::from(x),
            f64::from(y),
            ctx.frame_width,
            ctx.frame_height,
        );
        let index = ctx.state.nearest(target)?;
        Some(match kind {
            RequestKind::Delete => InputEffect::ConfirmDelete {
                index,
                marker: ctx.state.markers()[index].clone(),
            },
            RequestKind::Describe => InputEffect::DescribeMarker { index },
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum RequestKind {
    Delete,
    Describe,
}
