//! Live camera feed annotation for PCB inspection work.
//!
//! A capture engine streams one camera, rotates the feed 180° to match the
//! bench mounting, draws operator-placed markers, and exposes a zoom/pan
//! view. A control surface on another thread mirrors the annotation state
//! and drives the engine through a typed command channel; sessions persist
//! as JSON.

pub mod capture;
pub mod engine;
pub mod input;
pub mod marker;
pub mod protocol;
pub mod session;
pub mod surface;
pub mod view;

pub use capture::{CaptureBackend, CaptureDevice, CaptureError, Frame};
pub use engine::{CaptureEngine, EngineConfig};
pub use marker::{Marker, MarkerShape, MarkerStyle, Rgb};
pub use protocol::{channel_pair, Command, EngineHandle, SurfaceHandle, Update};
pub use session::SessionFile;
pub use surface::{SurfaceEvent, SurfaceMirror};
pub use view::ViewState;
