// Message protocol — the two typed channels between surface and engine.

pub mod channel;
pub mod command;
pub mod update;

pub use channel::{channel_pair, EngineHandle, SurfaceHandle};
pub use command::Command;
pub use update::Update;
