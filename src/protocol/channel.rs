use std::sync::mpsc::{self, Receiver, Sender};

use tracing::debug;

use crate::protocol::{Command, Update};

/// The Control Surface's end: sends commands, polls updates.
pub struct SurfaceHandle {
    commands: Sender<Command>,
    updates: Receiver<Update>,
}

/// The Capture Engine's end: polls commands, sends updates.
pub struct EngineHandle {
    commands: Receiver<Command>,
    updates: Sender<Update>,
}

/// Build the two ordered, unbounded channels connecting the surface and the
/// engine. Neither direction ever blocks the other side.
pub fn channel_pair() -> (SurfaceHandle, EngineHandle) {
    let (command_tx, command_rx) = mpsc::channel();
    let (update_tx, update_rx) = mpsc::channel();
    (
        SurfaceHandle {
            commands: command_tx,
            updates: update_rx,
        },
        EngineHandle {
            commands: command_rx,
            updates: update_tx,
        },
    )
}

impl SurfaceHandle {
    /// Send a command. A departed engine is normal during shutdown and is
    /// logged, not an error.
    pub fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("engine gone, command dropped");
        }
    }

    /// Fetch one pending update, if any. Never blocks.
    pub fn try_update(&self) -> Option<Update> {
        self.updates.try_recv().ok()
    }
}

impl EngineHandle {
    /// Fetch one pending command, if any. An empty queue means "no command
    /// this tick", never an error.
    pub fn try_command(&self) -> Option<Command> {
        self.commands.try_recv().ok()
    }

    /// Send an update. A departed surface is logged, not an error.
    pub fn send(&self, update: Update) {
        if self.updates.send(update).is_err() {
            debug!("surface gone, update dropped");
        }
    }
}
