use crate::marker::types::Marker;

/// A reversible record of one marker-list mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Add {
        marker: Marker,
    },
    Delete {
        index: usize,
        marker: Marker,
    },
    Modify {
        index: usize,
        old: Marker,
        new: Marker,
    },
}

/// Per-device annotation state: the marker list plus its undo/redo history.
///
/// One `DeviceState` exists per device index, created lazily on first
/// reference and kept for the process lifetime. Every mutating operation
/// pushes exactly one [`Action`] onto the undo stack and clears the redo
/// stack; `undo`/`redo` only move existing actions between the two stacks.
#[derive(Debug, Default, Clone)]
pub struct DeviceState {
    markers: Vec<Marker>,
    undo_stack: Vec<Action>,
    redo_stack: Vec<Action>,
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Append a marker.
    pub fn add(&mut self, marker: Marker) {
        self.redo_stack.clear();
        self.markers.push(marker.clone());
        self.undo_stack.push(Action::Add { marker });
    }

    /// Remove the marker at `index`. A stale out-of-range index is a silent
    /// no-op (`false`) — the list may have changed between the request being
    /// issued and handled.
    pub fn delete(&mut self, index: usize) -> bool {
        if index >= self.markers.len() {
            return false;
        }
        let marker = self.markers.remove(index);
        self.undo_stack.push(Action::Delete { index, marker });
        self.redo_stack.clear();
        true
    }

    /// Replace the marker at `index` wholesale. Out-of-range is a silent
    /// no-op (`false`).
    pub fn modify(&mut self, index: usize, new: Marker) -> bool {
        if index >= self.markers.len() {
            return false;
        }
        let old = std::mem::replace(&mut self.markers[index], new.clone());
        self.undo_stack.push(Action::Modify { index, old, new });
        self.redo_stack.clear();
        true
    }

    /// Revert the most recent mutation. Returns `false` when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.undo_stack.pop() else {
            return false;
        };
        match &action {
            Action::Add { .. } => {
                self.markers.pop();
            }
            Action::Delete { index, marker } => {
                self.markers.insert(*index, marker.clone());
            }
            Action::Modify { index, old, .. } => {
                self.markers[*index] = old.clone();
            }
        }
        self.redo_stack.push(action);
        true
    }

    /// Reapply the most recently undone mutation. Returns `false` when the
    /// redo stack is empty.
    pub fn redo(&mut self) -> bool {
        let Some(action) = self.redo_stack.pop() else {
            return false;
        };
        match &action {
            Action::Add { marker } => {
                self.markers.push(marker.clone());
            }
            Action::Delete { index, .. } => {
                self.markers.remove(*index);
            }
            Action::Modify { index, new, .. } => {
                self.markers[*index] = new.clone();
            }
        }
        self.undo_stack.push(action);
        true
    }

    /// Empty the marker list and both history stacks. Not itself undoable.
    pub fn clear(&mut self) {
        self.markers.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Replace the whole list, discarding history. Used when loading a
    /// session file.
    pub fn replace_all(&mut self, markers: Vec<Marker>) {
        self.markers = markers;
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Index of the marker nearest to `target` (sensor space, squared
    /// Euclidean distance). Ties keep the lowest index. `None` when the list
    /// is empty.
    pub fn nearest(&self, target: (f64, f64)) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, marker) in self.markers.iter().enumerate() {
            let dx = f64::from(marker.pos.0) - target.0;
            let dy = f64::from(marker.pos.1) - target.1;
            let dist_sq = dx * dx + dy * dy;
            if best.map_or(true, |(_, d)| dist_sq < d) {
                best = Some((i, dist_sq));
            }
        }
        best.map(|(i, _)| i)
    }

    #[cfg(test)]
    pub(crate) fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[cfg(test)]
    pub(crate) fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
}
