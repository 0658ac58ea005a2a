//! Two-stack undo/redo history of snapshots.

use super::snapshot::Snapshot;
use tracing::{debug, instrument};

/// Undo and redo stacks of [`Snapshot`]s.
///
/// Recording a new move discards the redo lineage. Undoing pushes the live
/// state that is being left onto the redo stack so that an immediate redo
/// reproduces it exactly.
#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
}

impl CommandHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the state before a move and invalidates any redo lineage.
    #[instrument(skip_all, fields(undo_len = self.undo.len()))]
    pub fn record_before_move(&mut self, snapshot: Snapshot) {
        self.undo.push(snapshot);
        if !self.redo.is_empty() {
            debug!(discarded = self.redo.len(), "New move discards redo lineage");
            self.redo.clear();
        }
    }

    /// Pops `steps` snapshots and returns the oldest of them.
    ///
    /// `live` is the state being left; it goes onto the redo stack. Returns
    /// `None` and leaves both stacks untouched if fewer than `steps` entries
    /// exist or `steps` is zero.
    #[instrument(skip(self, live), fields(undo_len = self.undo.len()))]
    pub fn undo(&mut self, steps: usize, live: Snapshot) -> Option<Snapshot> {
        if steps == 0 || self.undo.len() < steps {
            debug!(steps, "Not enough history to undo");
            return None;
        }

        let keep = self.undo.len() - steps;
        let restored = self.undo.drain(keep..).next()?;
        self.redo.push(live);
        Some(restored)
    }

    /// Pops one snapshot from the redo stack, pushing `live` onto the undo stack.
    #[instrument(skip(self, live), fields(redo_len = self.redo.len()))]
    pub fn redo(&mut self, live: Snapshot) -> Option<Snapshot> {
        let restored = self.redo.pop()?;
        self.undo.push(live);
        Some(restored)
    }

    /// Returns true if an undo of `steps` would succeed.
    pub fn can_undo(&self, steps: usize) -> bool {
        steps > 0 && self.undo.len() >= steps
    }

    /// Returns true if a redo would succeed.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Depth of the undo stack.
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Depth of the redo stack.
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Drops both stacks.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
