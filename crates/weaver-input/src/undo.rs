//! Undo/redo history for the reference model.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `History<S>` - snapshot history where changes of one batch form one step

use crate::types::BatchId;

/// Trait for managing undo/redo operations.
///
/// Implementations must actually perform the undo/redo, not just track state.
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Perform undo. Returns true if successful.
    fn undo(&mut self) -> bool;

    /// Perform redo. Returns true if successful.
    fn redo(&mut self) -> bool;

    /// Clear all undo/redo history.
    fn clear_history(&mut self);
}

#[derive(Debug, Clone)]
struct Step<S> {
    batch: BatchId,
    /// State to restore when this step is undone (or redone).
    state: S,
}

/// Snapshot-based undo history keyed by batch.
///
/// The owner calls [`History::record`] with the state *before* each change.
/// Consecutive changes under the same batch only keep the first snapshot,
/// so they undo together.
#[derive(Debug, Clone)]
pub struct History<S> {
    undo_stack: Vec<Step<S>>,
    redo_stack: Vec<Step<S>>,
    max_steps: usize,
}

impl<S> History<S> {
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps: max_steps.max(1),
        }
    }

    /// Record `before` as the state preceding a change in `batch`.
    pub fn record(&mut self, batch: BatchId, before: S) {
        // Clear redo stack on new edit
        self.redo_stack.clear();

        if self.undo_stack.last().is_some_and(|step| step.batch == batch) {
            return;
        }

        self.undo_stack.push(Step {
            batch,
            state: before,
        });

        // Trim if over max
        if self.undo_stack.len() > self.max_steps {
            let excess = self.undo_stack.len() - self.max_steps;
            self.undo_stack.drain(..excess);
        }
    }

    /// Pop the latest step, storing `current` for redo. Returns the state to
    /// restore.
    pub fn undo(&mut self, current: S) -> Option<S> {
        let step = self.undo_stack.pop()?;
        self.redo_stack.push(Step {
            batch: step.batch,
            state: current,
        });
        Some(step.state)
    }

    /// Inverse of [`History::undo`].
    pub fn redo(&mut self, current: S) -> Option<S> {
        let step = self.redo_stack.pop()?;
        self.undo_stack.push(Step {
            batch: step.batch,
            state: current,
        });
        Some(step.state)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo steps.
    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
