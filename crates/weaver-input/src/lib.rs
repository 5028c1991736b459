//! weaver-input: Input reconciliation for the weaver editor, without DOM
//! dependencies.
//!
//! This crate provides:
//! - `diff` - minimal prefix/suffix trim between old and new text
//! - `normalize` - mutation records to text changes (NBSP cleanup, empty-block typing)
//! - `reconcile` - where the selection lands after a change
//! - `plan_batch` / `apply_batch` - text changes to model writes, one undoable change per batch
//! - `KeystrokeGate` - removes a selection before a printable key replaces it
//! - `InputHandler` - all of the above wired to an `EditorModel` and a `ChangeBuffer`
//! - `PlainModel` / `PlainView` - in-memory model and view for hosts and tests

pub mod apply;
pub mod buffer;
pub mod command;
pub mod config;
pub mod diff;
pub mod error;
pub mod events;
pub mod gate;
pub mod handler;
pub mod model;
pub mod mutation;
pub mod plain;
pub mod selection;
pub mod types;
pub mod undo;
pub mod view;

pub use apply::{
    ChangeBatch, ChangeOp, PositionShift, apply_batch, delete_content, plan_batch,
    plan_text_change,
};
pub use buffer::{ChangeBuffer, TypingBuffer};
pub use command::InputCommand;
pub use config::InputConfig;
pub use diff::{TextDiff, diff};
pub use error::{InputError, UnsupportedMutation};
pub use events::{EventChannel, Subscription, ViewEvent};
pub use gate::{GateDecision, GateState, KeyEvent, KeystrokeGate, is_safe_keystroke};
pub use handler::{
    EditSummary, EventOutcome, InputHandler, KeydownOutcome, MutationOutcome, SelectionOutcome,
};
pub use model::{EditorModel, ModelOp, ModelWriter};
pub use mutation::{
    ChildrenMutation, MutationRecord, NBSP, NbspPolicy, TextMutation, TextTarget,
    classify_children, normalize,
};
pub use plain::{Block, Inline, PlainModel};
pub use selection::{SelectionTarget, local_hint, reconcile};
pub use smol_str::SmolStr;
pub use types::{
    Attributes, BatchId, ModelPosition, ModelRange, ModelSelection, NodeRef, SelectionHint,
    ViewNode, ViewPosition,
};
pub use undo::{History, UndoManager};
pub use view::{PlainView, ViewMapper};
