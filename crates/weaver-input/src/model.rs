//! Contracts the input core expects from the document model.
//!
//! The core never owns the model. It reads the current selection and issues
//! writes inside a scoped, undoable change. [`crate::plain::PlainModel`] is an
//! in-memory implementation of these traits.

use crate::error::InputError;
use crate::types::{Attributes, BatchId, ModelPosition, ModelRange, ModelSelection};

/// Write access to the model, valid only inside [`EditorModel::change`].
pub trait ModelWriter {
    /// Insert `text` at `at`, formatted with exactly `attributes`.
    fn insert_text(
        &mut self,
        at: ModelPosition,
        text: &str,
        attributes: &Attributes,
    ) -> Result<(), InputError>;

    /// Remove the content of `range`.
    ///
    /// A range spanning blocks removes the tail of the start block, every
    /// block in between and the head of the end block. The two remaining
    /// blocks stay separate until [`ModelWriter::merge_blocks`].
    fn remove_range(&mut self, range: ModelRange) -> Result<(), InputError>;

    /// Merge block `first + 1` into block `first`.
    fn merge_blocks(&mut self, first: usize) -> Result<(), InputError>;

    fn set_selection(
        &mut self,
        anchor: ModelPosition,
        focus: ModelPosition,
    ) -> Result<(), InputError>;
}

/// A document model the input core can edit.
pub trait EditorModel {
    /// Current selection, including the attributes typed text would get.
    fn selection(&self) -> ModelSelection;

    /// Run `f` as one atomic change.
    ///
    /// Changes made under the same `batch` form one undo step. If `f` fails
    /// the model must be left exactly as it was before the call.
    fn change<R>(
        &mut self,
        batch: BatchId,
        f: impl FnOnce(&mut dyn ModelWriter) -> Result<R, InputError>,
    ) -> Result<R, InputError>;
}

/// One call made on a [`ModelWriter`], as recorded by the reference model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelOp {
    Insert {
        at: ModelPosition,
        text: String,
        attributes: Attributes,
    },
    Remove(ModelRange),
    Merge(usize),
    Select {
        anchor: ModelPosition,
        focus: ModelPosition,
    },
}

impl ModelOp {
    pub fn is_insert(&self) -> bool {
        matches!(self, Self::Insert { .. })
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, Self::Remove(_))
    }
}
