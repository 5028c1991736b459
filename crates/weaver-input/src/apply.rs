//! Turning normalized text changes into model writes.
//!
//! A mutation batch is planned in full before anything is written: every
//! record is diffed, mapped to the model and turned into at most one remove
//! and one insert. The resulting [`ChangeBatch`] is then applied inside a
//! single model change, so a mapping failure never leaves half a batch behind.

use crate::diff::{TextDiff, diff};
use crate::error::InputError;
use crate::model::ModelWriter;
use crate::mutation::TextMutation;
use crate::selection::{SelectionTarget, local_hint, reconcile};
use crate::types::{Attributes, ModelPosition, ModelRange, SelectionHint};
use crate::view::ViewMapper;

/// One model write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeOp {
    Remove(ModelRange),
    Insert {
        at: ModelPosition,
        text: String,
        attributes: Attributes,
    },
}

/// Writes for one mutation batch, plus the selection to set afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub ops: Vec<ChangeOp>,
    pub selection: Option<SelectionTarget<ModelPosition>>,
}

impl ChangeBatch {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty() && self.selection.is_none()
    }

    /// Chars inserted by the batch.
    pub fn inserted_chars(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                ChangeOp::Insert { text, .. } => text.chars().count(),
                ChangeOp::Remove(_) => 0,
            })
            .sum()
    }

    /// Chars removed by the batch. Text mutations never span blocks.
    pub fn deleted_chars(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                ChangeOp::Remove(range) if !range.spans_blocks() => {
                    range.end.offset - range.start.offset
                }
                _ => 0,
            })
            .sum()
    }
}

/// Model writes for one diffed text node whose first char is at `origin`.
///
/// Always at most one remove followed by at most one insert, however
/// scattered the differences are.
pub fn plan_text_change(
    origin: ModelPosition,
    diff: &TextDiff,
    attributes: &Attributes,
) -> Vec<ChangeOp> {
    let at = origin.advanced(diff.common_prefix_len);
    let mut ops = Vec::with_capacity(2);

    if diff.deletion_len > 0 {
        ops.push(ChangeOp::Remove(ModelRange::new(
            at,
            at.advanced(diff.deletion_len),
        )));
    }
    if !diff.inserted.is_empty() {
        ops.push(ChangeOp::Insert {
            at,
            text: diff.inserted.clone(),
            attributes: attributes.clone(),
        });
    }

    ops
}

/// Net length changes of already planned records.
///
/// The view is only re-rendered after a whole batch, so every record is
/// mapped against the pre-batch view. Earlier edits in the same block move
/// the text of later records by their length delta.
#[derive(Clone, Debug, Default)]
pub struct PositionShift {
    edits: Vec<(ModelPosition, isize)>,
}

impl PositionShift {
    /// Positions at or after `from` (pre-batch coordinates) move by `delta`.
    pub fn record(&mut self, from: ModelPosition, delta: isize) {
        if delta != 0 {
            self.edits.push((from, delta));
        }
    }

    pub fn apply(&self, pos: ModelPosition) -> ModelPosition {
        let delta: isize = self
            .edits
            .iter()
            .filter(|(from, _)| from.block == pos.block && pos.offset >= from.offset)
            .map(|(_, delta)| delta)
            .sum();
        ModelPosition::new(pos.block, pos.offset.saturating_add_signed(delta))
    }
}

/// Plan the writes for a normalized mutation batch.
///
/// A hint pointing into a record's text wins: it becomes the batch selection
/// and only moves with the edits of later records. Without one, the
/// selection of the last record wins. A hint pointing elsewhere is mapped
/// through the view; if that fails the computed selection is kept.
pub fn plan_batch(
    mutations: &[TextMutation],
    view: &impl ViewMapper,
    hint: Option<&SelectionHint>,
    attributes: &Attributes,
) -> Result<ChangeBatch, InputError> {
    let mut batch = ChangeBatch::default();
    let mut shift = PositionShift::default();
    let mut hinted: Option<SelectionTarget<ModelPosition>> = None;

    for (index, mutation) in mutations.iter().enumerate() {
        let start = view
            .text_start(&mutation.target)
            .ok_or_else(|| InputError::Mapping(mutation.target.anchor_node().clone()))?;
        let origin = shift.apply(start);
        let text_diff = diff(&mutation.old_text, &mutation.new_text);
        let local = hint.and_then(|hint| local_hint(hint, &mutation.target));

        tracing::trace!(
            index,
            node = %mutation.target.anchor_node(),
            %origin,
            prefix = text_diff.common_prefix_len,
            deleted = text_diff.deletion_len,
            inserted = %text_diff.inserted.escape_debug(),
            "planning text change"
        );

        if text_diff.is_noop() && local.is_none() {
            continue;
        }

        batch
            .ops
            .extend(plan_text_change(origin, &text_diff, attributes));

        let edit_start = origin.advanced(text_diff.common_prefix_len);
        hinted = hinted.map(|target| {
            target.map(|pos| {
                follow_edit(pos, edit_start, text_diff.deletion_len, text_diff.len_delta())
            })
        });
        let selection = reconcile(&text_diff, local).map(|offset| origin.advanced(offset));
        if local.is_some() {
            hinted = Some(selection);
        } else if hinted.is_none() {
            batch.selection = Some(selection);
        }

        shift.record(
            start.advanced(text_diff.common_prefix_len + text_diff.deletion_len),
            text_diff.len_delta(),
        );
    }

    if let Some(target) = hinted {
        batch.selection = Some(target);
    } else if let Some(hint) = hint {
        match resolve_hint(view, hint) {
            Some(target) => batch.selection = Some(target.map(|pos| shift.apply(pos))),
            None => tracing::warn!(
                anchor = %hint.anchor.node,
                "selection hint could not be mapped, keeping computed selection"
            ),
        }
    }

    Ok(batch)
}

/// Move `pos` (already in batch coordinates) past an edit that removes
/// `deletion_len` chars at `start` and changes the length by `delta`.
///
/// A position at the edit start stays put, so a caret before an insertion
/// keeps its place.
fn follow_edit(
    pos: ModelPosition,
    start: ModelPosition,
    deletion_len: usize,
    delta: isize,
) -> ModelPosition {
    if pos.block != start.block || pos.offset <= start.offset {
        return pos;
    }
    if pos.offset < start.offset + deletion_len {
        return start;
    }
    ModelPosition::new(pos.block, pos.offset.saturating_add_signed(delta))
}

fn resolve_hint(
    view: &impl ViewMapper,
    hint: &SelectionHint,
) -> Option<SelectionTarget<ModelPosition>> {
    let anchor = view.to_model(&hint.anchor)?;
    if hint.is_collapsed() {
        return Some(SelectionTarget::Collapsed(anchor));
    }
    let focus = view.to_model(hint.focus())?;
    Some(SelectionTarget::Range { anchor, focus })
}

/// Apply a planned batch through `writer`.
pub fn apply_batch(writer: &mut dyn ModelWriter, batch: &ChangeBatch) -> Result<(), InputError> {
    for op in &batch.ops {
        match op {
            ChangeOp::Remove(range) => delete_content(writer, *range)?,
            ChangeOp::Insert {
                at,
                text,
                attributes,
            } => writer.insert_text(*at, text, attributes)?,
        }
    }
    if let Some(selection) = &batch.selection {
        let (anchor, focus) = selection.endpoints();
        writer.set_selection(anchor, focus)?;
    }
    Ok(())
}

/// Remove `range`, merging the blocks at its ends if it crosses a block
/// boundary.
pub fn delete_content(writer: &mut dyn ModelWriter, range: ModelRange) -> Result<(), InputError> {
    if range.is_collapsed() {
        return Ok(());
    }
    writer.remove_range(range)?;
    if range.spans_blocks() {
        writer.merge_blocks(range.start.block)?;
    }
    Ok(())
}
