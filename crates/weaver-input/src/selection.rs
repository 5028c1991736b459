//! Where the selection lands after a text change.

use crate::diff::TextDiff;
use crate::mutation::TextTarget;
use crate::types::{ModelPosition, NodeRef, SelectionHint, ViewPosition};

/// A selection target, either collapsed or a directed range.
///
/// `P` is a char offset into the new text of one text node while a change is
/// being reconciled, and a [`ModelPosition`] once it has been placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionTarget<P = usize> {
    Collapsed(P),
    Range { anchor: P, focus: P },
}

impl<P> SelectionTarget<P> {
    pub fn anchor(&self) -> &P {
        match self {
            Self::Collapsed(at) => at,
            Self::Range { anchor, .. } => anchor,
        }
    }

    pub fn focus(&self) -> &P {
        match self {
            Self::Collapsed(at) => at,
            Self::Range { focus, .. } => focus,
        }
    }

    /// Convert every position with `f`, keeping the shape.
    pub fn map<Q>(self, mut f: impl FnMut(P) -> Q) -> SelectionTarget<Q> {
        match self {
            Self::Collapsed(at) => SelectionTarget::Collapsed(f(at)),
            Self::Range { anchor, focus } => SelectionTarget::Range {
                anchor: f(anchor),
                focus: f(focus),
            },
        }
    }
}

impl<P: PartialEq> SelectionTarget<P> {
    pub fn is_collapsed(&self) -> bool {
        self.anchor() == self.focus()
    }
}

impl SelectionTarget<ModelPosition> {
    /// `(anchor, focus)` pair, as taken by the model writer.
    pub fn endpoints(&self) -> (ModelPosition, ModelPosition) {
        (*self.anchor(), *self.focus())
    }
}

/// Decide the selection after `diff` was applied.
///
/// A hint wins verbatim. Without one the caret goes after the inserted text,
/// or to the junction of a pure deletion.
pub fn reconcile(diff: &TextDiff, hint: Option<SelectionTarget>) -> SelectionTarget {
    if let Some(hint) = hint {
        return match hint {
            SelectionTarget::Range { anchor, focus } if anchor == focus => {
                SelectionTarget::Collapsed(anchor)
            }
            other => other,
        };
    }

    if diff.inserted.is_empty() {
        SelectionTarget::Collapsed(diff.common_prefix_len)
    } else {
        SelectionTarget::Collapsed(diff.common_prefix_len + diff.inserted_len())
    }
}

/// The part of `hint` expressed in offsets of the changed text, if both its
/// ends point into that text node.
pub fn local_hint(hint: &SelectionHint, target: &TextTarget) -> Option<SelectionTarget> {
    let node = view_ref(target);
    let offset_in = |pos: &ViewPosition| (pos.node == node).then_some(pos.offset);

    let anchor = offset_in(&hint.anchor)?;
    if hint.is_collapsed() {
        return Some(SelectionTarget::Collapsed(anchor));
    }
    let focus = offset_in(hint.focus())?;
    Some(SelectionTarget::Range { anchor, focus })
}

/// The reference the platform uses for the text node behind `target`.
///
/// Freshly inserted text nodes have no id, so they are addressed by parent and
/// index, the same way [`NodeRef::text_in`] names them.
fn view_ref(target: &TextTarget) -> NodeRef {
    match target {
        TextTarget::Node(node) => node.clone(),
        TextTarget::NewChild { parent, index } => NodeRef::text_in(parent, *index),
    }
}
