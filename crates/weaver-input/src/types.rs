//! Core input types: view node references, model positions, selections and
//! formatting attributes.
//!
//! These types are shared by every stage of the input pipeline and carry no
//! behaviour beyond small helpers. All offsets are in Unicode scalar values
//! (chars), not bytes or UTF-16.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

/// Opaque reference to a node in the view tree.
///
/// Elements are referenced by their id (`p-0`, `p-0-n1`). Text nodes have no
/// id of their own, so they are referenced by their parent and child index
/// (`p-0-t0`), see [`NodeRef::text_in`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef(SmolStr);

impl NodeRef {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    /// Reference for the text node at `index` among the children of `parent`.
    pub fn text_in(parent: &NodeRef, index: usize) -> Self {
        Self(format_smolstr!("{}-t{}", parent.0, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A node as seen in a mutation record.
///
/// The input core only cares whether a node is text or an element, and for
/// text nodes, what they contain. Nodes the browser just created may not have
/// a reference yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewNode {
    Text {
        node: Option<NodeRef>,
        text: SmolStr,
    },
    Element {
        node: Option<NodeRef>,
        name: SmolStr,
    },
}

impl ViewNode {
    /// A text node without a reference (typically freshly inserted).
    pub fn text(text: impl Into<SmolStr>) -> Self {
        Self::Text {
            node: None,
            text: text.into(),
        }
    }

    /// An element without a reference (typically freshly inserted).
    pub fn element(name: impl Into<SmolStr>) -> Self {
        Self::Element {
            node: None,
            name: name.into(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }

    pub fn node_ref(&self) -> Option<&NodeRef> {
        match self {
            Self::Text { node, .. } | Self::Element { node, .. } => node.as_ref(),
        }
    }

    /// Text content for text nodes, `None` for elements.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            Self::Element { .. } => None,
        }
    }
}

/// A position in the view: a node plus an offset inside it.
///
/// For text nodes the offset counts chars, for elements it is a child index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewPosition {
    pub node: NodeRef,
    pub offset: usize,
}

impl ViewPosition {
    pub fn new(node: impl Into<NodeRef>, offset: usize) -> Self {
        Self {
            node: node.into(),
            offset,
        }
    }
}

impl From<String> for NodeRef {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Post-mutation selection reported by the platform (e.g. after a
/// spellchecker replacement). A hint without a focus is collapsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionHint {
    pub anchor: ViewPosition,
    pub focus: Option<ViewPosition>,
}

impl SelectionHint {
    pub fn collapsed(at: ViewPosition) -> Self {
        Self {
            anchor: at,
            focus: None,
        }
    }

    pub fn range(anchor: ViewPosition, focus: ViewPosition) -> Self {
        Self {
            anchor,
            focus: Some(focus),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.focus.as_ref().is_none_or(|f| *f == self.anchor)
    }

    /// The focus position, which equals the anchor for collapsed hints.
    pub fn focus(&self) -> &ViewPosition {
        self.focus.as_ref().unwrap_or(&self.anchor)
    }
}

/// A position in the document model: block index plus char offset in it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ModelPosition {
    pub block: usize,
    pub offset: usize,
}

impl ModelPosition {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }

    /// Same block, `by` chars further.
    pub fn advanced(self, by: usize) -> Self {
        Self {
            block: self.block,
            offset: self.offset + by,
        }
    }
}

impl fmt::Display for ModelPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block, self.offset)
    }
}

/// Ordered model range (`start <= end`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelRange {
    pub start: ModelPosition,
    pub end: ModelPosition,
}

impl ModelRange {
    /// Build a range from two positions in any order.
    pub fn new(a: ModelPosition, b: ModelPosition) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn collapsed(at: ModelPosition) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Whether the range crosses at least one block boundary.
    pub fn spans_blocks(&self) -> bool {
        self.start.block != self.end.block
    }
}

/// Formatting attributes carried by text (`bold=true`, `linkHref=...`).
///
/// Ordered so that equality and rendering are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes(BTreeMap<SmolStr, SmolStr>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(SmolStr::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The model selection as seen by the input core.
///
/// `attributes` are the formatting attributes text typed at the selection
/// would receive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSelection {
    pub anchor: ModelPosition,
    pub focus: ModelPosition,
    pub attributes: Attributes,
}

impl ModelSelection {
    pub fn collapsed(at: ModelPosition) -> Self {
        Self {
            anchor: at,
            focus: at,
            attributes: Attributes::default(),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_backward(&self) -> bool {
        self.focus < self.anchor
    }

    /// Ordered range covered by the selection.
    pub fn range(&self) -> ModelRange {
        ModelRange::new(self.anchor, self.focus)
    }
}

/// Identity of one undo step, handed out by the change buffer.
///
/// Model changes made under the same batch id undo together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(pub u64);
