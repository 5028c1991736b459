//! Mutation records and their normalization into text changes.
//!
//! The platform reports low-level changes per view node. Only two shapes are
//! meaningful for typing: a text node whose content changed, and a text node
//! appended to an element (typing into an empty block, or after an inline
//! element). Everything else is dropped and the view resyncs from the model
//! on the next render.

use serde::{Deserialize, Serialize};

use crate::error::UnsupportedMutation;
use crate::types::{NodeRef, ViewNode};

/// Non-breaking space, as inserted by browsers at text boundaries.
pub const NBSP: char = '\u{00A0}';

/// One observed view change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationRecord {
    Text(TextMutation),
    Children(ChildrenMutation),
}

impl MutationRecord {
    /// Text change of an existing text node.
    pub fn text(node: impl Into<NodeRef>, old_text: &str, new_text: &str) -> Self {
        Self::Text(TextMutation {
            old_text: old_text.to_string(),
            new_text: new_text.to_string(),
            target: TextTarget::Node(node.into()),
        })
    }

    /// Change of the child list of `parent`.
    pub fn children(
        parent: impl Into<NodeRef>,
        old_children: Vec<ViewNode>,
        new_children: Vec<ViewNode>,
    ) -> Self {
        Self::Children(ChildrenMutation {
            old_children,
            new_children,
            parent: parent.into(),
        })
    }
}

/// Where the text of a [`TextMutation`] lives in the (pre-mutation) view.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextTarget {
    /// An existing text node.
    Node(NodeRef),
    /// A text node newly inserted as child `index` of `parent`.
    NewChild { parent: NodeRef, index: usize },
}

impl TextTarget {
    /// The node a view position must reference to fall inside this text.
    pub fn text_node(&self) -> Option<&NodeRef> {
        match self {
            TextTarget::Node(node) => Some(node),
            TextTarget::NewChild { .. } => None,
        }
    }

    /// Node used in log lines and mapping errors.
    pub fn anchor_node(&self) -> &NodeRef {
        match self {
            TextTarget::Node(node) => node,
            TextTarget::NewChild { parent, .. } => parent,
        }
    }
}

/// Content change of a single text node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextMutation {
    pub old_text: String,
    pub new_text: String,
    pub target: TextTarget,
}

impl TextMutation {
    /// Apply the NBSP rewrite rules of `policy`.
    pub fn normalized(mut self, policy: NbspPolicy) -> Self {
        match policy {
            NbspPolicy::Boundary => {
                self.new_text = rewrite_boundary_nbsp(&self.old_text, &self.new_text);
            }
            NbspPolicy::All => {
                self.old_text = self.old_text.replace(NBSP, " ");
                self.new_text = self.new_text.replace(NBSP, " ");
            }
        }
        self
    }
}

/// Change of an element's child list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildrenMutation {
    pub old_children: Vec<ViewNode>,
    pub new_children: Vec<ViewNode>,
    pub parent: NodeRef,
}

/// How non-breaking spaces inserted by the browser are rewritten.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NbspPolicy {
    /// Only a new leading or trailing NBSP becomes a space. Interior NBSPs
    /// and boundary NBSPs already present in the old text are kept.
    #[default]
    Boundary,
    /// Every NBSP in old and new text becomes a space.
    All,
}

/// Normalize a mutation batch into text changes, in order.
///
/// Unsupported children mutations are dropped.
pub fn normalize(records: &[MutationRecord], policy: NbspPolicy) -> Vec<TextMutation> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match record {
            MutationRecord::Text(mutation) => Some(mutation.clone().normalized(policy)),
            MutationRecord::Children(mutation) => match classify_children(mutation) {
                Ok(text) => Some(text.normalized(policy)),
                Err(reason) => {
                    tracing::debug!(
                        index,
                        parent = %mutation.parent,
                        old_children = mutation.old_children.len(),
                        new_children = mutation.new_children.len(),
                        %reason,
                        "dropping unsupported children mutation"
                    );
                    None
                }
            },
        })
        .collect()
}

/// Turn a children mutation into a text change, if it is a single text node
/// appended after an unchanged run of existing children.
pub fn classify_children(mutation: &ChildrenMutation) -> Result<TextMutation, UnsupportedMutation> {
    let old = &mutation.old_children;
    let new = &mutation.new_children;

    if new.len() < old.len() {
        return Err(UnsupportedMutation::RemovedNodes);
    }
    if new[..old.len()] != old[..] {
        let lost_node = old.iter().any(|node| !new.contains(node));
        return Err(if lost_node {
            UnsupportedMutation::RemovedNodes
        } else {
            UnsupportedMutation::NotTrailingAppend
        });
    }

    match &new[old.len()..] {
        [] => Err(UnsupportedMutation::NoInsertedNodes),
        [ViewNode::Text { text, .. }] => Ok(TextMutation {
            old_text: String::new(),
            new_text: text.to_string(),
            target: TextTarget::NewChild {
                parent: mutation.parent.clone(),
                index: old.len(),
            },
        }),
        [ViewNode::Element { .. }] => Err(UnsupportedMutation::InsertedElement),
        _ => Err(UnsupportedMutation::MultipleInsertedNodes),
    }
}

fn rewrite_boundary_nbsp(old: &str, new: &str) -> String {
    let mut chars: Vec<char> = new.chars().collect();

    if chars.first() == Some(&NBSP) && !old.starts_with(NBSP) {
        chars[0] = ' ';
    }
    if let Some(last) = chars.last_mut() {
        if *last == NBSP && !old.ends_with(NBSP) {
            *last = ' ';
        }
    }

    chars.into_iter().collect()
}
