//! View-to-model mapping and the reference view renderer.

use std::collections::HashMap;

use smol_str::format_smolstr;

use crate::mutation::TextTarget;
use crate::plain::{Inline, PlainModel};
use crate::types::{ModelPosition, NodeRef, ViewNode, ViewPosition};

/// Maps view nodes of the last render back to model positions.
///
/// `None` means the node is unknown to the current view (a stale reference),
/// which aborts the batch being handled.
pub trait ViewMapper {
    /// Model position of the first char of the text behind `target`.
    fn text_start(&self, target: &TextTarget) -> Option<ModelPosition>;

    /// Model position of a view position.
    fn to_model(&self, position: &ViewPosition) -> Option<ModelPosition>;
}

#[derive(Clone, Debug)]
struct TextEntry {
    start: ModelPosition,
    text: String,
}

#[derive(Clone, Debug)]
struct Container {
    start: ModelPosition,
    children: Vec<ViewNode>,
    /// Model length of each child.
    lengths: Vec<usize>,
}

impl Container {
    fn child_start(&self, index: usize) -> Option<ModelPosition> {
        (index <= self.lengths.len())
            .then(|| self.start.advanced(self.lengths[..index].iter().sum()))
    }
}

/// View tree rendered from a [`PlainModel`].
///
/// Block `b` renders as element `p-{b}`. Unformatted runs are direct text
/// children (`p-{b}-t{i}`), formatted runs are wrapped in a `span`
/// (`p-{b}-n{i}`, text `p-{b}-n{i}-t0`), inline elements are `p-{b}-n{i}`.
#[derive(Clone, Debug, Default)]
pub struct PlainView {
    blocks: Vec<NodeRef>,
    containers: HashMap<NodeRef, Container>,
    texts: HashMap<NodeRef, TextEntry>,
}

impl PlainView {
    pub fn render(model: &PlainModel) -> Self {
        let mut view = Self::default();

        for (b, block) in model.blocks().iter().enumerate() {
            let block_ref = NodeRef::new(format_smolstr!("p-{b}"));
            let block_start = ModelPosition::new(b, 0);
            let mut children = Vec::with_capacity(block.items().len());
            let mut lengths = Vec::with_capacity(block.items().len());
            let mut offset = 0;

            for (i, item) in block.items().iter().enumerate() {
                let start = ModelPosition::new(b, offset);
                let node = match item {
                    Inline::Text { text, attributes } if attributes.is_empty() => {
                        let node = NodeRef::text_in(&block_ref, i);
                        view.add_text(node.clone(), start, text);
                        ViewNode::Text {
                            node: Some(node),
                            text: text.as_str().into(),
                        }
                    }
                    Inline::Text { text, .. } => {
                        let wrapper = NodeRef::new(format_smolstr!("{block_ref}-n{i}"));
                        let node = NodeRef::text_in(&wrapper, 0);
                        view.add_text(node.clone(), start, text);
                        view.containers.insert(
                            wrapper.clone(),
                            Container {
                                start,
                                children: vec![ViewNode::Text {
                                    node: Some(node),
                                    text: text.as_str().into(),
                                }],
                                lengths: vec![item.len()],
                            },
                        );
                        ViewNode::Element {
                            node: Some(wrapper),
                            name: "span".into(),
                        }
                    }
                    Inline::Element { name } => {
                        let node = NodeRef::new(format_smolstr!("{block_ref}-n{i}"));
                        view.containers.insert(
                            node.clone(),
                            Container {
                                start,
                                children: Vec::new(),
                                lengths: Vec::new(),
                            },
                        );
                        ViewNode::Element {
                            node: Some(node),
                            name: name.clone(),
                        }
                    }
                };
                children.push(node);
                lengths.push(item.len());
                offset += item.len();
            }

            view.containers.insert(
                block_ref.clone(),
                Container {
                    start: block_start,
                    children,
                    lengths,
                },
            );
            view.blocks.push(block_ref);
        }

        view
    }

    fn add_text(&mut self, node: NodeRef, start: ModelPosition, text: &str) {
        self.texts.insert(
            node,
            TextEntry {
                start,
                text: text.to_string(),
            },
        );
    }

    pub fn block_ref(&self, block: usize) -> Option<&NodeRef> {
        self.blocks.get(block)
    }

    /// Children of block `block`, as a mutation record would list them.
    pub fn children(&self, block: usize) -> Vec<ViewNode> {
        self.block_ref(block)
            .and_then(|node| self.children_of(node))
            .map(<[ViewNode]>::to_vec)
            .unwrap_or_default()
    }

    pub fn children_of(&self, node: &NodeRef) -> Option<&[ViewNode]> {
        self.containers.get(node).map(|c| c.children.as_slice())
    }

    /// The text node rendered for child `child` of block `block`, looking
    /// through formatting wrappers.
    pub fn text_node(&self, block: usize, child: usize) -> Option<NodeRef> {
        let children = self.children_of(self.block_ref(block)?)?;
        match children.get(child)? {
            ViewNode::Text { node, .. } => node.clone(),
            ViewNode::Element { node, .. } => {
                let inner = self.children_of(node.as_ref()?)?;
                inner.first()?.node_ref().cloned()
            }
        }
    }

    pub fn text_of(&self, node: &NodeRef) -> Option<&str> {
        self.texts.get(node).map(|entry| entry.text.as_str())
    }

    /// Position of a text node the view has not rendered yet, named
    /// `<parent>-t<index>` after its place in `parent`.
    fn fresh_text_start(&self, node: &NodeRef) -> Option<ModelPosition> {
        let (parent, index) = node.as_str().rsplit_once("-t")?;
        let index: usize = index.parse().ok()?;
        self.containers
            .get(&NodeRef::new(parent))?
            .child_start(index)
    }
}

impl ViewMapper for PlainView {
    fn text_start(&self, target: &TextTarget) -> Option<ModelPosition> {
        match target {
            TextTarget::Node(node) => self.texts.get(node).map(|entry| entry.start),
            TextTarget::NewChild { parent, index } => {
                self.containers.get(parent)?.child_start(*index)
            }
        }
    }

    fn to_model(&self, position: &ViewPosition) -> Option<ModelPosition> {
        if let Some(entry) = self.texts.get(&position.node) {
            return (position.offset <= entry.text.chars().count())
                .then(|| entry.start.advanced(position.offset));
        }
        if let Some(container) = self.containers.get(&position.node) {
            return container.child_start(position.offset);
        }
        self.fresh_text_start(&position.node)
            .map(|start| start.advanced(position.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EditorModel;

    fn view_of(markup: &str) -> (PlainModel, PlainView) {
        let model = PlainModel::from_markup(markup).unwrap();
        let view = PlainView::render(&model);
        (model, view)
    }

    #[test]
    fn test_refs_and_children() {
        let (_, view) = view_of(
            "<paragraph>foo<$text bold=\"true\">bar</$text><image></image></paragraph>",
        );
        let children = view.children(0);
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].node_ref(), Some(&NodeRef::new("p-0-t0")));
        assert_eq!(children[1].node_ref(), Some(&NodeRef::new("p-0-n1")));
        assert_eq!(children[2].node_ref(), Some(&NodeRef::new("p-0-n2")));

        assert_eq!(view.text_node(0, 1), Some(NodeRef::new("p-0-n1-t0")));
        assert_eq!(view.text_node(0, 2), None);
        assert_eq!(view.text_of(&NodeRef::new("p-0-n1-t0")), Some("bar"));
    }

    #[test]
    fn test_text_start() {
        let (_, view) = view_of(
            "<paragraph>x</paragraph><paragraph>foo<$text bold=\"true\">bar</$text></paragraph>",
        );
        assert_eq!(
            view.text_start(&TextTarget::Node(NodeRef::new("p-1-n1-t0"))),
            Some(ModelPosition::new(1, 3))
        );
        assert_eq!(
            view.text_start(&TextTarget::NewChild {
                parent: NodeRef::new("p-1"),
                index: 2
            }),
            Some(ModelPosition::new(1, 6))
        );
        assert_eq!(
            view.text_start(&TextTarget::Node(NodeRef::new("p-9-t0"))),
            None
        );
    }

    #[test]
    fn test_to_model() {
        let (_, view) = view_of("<paragraph>foo<image></image></paragraph>");
        assert_eq!(
            view.to_model(&ViewPosition::new("p-0-t0", 2)),
            Some(ModelPosition::new(0, 2))
        );
        assert_eq!(view.to_model(&ViewPosition::new("p-0-t0", 4)), None);
        assert_eq!(
            view.to_model(&ViewPosition::new("p-0", 2)),
            Some(ModelPosition::new(0, 4))
        );
        // Text node typed after the image, not rendered yet.
        assert_eq!(
            view.to_model(&ViewPosition::new("p-0-t2", 1)),
            Some(ModelPosition::new(0, 5))
        );
    }

    #[test]
    fn test_empty_block() {
        let model = PlainModel::default();
        let view = PlainView::render(&model);
        assert!(view.children(0).is_empty());
        assert_eq!(
            view.text_start(&TextTarget::NewChild {
                parent: NodeRef::new("p-0"),
                index: 0
            }),
            Some(ModelPosition::new(0, 0))
        );
        assert!(model.selection().attributes.is_empty());
    }
}
