//! Reading view node references and positions out of the live DOM.
//!
//! Elements rendered by the editor carry their reference in `id` (or
//! `data-node-id`). Text nodes have none, so they are named after their
//! parent and child index, matching [`NodeRef::text_in`].

use smol_str::SmolStr;
use wasm_bindgen::JsCast;
use weaver_input::{NodeRef, SelectionHint, ViewNode, ViewPosition};

/// Reference carried by an editor element.
pub fn element_ref(element: &web_sys::Element) -> Option<NodeRef> {
    element
        .get_attribute("id")
        .or_else(|| element.get_attribute("data-node-id"))
        .map(NodeRef::from)
}

/// Index of `node` among its parent's child nodes.
pub fn child_index(node: &web_sys::Node) -> Option<usize> {
    let parent = node.parent_node()?;
    let children = parent.child_nodes();
    (0..children.length())
        .find(|&i| children.get(i).is_some_and(|child| child.is_same_node(Some(node))))
        .map(|i| i as usize)
}

/// Reference for any node in the editing root.
pub fn node_ref(node: &web_sys::Node) -> Option<NodeRef> {
    match node.node_type() {
        web_sys::Node::ELEMENT_NODE => element_ref(node.dyn_ref::<web_sys::Element>()?),
        web_sys::Node::TEXT_NODE => {
            let parent = node.parent_element()?;
            Some(NodeRef::text_in(&element_ref(&parent)?, child_index(node)?))
        }
        _ => None,
    }
}

/// The node as a mutation record lists it, under an explicit reference.
///
/// Comments and other node types have no place in the model and are
/// reported as elements so they fail classification.
pub fn view_node(node: &web_sys::Node, node_ref: Option<NodeRef>) -> ViewNode {
    if node.node_type() == web_sys::Node::TEXT_NODE {
        ViewNode::Text {
            node: node_ref,
            text: SmolStr::from(node.text_content().unwrap_or_default()),
        }
    } else {
        ViewNode::Element {
            node: node_ref,
            name: SmolStr::from(node.node_name().to_ascii_lowercase()),
        }
    }
}

/// Convert a UTF-16 offset into `text` to a char offset.
///
/// An offset inside a surrogate pair rounds down to the start of that char,
/// and offsets past the end clamp to the char count.
pub fn utf16_to_char_offset(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (chars, c) in text.chars().enumerate() {
        let width = c.len_utf16();
        if units + width > utf16_offset {
            return chars;
        }
        units += width;
    }
    text.chars().count()
}

/// View position for a DOM selection endpoint.
///
/// Text offsets arrive in UTF-16 units; element offsets are child indices
/// and pass through unchanged.
pub fn view_position(node: &web_sys::Node, offset: u32) -> Option<ViewPosition> {
    let node_ref = node_ref(node)?;
    let offset = if node.node_type() == web_sys::Node::TEXT_NODE {
        let text = node.text_content().unwrap_or_default();
        utf16_to_char_offset(&text, offset as usize)
    } else {
        offset as usize
    };
    Some(ViewPosition::new(node_ref, offset))
}

/// The current DOM selection as a hint, if it is inside editor nodes.
pub fn selection_hint(selection: &web_sys::Selection) -> Option<SelectionHint> {
    let anchor = view_position(&selection.anchor_node()?, selection.anchor_offset())?;
    if selection.is_collapsed() {
        return Some(SelectionHint::collapsed(anchor));
    }
    let focus = view_position(&selection.focus_node()?, selection.focus_offset())?;
    Some(SelectionHint::range(anchor, focus))
}

/// Read the window's selection as a hint.
pub fn window_selection_hint() -> Option<SelectionHint> {
    let selection = web_sys::window()?.get_selection().ok()??;
    let hint = selection_hint(&selection);
    if hint.is_none() {
        tracing::trace!("window selection is outside editor nodes");
    }
    hint
}
