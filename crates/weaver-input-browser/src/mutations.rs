//! DOM `MutationRecord`s to input-core mutation records.

use wasm_bindgen::JsCast;
use weaver_input::{MutationRecord, NodeRef};

use crate::dom::{element_ref, node_ref, view_node};

/// Convert one DOM mutation record.
///
/// Returns `None` for attribute changes and for records whose target is
/// not an editor node; those never reach the input core.
pub fn convert_record(record: &web_sys::MutationRecord) -> Option<MutationRecord> {
    match record.type_().as_str() {
        "characterData" => convert_text(record),
        "childList" => convert_children(record),
        other => {
            tracing::trace!(kind = other, "ignoring mutation record");
            None
        }
    }
}

/// Convert every record of one observer flush, in order.
pub fn convert_records(records: &js_sys::Array) -> Vec<MutationRecord> {
    records
        .iter()
        .filter_map(|record| record.dyn_into::<web_sys::MutationRecord>().ok())
        .filter_map(|record| convert_record(&record))
        .collect()
}

fn convert_text(record: &web_sys::MutationRecord) -> Option<MutationRecord> {
    let target = record.target()?;
    // Named by the node's current child index. If an earlier childList
    // record in the same flush inserted a sibling before it, the index no
    // longer matches the rendered view: the edit lands on the wrong node or
    // the batch fails to map.
    let node = node_ref(&target)?;
    let Some(old_text) = record.old_value() else {
        tracing::debug!(%node, "text mutation without old value, observer lacks characterDataOldValue");
        return None;
    };
    let new_text = target.text_content().unwrap_or_default();
    Some(MutationRecord::text(node, &old_text, &new_text))
}

/// Rebuild the child list before the mutation from the current children,
/// the added and removed nodes and the previous sibling.
///
/// Nodes that survive keep the reference they had in the old list, so the
/// core can tell an append from a rewrite. Added nodes have no reference.
fn convert_children(record: &web_sys::MutationRecord) -> Option<MutationRecord> {
    let target = record.target()?;
    let parent = element_ref(target.dyn_ref::<web_sys::Element>()?)?;

    let added = nodes(&record.added_nodes());
    let removed = nodes(&record.removed_nodes());
    let current = nodes(&target.child_nodes());

    let mut old: Vec<web_sys::Node> = current
        .iter()
        .filter(|node| !contains(&added, node))
        .cloned()
        .collect();
    let at = match record.previous_sibling() {
        Some(previous) => match position(&old, &previous) {
            Some(index) => index + 1,
            None => {
                tracing::debug!(%parent, "previous sibling is gone, skipping child list record");
                return None;
            }
        },
        None => 0,
    };
    old.splice(at..at, removed);

    let old_refs: Vec<Option<NodeRef>> = old
        .iter()
        .enumerate()
        .map(|(index, node)| stable_ref(node, &parent, index))
        .collect();
    let old_children = old
        .iter()
        .zip(&old_refs)
        .map(|(node, node_ref)| view_node(node, node_ref.clone()))
        .collect();
    let new_children = current
        .iter()
        .map(|node| {
            let node_ref = position(&old, node).and_then(|index| old_refs[index].clone());
            view_node(node, node_ref)
        })
        .collect();

    Some(MutationRecord::children(parent, old_children, new_children))
}

fn stable_ref(node: &web_sys::Node, parent: &NodeRef, index: usize) -> Option<NodeRef> {
    match node.node_type() {
        web_sys::Node::TEXT_NODE => Some(NodeRef::text_in(parent, index)),
        _ => element_ref(node.dyn_ref::<web_sys::Element>()?),
    }
}

fn nodes(list: &web_sys::NodeList) -> Vec<web_sys::Node> {
    (0..list.length()).filter_map(|i| list.get(i)).collect()
}

fn position(list: &[web_sys::Node], node: &web_sys::Node) -> Option<usize> {
    list.iter().position(|n| n.is_same_node(Some(node)))
}

fn contains(list: &[web_sys::Node], node: &web_sys::Node) -> bool {
    position(list, node).is_some()
}
