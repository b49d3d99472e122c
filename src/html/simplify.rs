//! Tree simplification passes.
//!
//! Two passes run in order:
//!
//! 1. **Prune** - remove empty text nodes and elements left childless,
//!    keeping void elements and anything holding a force-write marker
//! 2. **Collapse** - merge runs of adjacent non-fresh elements that share
//!    a tag identity, so fragmented inline formatting coalesces
//!
//! The result is stable: simplifying an already-simplified tree is the
//! identity.

use super::{HtmlNode, Tag};

/// Run both passes over a node list, producing a new tree.
pub fn simplify(nodes: Vec<HtmlNode>) -> Vec<HtmlNode> {
    collapse(prune(nodes))
}

fn prune(nodes: Vec<HtmlNode>) -> Vec<HtmlNode> {
    nodes.into_iter().filter_map(prune_node).collect()
}

fn prune_node(node: HtmlNode) -> Option<HtmlNode> {
    match node {
        HtmlNode::Text(value) if value.is_empty() => None,
        HtmlNode::Element(mut element) => {
            element.children = prune(element.children);
            if element.children.is_empty() && !element.is_void() {
                None
            } else {
                Some(HtmlNode::Element(element))
            }
        }
        other => Some(other),
    }
}

fn collapse(nodes: Vec<HtmlNode>) -> Vec<HtmlNode> {
    let mut collapsed = Vec::new();
    for node in nodes {
        append_collapsed(&mut collapsed, collapse_node(node));
    }
    collapsed
}

fn collapse_node(node: HtmlNode) -> HtmlNode {
    match node {
        HtmlNode::Element(mut element) => {
            element.children = collapse(element.children);
            HtmlNode::Element(element)
        }
        other => other,
    }
}

/// Append `node`, merging it into the previous sibling when eligible.
///
/// Merging appends the candidate's separator (if any) and then its
/// children, each re-checked against the sibling's new last child so
/// chains of mergeable content flatten in one scan.
fn append_collapsed(children: &mut Vec<HtmlNode>, node: HtmlNode) {
    let mergeable = match (&node, children.last()) {
        (HtmlNode::Element(candidate), Some(HtmlNode::Element(previous))) => {
            !candidate.tag.fresh && matches_tag(&candidate.tag, &previous.tag)
        }
        _ => false,
    };

    if !mergeable {
        children.push(node);
        return;
    }

    let candidate = match node {
        HtmlNode::Element(element) => element,
        _ => return,
    };
    if let Some(HtmlNode::Element(previous)) = children.last_mut() {
        if !candidate.tag.separator.is_empty() {
            previous
                .children
                .push(HtmlNode::Text(candidate.tag.separator.clone()));
        }
        for grandchild in candidate.children {
            append_collapsed(&mut previous.children, grandchild);
        }
    }
}

/// A candidate matches when its name choices include the sibling's
/// canonical name and the attributes are identical.
fn matches_tag(candidate: &Tag, previous: &Tag) -> bool {
    candidate.names.iter().any(|name| name == previous.name())
        && candidate.attributes == previous.attributes
}
