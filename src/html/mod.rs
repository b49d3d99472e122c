//! Intermediate HTML tree.
//!
//! The conversion engine produces this tree; the simplifier rewrites it;
//! the writers serialize it. It is deliberately small: elements, text,
//! a force-write marker, and deferred placeholders.

pub mod path;
pub mod simplify;

pub use path::{ElementSpec, HtmlPath};
pub use simplify::simplify;

use std::collections::BTreeMap;

/// Identity and merge metadata of an output element.
///
/// `names` is the tag-name choice list from the originating path element;
/// the first entry is the canonical name used when writing. `fresh`
/// elements never merge with an adjacent sibling; non-fresh elements merge
/// when identities match, inserting `separator` between merged content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub names: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub fresh: bool,
    pub separator: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, fresh: bool) -> Self {
        Self {
            names: vec![name.into()],
            attributes: BTreeMap::new(),
            fresh,
            separator: String::new(),
        }
    }

    /// Canonical tag name.
    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or("")
    }
}

/// Placeholder identity for content resolved after the main tree walk.
pub type DeferredId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum HtmlNode {
    Element(Element),
    Text(String),
    /// No rendered content; keeps an otherwise-empty ancestor alive
    /// through pruning.
    ForceWrite,
    /// Stands in for content produced out of band (images); substituted
    /// in place before simplification.
    Deferred(DeferredId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: Tag,
    pub children: Vec<HtmlNode>,
}

impl Element {
    /// Void elements are self-closing and survive pruning with no children.
    pub fn is_void(&self) -> bool {
        matches!(self.tag.name(), "br" | "hr" | "img" | "input")
    }
}

pub fn text(value: impl Into<String>) -> HtmlNode {
    HtmlNode::Text(value.into())
}

pub fn fresh_element(
    name: impl Into<String>,
    attributes: BTreeMap<String, String>,
    children: Vec<HtmlNode>,
) -> HtmlNode {
    element_with_tag(
        Tag {
            attributes,
            ..Tag::new(name, true)
        },
        children,
    )
}

pub fn non_fresh_element(
    name: impl Into<String>,
    attributes: BTreeMap<String, String>,
    children: Vec<HtmlNode>,
) -> HtmlNode {
    element_with_tag(
        Tag {
            attributes,
            ..Tag::new(name, false)
        },
        children,
    )
}

pub fn element_with_tag(tag: Tag, children: Vec<HtmlNode>) -> HtmlNode {
    HtmlNode::Element(Element { tag, children })
}
