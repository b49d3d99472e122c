//! Output path expressions: where converted content gets nested.
//!
//! A path like `ul > li:fresh` is an ordered list of element specs;
//! wrapping nests content inside each spec from innermost (last) to
//! outermost (first). The zero-length path passes content through, and
//! the ignore path drops it entirely.

use std::collections::BTreeMap;

use super::{Element, HtmlNode, Tag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlPath {
    Elements(Vec<ElementSpec>),
    /// Produces no output and suppresses evaluation of the wrapped
    /// content thunk.
    Ignore,
}

/// One level of an output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpec {
    /// Tag-name choices; the first is canonical.
    pub tag_names: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub fresh: bool,
    pub separator: String,
}

impl ElementSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            tag_names: vec![name.into()],
            attributes: BTreeMap::new(),
            fresh: false,
            separator: String::new(),
        }
    }

    fn tag(&self) -> Tag {
        Tag {
            names: self.tag_names.clone(),
            attributes: self.attributes.clone(),
            fresh: self.fresh,
            separator: self.separator.clone(),
        }
    }
}

impl HtmlPath {
    /// The zero-length path: wrapping is the identity.
    pub fn empty() -> Self {
        HtmlPath::Elements(Vec::new())
    }

    /// Single non-fresh element, the shape of inline formatting defaults.
    pub fn collapsible_element(name: impl Into<String>) -> Self {
        HtmlPath::Elements(vec![ElementSpec::new(name)])
    }

    /// Single fresh element, the shape of block-level defaults.
    pub fn fresh_element(name: impl Into<String>) -> Self {
        HtmlPath::Elements(vec![ElementSpec {
            fresh: true,
            ..ElementSpec::new(name)
        }])
    }

    pub fn is_ignore(&self) -> bool {
        matches!(self, HtmlPath::Ignore)
    }

    /// Nest the produced content inside this path.
    ///
    /// The content is a thunk so `Ignore` can skip producing it at all,
    /// side effects included.
    pub fn wrap<F>(&self, children: F) -> Vec<HtmlNode>
    where
        F: FnOnce() -> Vec<HtmlNode>,
    {
        match self {
            HtmlPath::Ignore => Vec::new(),
            HtmlPath::Elements(specs) => {
                let mut nodes = children();
                for spec in specs.iter().rev() {
                    nodes = vec![HtmlNode::Element(Element {
                        tag: spec.tag(),
                        children: nodes,
                    })];
                }
                nodes
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html;

    #[test]
    fn test_empty_path_is_identity() {
        let content = vec![html::text("hello")];
        assert_eq!(HtmlPath::empty().wrap(|| content.clone()), content);
    }

    #[test]
    fn test_wrap_nests_innermost_last() {
        let path = HtmlPath::Elements(vec![
            ElementSpec::new("ul"),
            ElementSpec::new("li"),
        ]);

        let nodes = path.wrap(|| vec![html::text("item")]);

        assert_eq!(nodes.len(), 1);
        let HtmlNode::Element(outer) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(outer.tag.name(), "ul");
        let HtmlNode::Element(inner) = &outer.children[0] else {
            panic!("expected element");
        };
        assert_eq!(inner.tag.name(), "li");
        assert_eq!(inner.children, vec![html::text("item")]);
    }

    #[test]
    fn test_ignore_drops_content_without_evaluating() {
        let mut evaluated = false;
        let nodes = HtmlPath::Ignore.wrap(|| {
            evaluated = true;
            vec![html::text("gone")]
        });

        assert!(nodes.is_empty());
        assert!(!evaluated);
    }
}
