//! Complex-field resolution for hyperlink field codes.
//!
//! Word encodes computed content (hyperlinks, page references, author
//! fields) as *complex fields*: a begin marker, instruction text, an
//! optional separate marker, the displayed result, and an end marker.
//! Fields nest, so the resolver is an explicit stack consumed while the
//! body reader scans runs in document order.

use std::sync::LazyLock;

use regex::Regex;

/// One entry per open field, innermost last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEntry {
    /// A field whose instruction we do not interpret (AUTHOR, PAGEREF, ...).
    Unknown,
    Hyperlink(FieldHyperlink),
}

/// Parsed HYPERLINK instruction payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldHyperlink {
    /// `HYPERLINK "http://example.com"`
    External { href: String },
    /// `HYPERLINK \l "bookmark"`
    Anchor { name: String },
}

/// Stack machine driven by field-character markers.
#[derive(Debug, Default)]
pub struct FieldStack {
    entries: Vec<FieldEntry>,
    instr_text: String,
}

impl FieldStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// `begin` marker: open a new field and reset the instruction buffer.
    pub fn begin(&mut self) {
        self.entries.push(FieldEntry::Unknown);
        self.instr_text.clear();
    }

    /// Instruction text fragment. Fragments may be split across several
    /// adjacent markers, so they accumulate until `separate`.
    pub fn instr_text(&mut self, fragment: &str) {
        self.instr_text.push_str(fragment);
    }

    /// `separate` marker: interpret the accumulated instruction. An
    /// unparseable instruction leaves the entry unknown.
    pub fn separate(&mut self) {
        let code = std::mem::take(&mut self.instr_text);
        if let Some(hyperlink) = parse_hyperlink_field_code(&code)
            && let Some(top) = self.entries.last_mut()
        {
            *top = FieldEntry::Hyperlink(hyperlink);
        }
    }

    /// `end` marker: close the innermost field.
    pub fn end(&mut self) {
        self.entries.pop();
    }

    /// The topmost hyperlink entry, skipping unknown entries above it.
    ///
    /// An unrelated field nested inside a hyperlink (an AUTHOR field, say)
    /// must not break the hyperlink association for runs inside it.
    pub fn current_hyperlink(&self) -> Option<&FieldHyperlink> {
        self.entries.iter().rev().find_map(|entry| match entry {
            FieldEntry::Hyperlink(hyperlink) => Some(hyperlink),
            FieldEntry::Unknown => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static INTERNAL_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*HYPERLINK\s+\\l\s+"(.*)""#).expect("valid pattern"));

static EXTERNAL_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*HYPERLINK "(.*)""#).expect("valid pattern"));

fn parse_hyperlink_field_code(code: &str) -> Option<FieldHyperlink> {
    if let Some(captures) = INTERNAL_LINK.captures(code) {
        return Some(FieldHyperlink::Anchor {
            name: captures[1].to_string(),
        });
    }
    if let Some(captures) = EXTERNAL_LINK.captures(code) {
        return Some(FieldHyperlink::External {
            href: captures[1].to_string(),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyperlink_field_resolves_href() {
        let mut stack = FieldStack::new();
        stack.begin();
        stack.instr_text(" HYPERLINK \"http://example.com\"");
        stack.separate();

        assert_eq!(
            stack.current_hyperlink(),
            Some(&FieldHyperlink::External {
                href: "http://example.com".to_string()
            })
        );

        stack.end();
        assert_eq!(stack.current_hyperlink(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_instruction_text_accumulates_across_fragments() {
        let mut stack = FieldStack::new();
        stack.begin();
        stack.instr_text(" HYPERLINK \"http://exam");
        stack.instr_text("ple.com\"");
        stack.separate();

        assert_eq!(
            stack.current_hyperlink(),
            Some(&FieldHyperlink::External {
                href: "http://example.com".to_string()
            })
        );
    }

    #[test]
    fn test_internal_anchor_form() {
        let mut stack = FieldStack::new();
        stack.begin();
        stack.instr_text(" HYPERLINK \\l \"intro\"");
        stack.separate();

        assert_eq!(
            stack.current_hyperlink(),
            Some(&FieldHyperlink::Anchor {
                name: "intro".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_field_does_not_become_hyperlink() {
        let mut stack = FieldStack::new();
        stack.begin();
        stack.instr_text(" AUTHOR ");
        stack.separate();

        assert_eq!(stack.current_hyperlink(), None);
    }

    #[test]
    fn test_nested_unknown_field_keeps_outer_hyperlink() {
        let mut stack = FieldStack::new();
        stack.begin();
        stack.instr_text(" HYPERLINK \"http://example.com\"");
        stack.separate();

        // An AUTHOR field nested inside the hyperlink's result.
        stack.begin();
        stack.instr_text(" AUTHOR ");
        stack.separate();

        assert_eq!(
            stack.current_hyperlink(),
            Some(&FieldHyperlink::External {
                href: "http://example.com".to_string()
            })
        );

        stack.end();
        assert!(stack.current_hyperlink().is_some());
        stack.end();
        assert_eq!(stack.current_hyperlink(), None);
    }

    #[test]
    fn test_begin_resets_instruction_buffer() {
        let mut stack = FieldStack::new();
        stack.begin();
        stack.instr_text(" HYPERLINK \"http://first.example\"");
        stack.end();

        // Buffer from the unseparated field must not leak into this one.
        stack.begin();
        stack.instr_text(" AUTHOR ");
        stack.separate();
        assert_eq!(stack.current_hyperlink(), None);
    }
}
