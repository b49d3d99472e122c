//! Document matchers: the left-hand side of a style rule.
//!
//! A matcher names an element kind plus optional refinements. All present
//! refinements are conjunctive; a matcher either matches a node fully or
//! not at all.

use crate::document::{BreakType, NumberingLevel, Paragraph, Run, Table};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentMatcher {
    Paragraph(BlockMatcher),
    Run(BlockMatcher),
    Table(BlockMatcher),
    Bold,
    Italic,
    Underline,
    Strikethrough,
    SmallCaps,
    CommentReference,
    Break(BreakType),
}

/// Refinements shared by paragraph, run, and table matchers. The list
/// selector only ever applies to paragraphs and runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockMatcher {
    pub style_id: Option<String>,
    pub style_name: Option<StringMatcher>,
    pub numbering: Option<NumberingLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringOperator {
    EqualTo,
    StartsWith,
}

/// Case-insensitive string constraint used for style names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringMatcher {
    pub operator: StringOperator,
    pub value: String,
}

impl StringMatcher {
    pub fn equal_to(value: impl Into<String>) -> Self {
        Self {
            operator: StringOperator::EqualTo,
            value: value.into(),
        }
    }

    pub fn starts_with(value: impl Into<String>) -> Self {
        Self {
            operator: StringOperator::StartsWith,
            value: value.into(),
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self.operator {
            StringOperator::EqualTo => candidate.eq_ignore_ascii_case(&self.value),
            StringOperator::StartsWith => candidate
                .get(..self.value.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(&self.value)),
        }
    }
}

impl BlockMatcher {
    fn matches(
        &self,
        style_id: Option<&str>,
        style_name: Option<&str>,
        numbering: Option<&NumberingLevel>,
    ) -> bool {
        if let Some(required) = &self.style_id
            && style_id != Some(required.as_str())
        {
            return false;
        }
        if let Some(required) = &self.style_name {
            match style_name {
                Some(name) if required.matches(name) => {}
                _ => return false,
            }
        }
        if let Some(required) = &self.numbering {
            match numbering {
                Some(level)
                    if level.level_index == required.level_index
                        && level.is_ordered == required.is_ordered => {}
                _ => return false,
            }
        }
        true
    }
}

impl DocumentMatcher {
    pub fn matches_paragraph(&self, paragraph: &Paragraph) -> bool {
        match self {
            DocumentMatcher::Paragraph(options) => options.matches(
                paragraph.style_id.as_deref(),
                paragraph.style_name.as_deref(),
                paragraph.numbering.as_ref(),
            ),
            _ => false,
        }
    }

    pub fn matches_run(&self, run: &Run) -> bool {
        match self {
            DocumentMatcher::Run(options) => {
                options.matches(run.style_id.as_deref(), run.style_name.as_deref(), None)
            }
            _ => false,
        }
    }

    pub fn matches_table(&self, table: &Table) -> bool {
        match self {
            DocumentMatcher::Table(options) => {
                options.matches(table.style_id.as_deref(), table.style_name.as_deref(), None)
            }
            _ => false,
        }
    }

    pub fn matches_break(&self, break_type: BreakType) -> bool {
        matches!(self, DocumentMatcher::Break(required) if *required == break_type)
    }
}
