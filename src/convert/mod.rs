//! Document tree to HTML tree conversion.
//!
//! The engine walks the structural document, looks up the first matching
//! style rule per node (falling back to fixed defaults), and wraps
//! converted content in the matched output path. Cross-reference
//! bookkeeping (notes, comments, bookmarks) and deferred image resolution
//! are owned by a per-run converter, so nothing leaks between conversions.

use std::collections::{BTreeMap, HashMap};

use base64::Engine as _;

use crate::diagnostics::Diagnostics;
use crate::document::{
    Bookmark, BreakType, Comment, CommentReference, Document, DocumentElement, Hyperlink, Image,
    NoteReference, Paragraph, Run, Table, TableCell, TableRow, VerticalAlignment,
};
use crate::error::Result;
use crate::html::{self, DeferredId, HtmlNode, HtmlPath, simplify};
use crate::stylemap::{DocumentMatcher, StyleMap, default_style_map};

/// Options controlling a conversion run.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Style-map source, tried before the built-in defaults.
    pub style_map: String,
    /// Append [`crate::stylemap::DEFAULT_STYLE_MAP`] after the user rules.
    pub include_default_style_map: bool,
    /// Prefix for generated element ids, to keep them unique when several
    /// converted documents share a page.
    pub id_prefix: String,
    /// Drop paragraphs with no content instead of emitting empty `<p>`.
    pub ignore_empty_paragraphs: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            style_map: String::new(),
            include_default_style_map: true,
            id_prefix: String::new(),
            ignore_empty_paragraphs: true,
        }
    }
}

/// Rendered output plus the diagnostics gathered along the way.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub value: String,
    pub messages: Vec<crate::diagnostics::Diagnostic>,
}

/// Convert a structural document into a simplified HTML tree.
pub fn convert_document(
    document: &Document,
    options: &ConversionOptions,
) -> (Vec<HtmlNode>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let mut style_map = StyleMap::parse(&options.style_map, &mut diagnostics);
    if options.include_default_style_map {
        style_map.extend(default_style_map());
    }

    let converter = DocumentConverter {
        document,
        options,
        style_map,
        diagnostics,
        note_references: Vec::new(),
        referenced_comments: Vec::new(),
        deferred: Vec::new(),
        next_deferred_id: 0,
    };
    converter.run()
}

const SUPPORTED_IMAGE_TYPES: [&str; 5] = [
    "image/png",
    "image/gif",
    "image/jpeg",
    "image/svg+xml",
    "image/tiff",
];

type DeferredThunk = Box<dyn FnOnce(&mut Diagnostics) -> Result<Vec<HtmlNode>>>;

struct DocumentConverter<'a> {
    document: &'a Document,
    options: &'a ConversionOptions,
    style_map: StyleMap,
    diagnostics: Diagnostics,
    note_references: Vec<NoteReference>,
    referenced_comments: Vec<(String, &'a Comment)>,
    deferred: Vec<(DeferredId, DeferredThunk)>,
    next_deferred_id: DeferredId,
}

impl<'a> DocumentConverter<'a> {
    fn run(mut self) -> (Vec<HtmlNode>, Diagnostics) {
        let document = self.document;
        let mut nodes = self.convert_children(&document.children);
        nodes.extend(self.convert_note_list());
        nodes.extend(self.convert_comment_list());
        let nodes = self.resolve_deferred(nodes);
        (simplify(nodes), self.diagnostics)
    }

    fn convert_children(&mut self, children: &'a [DocumentElement]) -> Vec<HtmlNode> {
        let mut nodes = Vec::new();
        for child in children {
            nodes.extend(self.convert_element(child));
        }
        nodes
    }

    fn convert_element(&mut self, element: &'a DocumentElement) -> Vec<HtmlNode> {
        match element {
            DocumentElement::Paragraph(paragraph) => self.convert_paragraph(paragraph),
            DocumentElement::Run(run) => self.convert_run(run),
            DocumentElement::Text(value) => vec![html::text(value.clone())],
            DocumentElement::Tab => vec![html::text("\t")],
            DocumentElement::Break(break_type) => self.convert_break(*break_type),
            DocumentElement::Hyperlink(hyperlink) => self.convert_hyperlink(hyperlink),
            DocumentElement::Bookmark(bookmark) => self.convert_bookmark(bookmark),
            DocumentElement::NoteReference(reference) => self.convert_note_reference(reference),
            DocumentElement::CommentReference(reference) => {
                self.convert_comment_reference(reference)
            }
            DocumentElement::Image(image) => self.convert_image(image),
            DocumentElement::Table(table) => self.convert_table(table),
            DocumentElement::TableRow(row) => self.convert_table_row(row),
            DocumentElement::TableCell(cell) => self.convert_table_cell(cell, "td"),
        }
    }

    fn convert_paragraph(&mut self, paragraph: &'a Paragraph) -> Vec<HtmlNode> {
        let path = match self
            .style_map
            .find(|matcher| matcher.matches_paragraph(paragraph))
        {
            Some(path) => path.clone(),
            None => {
                if paragraph.style_id.is_some() {
                    self.unrecognised_style_warning(
                        "paragraph",
                        paragraph.style_id.as_deref(),
                        paragraph.style_name.as_deref(),
                    );
                }
                HtmlPath::fresh_element("p")
            }
        };

        let force_write = !self.options.ignore_empty_paragraphs;
        path.wrap(|| {
            let mut children = Vec::new();
            if force_write {
                children.push(HtmlNode::ForceWrite);
            }
            children.extend(self.convert_children(&paragraph.children));
            children
        })
    }

    /// Formatting layers wrap innermost-first in a fixed order; the run's
    /// own style mapping ends up outermost. An ignore path at any layer
    /// suppresses everything inside it.
    fn convert_run(&mut self, run: &'a Run) -> Vec<HtmlNode> {
        let mut paths: Vec<HtmlPath> = Vec::new();
        if run.small_caps {
            paths.push(self.run_property_path(&DocumentMatcher::SmallCaps, None));
        }
        if run.strikethrough {
            paths.push(self.run_property_path(&DocumentMatcher::Strikethrough, Some("s")));
        }
        if run.underline {
            paths.push(self.run_property_path(&DocumentMatcher::Underline, None));
        }
        match run.vertical_alignment {
            VerticalAlignment::Subscript => paths.push(HtmlPath::collapsible_element("sub")),
            VerticalAlignment::Superscript => paths.push(HtmlPath::collapsible_element("sup")),
            VerticalAlignment::Baseline => {}
        }
        if run.italic {
            paths.push(self.run_property_path(&DocumentMatcher::Italic, Some("em")));
        }
        if run.bold {
            paths.push(self.run_property_path(&DocumentMatcher::Bold, Some("strong")));
        }
        let style_path = match self.style_map.find(|matcher| matcher.matches_run(run)) {
            Some(path) => path.clone(),
            None => {
                if run.style_id.is_some() {
                    self.unrecognised_style_warning(
                        "run",
                        run.style_id.as_deref(),
                        run.style_name.as_deref(),
                    );
                }
                HtmlPath::empty()
            }
        };
        paths.push(style_path);

        // Evaluation happens outermost-in: an ignore path discards every
        // layer inside it, run content included, before it is produced.
        let mut nodes = match paths.iter().rposition(HtmlPath::is_ignore) {
            Some(last_ignore) => {
                paths.drain(..=last_ignore);
                Vec::new()
            }
            None => self.convert_children(&run.children),
        };
        for path in paths {
            nodes = path.wrap(move || nodes);
        }
        nodes
    }

    fn run_property_path(
        &self,
        matcher_kind: &DocumentMatcher,
        default_tag: Option<&str>,
    ) -> HtmlPath {
        self.style_map
            .find(|matcher| matcher == matcher_kind)
            .cloned()
            .unwrap_or_else(|| match default_tag {
                Some(tag) => HtmlPath::collapsible_element(tag),
                None => HtmlPath::empty(),
            })
    }

    fn convert_break(&mut self, break_type: BreakType) -> Vec<HtmlNode> {
        let path = self
            .style_map
            .find(|matcher| matcher.matches_break(break_type))
            .cloned()
            .unwrap_or_else(|| match break_type {
                BreakType::Line => HtmlPath::fresh_element("br"),
                BreakType::Page | BreakType::Column => HtmlPath::empty(),
            });
        path.wrap(Vec::new)
    }

    fn convert_hyperlink(&mut self, hyperlink: &'a Hyperlink) -> Vec<HtmlNode> {
        let mut attributes = BTreeMap::new();
        if let Some(href) = &hyperlink.href {
            attributes.insert("href".to_string(), href.clone());
        } else if let Some(anchor) = &hyperlink.anchor {
            attributes.insert("href".to_string(), format!("#{}", self.html_id(anchor)));
        }
        if let Some(frame) = &hyperlink.target_frame {
            attributes.insert("target".to_string(), frame.clone());
        }

        let children = self.convert_children(&hyperlink.children);
        vec![html::non_fresh_element("a", attributes, children)]
    }

    fn convert_bookmark(&mut self, bookmark: &Bookmark) -> Vec<HtmlNode> {
        let mut attributes = BTreeMap::new();
        attributes.insert("id".to_string(), self.html_id(&bookmark.name));
        vec![html::fresh_element(
            "a",
            attributes,
            vec![HtmlNode::ForceWrite],
        )]
    }

    fn convert_note_reference(&mut self, reference: &NoteReference) -> Vec<HtmlNode> {
        self.note_references.push(reference.clone());
        let number = self.note_references.len();

        let mut attributes = BTreeMap::new();
        attributes.insert(
            "href".to_string(),
            format!("#{}", self.note_referent_id(reference)),
        );
        attributes.insert("id".to_string(), self.note_reference_id(reference));

        vec![html::non_fresh_element(
            "sup",
            BTreeMap::new(),
            vec![html::non_fresh_element(
                "a",
                attributes,
                vec![html::text(format!("[{number}]"))],
            )],
        )]
    }

    fn convert_comment_reference(&mut self, reference: &CommentReference) -> Vec<HtmlNode> {
        let path = self
            .style_map
            .find(|matcher| matches!(matcher, DocumentMatcher::CommentReference))
            .cloned()
            .unwrap_or(HtmlPath::Ignore);

        let document = self.document;
        let referenced_comments = &mut self.referenced_comments;
        let diagnostics = &mut self.diagnostics;
        let id_prefix = &self.options.id_prefix;
        path.wrap(|| {
            let Some(comment) = document
                .comments
                .iter()
                .find(|comment| comment.comment_id == reference.comment_id)
            else {
                diagnostics.warning(format!(
                    "Referenced comment with ID {} was not defined",
                    reference.comment_id
                ));
                return Vec::new();
            };

            let count = referenced_comments.len() + 1;
            let label = format!(
                "[{}{count}]",
                comment.author_initials.as_deref().unwrap_or("")
            );
            referenced_comments.push((label.clone(), comment));

            let mut attributes = BTreeMap::new();
            attributes.insert(
                "href".to_string(),
                format!("#{id_prefix}comment-{}", comment.comment_id),
            );
            attributes.insert(
                "id".to_string(),
                format!("{id_prefix}comment-ref-{}", comment.comment_id),
            );
            vec![html::non_fresh_element(
                "a",
                attributes,
                vec![html::text(label)],
            )]
        })
    }

    fn convert_image(&mut self, image: &Image) -> Vec<HtmlNode> {
        if let Some(content_type) = &image.content_type
            && !SUPPORTED_IMAGE_TYPES.contains(&content_type.as_str())
        {
            self.diagnostics.warning(format!(
                "Image of type {content_type} is unlikely to display in web browsers"
            ));
        }

        let id = self.next_deferred_id;
        self.next_deferred_id += 1;

        let image = image.clone();
        self.deferred.push((
            id,
            Box::new(move |diagnostics| {
                let Some(content_type) = image.content_type.clone() else {
                    diagnostics.warning("Image has no content type and was skipped".to_string());
                    return Ok(Vec::new());
                };
                let bytes = image.read()?;
                let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

                let mut attributes = BTreeMap::new();
                attributes.insert(
                    "src".to_string(),
                    format!("data:{content_type};base64,{encoded}"),
                );
                if let Some(alt_text) = &image.alt_text {
                    attributes.insert("alt".to_string(), alt_text.clone());
                }
                Ok(vec![html::fresh_element("img", attributes, Vec::new())])
            }),
        ));

        vec![HtmlNode::Deferred(id)]
    }

    /// Resolve deferred leaves strictly in encounter order, one at a time,
    /// then substitute each placeholder in place. A failed resolution
    /// becomes an error diagnostic and empty content; the rest of the tree
    /// is unaffected.
    fn resolve_deferred(&mut self, nodes: Vec<HtmlNode>) -> Vec<HtmlNode> {
        if self.deferred.is_empty() {
            return nodes;
        }

        let mut resolved: HashMap<DeferredId, Vec<HtmlNode>> = HashMap::new();
        for (id, thunk) in std::mem::take(&mut self.deferred) {
            let replacement = match thunk(&mut self.diagnostics) {
                Ok(replacement) => replacement,
                Err(error) => {
                    self.diagnostics.error(error.to_string());
                    Vec::new()
                }
            };
            resolved.insert(id, replacement);
        }

        substitute_deferred(nodes, &mut resolved)
    }

    fn convert_table(&mut self, table: &'a Table) -> Vec<HtmlNode> {
        let path = match self.style_map.find(|matcher| matcher.matches_table(table)) {
            Some(path) => path.clone(),
            None => {
                if table.style_id.is_some() {
                    self.unrecognised_style_warning(
                        "table",
                        table.style_id.as_deref(),
                        table.style_name.as_deref(),
                    );
                }
                HtmlPath::fresh_element("table")
            }
        };
        path.wrap(|| self.convert_table_children(table))
    }

    /// A leading block of header rows renders inside `<thead>` with the
    /// remainder in `<tbody>`; tables without header rows stay flat.
    fn convert_table_children(&mut self, table: &'a Table) -> Vec<HtmlNode> {
        let body_index = table
            .children
            .iter()
            .position(|child| !matches!(child, DocumentElement::TableRow(row) if row.is_header))
            .unwrap_or(table.children.len());

        if body_index == 0 {
            return self.convert_children(&table.children);
        }

        let head_rows = self.convert_children(&table.children[..body_index]);
        let body_rows = self.convert_children(&table.children[body_index..]);
        vec![
            html::fresh_element("thead", BTreeMap::new(), head_rows),
            html::fresh_element("tbody", BTreeMap::new(), body_rows),
        ]
    }

    fn convert_table_row(&mut self, row: &'a TableRow) -> Vec<HtmlNode> {
        let cell_tag = if row.is_header { "th" } else { "td" };
        let mut children = vec![HtmlNode::ForceWrite];
        for child in &row.children {
            match child {
                DocumentElement::TableCell(cell) => {
                    children.extend(self.convert_table_cell(cell, cell_tag));
                }
                other => children.extend(self.convert_element(other)),
            }
        }
        vec![html::fresh_element("tr", BTreeMap::new(), children)]
    }

    fn convert_table_cell(&mut self, cell: &'a TableCell, tag: &str) -> Vec<HtmlNode> {
        let mut attributes = BTreeMap::new();
        if cell.colspan != 1 {
            attributes.insert("colspan".to_string(), cell.colspan.to_string());
        }
        if cell.rowspan != 1 {
            attributes.insert("rowspan".to_string(), cell.rowspan.to_string());
        }

        let mut children = vec![HtmlNode::ForceWrite];
        children.extend(self.convert_children(&cell.children));
        vec![html::fresh_element(tag, attributes, children)]
    }

    /// Referenced notes render after the main content as an ordered list,
    /// in the order their references were encountered, each with a
    /// back-link to its reference.
    fn convert_note_list(&mut self) -> Vec<HtmlNode> {
        if self.note_references.is_empty() {
            return Vec::new();
        }

        let document = self.document;
        let references = std::mem::take(&mut self.note_references);
        let mut items = Vec::new();
        for reference in &references {
            let Some(note) = document.notes.find(reference.note_type, &reference.note_id) else {
                self.diagnostics.warning(format!(
                    "Referenced {} with ID {} was not defined",
                    reference.note_type.as_str(),
                    reference.note_id
                ));
                continue;
            };

            let mut body = self.convert_children(&note.body);
            body.push(back_link(&format!(
                "#{}",
                self.note_reference_id(reference)
            )));

            let mut attributes = BTreeMap::new();
            attributes.insert("id".to_string(), self.note_referent_id(reference));
            items.push(html::fresh_element("li", attributes, body));
        }

        vec![html::fresh_element("ol", BTreeMap::new(), items)]
    }

    /// Referenced comments render after the notes as a definition list.
    fn convert_comment_list(&mut self) -> Vec<HtmlNode> {
        if self.referenced_comments.is_empty() {
            return Vec::new();
        }

        let referenced = std::mem::take(&mut self.referenced_comments);
        let mut entries = Vec::new();
        for (label, comment) in referenced {
            let mut dt_attributes = BTreeMap::new();
            dt_attributes.insert(
                "id".to_string(),
                format!("{}comment-{}", self.options.id_prefix, comment.comment_id),
            );
            entries.push(html::fresh_element(
                "dt",
                dt_attributes,
                vec![html::text(format!("Comment {label}"))],
            ));

            let mut body = self.convert_children(&comment.body);
            body.push(back_link(&format!(
                "#{}comment-ref-{}",
                self.options.id_prefix, comment.comment_id
            )));
            entries.push(html::fresh_element("dd", BTreeMap::new(), body));
        }

        vec![html::fresh_element("dl", BTreeMap::new(), entries)]
    }

    fn unrecognised_style_warning(
        &mut self,
        kind: &str,
        style_id: Option<&str>,
        style_name: Option<&str>,
    ) {
        self.diagnostics.warning(format!(
            "Unrecognised {kind} style: '{}' (Style ID: {})",
            style_name.unwrap_or(""),
            style_id.unwrap_or(""),
        ));
    }

    fn html_id(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.options.id_prefix)
    }

    fn note_referent_id(&self, reference: &NoteReference) -> String {
        self.html_id(&format!(
            "{}-{}",
            reference.note_type.as_str(),
            reference.note_id
        ))
    }

    fn note_reference_id(&self, reference: &NoteReference) -> String {
        self.html_id(&format!(
            "{}-ref-{}",
            reference.note_type.as_str(),
            reference.note_id
        ))
    }
}

/// Back-link paragraph appended to note and comment bodies. Non-fresh so
/// it merges into the body's final paragraph when one exists.
fn back_link(href: &str) -> HtmlNode {
    let mut attributes = BTreeMap::new();
    attributes.insert("href".to_string(), href.to_string());
    html::non_fresh_element(
        "p",
        BTreeMap::new(),
        vec![
            html::text(" "),
            html::non_fresh_element("a", attributes, vec![html::text("↑")]),
        ],
    )
}

fn substitute_deferred(
    nodes: Vec<HtmlNode>,
    resolved: &mut HashMap<DeferredId, Vec<HtmlNode>>,
) -> Vec<HtmlNode> {
    let mut result = Vec::new();
    for node in nodes {
        match node {
            HtmlNode::Deferred(id) => {
                result.extend(resolved.remove(&id).unwrap_or_default());
            }
            HtmlNode::Element(mut element) => {
                element.children = substitute_deferred(element.children, resolved);
                result.push(HtmlNode::Element(element));
            }
            other => result.push(other),
        }
    }
    result
}
