//! Body XML reader: generic XML tree to structural document elements.
//!
//! One reader instance is scoped to a single part (document body,
//! footnotes, endnotes, comments) and owns that part's complex-field
//! stack. Unknown elements are reported once and skipped; recoverable
//! problems become diagnostics, never errors.

use std::io::{Read, Seek};

use zip::ZipArchive;

use crate::diagnostics::Diagnostics;
use crate::document::{
    Bookmark, BreakType, Comment, CommentReference, DocumentElement, Hyperlink, Image, Note,
    NoteReference, NoteType, Paragraph, Run, Table, TableCell, TableRow, VerticalAlignment,
};
use crate::document::fields::{FieldHyperlink, FieldStack};
use crate::document::tables::calculate_row_spans;

use super::package::{ContentTypes, Numbering, Relationships, Styles};
use super::xml::XmlElement;
use super::{read_archive_file_bytes, resolve_part_path};

/// Elements that carry properties or bookkeeping we have already consumed
/// (or deliberately produce nothing); skipped without a diagnostic.
const IGNORED_ELEMENTS: [&str; 16] = [
    "w:pPr",
    "w:rPr",
    "w:tblPr",
    "w:tblGrid",
    "w:trPr",
    "w:tcPr",
    "w:sectPr",
    "w:proofErr",
    "w:lastRenderedPageBreak",
    "w:bookmarkEnd",
    "w:commentRangeStart",
    "w:commentRangeEnd",
    "w:footnoteRef",
    "w:endnoteRef",
    "w:annotationRef",
    "w:del",
];

pub(crate) struct BodyReader<'a, R: Read + Seek> {
    pub archive: &'a mut ZipArchive<R>,
    pub base: &'a str,
    pub styles: &'a Styles,
    pub numbering: &'a Numbering,
    pub relationships: &'a Relationships,
    pub content_types: &'a ContentTypes,
    pub diagnostics: &'a mut Diagnostics,
    field_stack: FieldStack,
}

impl<'a, R: Read + Seek> BodyReader<'a, R> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        archive: &'a mut ZipArchive<R>,
        base: &'a str,
        styles: &'a Styles,
        numbering: &'a Numbering,
        relationships: &'a Relationships,
        content_types: &'a ContentTypes,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            archive,
            base,
            styles,
            numbering,
            relationships,
            content_types,
            diagnostics,
            field_stack: FieldStack::new(),
        }
    }

    pub fn read_children(&mut self, parent: &XmlElement) -> Vec<DocumentElement> {
        let mut elements = Vec::new();
        for child in parent.elements() {
            elements.extend(self.read_element(child));
        }
        elements
    }

    fn read_element(&mut self, element: &XmlElement) -> Vec<DocumentElement> {
        match element.name.as_str() {
            "w:p" => self.read_paragraph(element),
            "w:r" => self.read_run(element),
            "w:t" => vec![DocumentElement::Text(element.text())],
            "w:tab" => vec![DocumentElement::Tab],
            "w:br" => self.read_break(element),
            "w:fldChar" => {
                match element.attr("w:fldCharType") {
                    Some("begin") => self.field_stack.begin(),
                    Some("separate") => self.field_stack.separate(),
                    Some("end") => self.field_stack.end(),
                    _ => {}
                }
                Vec::new()
            }
            "w:instrText" => {
                self.field_stack.instr_text(&element.text());
                Vec::new()
            }
            "w:hyperlink" => self.read_hyperlink(element),
            "w:bookmarkStart" => self.read_bookmark(element),
            "w:footnoteReference" => self.read_note_reference(element, NoteType::Footnote),
            "w:endnoteReference" => self.read_note_reference(element, NoteType::Endnote),
            "w:commentReference" => match element.attr("w:id") {
                Some(id) => vec![DocumentElement::CommentReference(CommentReference {
                    comment_id: id.to_string(),
                })],
                None => Vec::new(),
            },
            "w:tbl" => self.read_table(element),
            "w:tr" => self.read_table_row(element),
            "w:tc" => self.read_table_cell(element),
            "w:drawing" => self.read_drawing(element),
            "w:noBreakHyphen" => vec![DocumentElement::Text("\u{2011}".to_string())],
            "w:softHyphen" => vec![DocumentElement::Text("\u{ad}".to_string())],
            // Tracked insertions and structured document tags contribute
            // their content directly.
            "w:ins" | "w:smartTag" => self.read_children(element),
            "w:sdt" => match element.find("w:sdtContent") {
                Some(content) => self.read_children(content),
                None => Vec::new(),
            },
            "mc:AlternateContent" => match element.find("mc:Fallback") {
                Some(fallback) => self.read_children(fallback),
                None => Vec::new(),
            },
            name if IGNORED_ELEMENTS.contains(&name) => Vec::new(),
            name => {
                log::warn!("ignoring unrecognised element {name}");
                self.diagnostics
                    .warning(format!("An unrecognised element was ignored: {name}"));
                Vec::new()
            }
        }
    }

    fn read_paragraph(&mut self, element: &XmlElement) -> Vec<DocumentElement> {
        let mut paragraph = Paragraph {
            children: self.read_children(element),
            ..Paragraph::default()
        };

        if let Some(properties) = element.find("w:pPr") {
            if let Some(style_id) = properties
                .find("w:pStyle")
                .and_then(|style| style.attr("w:val"))
            {
                paragraph.style_id = Some(style_id.to_string());
                match self.styles.paragraph_style_name(style_id) {
                    Some(name) => paragraph.style_name = Some(name.to_string()),
                    None => self.diagnostics.warning(format!(
                        "Paragraph style with ID {style_id} was referenced but not defined in the document"
                    )),
                }
            }
            paragraph.numbering = properties.find("w:numPr").and_then(|numbering| {
                let level = numbering.find("w:ilvl")?.attr("w:val")?;
                let num_id = numbering.find("w:numId")?.attr("w:val")?;
                self.numbering.find_level(num_id, level)
            });
        }

        vec![DocumentElement::Paragraph(paragraph)]
    }

    fn read_run(&mut self, element: &XmlElement) -> Vec<DocumentElement> {
        let mut children = self.read_children(element);

        // Runs inside an open hyperlink field carry the link.
        if let Some(hyperlink) = self.field_stack.current_hyperlink() {
            let mut wrapper = Hyperlink {
                children,
                ..Hyperlink::default()
            };
            match hyperlink {
                FieldHyperlink::External { href } => wrapper.href = Some(href.clone()),
                FieldHyperlink::Anchor { name } => wrapper.anchor = Some(name.clone()),
            }
            children = vec![DocumentElement::Hyperlink(wrapper)];
        }

        let mut run = Run {
            children,
            ..Run::default()
        };

        if let Some(properties) = element.find("w:rPr") {
            if let Some(style_id) = properties
                .find("w:rStyle")
                .and_then(|style| style.attr("w:val"))
            {
                run.style_id = Some(style_id.to_string());
                match self.styles.character_style_name(style_id) {
                    Some(name) => run.style_name = Some(name.to_string()),
                    None => self.diagnostics.warning(format!(
                        "Run style with ID {style_id} was referenced but not defined in the document"
                    )),
                }
            }
            run.bold = boolean_element(properties, "w:b");
            run.italic = boolean_element(properties, "w:i");
            run.strikethrough = boolean_element(properties, "w:strike");
            run.small_caps = boolean_element(properties, "w:smallCaps");
            run.underline = properties
                .find("w:u")
                .is_some_and(|underline| !matches!(underline.attr("w:val"), Some("none" | "false" | "0")));
            run.vertical_alignment = match properties
                .find("w:vertAlign")
                .and_then(|alignment| alignment.attr("w:val"))
            {
                Some("superscript") => VerticalAlignment::Superscript,
                Some("subscript") => VerticalAlignment::Subscript,
                _ => VerticalAlignment::Baseline,
            };
        }

        vec![DocumentElement::Run(run)]
    }

    fn read_break(&mut self, element: &XmlElement) -> Vec<DocumentElement> {
        match element.attr("w:type") {
            None | Some("textWrapping") => vec![DocumentElement::Break(BreakType::Line)],
            Some("page") => vec![DocumentElement::Break(BreakType::Page)],
            Some("column") => vec![DocumentElement::Break(BreakType::Column)],
            Some(other) => {
                self.diagnostics
                    .warning(format!("Unsupported break type: {other}"));
                Vec::new()
            }
        }
    }

    fn read_hyperlink(&mut self, element: &XmlElement) -> Vec<DocumentElement> {
        let children = self.read_children(element);
        let target_frame = element
            .attr("w:tgtFrame")
            .filter(|frame| !frame.is_empty())
            .map(String::from);

        if let Some(relationship_id) = element.attr("r:id") {
            let Some(relationship) = self.relationships.target(relationship_id) else {
                self.diagnostics.warning(format!(
                    "Hyperlink relationship {relationship_id} was not found; the link has been ignored"
                ));
                return children;
            };
            let mut href = relationship.target.clone();
            if let Some(anchor) = element.attr("w:anchor") {
                href = replace_fragment(&href, anchor);
            }
            return vec![DocumentElement::Hyperlink(Hyperlink {
                href: Some(href),
                anchor: None,
                target_frame,
                children,
            })];
        }

        if let Some(anchor) = element.attr("w:anchor") {
            return vec![DocumentElement::Hyperlink(Hyperlink {
                href: None,
                anchor: Some(anchor.to_string()),
                target_frame,
                children,
            })];
        }

        children
    }

    fn read_bookmark(&mut self, element: &XmlElement) -> Vec<DocumentElement> {
        match element.attr("w:name") {
            // _GoBack is the editor's own cursor bookmark, not content.
            Some("_GoBack") | None => Vec::new(),
            Some(name) => vec![DocumentElement::Bookmark(Bookmark {
                name: name.to_string(),
            })],
        }
    }

    fn read_note_reference(
        &mut self,
        element: &XmlElement,
        note_type: NoteType,
    ) -> Vec<DocumentElement> {
        match element.attr("w:id") {
            Some(id) => vec![DocumentElement::NoteReference(NoteReference {
                note_type,
                note_id: id.to_string(),
            })],
            None => Vec::new(),
        }
    }

    fn read_table(&mut self, element: &XmlElement) -> Vec<DocumentElement> {
        let mut table = Table {
            children: self.read_children(element),
            ..Table::default()
        };

        if let Some(style_id) = element
            .find("w:tblPr")
            .and_then(|properties| properties.find("w:tblStyle"))
            .and_then(|style| style.attr("w:val"))
        {
            table.style_id = Some(style_id.to_string());
            match self.styles.table_style_name(style_id) {
                Some(name) => table.style_name = Some(name.to_string()),
                None => self.diagnostics.warning(format!(
                    "Table style with ID {style_id} was referenced but not defined in the document"
                )),
            }
        }

        table.children = calculate_row_spans(table.children, self.diagnostics);
        vec![DocumentElement::Table(table)]
    }

    fn read_table_row(&mut self, element: &XmlElement) -> Vec<DocumentElement> {
        let is_header = element
            .find("w:trPr")
            .is_some_and(|properties| boolean_element(properties, "w:tblHeader"));
        vec![DocumentElement::TableRow(TableRow {
            is_header,
            children: self.read_children(element),
        })]
    }

    fn read_table_cell(&mut self, element: &XmlElement) -> Vec<DocumentElement> {
        let mut cell = TableCell {
            children: self.read_children(element),
            ..TableCell::default()
        };

        if let Some(properties) = element.find("w:tcPr") {
            cell.colspan = properties
                .find("w:gridSpan")
                .and_then(|span| span.attr("w:val"))
                .and_then(|value| value.parse().ok())
                .unwrap_or(1);
            // Tri-state merge flag: `continue` (or a bare element) continues
            // the cell above; `restart` and absence start a cell.
            cell.vmerge = match properties.find("w:vMerge") {
                Some(merge) => !matches!(merge.attr("w:val"), Some("restart")),
                None => false,
            };
        }

        vec![DocumentElement::TableCell(cell)]
    }

    fn read_drawing(&mut self, element: &XmlElement) -> Vec<DocumentElement> {
        let alt_text = element
            .find_descendant("wp:docPr")
            .and_then(|properties| {
                properties
                    .attr("descr")
                    .filter(|description| !description.is_empty())
                    .or_else(|| properties.attr("title"))
            })
            .map(String::from);

        let Some(blip) = element.find_descendant("a:blip") else {
            self.diagnostics
                .warning("A drawing with no embedded image was ignored".to_string());
            return Vec::new();
        };
        let Some(relationship_id) = blip.attr("r:embed") else {
            self.diagnostics
                .warning("A drawing with no embedded image was ignored".to_string());
            return Vec::new();
        };
        let Some(relationship) = self.relationships.target(relationship_id) else {
            self.diagnostics.warning(format!(
                "Image relationship {relationship_id} was not found; the image has been ignored"
            ));
            return Vec::new();
        };
        if relationship.is_external {
            self.diagnostics.warning(format!(
                "External image {} was not embedded and has been ignored",
                relationship.target
            ));
            return Vec::new();
        }

        let part_path = resolve_part_path(self.base, &relationship.target);
        let content_type = self.content_types.content_type(&part_path);

        // Bytes are captured now (the archive is unavailable later); the
        // engine still defers decoding and any failure until after the
        // main walk.
        let data: Result<Vec<u8>, String> = read_archive_file_bytes(self.archive, &part_path)
            .map_err(|error| format!("{part_path}: {error}"));
        let image = Image::new(alt_text, content_type, move || {
            data.clone().map_err(crate::error::Error::Image)
        });

        vec![DocumentElement::Image(image)]
    }
}

/// Boolean property element: present unless its value says otherwise.
fn boolean_element(properties: &XmlElement, name: &str) -> bool {
    properties
        .find(name)
        .is_some_and(|element| !matches!(element.attr("w:val"), Some("false" | "0")))
}

/// Swap the fragment of a relationship target for the element's anchor.
fn replace_fragment(href: &str, anchor: &str) -> String {
    match href.find('#') {
        Some(index) => format!("{}#{anchor}", &href[..index]),
        None => format!("{href}#{anchor}"),
    }
}

/// Read a footnotes or endnotes part.
pub(crate) fn read_notes<R: Read + Seek>(
    reader: &mut BodyReader<'_, R>,
    root: &XmlElement,
    note_type: NoteType,
) -> Vec<Note> {
    let element_name = match note_type {
        NoteType::Footnote => "w:footnote",
        NoteType::Endnote => "w:endnote",
    };

    let mut notes = Vec::new();
    for note in root.children_named(element_name) {
        // Separator pseudo-notes carry layout chrome, not content.
        if matches!(
            note.attr("w:type"),
            Some("separator" | "continuationSeparator")
        ) {
            continue;
        }
        let Some(id) = note.attr("w:id") else {
            continue;
        };
        notes.push(Note {
            note_type,
            id: id.to_string(),
            body: reader.read_children(note),
        });
    }
    notes
}

/// Read a comments part.
pub(crate) fn read_comments<R: Read + Seek>(
    reader: &mut BodyReader<'_, R>,
    root: &XmlElement,
) -> Vec<Comment> {
    let mut comments = Vec::new();
    for comment in root.children_named("w:comment") {
        let Some(id) = comment.attr("w:id") else {
            continue;
        };
        comments.push(Comment {
            comment_id: id.to_string(),
            author_name: comment
                .attr("w:author")
                .filter(|author| !author.is_empty())
                .map(String::from),
            author_initials: comment
                .attr("w:initials")
                .filter(|initials| !initials.is_empty())
                .map(String::from),
            body: reader.read_children(comment),
        });
    }
    comments
}
