//! Structural document model produced by ingestion.
//!
//! The DOCX reader assembles this tree; the conversion engine walks it.
//! Nodes are closed tagged variants with owned children, so each component
//! dispatches with an exhaustive `match`.

pub mod fields;
pub mod tables;

use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// A parsed word-processing document: body elements plus the note and
/// comment stores referenced from the body.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub children: Vec<DocumentElement>,
    pub notes: Notes,
    pub comments: Vec<Comment>,
}

/// A node in the structural document tree.
#[derive(Debug, Clone)]
pub enum DocumentElement {
    Paragraph(Paragraph),
    Run(Run),
    Text(String),
    Tab,
    Break(BreakType),
    Hyperlink(Hyperlink),
    Bookmark(Bookmark),
    NoteReference(NoteReference),
    CommentReference(CommentReference),
    Image(Image),
    Table(Table),
    TableRow(TableRow),
    TableCell(TableCell),
}

#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub style_id: Option<String>,
    pub style_name: Option<String>,
    pub numbering: Option<NumberingLevel>,
    pub children: Vec<DocumentElement>,
}

#[derive(Debug, Clone, Default)]
pub struct Run {
    pub style_id: Option<String>,
    pub style_name: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub small_caps: bool,
    pub vertical_alignment: VerticalAlignment,
    pub children: Vec<DocumentElement>,
}

/// Run baseline shift. Not exposed to the style-mapping language; sub and
/// superscript always render as `<sub>`/`<sup>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAlignment {
    #[default]
    Baseline,
    Superscript,
    Subscript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakType {
    Line,
    Page,
    Column,
}

/// A link to an external target, an internal bookmark, or both.
#[derive(Debug, Clone, Default)]
pub struct Hyperlink {
    pub href: Option<String>,
    pub anchor: Option<String>,
    pub target_frame: Option<String>,
    pub children: Vec<DocumentElement>,
}

/// A named location in the document, rendered as an empty anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteType {
    Footnote,
    Endnote,
}

impl NoteType {
    pub fn as_str(self) -> &'static str {
        match self {
            NoteType::Footnote => "footnote",
            NoteType::Endnote => "endnote",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteReference {
    pub note_type: NoteType,
    pub note_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentReference {
    pub comment_id: String,
}

/// An embedded image. The bytes are produced by a thunk so they can be
/// fetched after the main tree walk, one image at a time.
#[derive(Clone)]
pub struct Image {
    pub alt_text: Option<String>,
    pub content_type: Option<String>,
    read: Arc<dyn Fn() -> Result<Vec<u8>> + Send + Sync>,
}

impl Image {
    pub fn new(
        alt_text: Option<String>,
        content_type: Option<String>,
        read: impl Fn() -> Result<Vec<u8>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            alt_text,
            content_type,
            read: Arc::new(read),
        }
    }

    pub fn read(&self) -> Result<Vec<u8>> {
        (self.read)()
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("alt_text", &self.alt_text)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub style_id: Option<String>,
    pub style_name: Option<String>,
    pub children: Vec<DocumentElement>,
}

#[derive(Debug, Clone, Default)]
pub struct TableRow {
    pub is_header: bool,
    pub children: Vec<DocumentElement>,
}

#[derive(Debug, Clone)]
pub struct TableCell {
    pub colspan: u32,
    pub rowspan: u32,
    /// Raw vertical-merge flag from the source: true when this cell
    /// continues the cell above it. Cleared by the merge resolver.
    pub vmerge: bool,
    pub children: Vec<DocumentElement>,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            colspan: 1,
            rowspan: 1,
            vmerge: false,
            children: Vec::new(),
        }
    }
}

/// Numbering metadata attached to a paragraph, resolved from the
/// numbering part: 0-based level plus ordered-ness of the list format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingLevel {
    pub level_index: usize,
    pub is_ordered: bool,
}

#[derive(Debug, Clone)]
pub struct Note {
    pub note_type: NoteType,
    pub id: String,
    pub body: Vec<DocumentElement>,
}

/// Footnote and endnote store, looked up by (type, id).
#[derive(Debug, Clone, Default)]
pub struct Notes {
    notes: Vec<Note>,
}

impl Notes {
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    pub fn push(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn find(&self, note_type: NoteType, id: &str) -> Option<&Note> {
        self.notes
            .iter()
            .find(|note| note.note_type == note_type && note.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub comment_id: String,
    pub author_name: Option<String>,
    pub author_initials: Option<String>,
    pub body: Vec<DocumentElement>,
}
