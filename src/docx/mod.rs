//! DOCX package reading.
//!
//! Opens the OPC container, locates the parts it needs by convention
//! (falling back where the package relationships are missing), and hands
//! the body XML to the body reader. The output is the structural document
//! model plus any diagnostics gathered while reading.

mod body;
mod package;
mod xml;

pub use package::{ContentTypes, Numbering, Relationship, Relationships, Styles};

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use crate::diagnostics::Diagnostics;
use crate::document::{Document, NoteType};
use crate::error::{Error, Result};

use body::BodyReader;

/// Read a document from any seekable byte source.
pub fn read_document<R: Read + Seek>(reader: R) -> Result<(Document, Diagnostics)> {
    let mut archive = ZipArchive::new(reader)?;
    let mut diagnostics = Diagnostics::new();

    let main_part = find_main_document_part(&mut archive)?;
    log::debug!("main document part: {main_part}");
    let base = main_part
        .rsplit_once('/')
        .map(|(directory, _)| directory)
        .unwrap_or("")
        .to_string();

    let content_types = match read_optional_part(&mut archive, "[Content_Types].xml")? {
        Some(source) => ContentTypes::parse(&source)?,
        None => ContentTypes::default(),
    };
    let styles = match read_optional_part(&mut archive, &part_path(&base, "styles.xml"))? {
        Some(source) => Styles::parse(&source)?,
        None => Styles::default(),
    };
    let numbering = match read_optional_part(&mut archive, &part_path(&base, "numbering.xml"))? {
        Some(source) => Numbering::parse(&source)?,
        None => Numbering::default(),
    };

    let main_source = match read_optional_part(&mut archive, &main_part)? {
        Some(source) => source,
        None => return Err(Error::MissingPart(main_part)),
    };
    let main_relationships = part_relationships(&mut archive, &main_part)?;

    let root = xml::parse(&main_source)?;
    let Some(body) = root.find("w:body") else {
        return Err(Error::InvalidDocx(format!("{main_part} has no body")));
    };
    let children = {
        let mut reader = BodyReader::new(
            &mut archive,
            &base,
            &styles,
            &numbering,
            &main_relationships,
            &content_types,
            &mut diagnostics,
        );
        reader.read_children(body)
    };

    let mut document = Document {
        children,
        ..Document::default()
    };

    for note_type in [NoteType::Footnote, NoteType::Endnote] {
        let part_name = match note_type {
            NoteType::Footnote => "footnotes.xml",
            NoteType::Endnote => "endnotes.xml",
        };
        let path = part_path(&base, part_name);
        if let Some(source) = read_optional_part(&mut archive, &path)? {
            let relationships = part_relationships(&mut archive, &path)?;
            let root = xml::parse(&source)?;
            let mut reader = BodyReader::new(
                &mut archive,
                &base,
                &styles,
                &numbering,
                &relationships,
                &content_types,
                &mut diagnostics,
            );
            for note in body::read_notes(&mut reader, &root, note_type) {
                document.notes.push(note);
            }
        }
    }

    let comments_path = part_path(&base, "comments.xml");
    if let Some(source) = read_optional_part(&mut archive, &comments_path)? {
        let relationships = part_relationships(&mut archive, &comments_path)?;
        let root = xml::parse(&source)?;
        let mut reader = BodyReader::new(
            &mut archive,
            &base,
            &styles,
            &numbering,
            &relationships,
            &content_types,
            &mut diagnostics,
        );
        document.comments = body::read_comments(&mut reader, &root);
    }

    Ok((document, diagnostics))
}

/// Read a document from a file on disk.
pub fn read_document_path(path: impl AsRef<Path>) -> Result<(Document, Diagnostics)> {
    let file = File::open(path)?;
    read_document(BufReader::new(file))
}

/// Locate the main document part via the package relationships, falling
/// back to the conventional path.
fn find_main_document_part<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String> {
    if let Some(source) = read_optional_part(archive, "_rels/.rels")?
        && let Some(target) = Relationships::target_by_type_suffix(&source, "/officeDocument")?
    {
        return Ok(target.trim_start_matches('/').to_string());
    }
    Ok("word/document.xml".to_string())
}

/// Relationships for a part, from its `_rels/<name>.rels` sibling.
fn part_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
) -> Result<Relationships> {
    let (directory, name) = part.rsplit_once('/').unwrap_or(("", part));
    let path = if directory.is_empty() {
        format!("_rels/{name}.rels")
    } else {
        format!("{directory}/_rels/{name}.rels")
    };
    match read_optional_part(archive, &path)? {
        Some(source) => Relationships::parse(&source),
        None => Ok(Relationships::default()),
    }
}

fn part_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

/// Resolve a relationship target against the base part directory.
pub(crate) fn resolve_part_path(base: &str, target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => part_path(base, target),
    }
}

fn read_optional_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Option<String>> {
    match read_archive_file_bytes(archive, path) {
        Ok(bytes) => {
            let bytes = strip_bom(&bytes);
            Ok(Some(String::from_utf8(bytes.to_vec())?))
        }
        Err(Error::Zip(zip::result::ZipError::FileNotFound)) => Ok(None),
        Err(error) => Err(error),
    }
}

pub(crate) fn read_archive_file_bytes<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Vec<u8>> {
    // Try direct lookup first
    match archive.by_name(path) {
        Ok(mut file) => {
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            return Ok(contents);
        }
        Err(zip::result::ZipError::FileNotFound) => {}
        Err(error) => return Err(error.into()),
    }

    // Fallback: try the percent-decoded path (relationship targets are URIs)
    let decoded = percent_encoding::percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| Error::InvalidDocx(format!("Invalid UTF-8 in path: {path}")))?;

    let mut file = archive.by_name(&decoded)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

/// Strip UTF-8 BOM (byte order mark) if present
fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}
