//! Minimal XML tree built on quick-xml events.
//!
//! DOCX parts are small enough to materialize; the body reader then walks
//! a plain tree instead of juggling pull-parser state. Names and attribute
//! keys keep their conventional prefixes (`w:p`, `r:id`).

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub(crate) struct XmlElement {
    pub name: String,
    pub attributes: HashMap<String, String>,
    pub children: Vec<XmlNode>,
}

#[derive(Debug, Clone)]
pub(crate) enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First child element with the given name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |child| child.name == name)
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// First descendant element with the given name, depth-first.
    pub fn find_descendant(&self, name: &str) -> Option<&XmlElement> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text of this element's direct text children.
    pub fn text(&self) -> String {
        let mut value = String::new();
        for child in &self.children {
            if let XmlNode::Text(text) = child {
                value.push_str(text);
            }
        }
        value
    }
}

/// Parse a document into its root element.
pub(crate) fn parse(xml: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                stack.push(element_from_start(start.name().as_ref(), start.attributes())?);
            }
            Ok(Event::Empty(empty)) => {
                let element = element_from_start(empty.name().as_ref(), empty.attributes())?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                let Some(element) = stack.pop() else {
                    return Err(Error::InvalidDocx("unbalanced XML".to_string()));
                };
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::Text(text)) => {
                if let Some(parent) = stack.last_mut() {
                    let raw = String::from_utf8_lossy(text.as_ref());
                    push_text(parent, &raw);
                }
            }
            Ok(Event::GeneralRef(entity)) => {
                if let Some(parent) = stack.last_mut() {
                    let entity = String::from_utf8_lossy(entity.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        push_text(parent, &resolved);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(error) => return Err(error.into()),
            _ => {}
        }
    }

    root.ok_or_else(|| Error::InvalidDocx("empty XML document".to_string()))
}

fn element_from_start(
    name: &[u8],
    attributes: quick_xml::events::attributes::Attributes<'_>,
) -> Result<XmlElement> {
    let mut parsed = HashMap::new();
    for attribute in attributes.flatten() {
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let raw = String::from_utf8(attribute.value.to_vec())?;
        parsed.insert(key, unescape_attribute(&raw));
    }
    Ok(XmlElement {
        name: String::from_utf8_lossy(name).into_owned(),
        attributes: parsed,
        children: Vec::new(),
    })
}

fn attach(stack: &mut Vec<XmlElement>, root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn push_text(parent: &mut XmlElement, text: &str) {
    // Coalesce adjacent fragments (entity boundaries split text events).
    if let Some(XmlNode::Text(existing)) = parent.children.last_mut() {
        existing.push_str(text);
    } else {
        parent.children.push(XmlNode::Text(text.to_string()));
    }
}

/// Decode entity references in attribute values.
fn unescape_attribute(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    let mut result = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find('&') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find(';') {
            Some(end) => {
                match resolve_entity(&after[..end]) {
                    Some(resolved) => result.push_str(&resolved),
                    None => {
                        result.push('&');
                        result.push_str(&after[..end]);
                        result.push(';');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                result.push('&');
                rest = after;
            }
        }
    }
    result.push_str(rest);
    result
}

fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    if let Some(hex) = entity.strip_prefix("#x") {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(character) = char::from_u32(code)
        {
            return Some(character.to_string());
        }
    } else if let Some(decimal) = entity.strip_prefix('#')
        && let Ok(code) = decimal.parse::<u32>()
        && let Some(character) = char::from_u32(code)
    {
        return Some(character.to_string());
    }

    None
}
