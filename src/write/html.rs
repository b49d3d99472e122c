//! HTML serialization.

use crate::html::{Element, HtmlNode};

/// Render a simplified tree as an HTML fragment.
pub fn write_html(nodes: &[HtmlNode]) -> String {
    let mut output = String::new();
    write_nodes(&mut output, nodes);
    output
}

fn write_nodes(output: &mut String, nodes: &[HtmlNode]) {
    for node in nodes {
        match node {
            HtmlNode::Element(element) => write_element(output, element),
            HtmlNode::Text(value) => escape_text(output, value),
            // Markers and unresolved placeholders render nothing.
            HtmlNode::ForceWrite | HtmlNode::Deferred(_) => {}
        }
    }
}

fn write_element(output: &mut String, element: &Element) {
    let name = element.tag.name();
    output.push('<');
    output.push_str(name);
    for (key, value) in &element.tag.attributes {
        output.push(' ');
        output.push_str(key);
        output.push_str("=\"");
        escape_attribute(output, value);
        output.push('"');
    }

    if element.is_void() {
        output.push_str(" />");
        return;
    }

    output.push('>');
    write_nodes(output, &element.children);
    output.push_str("</");
    output.push_str(name);
    output.push('>');
}

fn escape_text(output: &mut String, value: &str) {
    for character in value.chars() {
        match character {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            other => output.push(other),
        }
    }
}

fn escape_attribute(output: &mut String, value: &str) {
    for character in value.chars() {
        match character {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            other => output.push(other),
        }
    }
}
