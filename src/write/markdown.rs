//! Markdown serialization.
//!
//! Tag-driven emission over the same simplified tree the HTML writer
//! consumes. Tags with no Markdown counterpart contribute their content
//! with no decoration.

use crate::html::{Element, HtmlNode};

/// Render a simplified tree as Markdown.
pub fn write_markdown(nodes: &[HtmlNode]) -> String {
    let mut writer = MarkdownWriter::default();
    writer.write_nodes(nodes);
    writer.output
}

#[derive(Debug, Clone, Copy)]
struct ListState {
    is_ordered: bool,
    count: usize,
}

#[derive(Debug, Default)]
struct MarkdownWriter {
    output: String,
    list_stack: Vec<ListState>,
}

impl MarkdownWriter {
    fn write_nodes(&mut self, nodes: &[HtmlNode]) {
        for node in nodes {
            match node {
                HtmlNode::Element(element) => self.write_element(element),
                HtmlNode::Text(value) => self.output.push_str(value),
                HtmlNode::ForceWrite | HtmlNode::Deferred(_) => {}
            }
        }
    }

    fn write_element(&mut self, element: &Element) {
        match element.tag.name() {
            "p" => {
                self.write_nodes(&element.children);
                self.output.push_str("\n\n");
            }
            "br" => self.output.push_str("  \n"),
            name @ ("h1" | "h2" | "h3" | "h4" | "h5" | "h6") => {
                let level = name[1..].parse().unwrap_or(1);
                self.output.push_str(&"#".repeat(level));
                self.output.push(' ');
                self.write_nodes(&element.children);
                self.output.push_str("\n\n");
            }
            "strong" | "b" => self.write_delimited(element, "__"),
            "em" | "i" => self.write_delimited(element, "*"),
            "a" => match element.tag.attributes.get("href") {
                Some(href) => {
                    self.output.push('[');
                    self.write_nodes(&element.children);
                    self.output.push_str("](");
                    self.output.push_str(href);
                    self.output.push(')');
                }
                None => self.write_nodes(&element.children),
            },
            "img" => {
                let alt = element
                    .tag
                    .attributes
                    .get("alt")
                    .map(String::as_str)
                    .unwrap_or("");
                let src = element
                    .tag
                    .attributes
                    .get("src")
                    .map(String::as_str)
                    .unwrap_or("");
                self.output.push_str(&format!("![{alt}]({src})"));
            }
            name @ ("ul" | "ol") => {
                self.list_stack.push(ListState {
                    is_ordered: name == "ol",
                    count: 0,
                });
                self.write_nodes(&element.children);
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.output.push('\n');
                }
            }
            "li" => {
                if !self.output.is_empty() && !self.output.ends_with('\n') {
                    self.output.push('\n');
                }
                let depth = self.list_stack.len().saturating_sub(1);
                self.output.push_str(&"\t".repeat(depth));
                let marker = match self.list_stack.last_mut() {
                    Some(state) if state.is_ordered => {
                        state.count += 1;
                        format!("{}. ", state.count)
                    }
                    _ => "- ".to_string(),
                };
                self.output.push_str(&marker);
                self.write_nodes(&element.children);
                if !self.output.ends_with('\n') {
                    self.output.push('\n');
                }
            }
            _ => self.write_nodes(&element.children),
        }
    }

    fn write_delimited(&mut self, element: &Element, delimiter: &str) {
        self.output.push_str(delimiter);
        self.write_nodes(&element.children);
        self.output.push_str(delimiter);
    }
}
