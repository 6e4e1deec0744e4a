//! Markup serialization and text extraction.
//!
//! Output escapes `&`, `<`, `>` in text and `&`, `"` in attribute values, like
//! `innerHTML`. Comments are written verbatim. Properties and listeners are not part of
//! the output.

use crate::document::Document;
use crate::markup::is_void_element;
use crate::types::{NodeKey, NodeKind};

impl Document {
    /// Concatenated character data of all text descendants.
    pub fn text_content(&self, key: NodeKey) -> String {
        let mut out = String::new();
        self.collect_text(key, &mut out);
        out
    }

    fn collect_text(&self, key: NodeKey, out: &mut String) {
        match self.kind(key) {
            Some(NodeKind::Text { text }) => out.push_str(text),
            Some(NodeKind::Element { .. }) | Some(NodeKind::Fragment) => {
                for child in self.children(key) {
                    self.collect_text(*child, out);
                }
            }
            Some(NodeKind::Comment { .. }) | None => {}
        }
    }

    pub fn inner_html(&self, key: NodeKey) -> String {
        let mut out = String::new();
        for child in self.children(key) {
            self.write_node(*child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, key: NodeKey) -> String {
        let mut out = String::new();
        self.write_node(key, &mut out);
        out
    }

    fn write_node(&self, key: NodeKey, out: &mut String) {
        match self.kind(key) {
            Some(NodeKind::Fragment) => {
                for child in self.children(key) {
                    self.write_node(*child, out);
                }
            }
            Some(NodeKind::Element { name, attributes }) => {
                out.push('<');
                out.push_str(name);
                for (attr, value) in attributes {
                    out.push(' ');
                    out.push_str(attr);
                    if let Some(value) = value {
                        out.push_str("=\"");
                        escape_into(value, true, out);
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void_element(name) {
                    return;
                }
                for child in self.children(key) {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            Some(NodeKind::Text { text }) => escape_into(text, false, out),
            Some(NodeKind::Comment { text }) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            None => {}
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
