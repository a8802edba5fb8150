//! HTML serialization (`innerHTML` / `outerHTML`).

use crate::Document;
use crate::NodeId;
use crate::NodeKind;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script",
    "style",
    "xmp",
    "iframe",
    "noembed",
    "noframes",
    "plaintext",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Elements whose text children are serialized verbatim.
pub fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

impl Document {
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        let raw = self.tag_name(node).is_some_and(is_raw_text_element);
        for child in self.children(node) {
            self.write_node(*child, raw, &mut out);
        }
        out
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        let raw = self
            .parent(node)
            .and_then(|parent| self.tag_name(parent))
            .is_some_and(is_raw_text_element);
        self.write_node(node, raw, &mut out);
        out
    }

    fn write_node(&self, node: NodeId, parent_is_raw: bool, out: &mut String) {
        match self.kind(node) {
            Some(NodeKind::Element(element)) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in &element.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                out.push('>');

                if is_void_element(&element.tag) {
                    return;
                }

                let raw = is_raw_text_element(&element.tag);
                for child in self.children(node) {
                    self.write_node(*child, raw, out);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
            Some(NodeKind::Text(text)) => {
                if parent_is_raw {
                    out.push_str(text);
                } else {
                    escape_into(text, false, out);
                }
            }
            Some(NodeKind::Comment(text)) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Some(NodeKind::Document) => {
                for child in self.children(node) {
                    self.write_node(*child, false, out);
                }
            }
            Some(NodeKind::Vacant) | None => {}
        }
    }
}

fn escape_into(input: &str, attribute_mode: bool, out: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute_mode => out.push_str("&quot;"),
            '<' if !attribute_mode => out.push_str("&lt;"),
            '>' if !attribute_mode => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}
