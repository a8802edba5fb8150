//! Extracted, cacheable representation of one document.

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeSet;

/// Detached description of an element, rebuilt into a node only when applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    /// Serialized children, used to rebuild the element.
    pub inner_html: String,
    /// Concatenated text of the element, used for `<title>`.
    pub text: String,
}

impl ElementDescriptor {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            inner_html: String::new(),
            text: String::new(),
        }
    }

    pub fn is_title(&self) -> bool {
        self.tag.eq_ignore_ascii_case("title")
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets `name`, overwriting an existing value.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_owned(),
            None => self.attributes.push((name.to_owned(), value.to_owned())),
        }
    }
}

/// Swappable content of a document. Immutable once extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Inner markup of the page root.
    pub body_html: String,
    /// Layout name to inner markup, in order of first discovery.
    pub layouts: IndexMap<String, String>,
    pub title: Option<String>,
    /// Children of the head-content source, when the document has one.
    pub head_content: Option<Vec<ElementDescriptor>>,
    /// Script identity keys; see [`crate::hash::script_key`].
    pub scripts: BTreeSet<String>,
}

impl Snapshot {
    pub fn has_script(&self, key: &str) -> bool {
        self.scripts.contains(key)
    }
}
