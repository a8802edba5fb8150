//! Document-order queries.
//!
//! Traversal never enters `<template>` children: template content is inert,
//! so markers placed inside a template are invisible to queries. The template
//! element itself is still visited.

use crate::Document;
use crate::NodeId;

/// Pre-order iterator over the descendants of a node (the node excluded).
pub struct Descendants<'a> {
    doc: &'a Document,
    pending: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.pending.pop()?;
        if self.doc.tag_name(current) != Some("template") {
            self.pending
                .extend(self.doc.children(current).iter().rev().copied());
        }
        Some(current)
    }
}

impl Document {
    pub fn descendants(&self, node: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            pending: self.children(node).iter().rev().copied().collect(),
        }
    }

    /// Elements of the whole document, in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(self.root())
            .filter(|node| self.is_element(*node))
    }

    pub fn first_with_attribute(&self, name: &str) -> Option<NodeId> {
        self.elements()
            .find(|node| self.attribute(*node, name).is_some())
    }

    pub fn all_with_attribute(&self, name: &str) -> Vec<NodeId> {
        self.elements()
            .filter(|node| self.attribute(*node, name).is_some())
            .collect()
    }

    pub fn first_with_attribute_value(&self, name: &str, value: &str) -> Option<NodeId> {
        self.elements()
            .find(|node| self.attribute(*node, name) == Some(value))
    }

    pub fn first_element_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.elements()
            .find(|node| self.tag_name(*node).is_some_and(|name| name.eq_ignore_ascii_case(tag)))
    }

    pub fn all_with_tag(&self, tag: &str) -> Vec<NodeId> {
        self.elements()
            .filter(|node| self.tag_name(*node).is_some_and(|name| name.eq_ignore_ascii_case(tag)))
            .collect()
    }
}
