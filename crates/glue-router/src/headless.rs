//! In-memory host: `glue_dom::Document` as the live document and
//! [`SessionHistory`] as the window.

use crate::host::DocumentView;
use crate::host::LiveDocument;
use crate::host::Window;
use crate::snapshot::ElementDescriptor;
use glue_core::GlueResult;
use glue_dom::Document;
use glue_dom::NodeId;
use glue_html::HtmlParser;

impl DocumentView for Document {
    type Node = NodeId;

    fn first_with_attribute(&self, name: &str) -> Option<NodeId> {
        Document::first_with_attribute(self, name)
    }

    fn all_with_attribute(&self, name: &str) -> Vec<NodeId> {
        Document::all_with_attribute(self, name)
    }

    fn first_with_attribute_value(&self, name: &str, value: &str) -> Option<NodeId> {
        Document::first_with_attribute_value(self, name, value)
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        Document::tag_name(self, node)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        Document::attribute(self, node, name)
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        Document::attributes(self, node).to_vec()
    }

    fn text_content(&self, node: NodeId) -> String {
        Document::text_content(self, node)
    }

    fn inner_html(&self, node: NodeId) -> String {
        Document::inner_html(self, node)
    }

    // Parsed template content stays as the template's children here.
    fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        Document::element_children(self, node)
    }

    fn title(&self) -> Option<String> {
        Document::title(self)
    }
}

impl LiveDocument for Document {
    fn set_inner_html(&mut self, node: NodeId, markup: &str) -> GlueResult<()> {
        self.clear_children(node);
        HtmlParser.parse_fragment_into(self, node, markup)?;
        Ok(())
    }

    fn remove(&mut self, node: NodeId) {
        Document::remove(self, node);
    }

    fn set_title(&mut self, title: &str) {
        Document::set_title(self, title);
    }

    fn append_to_head(&mut self, element: &ElementDescriptor) -> GlueResult<NodeId> {
        let node = build_element(self, element)?;
        let head = self.ensure_head();
        self.append_child(head, node);
        Ok(node)
    }

    fn replace_with_element(
        &mut self,
        node: NodeId,
        element: &ElementDescriptor,
    ) -> GlueResult<NodeId> {
        let replacement = build_element(self, element)?;
        self.replace(node, replacement);
        Ok(replacement)
    }
}

fn build_element(doc: &mut Document, element: &ElementDescriptor) -> GlueResult<NodeId> {
    let node = doc.create_element_with_attrs(&element.tag, element.attributes.clone());
    if !element.inner_html.is_empty() {
        HtmlParser.parse_fragment_into(doc, node, &element.inner_html)?;
    }
    Ok(node)
}

/// Session history kept in memory.
///
/// `back` and `forward` move the cursor and queue a popstate notification,
/// which the driver drains with [`SessionHistory::take_pop_state`] and
/// forwards to the router, mirroring how a browser delivers popstate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHistory {
    entries: Vec<String>,
    index: usize,
    pending_pop_states: usize,
    reloads: usize,
    scroll_resets: usize,
}

impl SessionHistory {
    pub fn new(initial_url: &str) -> Self {
        Self {
            entries: vec![initial_url.to_owned()],
            index: 0,
            pending_pop_states: 0,
            reloads: 0,
            scroll_resets: 0,
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn reload_count(&self) -> usize {
        self.reloads
    }

    pub fn scroll_reset_count(&self) -> usize {
        self.scroll_resets
    }

    /// Moves the cursor as if the user typed or followed an external link;
    /// no popstate is queued.
    pub fn navigate_externally(&mut self, url: &str) {
        self.push_state(url);
    }

    /// Consumes one queued popstate notification.
    pub fn take_pop_state(&mut self) -> bool {
        if self.pending_pop_states == 0 {
            return false;
        }
        self.pending_pop_states -= 1;
        true
    }

    fn traverse(&mut self, target: Option<usize>) {
        if let Some(target) = target.filter(|index| *index < self.entries.len()) {
            self.index = target;
            self.pending_pop_states += 1;
        }
    }
}

impl Window for SessionHistory {
    fn location(&self) -> String {
        self.entries.get(self.index).cloned().unwrap_or_default()
    }

    fn push_state(&mut self, url: &str) {
        self.entries.truncate(self.index + 1);
        self.entries.push(url.to_owned());
        self.index = self.entries.len() - 1;
    }

    fn replace_state(&mut self, url: &str) {
        match self.entries.get_mut(self.index) {
            Some(entry) => *entry = url.to_owned(),
            None => self.entries.push(url.to_owned()),
        }
    }

    fn back(&mut self) {
        self.traverse(self.index.checked_sub(1));
    }

    fn forward(&mut self) {
        self.traverse(self.index.checked_add(1));
    }

    fn reload(&mut self) {
        self.reloads += 1;
    }

    fn scroll_to_top(&mut self) {
        self.scroll_resets += 1;
    }
}
