//! DOM tree data structures.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by
//! [`NodeId`]. Released slots go on a free list and are reused; each reuse
//! bumps the slot's generation, so an id kept past its node's removal no
//! longer resolves instead of aliasing the slot's new occupant.

mod query;
mod serialize;

pub use query::Descendants;
pub use serialize::is_raw_text_element;
pub use serialize::is_void_element;

/// ID used to address nodes in the DOM arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    pub fn index(self) -> usize {
        self.index
    }
}

/// Element payload: lowercase tag name plus attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(key, _)| key == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    Comment(String),
    /// Slot of a removed node, waiting for reuse.
    Vacant,
}

#[derive(Debug, Clone)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Arena-backed HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    free: Vec<usize>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                generation: 0,
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            free: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId {
            index: 0,
            generation: 0,
        }
    }

    /// Number of live nodes, document node included.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Number of arena slots, vacant ones included.
    pub fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeKind::Element(Element::new(tag)))
    }

    pub fn create_element_with_attrs(&mut self, tag: &str, attrs: Vec<(String, String)>) -> NodeId {
        let mut element = Element::new(tag);
        element.attrs = attrs;
        self.push_node(NodeKind::Element(element))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(text.to_owned()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Comment(text.to_owned()))
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.nodes[index];
            slot.kind = kind;
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.nodes.len();
        self.nodes.push(Node {
            generation: 0,
            parent: None,
            children: Vec::new(),
            kind,
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.index)
            .filter(|slot| slot.generation == id.generation && slot.kind != NodeKind::Vacant)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation && slot.kind != NodeKind::Vacant)
    }

    fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Node payload, or `None` once the node has been released.
    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.node(node).map(|slot| &slot.kind)
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match self.kind(node) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match self.node_mut(node).map(|slot| &mut slot.kind) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|element| element.tag.as_str())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|element| element.attr(name))
    }

    pub fn attributes(&self, node: NodeId) -> &[(String, String)] {
        match self.element(node) {
            Some(element) => &element.attrs,
            None => &[],
        }
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(element) = self.element_mut(node) else {
            return;
        };

        let name = name.to_ascii_lowercase();
        match element.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value.to_owned(),
            None => element.attrs.push((name, value.to_owned())),
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|slot| slot.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        match self.node(node) {
            Some(slot) => &slot.children,
            None => &[],
        }
    }

    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    /// True when `node` is reachable from the document node.
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root(), node)
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = self.contains(node).then_some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Appends `child` to `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) {
            return;
        }

        if self.is_inclusive_ancestor(child, parent) {
            return;
        }

        self.detach(child);
        self.nodes[child.index].parent = Some(parent);
        self.nodes[parent.index].children.push(child);
    }

    /// Puts `replacement` in the tree position of `old` and releases `old`.
    pub fn replace(&mut self, old: NodeId, replacement: NodeId) {
        if old == replacement || old == self.root() || !self.contains(replacement) {
            return;
        }

        let Some(parent) = self.parent(old) else {
            return;
        };

        if self.is_inclusive_ancestor(replacement, old) {
            return;
        }

        self.detach(replacement);
        if let Some(position) = self.nodes[parent.index]
            .children
            .iter()
            .position(|child| *child == old)
        {
            self.nodes[parent.index].children[position] = replacement;
            self.nodes[replacement.index].parent = Some(parent);
            self.nodes[old.index].parent = None;
        }
        self.release(old);
    }

    /// Detaches `node` and releases its whole subtree.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.root() || !self.contains(node) {
            return;
        }

        self.detach(node);
        self.release(node);
    }

    pub fn clear_children(&mut self, node: NodeId) {
        let Some(slot) = self.node_mut(node) else {
            return;
        };

        let children = std::mem::take(&mut slot.children);
        for child in children {
            self.nodes[child.index].parent = None;
            self.release(child);
        }
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node.index].parent.take() else {
            return;
        };
        self.nodes[parent.index].children.retain(|child| *child != node);
    }

    fn release(&mut self, node: NodeId) {
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            let slot = &mut self.nodes[current.index];
            pending.append(&mut slot.children);
            slot.parent = None;
            slot.kind = NodeKind::Vacant;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index);
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        if let Some(NodeKind::Text(text)) = self.kind(node) {
            return text.clone();
        }

        let mut out = String::new();
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            if let Some(NodeKind::Text(text)) = self.kind(current) {
                out.push_str(text);
            }
            pending.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Replaces all children of `node` with a single text node.
    pub fn set_text_content(&mut self, node: NodeId, text: &str) {
        self.clear_children(node);
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(node, text_node);
        }
    }

    pub fn head(&self) -> Option<NodeId> {
        self.first_element_by_tag("head")
    }

    /// Returns `<head>`, creating it under `<html>` (or the document) when absent.
    pub fn ensure_head(&mut self) -> NodeId {
        if let Some(head) = self.head() {
            return head;
        }

        let parent = self
            .first_element_by_tag("html")
            .unwrap_or_else(|| self.root());
        let head = self.create_element("head");
        self.nodes[head.index].parent = Some(parent);
        self.nodes[parent.index].children.insert(0, head);
        head
    }

    /// `document.title`: text of the first `<title>`, whitespace collapsed.
    pub fn title(&self) -> Option<String> {
        let title = self.first_element_by_tag("title")?;
        let collapsed = self
            .text_content(title)
            .split_ascii_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if collapsed.is_empty() {
            None
        } else {
            Some(collapsed)
        }
    }

    pub fn set_title(&mut self, title: &str) {
        let element = match self.first_element_by_tag("title") {
            Some(existing) => existing,
            None => {
                let head = self.ensure_head();
                let created = self.create_element("title");
                self.append_child(head, created);
                created
            }
        };
        self.set_text_content(element, title);
    }
}
