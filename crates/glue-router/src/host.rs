//! Contracts the router needs from its host: a document it can read and
//! mutate, and a window with session history.

use crate::snapshot::ElementDescriptor;
use glue_core::GlueResult;

/// Read-only document queries used during extraction.
///
/// Attribute queries walk elements in document order and must not enter
/// `<template>` content.
pub trait DocumentView {
    type Node: Copy + Eq + std::fmt::Debug;

    fn first_with_attribute(&self, name: &str) -> Option<Self::Node>;
    fn all_with_attribute(&self, name: &str) -> Vec<Self::Node>;
    fn first_with_attribute_value(&self, name: &str, value: &str) -> Option<Self::Node>;

    fn tag_name(&self, node: Self::Node) -> Option<&str>;
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;
    fn attributes(&self, node: Self::Node) -> Vec<(String, String)>;
    fn text_content(&self, node: Self::Node) -> String;
    fn inner_html(&self, node: Self::Node) -> String;

    /// Element children, or the template content's element children when
    /// `node` is a `<template>`.
    fn element_children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// `document.title`; `None` when empty.
    fn title(&self) -> Option<String>;
}

/// Mutations used when applying a snapshot to the live document.
pub trait LiveDocument: DocumentView {
    fn set_inner_html(&mut self, node: Self::Node, markup: &str) -> GlueResult<()>;
    fn remove(&mut self, node: Self::Node);
    fn set_title(&mut self, title: &str);
    fn append_to_head(&mut self, element: &ElementDescriptor) -> GlueResult<Self::Node>;

    /// Replaces `node` with a newly constructed element and returns it.
    /// The new node must not compare equal to `node`.
    fn replace_with_element(
        &mut self,
        node: Self::Node,
        element: &ElementDescriptor,
    ) -> GlueResult<Self::Node>;
}

/// Browser window surface: location, session history, scrolling.
///
/// Traversal is asynchronous in browsers: `back` and `forward` only request
/// it, and the host forwards the resulting popstate to
/// [`crate::Router::handle_pop_state`].
pub trait Window {
    fn location(&self) -> String;
    fn push_state(&mut self, url: &str);
    fn replace_state(&mut self, url: &str);
    fn back(&mut self);
    fn forward(&mut self);
    fn reload(&mut self);
    fn scroll_to_top(&mut self);
}
