//! Snapshot extraction. Never mutates the document it reads.

use crate::config::RouterConfig;
use crate::hash::script_key;
use crate::host::DocumentView;
use crate::snapshot::ElementDescriptor;
use crate::snapshot::Snapshot;
use glue_core::GlueError;
use glue_core::GlueResult;
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Builds a [`Snapshot`] of `document`.
///
/// Fails with a structural error when no page root is present. Only the
/// first page root and the first head-content source are used; a layout
/// name seen twice keeps its first position and its last content.
pub fn extract<D>(document: &D, config: &RouterConfig) -> GlueResult<Snapshot>
where
    D: DocumentView + ?Sized,
{
    let page = document
        .first_with_attribute(&config.page_marker)
        .ok_or_else(|| {
            GlueError::structural(
                "router.extract.page_root_missing",
                format!("no [{}] element found", config.page_marker),
            )
        })?;

    let mut layouts = IndexMap::new();
    for region in document.all_with_attribute(&config.layout_marker) {
        let Some(name) = document.attribute(region, &config.layout_marker) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        layouts.insert(name.to_owned(), document.inner_html(region));
    }

    let head_content = document
        .first_with_attribute(&config.head_marker)
        .map(|source| {
            document
                .element_children(source)
                .into_iter()
                .map(|child| describe(document, child))
                .collect::<Vec<_>>()
        });

    let scripts: BTreeSet<String> = document
        .all_with_attribute(&config.script_marker)
        .into_iter()
        .map(|script| {
            script_key(
                document.attribute(script, "src"),
                &document.text_content(script),
            )
        })
        .collect();

    Ok(Snapshot {
        body_html: document.inner_html(page),
        layouts,
        title: document.title(),
        head_content,
        scripts,
    })
}

/// Detached copy of `node` (tag, attributes, markup, text).
pub fn describe<D>(document: &D, node: D::Node) -> ElementDescriptor
where
    D: DocumentView + ?Sized,
{
    ElementDescriptor {
        tag: document.tag_name(node).unwrap_or_default().to_owned(),
        attributes: document.attributes(node),
        inner_html: document.inner_html(node),
        text: document.text_content(node),
    }
}
