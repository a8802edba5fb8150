//! Applies a snapshot to the live document.
//!
//! Order matters and is fixed: layout regions, page root, head, scripts.
//! The router finishes the navigation by moving its URL cursor and emitting
//! the navigated event.

use crate::config::RouterConfig;
use crate::hash::script_key;
use crate::host::LiveDocument;
use crate::snapshot::ElementDescriptor;
use crate::snapshot::Snapshot;
use glue_core::GlueError;
use glue_core::GlueResult;

pub fn apply<D>(document: &mut D, snapshot: &Snapshot, config: &RouterConfig) -> GlueResult<()>
where
    D: LiveDocument + ?Sized,
{
    let root = document
        .first_with_attribute(&config.page_marker)
        .ok_or_else(|| {
            GlueError::structural(
                "router.apply.page_root_missing",
                format!("live document has no [{}] element", config.page_marker),
            )
        })?;

    // Regions the snapshot does not name are left as they are.
    for (name, markup) in &snapshot.layouts {
        if let Some(region) = document.first_with_attribute_value(&config.layout_marker, name) {
            document.set_inner_html(region, markup)?;
        }
    }

    document.set_inner_html(root, &snapshot.body_html)?;

    sync_head(document, snapshot, config)?;
    rerun_scripts(document, snapshot, config)
}

fn sync_head<D>(document: &mut D, snapshot: &Snapshot, config: &RouterConfig) -> GlueResult<()>
where
    D: LiveDocument + ?Sized,
{
    let Some(head_content) = &snapshot.head_content else {
        if let Some(title) = &snapshot.title {
            document.set_title(title);
        }
        return Ok(());
    };

    for stale in document.all_with_attribute(&config.dynamic_marker) {
        document.remove(stale);
    }

    for descriptor in head_content {
        let mut element = descriptor.clone();
        element.set_attribute(&config.dynamic_marker, "");
        if element.is_title() {
            document.set_title(&element.text);
        } else {
            document.append_to_head(&element)?;
        }
    }

    Ok(())
}

/// Scripts inserted through markup never run, so every marked script whose
/// key is in the snapshot is swapped for a freshly built element.
fn rerun_scripts<D>(document: &mut D, snapshot: &Snapshot, config: &RouterConfig) -> GlueResult<()>
where
    D: LiveDocument + ?Sized,
{
    for script in document.all_with_attribute(&config.script_marker) {
        let text = document.text_content(script);
        let key = script_key(document.attribute(script, "src"), &text);
        if !snapshot.has_script(&key) {
            continue;
        }

        let mut fresh = ElementDescriptor::new("script");
        fresh.attributes = document
            .attributes(script)
            .into_iter()
            .filter(|(name, _)| !name.starts_with(&config.internal_prefix))
            .collect();
        fresh.inner_html.clone_from(&text);
        fresh.text = text;

        document.replace_with_element(script, &fresh)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::apply;
    use crate::config::RouterConfig;
    use crate::extract::extract;
    use crate::snapshot::Snapshot;
    use glue_core::ErrorKind;
    use glue_dom::Document;
    use glue_html::HtmlParser;

    fn parse(markup: &str) -> Document {
        match HtmlParser.parse(markup) {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        }
    }

    fn snapshot_of(markup: &str) -> Snapshot {
        match extract(&parse(markup), &RouterConfig::default()) {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        }
    }

    const LIVE: &str = "<html><head><title>Home</title></head><body>\
        <nav data-glue-layout=\"nav\">home nav</nav>\
        <footer data-glue-layout=\"footer\">home footer</footer>\
        <main data-glue-page><p>home</p></main></body></html>";

    const NEXT: &str = "<html><head><title>About</title>\
        <template data-glue-head><meta name=\"description\" content=\"about\">\
        <title>About | Site</title></template></head><body>\
        <nav data-glue-layout=\"nav\">about nav</nav>\
        <main data-glue-page><p>about</p>\
        <script data-glue-script type=\"module\">boot()</script></main></body></html>";

    fn region(doc: &Document, name: &str) -> String {
        match doc.first_with_attribute_value("data-glue-layout", name) {
            Some(node) => doc.inner_html(node),
            None => panic!("region {name} missing"),
        }
    }

    fn page(doc: &Document) -> String {
        match doc.first_with_attribute("data-glue-page") {
            Some(node) => doc.inner_html(node),
            None => panic!("page root missing"),
        }
    }

    #[test]
    fn swaps_named_regions_and_leaves_others() {
        let mut doc = parse(LIVE);
        let snapshot = snapshot_of(NEXT);
        assert!(apply(&mut doc, &snapshot, &RouterConfig::default()).is_ok());

        assert_eq!(region(&doc, "nav"), "about nav");
        assert_eq!(region(&doc, "footer"), "home footer");
        assert!(page(&doc).starts_with("<p>about</p>"));
    }

    #[test]
    fn head_content_is_marked_dynamic_and_title_is_set() {
        let mut doc = parse(LIVE);
        let snapshot = snapshot_of(NEXT);
        assert!(apply(&mut doc, &snapshot, &RouterConfig::default()).is_ok());

        assert_eq!(doc.title().as_deref(), Some("About | Site"));
        let dynamic = doc.all_with_attribute("data-glue-dynamic");
        assert_eq!(dynamic.len(), 1);
        assert_eq!(doc.attribute(dynamic[0], "name"), Some("description"));
        assert_eq!(doc.parent(dynamic[0]), doc.head());
    }

    #[test]
    fn title_only_snapshot_keeps_head() {
        let mut doc = parse(NEXT);
        let snapshot = snapshot_of(LIVE);
        assert!(snapshot.head_content.is_none());
        let head_before = match doc.head() {
            Some(head) => doc.inner_html(head),
            None => panic!("head missing"),
        };

        assert!(apply(&mut doc, &snapshot, &RouterConfig::default()).is_ok());
        assert_eq!(doc.title().as_deref(), Some("Home"));
        let head_after = match doc.head() {
            Some(head) => doc.inner_html(head),
            None => panic!("head missing"),
        };
        assert_eq!(
            head_after.replace("<title>Home</title>", "<title>About</title>"),
            head_before
        );
    }

    #[test]
    fn applying_twice_matches_applying_once() {
        let snapshot = snapshot_of(NEXT);
        let config = RouterConfig::default();

        let mut once = parse(LIVE);
        assert!(apply(&mut once, &snapshot, &config).is_ok());
        let mut twice = parse(LIVE);
        assert!(apply(&mut twice, &snapshot, &config).is_ok());
        assert!(apply(&mut twice, &snapshot, &config).is_ok());

        assert_eq!(once.inner_html(once.root()), twice.inner_html(twice.root()));
        assert_eq!(once.title(), twice.title());
        assert_eq!(
            once.all_with_attribute("data-glue-dynamic").len(),
            twice.all_with_attribute("data-glue-dynamic").len()
        );
    }

    #[test]
    fn matching_scripts_are_rebuilt_without_internal_attributes() {
        let mut doc = parse(NEXT);
        let snapshot = snapshot_of(NEXT);
        let before = match doc.first_element_by_tag("script") {
            Some(node) => node,
            None => panic!("script missing"),
        };
        let rebuilt_markup = snapshot.body_html.replace(" data-glue-script=\"\"", "");

        assert!(apply(&mut doc, &snapshot, &RouterConfig::default()).is_ok());
        let after = match doc.first_element_by_tag("script") {
            Some(node) => node,
            None => panic!("script missing after apply"),
        };

        assert_ne!(before, after);
        assert_eq!(
            doc.outer_html(after),
            "<script type=\"module\">boot()</script>"
        );
        assert_eq!(page(&doc), rebuilt_markup);
    }

    #[test]
    fn scripts_outside_the_snapshot_are_left_alone() {
        let mut doc = parse(
            "<main data-glue-page></main>\
             <script data-glue-script>analytics()</script>",
        );
        let before = match doc.first_element_by_tag("script") {
            Some(node) => node,
            None => panic!("script missing"),
        };
        let snapshot = Snapshot {
            body_html: "<p>x</p>".to_owned(),
            ..Snapshot::default()
        };
        assert!(apply(&mut doc, &snapshot, &RouterConfig::default()).is_ok());
        assert_eq!(doc.first_element_by_tag("script"), Some(before));
    }

    #[test]
    fn live_document_without_page_root_is_structural() {
        let mut doc = parse("<div>static</div>");
        let result = apply(&mut doc, &Snapshot::default(), &RouterConfig::default());
        assert!(result.is_err_and(|error| error.kind == ErrorKind::Structural));
    }
}
