//! HTML tokenization and tree construction into a `glue_dom::Document`.

mod tokenizer;

use glue_core::GlueError;
use glue_core::GlueResult;
use glue_dom::Document;
use glue_dom::NodeId;
use glue_dom::is_void_element;
use tokenizer::Token;
use tokenizer::is_raw_text_tag;
use tokenizer::is_rcdata_tag;
use tokenizer::tokenize;

/// Deepest element nesting accepted before a document is rejected.
pub const MAX_TREE_DEPTH: usize = 512;

/// Parses raw HTML into a DOM document.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn parse(&self, input: &str) -> GlueResult<Document> {
        let mut doc = Document::new();
        let root = doc.root();
        build_into(&mut doc, root, tokenize(input))?;
        Ok(doc)
    }

    /// Parses `markup` as the new content of `parent` (`innerHTML` semantics)
    /// and appends the resulting nodes. Existing children are left in place.
    pub fn parse_fragment_into(
        &self,
        doc: &mut Document,
        parent: NodeId,
        markup: &str,
    ) -> GlueResult<Vec<NodeId>> {
        let context = doc.tag_name(parent).map(str::to_owned);
        if let Some(tag) = context.as_deref() {
            if is_raw_text_tag(tag) || is_rcdata_tag(tag) {
                if markup.is_empty() {
                    return Ok(Vec::new());
                }
                let text = if is_rcdata_tag(tag) {
                    tokenizer::decode_entities(markup)
                } else {
                    markup.to_owned()
                };
                let node = doc.create_text(&text);
                doc.append_child(parent, node);
                return Ok(vec![node]);
            }
        }

        let before = doc.children(parent).len();
        build_into(doc, parent, tokenize(markup))?;
        Ok(doc.children(parent)[before..].to_vec())
    }
}

struct OpenElement {
    node: NodeId,
    tag: String,
}

fn build_into(doc: &mut Document, parent: NodeId, tokens: Vec<Token>) -> GlueResult<()> {
    let mut stack: Vec<OpenElement> = Vec::new();

    for token in tokens {
        let current = stack.last().map_or(parent, |open| open.node);
        match token {
            Token::Text(text) => {
                let node = doc.create_text(&text);
                doc.append_child(current, node);
            }
            Token::Comment(text) => {
                let node = doc.create_comment(&text);
                doc.append_child(current, node);
            }
            Token::Start {
                name,
                attrs,
                self_closing,
            } => {
                close_implied(&mut stack, &name);
                let current = stack.last().map_or(parent, |open| open.node);

                let node = doc.create_element_with_attrs(&name, attrs);
                doc.append_child(current, node);

                if self_closing || is_void_element(&name) {
                    continue;
                }

                if stack.len() >= MAX_TREE_DEPTH {
                    return Err(GlueError::parse(
                        "html.depth_exceeded",
                        format!("element nesting exceeds {MAX_TREE_DEPTH} levels at <{name}>"),
                    ));
                }
                stack.push(OpenElement { node, tag: name });
            }
            Token::End { name } => {
                // End tags without a matching open element are ignored.
                if let Some(position) = stack.iter().rposition(|open| open.tag == name) {
                    stack.truncate(position);
                }
            }
        }
    }

    Ok(())
}

/// Applies the small set of implicit end-tag rules that matter for
/// tolerant parsing of real-world markup.
fn close_implied(stack: &mut Vec<OpenElement>, incoming: &str) {
    let Some(top) = stack.last() else {
        return;
    };

    let closes = match top.tag.as_str() {
        "p" => closes_paragraph(incoming),
        "li" => incoming == "li",
        "dt" | "dd" => matches!(incoming, "dt" | "dd"),
        "option" => matches!(incoming, "option" | "optgroup"),
        "tr" => incoming == "tr",
        "td" | "th" => matches!(incoming, "td" | "th" | "tr"),
        "head" => incoming == "body",
        _ => false,
    };

    if closes {
        stack.pop();
    }
}

fn closes_paragraph(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "div"
            | "dl"
            | "fieldset"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "ul"
    )
}

#[cfg(test)]
mod tests {
    use super::HtmlParser;
    use super::MAX_TREE_DEPTH;
    use glue_core::ErrorKind;

    #[test]
    fn parses_title_and_nested_markup() {
        let parser = HtmlParser;
        let doc = parser.parse(
            "<!doctype html><html><head><title> Glue  Demo </title></head>\
             <body><main data-glue-page><p>Hi <b>there</b></p></main></body></html>",
        );
        let doc = match doc {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };

        assert_eq!(doc.title().as_deref(), Some("Glue Demo"));
        let page = doc.first_with_attribute("data-glue-page");
        assert!(page.is_some());
        if let Some(page) = page {
            assert_eq!(doc.inner_html(page), "<p>Hi <b>there</b></p>");
        }
    }

    #[test]
    fn unmatched_end_tags_are_ignored() {
        let parser = HtmlParser;
        let doc = match parser.parse("<div id=a></span>text</div>") {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };
        let root = doc.root();
        assert_eq!(doc.inner_html(root), "<div id=\"a\">text</div>");
    }

    #[test]
    fn unclosed_elements_are_closed_at_end_of_input() {
        let parser = HtmlParser;
        let doc = match parser.parse("<ul><li>one<li>two</ul><p>a<div>b</div>") {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };
        let root = doc.root();
        assert_eq!(
            doc.inner_html(root),
            "<ul><li>one</li><li>two</li></ul><p>a</p><div>b</div>"
        );
    }

    #[test]
    fn fragment_into_script_creates_single_text_node() {
        let parser = HtmlParser;
        let mut doc = match parser.parse("<script></script>") {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };
        let script = match doc.first_element_by_tag("script") {
            Some(node) => node,
            None => panic!("script missing"),
        };

        let created = parser.parse_fragment_into(&mut doc, script, "<b>not markup</b>");
        let created = match created {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(created.len(), 1);
        assert_eq!(doc.text_content(script), "<b>not markup</b>");
    }

    #[test]
    fn fragment_appends_after_existing_children() {
        let parser = HtmlParser;
        let mut doc = match parser.parse("<div><i>a</i></div>") {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };
        let div = match doc.first_element_by_tag("div") {
            Some(node) => node,
            None => panic!("div missing"),
        };

        let created = match parser.parse_fragment_into(&mut doc, div, "<b>b</b>c") {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(created.len(), 2);
        assert_eq!(doc.inner_html(div), "<i>a</i><b>b</b>c");
    }

    #[test]
    fn rejects_pathologically_deep_nesting() {
        let parser = HtmlParser;
        let markup = "<div>".repeat(MAX_TREE_DEPTH + 1);
        let result = parser.parse(&markup);
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.kind, ErrorKind::Parse);
            assert_eq!(error.code, "html.depth_exceeded");
        }
    }

    #[test]
    fn void_elements_do_not_swallow_siblings() {
        let parser = HtmlParser;
        let doc = match parser.parse("<head><meta charset=utf-8><link rel=x></head>") {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };
        let head = match doc.head() {
            Some(node) => node,
            None => panic!("head missing"),
        };
        assert_eq!(doc.element_children(head).len(), 2);
    }
}
