//! Small streaming passes over HTML built on lol_html.
//!
//! Every pass leaves markup it does not touch byte-for-byte intact.

use std::cell::RefCell;
use std::rc::Rc;

use html_escape::decode_html_entities;
use lol_html::html_content::EndTag;
use lol_html::{doc_text, element, rewrite_str, EndTagHandler, RewriteStrSettings};

use crate::app::Result;

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "pre",
    "section", "table", "tr", "ul",
];

/// `src` of every `<img>` in document order. `None` when the attribute is absent.
pub fn image_sources(html: &str) -> Result<Vec<Option<String>>> {
    let mut sources = Vec::new();

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("img", |el| {
                sources.push(
                    el.get_attribute("src")
                        .map(|src| decode_html_entities(&src).into_owned()),
                );
                Ok(())
            })],
            strict: false,
            ..RewriteStrSettings::new()
        },
    )?;

    Ok(sources)
}

/// Set the `src` of the first `replacements.len()` images; later images are left alone.
pub fn replace_image_sources(html: &str, replacements: &[String]) -> Result<String> {
    let mut index = 0;

    let output = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("img", |el| {
                if let Some(src) = replacements.get(index) {
                    el.set_attribute("src", src)?;
                }
                index += 1;
                Ok(())
            })],
            strict: false,
            ..RewriteStrSettings::new()
        },
    )?;

    Ok(output)
}

/// Content between `<body ...>` and the last `</body>`, or the whole input.
pub fn body_inner(html: &str) -> &str {
    let start = html
        .find("<body")
        .and_then(|open| html[open..].find('>').map(|close| open + close + 1));
    let end = html.rfind("</body>");

    match (start, end) {
        (Some(start), Some(end)) if start <= end => &html[start..end],
        _ => html,
    }
}

/// Plain text of a fragment: tags dropped, entities decoded, whitespace collapsed.
pub fn to_text(html: &str) -> Result<String> {
    let mut raw = String::new();

    rewrite_str(
        html,
        RewriteStrSettings {
            document_content_handlers: vec![doc_text!(|t| {
                raw.push_str(t.as_str());
                Ok(())
            })],
            strict: false,
            ..RewriteStrSettings::new()
        },
    )?;

    Ok(collapse_whitespace(&decode_html_entities(&raw)))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A unit of flowed content for page layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(String),
    Paragraph(String),
    Image(String),
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    current: String,
    heading_depth: usize,
}

impl BlockBuilder {
    fn flush(&mut self) {
        let text = collapse_whitespace(&decode_html_entities(&self.current));
        self.current.clear();
        if text.is_empty() {
            return;
        }
        if self.heading_depth > 0 {
            self.blocks.push(Block::Heading(text));
        } else {
            self.blocks.push(Block::Paragraph(text));
        }
    }
}

/// Split the `<body>` of a document into headings, paragraphs and images.
pub fn blocks(html: &str) -> Result<Vec<Block>> {
    let state = Rc::new(RefCell::new(BlockBuilder::default()));
    let on_element = state.clone();
    let on_text = state.clone();

    rewrite_str(
        body_inner(html),
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", move |el| {
                let tag = el.tag_name();
                let is_heading = matches!(tag.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6");

                if tag == "img" {
                    let mut builder = on_element.borrow_mut();
                    builder.flush();
                    if let Some(src) = el.get_attribute("src").filter(|s| !s.is_empty()) {
                        builder
                            .blocks
                            .push(Block::Image(decode_html_entities(&src).into_owned()));
                    }
                    return Ok(());
                }
                if tag == "br" {
                    on_element.borrow_mut().flush();
                    return Ok(());
                }
                if !BLOCK_ELEMENTS.contains(&tag.as_str()) {
                    return Ok(());
                }

                {
                    let mut builder = on_element.borrow_mut();
                    builder.flush();
                    if is_heading {
                        builder.heading_depth += 1;
                    }
                }

                let on_end = on_element.clone();
                if let Some(handlers) = el.end_tag_handlers() {
                    let handler: EndTagHandler<'static> = Box::new(move |_end: &mut EndTag<'_>| {
                        let mut builder = on_end.borrow_mut();
                        builder.flush();
                        if is_heading {
                            builder.heading_depth = builder.heading_depth.saturating_sub(1);
                        }
                        Ok(())
                    });
                    handlers.push(handler);
                }
                Ok(())
            })],
            document_content_handlers: vec![doc_text!(move |t| {
                on_text.borrow_mut().current.push_str(t.as_str());
                Ok(())
            })],
            strict: false,
            ..RewriteStrSettings::new()
        },
    )?;

    let mut builder = state.borrow_mut();
    builder.flush();
    Ok(std::mem::take(&mut builder.blocks))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_sources_in_order() {
        let html = r#"<p><img src="http://a/1.png"><img src=""><img alt="x"></p>"#;
        assert_eq!(
            image_sources(html).unwrap(),
            vec![Some("http://a/1.png".into()), Some(String::new()), None]
        );
    }

    #[test]
    fn test_image_sources_decodes_entities() {
        let html = r#"<img src="http://a/x.png?w=1&amp;h=2">"#;
        assert_eq!(
            image_sources(html).unwrap(),
            vec![Some("http://a/x.png?w=1&h=2".into())]
        );
    }

    #[test]
    fn test_image_sources_none() {
        assert!(image_sources("<p>no images</p>").unwrap().is_empty());
    }

    #[test]
    fn test_replace_only_leading_images() {
        let html = r#"<img src="http://a/1.png"> and <img src='http://a/2.png'>"#;
        let out = replace_image_sources(html, &["images/1.png".to_string()]).unwrap();
        assert_eq!(
            out,
            r#"<img src="images/1.png"> and <img src='http://a/2.png'>"#
        );
    }

    #[test]
    fn test_replace_keeps_other_attributes_verbatim() {
        let html = "<img align=left src='http://a/1.png' width=72/>text";
        let out = replace_image_sources(html, &["images/1.png".to_string()]).unwrap();
        assert!(out.contains("align=left"));
        assert!(out.contains("width=72"));
        assert!(out.contains(r#"src="images/1.png""#));
        assert!(out.ends_with("text"));
    }

    #[test]
    fn test_body_inner() {
        let html = "<html><head><title>t</title></head><body class='x'>\n<p>hi</p>\n</body></html>";
        assert_eq!(body_inner(html), "\n<p>hi</p>\n");
        assert_eq!(body_inner("<p>fragment</p>"), "<p>fragment</p>");
    }

    #[test]
    fn test_to_text() {
        let text = to_text("<p>Fish &amp; <b>chips</b></p>\n<p>second</p>").unwrap();
        assert_eq!(text, "Fish & chips second");
    }

    #[test]
    fn test_blocks() {
        let html = r#"<html><head><title>ignored</title></head><body>
            <div class='entry'>
                <h2 class='title'>Title &amp; more</h2>
                <p><span class='date'>2024-01-01</span></p>
                <div class='description'>hi<img src="/abs/a.png">there</div>
            </div>
        </body></html>"#;

        assert_eq!(
            blocks(html).unwrap(),
            vec![
                Block::Heading("Title & more".into()),
                Block::Paragraph("2024-01-01".into()),
                Block::Paragraph("hi".into()),
                Block::Image("/abs/a.png".into()),
                Block::Paragraph("there".into()),
            ]
        );
    }

    #[test]
    fn test_blocks_empty_body() {
        assert!(blocks("<html><body>\n</body></html>").unwrap().is_empty());
    }
}
