//! HTML to XHTML conversion for EPUB content documents.
//!
//! Feed summaries are tag soup: unquoted attributes, HTML-only entities such as
//! `&nbsp;`, unclosed paragraphs. The markup is parsed with html5ever, which
//! repairs it the way a browser would, and the tree is written back as XML.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use html_escape::{encode_double_quoted_attribute, encode_text};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn parse_html(html: &str) -> RcDom {
    parse_document(RcDom::default(), ParseOpts::default()).one(html)
}

/// Children of `<body>` as well-formed XHTML, ready to sit inside an XHTML `<body>`.
///
/// Comments, doctypes and processing instructions are dropped. So are attributes
/// that have no plain XML name.
pub fn body_to_xhtml(html: &str) -> String {
    let dom = parse_html(html);
    let mut out = String::new();

    if let Some(body) = find_first_element(&dom.document, "body") {
        for child in body.children.borrow().iter() {
            write_node(&mut out, child, XHTML_NS);
        }
    }
    out
}

fn find_first_element(handle: &Handle, local: &str) -> Option<Handle> {
    if let NodeData::Element { ref name, .. } = handle.data {
        if &*name.local == local {
            return Some(handle.clone());
        }
    }

    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_first_element(child, local))
}

fn write_node(out: &mut String, handle: &Handle, parent_ns: &str) {
    match handle.data {
        NodeData::Text { ref contents } => {
            out.push_str(&encode_text(&xml_chars(&contents.borrow())));
        }
        NodeData::Element {
            ref name,
            ref attrs,
            ..
        } => {
            let local = &*name.local;
            let ns = &*name.ns;

            // keep the content of elements XML cannot name
            if !is_xml_name(local) {
                for child in handle.children.borrow().iter() {
                    write_node(out, child, parent_ns);
                }
                return;
            }

            out.push('<');
            out.push_str(local);
            if ns != parent_ns {
                out.push_str(&format!(" xmlns=\"{}\"", encode_double_quoted_attribute(ns)));
            }
            for attr in attrs.borrow().iter() {
                let attr_name = &*attr.name.local;
                if !attr.name.ns.is_empty() || !is_xml_name(attr_name) || attr_name == "xmlns" {
                    continue;
                }
                out.push_str(&format!(
                    " {}=\"{}\"",
                    attr_name,
                    encode_double_quoted_attribute(&xml_chars(&attr.value))
                ));
            }

            let children = handle.children.borrow();
            if children.is_empty() && (ns != XHTML_NS || VOID_ELEMENTS.contains(&local)) {
                out.push_str("/>");
                return;
            }

            out.push('>');
            for child in children.iter() {
                write_node(out, child, ns);
            }
            out.push_str("</");
            out.push_str(local);
            out.push('>');
        }
        _ => {}
    }
}

/// ASCII names only: a letter or `_`, then letters, digits, `-`, `_` or `.`.
fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Drop characters XML 1.0 does not allow, such as most C0 controls.
fn xml_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}'))
        .collect()
}
