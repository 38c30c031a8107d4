//! Rendered-text extraction
//!
//! Turns raw HTML into the lower-cased text the detector scans. Text nodes
//! outside `<script>`, `<style>` and `<noscript>` are concatenated verbatim,
//! so inline markup never splits a word. Block-level boundaries become a
//! space, and whitespace runs collapse to one space.

use scraper::{ElementRef, Html, Node};

/// Elements whose text content is never part of the rendered page
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that start a new line of rendered text
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "option", "p", "pre", "section", "table", "tbody", "td",
    "tfoot", "th", "thead", "title", "tr", "ul",
];

/// Extracts lower-cased visible text from an HTML document
///
/// # Examples
///
/// ```
/// use forge_scout::detect::page_text;
///
/// let html = "<html><head><style>p { color: red }</style></head>\
///             <body><p>CNC Machin<b>ing</b></p><script>var mig = 1;</script></body></html>";
/// assert_eq!(page_text(html), "cnc machining");
/// ```
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);

    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    out.push(' ');
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}
