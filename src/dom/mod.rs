//! # Element Tree
//!
//! An owned, cloneable HTML element tree. Blocks, page containers and split
//! fragments are all built from it, and it is what the layout backend
//! measures. Parsing goes through html5ever, which recovers from malformed
//! markup the way a browser does, so nothing here fails on arbitrary input.

use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use serde::Serialize;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Element(Element),
    Text { text: String },
}

impl Node {
    pub fn text(text: &str) -> Self {
        Node::Text {
            text: text.to_string(),
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text { .. } => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text { .. } => None,
        }
    }

    /// Whitespace-only text nodes carry no content.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text { text } if text.trim().is_empty())
    }

    pub fn text_content(&self) -> String {
        match self {
            Node::Element(el) => el.text_content(),
            Node::Text { text } => text.clone(),
        }
    }

    /// Does this node produce anything visible?
    pub fn has_visible_content(&self) -> bool {
        match self {
            Node::Element(el) => el.has_visible_content(),
            Node::Text { text } => !text.trim().is_empty(),
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Element(el) => el.write_html(out),
            Node::Text { text } => out.push_str(&escape_text(text)),
        }
    }
}

/// An HTML element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Copy of this element with the same tag and attributes but no children.
    pub fn shallow_clone(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            attrs: self.attrs.clone(),
            children: Vec::new(),
        }
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(slot) = self.attrs.iter_mut().find(|(k, _)| k == name) {
            slot.1 = value.to_string();
        } else {
            self.attrs.push((name.to_string(), value.to_string()));
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let value = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attr("class", &value);
    }

    /// Set one property in the inline `style` attribute, keeping the others.
    pub fn set_style_property(&mut self, name: &str, value: &str) {
        let mut decls = crate::style::parse_declarations(self.attr("style").unwrap_or(""));
        decls.retain(|(k, _)| k != name);
        decls.push((name.to_string(), value.to_string()));
        let style = decls
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr("style", &style);
    }

    pub fn push(&mut self, node: Node) {
        self.children.push(node);
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            out.push_str(&child.text_content());
        }
        out
    }

    /// Non-whitespace text anywhere below, or a replaced element (image,
    /// rule) that renders without text.
    pub fn has_visible_content(&self) -> bool {
        if matches!(self.tag.as_str(), "img" | "hr" | "svg" | "video" | "canvas") {
            return true;
        }
        self.children.iter().any(Node::has_visible_content)
    }

    /// First element in document order (self included) matching `pred`.
    pub fn find_first(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.find_first(pred))
    }

    /// Last element in document order (self included) matching `pred`,
    /// preferring the deepest match inside the last matching subtree.
    pub fn find_last(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        for child in self.children.iter().rev().filter_map(Node::as_element) {
            if let Some(found) = child.find_last(pred) {
                return Some(found);
            }
        }
        if pred(self) {
            Some(self)
        } else {
            None
        }
    }

    pub fn find_first_mut(&mut self, pred: &dyn Fn(&Element) -> bool) -> Option<&mut Element> {
        if pred(self) {
            return Some(self);
        }
        for child in self.children.iter_mut().filter_map(Node::as_element_mut) {
            if let Some(found) = child.find_first_mut(pred) {
                return Some(found);
            }
        }
        None
    }

    /// Every `<img>` source below this element, in document order.
    pub fn image_sources(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_image_sources(&mut out);
        out
    }

    fn collect_image_sources(&self, out: &mut Vec<String>) {
        if self.is("img") {
            if let Some(src) = self.attr("src") {
                out.push(src.to_string());
            }
        }
        for child in self.child_elements() {
            child.collect_image_sources(out);
        }
    }

    /// Serialize this element and its subtree.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_html(&mut out);
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return;
        }
        if matches!(self.tag.as_str(), "style" | "script") {
            out.push_str(&self.text_content());
        } else {
            for child in &self.children {
                child.write_html(out);
            }
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

/// Parse an HTML fragment in `<body>` context.
///
/// Comments, doctypes and processing instructions are dropped. Malformed
/// markup is repaired by html5ever; this never fails.
pub fn parse_fragment(html: &str) -> Vec<Node> {
    let context = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from("body"),
    );
    let dom = html5ever::parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new())
        .one(html);

    let document_children = dom.document.children.borrow();
    // Fragment parsing hangs the content off a synthetic <html> element.
    let root = document_children
        .iter()
        .find(|handle| matches!(handle.data, NodeData::Element { .. }));

    match root {
        Some(root) => root.children.borrow().iter().filter_map(convert).collect(),
        None => Vec::new(),
    }
}

/// Parse a fragment that is expected to hold exactly one element.
pub fn parse_element(html: &str) -> Option<Element> {
    parse_fragment(html).into_iter().find_map(|node| match node {
        Node::Element(el) => Some(el),
        Node::Text { .. } => None,
    })
}

fn convert(handle: &Handle) -> Option<Node> {
    match &handle.data {
        NodeData::Text { contents } => Some(Node::Text {
            text: contents.borrow().to_string(),
        }),
        NodeData::Element { name, attrs, .. } => {
            let mut element = Element::new(&name.local);
            element.attrs = attrs
                .borrow()
                .iter()
                .map(|a| (a.name.local.to_string(), a.value.to_string()))
                .collect();
            element.children = handle.children.borrow().iter().filter_map(convert).collect();
            Some(Node::Element(element))
        }
        _ => None,
    }
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_siblings_in_order() {
        let nodes = parse_fragment("<h1>Title</h1><p>One</p><p>Two</p>");
        let tags: Vec<&str> = nodes
            .iter()
            .filter_map(Node::as_element)
            .map(|e| e.tag.as_str())
            .collect();
        assert_eq!(tags, vec!["h1", "p", "p"]);
    }

    #[test]
    fn drops_comments() {
        let nodes = parse_fragment("<!-- note --><p>x</p>");
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn recovers_from_unclosed_tags() {
        let nodes = parse_fragment("<p>open <b>bold");
        let p = nodes[0].as_element().unwrap();
        assert_eq!(p.text_content(), "open bold");
        assert_eq!(p.to_html(), "<p>open <b>bold</b></p>");
    }

    #[test]
    fn serializes_void_elements_and_escapes() {
        let el = Element::new("p").with_children(vec![
            Node::text("a < b & c"),
            Node::Element(Element::new("br")),
            Node::Element(Element::new("img").with_attr("alt", "say \"hi\"")),
        ]);
        assert_eq!(
            el.to_html(),
            "<p>a &lt; b &amp; c<br><img alt=\"say &quot;hi&quot;\"></p>"
        );
    }

    #[test]
    fn reparse_is_stable() {
        let html = "<ol start=\"3\"><li>a</li><li><em>b</em></li></ol>";
        let el = parse_element(html).unwrap();
        assert_eq!(el.to_html(), html);
    }

    #[test]
    fn style_property_replaces_existing_value() {
        let mut el = Element::new("img").with_attr("style", "width: 10px; border: 0");
        el.set_style_property("width", "20px");
        assert_eq!(el.attr("style"), Some("border: 0; width: 20px"));
    }

    #[test]
    fn class_helpers() {
        let mut el = Element::new("ul").with_attr("class", "notes");
        el.add_class("list-continuation");
        el.add_class("list-continuation");
        assert_eq!(el.attr("class"), Some("notes list-continuation"));
        assert!(el.has_class("notes"));
    }

    #[test]
    fn find_last_prefers_deepest_trailing_match() {
        let el = parse_element("<div><ul><li>a</li></ul><p>x<ol><li>b</li></ol></p></div>").unwrap();
        let found = el.find_last(&|e| e.is("ul") || e.is("ol")).unwrap();
        assert!(found.is("ol"));
    }

    #[test]
    fn visible_content_counts_images() {
        let el = parse_element("<p> <img src=\"x.png\"> </p>").unwrap();
        assert!(el.has_visible_content());
        let empty = parse_element("<p>  </p>").unwrap();
        assert!(!empty.has_visible_content());
    }
}
