use std::fmt;

use serde::{Deserialize, Serialize};

/// Elements that never have children or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomNode {
    Element(Element),
    Text(String),
    Comment(String),
}

impl DomNode {
    pub fn text(text: impl Into<String>) -> Self {
        DomNode::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            DomNode::Element(el) => Some(el),
            DomNode::Text(_) | DomNode::Comment(_) => None,
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            DomNode::Element(el) => el.text_content(),
            DomNode::Text(text) => text.clone(),
            DomNode::Comment(_) => String::new(),
        }
    }
}

impl From<Element> for DomNode {
    fn from(value: Element) -> Self {
        DomNode::Element(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DomNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Replaces the value in place when the attribute exists, so attribute order is stable.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attrs.push(Attribute { name, value }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let ix = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(ix).value)
    }

    pub fn retain_attrs(&mut self, mut keep: impl FnMut(&Attribute) -> bool) {
        self.attrs.retain(|a| keep(a));
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_opt_attr(self, name: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.with_attr(name, value),
            None => self,
        }
    }

    pub fn with_child(mut self, child: impl Into<DomNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(DomNode::Text(text.into()));
        self
    }

    pub fn push(&mut self, child: impl Into<DomNode>) {
        self.children.push(child.into());
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(DomNode::as_element)
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    pub fn is_void(&self) -> bool {
        is_void_element(&self.tag)
    }

    /// Descends through `path` (child indices) and returns the element found there.
    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = self;
        for &ix in path {
            current = match current.children.get_mut(ix)? {
                DomNode::Element(el) => el,
                DomNode::Text(_) | DomNode::Comment(_) => return None,
            };
        }
        Some(current)
    }
}

fn collect_text(nodes: &[DomNode], out: &mut String) {
    for node in nodes {
        match node {
            DomNode::Element(el) => collect_text(&el.children, out),
            DomNode::Text(text) => out.push_str(text),
            DomNode::Comment(_) => {}
        }
    }
}

pub fn serialize(nodes: &[DomNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

pub fn serialize_element(element: &Element) -> String {
    let mut out = String::new();
    write_element(element, &mut out);
    out
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_element(self))
    }
}

fn write_node(node: &DomNode, out: &mut String) {
    match node {
        DomNode::Element(el) => write_element(el, out),
        DomNode::Text(text) => escape_text_into(text, out),
        DomNode::Comment(text) => {
            out.push_str("<!--");
            out.push_str(&text.replace("--", "- -"));
            out.push_str("-->");
        }
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);
    for attr in &el.attrs {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        escape_attr_into(&attr.value, out);
        out.push('"');
    }
    out.push('>');
    if el.is_void() {
        return;
    }
    for child in &el.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_text_into(text, &mut out);
    out
}

fn escape_text_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr_into(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_void_and_escapes() {
        let el = Element::new("p")
            .with_attr("title", "a \"b\" & c")
            .with_text("1 < 2")
            .with_child(Element::new("br"));
        assert_eq!(
            serialize_element(&el),
            "<p title=\"a &quot;b&quot; &amp; c\">1 &lt; 2<br></p>"
        );
    }

    #[test]
    fn set_attr_keeps_position() {
        let mut el = Element::new("img").with_attr("src", "a").with_attr("alt", "b");
        el.set_attr("src", "c");
        assert_eq!(el.attrs[0].name, "src");
        assert_eq!(el.attr("src"), Some("c"));
    }

    #[test]
    fn dom_ships_as_json() {
        let el = Element::new("p").with_attr("class", "x").with_text("hi");
        let json = serde_json::to_value(DomNode::from(el.clone())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "element": {
                    "tag": "p",
                    "attrs": [{ "name": "class", "value": "x" }],
                    "children": [{ "text": "hi" }]
                }
            })
        );
        let back: DomNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, DomNode::Element(el));
    }
}
