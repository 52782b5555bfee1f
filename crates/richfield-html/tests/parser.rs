use richfield_html::{DomNode, Element, parse_fragment, serialize};

#[test]
fn parses_nested_elements_and_text() {
    let nodes = parse_fragment("<p class=\"x\">Hello <strong>world</strong></p>");
    assert_eq!(nodes.len(), 1);
    let p = nodes[0].as_element().unwrap();
    assert_eq!(p.tag, "p");
    assert!(p.has_class("x"));
    assert_eq!(p.children.len(), 2);
    assert!(matches!(&p.children[0], DomNode::Text(t) if t == "Hello "));
    assert_eq!(p.text_content(), "Hello world");
}

#[test]
fn doctype_and_document_wrappers() {
    let nodes = parse_fragment("<!DOCTYPE html><html><body><p>x</p></body></html>");
    assert_eq!(serialize(&nodes), "<html><body><p>x</p></body></html>");
}

#[test]
fn unmatched_end_tags_are_ignored() {
    let nodes = parse_fragment("<p>a</span></div>b</p>");
    assert_eq!(serialize(&nodes), "<p>ab</p>");
}

#[test]
fn unclosed_elements_are_closed_at_end() {
    let nodes = parse_fragment("<div><p>a<em>b");
    assert_eq!(serialize(&nodes), "<div><p>a<em>b</em></p></div>");
}

#[test]
fn void_and_self_closing_elements() {
    let nodes = parse_fragment("a<br/>b<hr><div/>c");
    assert_eq!(serialize(&nodes), "a<br>b<hr><div></div>c");
}

#[test]
fn comments_are_kept() {
    let nodes = parse_fragment("<!-- note -->x");
    assert!(matches!(&nodes[0], DomNode::Comment(c) if c == " note "));
}

#[test]
fn table_sections_close_each_other() {
    let nodes = parse_fragment("<table><thead><tr><th>h<tbody><tr><td>1</table>");
    assert_eq!(
        serialize(&nodes),
        "<table><thead><tr><th>h</th></tr></thead><tbody><tr><td>1</td></tr></tbody></table>"
    );
}

#[test]
fn serialize_then_parse_is_stable() {
    let el = Element::new("div")
        .with_attr("data-x", "a\"b<c&d")
        .with_child(Element::new("span").with_text("1 < 2 & 3"))
        .with_child(Element::new("img").with_attr("src", "/x.png"));
    let html = serialize(&[DomNode::from(el.clone())]);
    let parsed = parse_fragment(&html);
    assert_eq!(parsed, vec![DomNode::Element(el)]);
}
